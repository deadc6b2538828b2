use multimorbidity_graph::analytics::{
    AnalysisKind, AnalyticsConfig, AnalyticsEngine, ClusterType, HubStatus, InterventionUrgency, SpreadPattern,
};
use multimorbidity_graph::dataset::{
    BodySystemRecord, ConditionRecord, DiseaseRecord, PatientRecord, ReferenceDataset, RelationshipRecord,
};
use multimorbidity_graph::derived::{recompute_hub_labels, system_burden};
use multimorbidity_graph::graph::{GraphStore, Label};
use multimorbidity_graph::loader::{load_patients, load_reference_data};
use multimorbidity_graph::model::{Complexity, DiagnosisType};
use multimorbidity_graph::schema::labels;

fn system(name: &str, num: i64) -> BodySystemRecord {
    BodySystemRecord {
        name: name.to_string(),
        system_num: num,
        condition_count: 0,
    }
}

fn disease(id: i64, name: &str, systems: &[&str], complexity: Complexity) -> DiseaseRecord {
    DiseaseRecord {
        id,
        name: name.to_string(),
        original_name: None,
        systems: systems.iter().map(|s| s.to_string()).collect(),
        diagnosis_type: DiagnosisType::Single,
        complexity,
        has_test_results: false,
    }
}

fn patient(id: &str, conditions: &[&str]) -> PatientRecord {
    PatientRecord {
        id: id.to_string(),
        age_group: "55-65".to_string(),
        complexity: Complexity::Moderate,
        conditions: conditions.iter().map(|c| ConditionRecord::from(*c)).collect(),
    }
}

fn three_system_dataset() -> ReferenceDataset {
    ReferenceDataset {
        body_systems: vec![system("S1", 1), system("S2", 2), system("S3", 3)],
        diseases: vec![
            disease(1, "A", &["S1"], Complexity::High),
            disease(2, "A2", &["S1"], Complexity::Moderate),
            disease(3, "B", &["S2"], Complexity::High),
            disease(4, "B2", &["S2"], Complexity::Low),
            disease(5, "C", &["S3"], Complexity::Moderate),
        ],
        ..Default::default()
    }
}

/// One disease per system, S1..S4, linked in the given order by
/// co-occurrence at 0.7
fn cooccurrence_ring(names: [&str; 4], close_ring: bool) -> ReferenceDataset {
    let mut relationships: Vec<RelationshipRecord> = names
        .windows(2)
        .map(|w| RelationshipRecord::new(w[0], w[1], "COMMONLY_OCCURS_WITH", 0.7))
        .collect();
    if close_ring {
        relationships.push(RelationshipRecord::new(names[3], names[0], "COMMONLY_OCCURS_WITH", 0.7));
    }
    ReferenceDataset {
        body_systems: (1..=4).map(|i| system(&format!("S{}", i), i)).collect(),
        diseases: names
            .iter()
            .enumerate()
            .map(|(i, name)| disease(i as i64 + 1, name, &[format!("S{}", i + 1).as_str()], Complexity::Moderate))
            .collect(),
        relationships,
        ..Default::default()
    }
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

fn engine(dataset: &ReferenceDataset, patients: &[PatientRecord]) -> AnalyticsEngine {
    let mut store = GraphStore::new();
    let report = load_reference_data(&mut store, dataset).unwrap();
    assert!(report.is_clean(), "{:?}", report.rejections);
    load_patients(&mut store, patients).unwrap();
    AnalyticsEngine::new(&store, &AnalyticsConfig::default())
}

#[test]
fn test_cascade_counts_distinct_origins() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![
        RelationshipRecord::new("A", "B", "LEADS_TO", 0.85),
        RelationshipRecord::new("A2", "B2", "COMMONLY_OCCURS_WITH", 0.6),
        // Below the cascade threshold
        RelationshipRecord::new("A2", "C", "LEADS_TO", 0.4),
    ];

    let cascades = engine(&dataset, &[]).cross_system_cascades();
    assert_eq!(cascades.len(), 1);
    let c = &cascades[0];
    assert_eq!((c.origin_system.as_str(), c.intermediate_system.as_str()), ("S1", "S2"));
    assert_eq!(c.origin_diseases, 2);
    assert_eq!(c.avg_strength, 0.725);
}

#[test]
fn test_three_system_cascade() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![
        RelationshipRecord::new("A", "B", "LEADS_TO", 0.8),
        RelationshipRecord::new("A2", "B", "COMMONLY_OCCURS_WITH", 0.6),
        RelationshipRecord::new("B", "C", "LEADS_TO", 0.7),
    ];

    let cascades = engine(&dataset, &[]).cross_system_cascades();
    let extended = cascades
        .iter()
        .find(|c| c.terminal_system.as_deref() == Some("S3"))
        .unwrap();
    assert_eq!((extended.origin_system.as_str(), extended.intermediate_system.as_str()), ("S1", "S2"));
    assert_eq!(extended.origin_diseases, 2);
    assert_eq!(extended.cascade_count, 2);
    // Each path averages its two hops: (0.8 + 0.7) / 2 and (0.6 + 0.7) / 2
    assert_eq!(extended.avg_strength, 0.7);
    assert!(extended.cascade_paths.contains(&"A -> B -> C".to_string()));

    // B alone reaches S3, so the direct S2 -> S3 pair is not reported
    assert!(!cascades.iter().any(|c| c.origin_system == "S2"));

    let config = AnalyticsConfig {
        cascade_third_hop: false,
        ..Default::default()
    };
    let mut store = GraphStore::new();
    load_reference_data(&mut store, &dataset).unwrap();
    let direct_only = AnalyticsEngine::new(&store, &config).cross_system_cascades();
    assert!(direct_only.iter().all(|c| c.terminal_system.is_none()));
}

#[test]
fn test_single_origin_cascade_not_reported() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![
        RelationshipRecord::new("A", "B", "LEADS_TO", 0.9),
        RelationshipRecord::new("A", "B2", "LEADS_TO", 0.9),
    ];
    assert!(engine(&dataset, &[]).cross_system_cascades().is_empty());
}

#[test]
fn test_hub_threshold_boundary() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![
        RelationshipRecord::new("A", "B", "LEADS_TO", 0.7),
        RelationshipRecord::new("A", "B2", "COMMONLY_OCCURS_WITH", 0.6),
        RelationshipRecord::new("C", "A", "INCREASES_RISK_OF", 0.5),
    ];
    let mut store = GraphStore::new();
    load_reference_data(&mut store, &dataset).unwrap();
    let hubs = Label::new(labels::HUB_DISEASE);

    let summary = recompute_hub_labels(&mut store, 3).unwrap();
    assert_eq!(summary.hubs, vec!["A".to_string()]);
    assert_eq!(store.label_count(&hubs), 1);

    // Hub status comes from centrality, not from the hub label: 3 * 0.6
    let hotspots = AnalyticsEngine::new(&store, &AnalyticsConfig::default()).disease_hotspots();
    assert_eq!(hotspots.len(), 1);
    assert_eq!(hotspots[0].disease, "A");
    assert_eq!(hotspots[0].centrality_score, 1.8);
    assert_eq!(hotspots[0].hub_status, HubStatus::Minor);

    let summary = recompute_hub_labels(&mut store, 4).unwrap();
    assert!(summary.hubs.is_empty());
    assert_eq!(summary.labels_removed, 1);
    assert_eq!(store.label_count(&hubs), 0);
}

#[test]
fn test_four_disease_ring_is_extended_triangular() {
    let engine = engine(&cooccurrence_ring(["W", "X", "Y", "Z"], true), &[]);
    let clusters = engine.discover_clusters();

    let top = &clusters[0];
    assert_eq!(top.cluster_type, ClusterType::ExtendedTriangular);
    assert_eq!(top.cluster_size, 4);
    assert_eq!(sorted(top.diseases.clone()), vec!["W", "X", "Y", "Z"]);
    assert_eq!(top.avg_cluster_strength, 0.7);
    // 0.7 * 1.25 * (1 + 0.1 * 3)
    assert_eq!(top.stability_score, 1.1375);
    assert_eq!(top.system_count, 4);

    // Every three-disease run around the ring is open
    assert_eq!(clusters.len(), 5);
    assert!(clusters[1..]
        .iter()
        .all(|c| c.cluster_type == ClusterType::LinearChain && c.cluster_size == 3));
}

#[test]
fn test_open_four_disease_chain() {
    let engine = engine(&cooccurrence_ring(["P", "Q", "R", "T"], false), &[]);
    let clusters = engine.discover_clusters();

    let top = &clusters[0];
    assert_eq!(top.cluster_type, ClusterType::ExtendedChain);
    assert_eq!(sorted(top.diseases.clone()), vec!["P", "Q", "R", "T"]);
    // 0.7 * 1.0 * 1.3
    assert_eq!(top.stability_score, 0.91);
    assert_eq!(clusters.len(), 3);

    let config = AnalyticsConfig {
        cluster_four_node_chains: false,
        ..Default::default()
    };
    let engine = AnalyticsEngine::from_network(engine.network().clone(), &config);
    assert!(engine.discover_clusters().iter().all(|c| c.cluster_size == 3));
}

#[test]
fn test_complex_multimorbidity_boundaries() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![RelationshipRecord::new("A", "A2", "LEADS_TO", 0.8)];
    let patients = [
        // Three diseases, two systems
        patient("P1", &["A", "B", "B2"]),
        // Three diseases, three systems
        patient("P2", &["A2", "B", "C"]),
        // Two diseases
        patient("P3", &["A", "C"]),
    ];

    let profiles = engine(&dataset, &patients).patient_profiles();
    let flag = |id: &str| profiles.iter().find(|p| p.patient_id == id).unwrap().complex_multimorbid;
    assert!(!flag("P1"));
    assert!(flag("P2"));
    assert!(!flag("P3"));
}

#[test]
fn test_compound_pathway_risk() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![
        RelationshipRecord::new("A", "B", "LEADS_TO", 0.7),
        RelationshipRecord::new("B", "C", "LEADS_TO", 0.7),
    ];

    let pathways = engine(&dataset, &[]).critical_pathways();
    assert_eq!(pathways.len(), 1);
    let p = &pathways[0];
    assert_eq!(p.compound_progression_risk, 0.49);
    assert_eq!(p.intervention_urgency, InterventionUrgency::UrgentIntervention);
    assert_eq!(p.spread_pattern, SpreadPattern::MultiSystemSpread);
}

#[test]
fn test_burden_grows_with_high_complexity_disease() {
    let mut dataset = three_system_dataset();
    let mut store = GraphStore::new();
    load_reference_data(&mut store, &dataset).unwrap();
    let before = system_burden(&store, "S1").unwrap();

    dataset.diseases.push(disease(6, "A3", &["S1"], Complexity::High));
    load_reference_data(&mut store, &dataset).unwrap();
    let after = system_burden(&store, "S1").unwrap();

    assert_eq!(after.disease_count, before.disease_count + 1);
    assert!(after.score() > before.score());
    // disease_count + 2 * high + moderate
    assert_eq!(after.score(), 3.0 + 2.0 * 2.0 + 1.0);
    assert!(system_burden(&store, "Unknown").is_none());
}

#[test]
fn test_single_connection_hotspot_has_no_interval() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![RelationshipRecord::new("A", "B", "LEADS_TO", 0.7)];
    let mut store = GraphStore::new();
    load_reference_data(&mut store, &dataset).unwrap();
    let config = AnalyticsConfig {
        hotspot_min_connections: 1,
        ..Default::default()
    };

    let hotspots = AnalyticsEngine::new(&store, &config).disease_hotspots();
    assert_eq!(hotspots.len(), 2);
    assert!(hotspots.iter().all(|h| h.ci_lower.is_none() && h.ci_upper.is_none()));
    assert!(hotspots.iter().all(|h| h.strength_stdev.is_none()));
}

#[test]
fn test_empty_graph_every_analysis() {
    let engine = AnalyticsEngine::new(&GraphStore::new(), &AnalyticsConfig::default());
    for kind in AnalysisKind::ALL {
        let rows = engine.run(kind).unwrap();
        assert!(rows.is_empty(), "{} returned rows", kind);
    }
}

#[test]
fn test_partial_graph_without_relationships() {
    let engine = engine(&three_system_dataset(), &[patient("P1", &["A", "B", "C"])]);
    assert!(engine.disease_hotspots().is_empty());
    assert!(engine.cross_system_cascades().is_empty());
    assert!(engine.discover_clusters().is_empty());

    let burden = engine.resource_burden();
    assert_eq!(burden[0].interaction_count, 0);
    assert_eq!(burden[0].interaction_multiplier, 1.0);
    // (4 + 4 + 2) * 1.0 * 1.2
    assert_eq!(burden[0].total_complexity, 12.0);
}

#[test]
fn test_rows_render_as_json() {
    let mut dataset = three_system_dataset();
    dataset.relationships = vec![
        RelationshipRecord::new("A", "B", "LEADS_TO", 0.7),
        RelationshipRecord::new("B", "C", "LEADS_TO", 0.7),
    ];
    let rows = engine(&dataset, &[]).run(AnalysisKind::CriticalPathways).unwrap();
    let json = rows.to_json();
    assert_eq!(json[0]["start_disease"], "A");
    assert_eq!(json[0]["intervention_urgency"], "URGENT_INTERVENTION");
}
