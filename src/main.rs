use anyhow::Context;
use multimorbidity_graph::dataset::{read_patients, sample, ReferenceDataset};
use multimorbidity_graph::{Config, GraphService};
use std::env;
use tracing::info;

/// Usage: multimorbidity-graph [config.yaml] [reference.json|yaml] [patients.json|yaml]
///
/// Without arguments the bundled sample dataset and its three demonstration
/// patients are loaded with default thresholds.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) => Config::from_yaml_file(path).with_context(|| format!("loading config {}", path))?,
        None => Config::default(),
    };
    let dataset = match args.get(1) {
        Some(path) => ReferenceDataset::from_path(path).with_context(|| format!("loading dataset {}", path))?,
        None => sample::reference_dataset(),
    };
    let patients = match args.get(2) {
        Some(path) => read_patients(path).with_context(|| format!("loading patients {}", path))?,
        None => sample::patients(),
    };

    println!("Multimorbidity Graph v{}", multimorbidity_graph::version());
    println!("==========================================");

    let summary = dataset.summary();
    println!(
        "Dataset: {} conditions across {} body systems (diversity {:.2})",
        summary.total_conditions, summary.systems_count, summary.system_diversity
    );

    let service = GraphService::new(config);
    let report = service.bootstrap(&dataset, &patients).await?;
    println!(
        "Loaded {} entities ({} rejected), {} hub diseases",
        report.reference.total_created() + report.patients.total_created(),
        report.reference.rejections.len() + report.patients.rejections.len(),
        report.hubs.hubs.len()
    );
    for rejection in report.reference.rejections.iter().chain(&report.patients.rejections) {
        println!("  rejected {:?} {}: {}", rejection.kind, rejection.record, rejection.reason);
    }

    let engine = service.analytics().await?;
    for (kind, rows) in engine.run_all()? {
        println!("\n=== {} ({} rows) ===", kind, rows.len());
        println!("{}", serde_json::to_string_pretty(&rows.to_json())?);
    }

    if service.config().snapshot_path.is_some() {
        let saved = service.save_snapshot().await?;
        info!("Snapshot holds {} nodes and {} edges", saved.nodes, saved.edges);
    }

    service.shutdown().await;
    Ok(())
}
