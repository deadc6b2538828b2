//! Read-only projection of the disease graph
//!
//! Analyses run over dense indices instead of store ids: the projection is
//! built once per engine and never touches the store again.

use crate::graph::{GraphStatistics, GraphStore, Label, NodeId};
use crate::model::{Complexity, RelationshipKind};
use crate::schema::{labels, rel};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct DiseaseInfo {
    pub node: NodeId,
    pub disease_id: Option<i64>,
    pub name: String,
    pub complexity: Option<Complexity>,
    /// Indices into [`DiseaseNetwork::systems`], sorted
    pub systems: Vec<usize>,
    pub relationship_count: Option<i64>,
    pub is_hub: bool,
}

#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub node: NodeId,
    pub name: String,
    pub system_num: Option<i64>,
}

/// A weighted disease-to-disease relationship
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub kind: RelationshipKind,
    pub strength: f64,
}

impl Link {
    pub fn other(&self, disease: usize) -> usize {
        if self.source == disease {
            self.target
        } else {
            self.source
        }
    }
}

#[derive(Debug, Clone)]
pub struct Interaction {
    pub source: usize,
    pub target: usize,
    pub interaction_type: String,
    pub strength: f64,
}

#[derive(Debug, Clone)]
pub struct PatientInfo {
    pub id: String,
    pub age_group: Option<String>,
    pub complexity: Option<String>,
    /// Distinct held diseases, sorted
    pub conditions: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct DiseaseNetwork {
    pub diseases: Vec<DiseaseInfo>,
    pub systems: Vec<SystemInfo>,
    pub links: Vec<Link>,
    pub interactions: Vec<Interaction>,
    pub patients: Vec<PatientInfo>,
    pub statistics: GraphStatistics,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl DiseaseNetwork {
    pub fn from_store(store: &GraphStore) -> Self {
        let mut network = DiseaseNetwork {
            statistics: store.statistics(),
            ..Default::default()
        };

        let mut system_index: FxHashMap<NodeId, usize> = FxHashMap::default();
        for node in store.get_nodes_by_label(&Label::new(labels::BODY_SYSTEM)) {
            system_index.insert(node.id, network.systems.len());
            network.systems.push(SystemInfo {
                node: node.id,
                name: node.str_property("name").unwrap_or_default().to_string(),
                system_num: node.get_property("system_num").and_then(|v| v.as_integer()),
            });
        }

        let mut disease_index: FxHashMap<NodeId, usize> = FxHashMap::default();
        for node in store.get_nodes_by_label(&Label::new(labels::DISEASE)) {
            let mut systems: Vec<usize> = store
                .get_outgoing_edges(node.id)
                .into_iter()
                .filter(|e| e.is_type(rel::AFFECTS_SYSTEM))
                .filter_map(|e| system_index.get(&e.target).copied())
                .collect();
            systems.sort_unstable();
            systems.dedup();

            disease_index.insert(node.id, network.diseases.len());
            network.diseases.push(DiseaseInfo {
                node: node.id,
                disease_id: node.get_property("id").and_then(|v| v.as_integer()),
                name: node.str_property("name").unwrap_or_default().to_string(),
                complexity: node.get_property("complexity").and_then(Complexity::from_property),
                systems,
                relationship_count: node.get_property("relationship_count").and_then(|v| v.as_integer()),
                is_hub: node.get_property("is_hub").and_then(|v| v.as_boolean()).unwrap_or(false),
            });
        }

        network.outgoing = vec![Vec::new(); network.diseases.len()];
        network.incoming = vec![Vec::new(); network.diseases.len()];
        for kind in RelationshipKind::ALL {
            for edge in store.get_edges_by_type(&kind.as_str().into()) {
                let (Some(&source), Some(&target)) =
                    (disease_index.get(&edge.source), disease_index.get(&edge.target))
                else {
                    continue;
                };
                let Some(strength) = edge.strength() else {
                    continue;
                };
                let link = network.links.len();
                network.links.push(Link {
                    source,
                    target,
                    kind,
                    strength,
                });
                network.outgoing[source].push(link);
                network.incoming[target].push(link);
            }
        }

        for edge in store.get_edges_by_type(&rel::SYSTEM_INTERACTION.into()) {
            let (Some(&source), Some(&target)) =
                (system_index.get(&edge.source), system_index.get(&edge.target))
            else {
                continue;
            };
            network.interactions.push(Interaction {
                source,
                target,
                interaction_type: edge
                    .get_property("type")
                    .and_then(|v| v.as_string())
                    .unwrap_or_default()
                    .to_string(),
                strength: edge.strength().unwrap_or(0.0),
            });
        }

        for node in store.get_nodes_by_label(&Label::new(labels::PATIENT)) {
            let mut conditions: Vec<usize> = store
                .get_outgoing_edges(node.id)
                .into_iter()
                .filter(|e| e.is_type(rel::HAS_CONDITION))
                .filter_map(|e| disease_index.get(&e.target).copied())
                .collect();
            conditions.sort_unstable();
            conditions.dedup();

            network.patients.push(PatientInfo {
                id: node.str_property("id").unwrap_or_default().to_string(),
                age_group: node.str_property("age_group").map(str::to_string),
                complexity: node.str_property("complexity").map(str::to_string),
                conditions,
            });
        }

        network
    }

    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    pub fn name(&self, disease: usize) -> &str {
        &self.diseases[disease].name
    }

    pub fn system_name(&self, system: usize) -> &str {
        &self.systems[system].name
    }

    pub fn system_names(&self, disease: usize) -> Vec<String> {
        self.diseases[disease]
            .systems
            .iter()
            .map(|&s| self.systems[s].name.clone())
            .collect()
    }

    pub fn outgoing(&self, disease: usize) -> impl Iterator<Item = &Link> {
        self.outgoing[disease].iter().map(move |&l| &self.links[l])
    }

    pub fn incoming(&self, disease: usize) -> impl Iterator<Item = &Link> {
        self.incoming[disease].iter().map(move |&l| &self.links[l])
    }

    /// Every link touching `disease`, either direction
    pub fn incident(&self, disease: usize) -> impl Iterator<Item = &Link> {
        self.outgoing(disease).chain(self.incoming(disease))
    }

    /// Diseases reachable from `disease` over `kinds` at `min_strength` or
    /// more. Co-occurrence links are followed against their direction too.
    pub fn neighbours(
        &self,
        disease: usize,
        kinds: &[RelationshipKind],
        min_strength: f64,
    ) -> Vec<(usize, &Link)> {
        let forward = self
            .outgoing(disease)
            .filter(|l| kinds.contains(&l.kind) && l.strength >= min_strength)
            .map(|l| (l.target, l));
        let backward = self
            .incoming(disease)
            .filter(|l| l.kind.is_symmetric() && kinds.contains(&l.kind) && l.strength >= min_strength)
            .map(|l| (l.source, l));
        forward.chain(backward).collect()
    }

    /// Strongest undirected link of `kind` between two diseases
    pub fn link_between(&self, a: usize, b: usize, kind: RelationshipKind, min_strength: f64) -> Option<f64> {
        self.outgoing(a)
            .filter(|l| l.target == b)
            .chain(self.incoming(a).filter(|l| l.source == b))
            .filter(|l| l.kind == kind && l.strength >= min_strength)
            .map(|l| l.strength)
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
    }

    pub fn shares_system(&self, a: usize, b: usize) -> bool {
        let (sa, sb) = (&self.diseases[a].systems, &self.diseases[b].systems);
        sa.iter().any(|s| sb.contains(s))
    }

    /// Diseases attached to each system, by system index
    pub fn diseases_by_system(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.systems.len()];
        for (d, info) in self.diseases.iter().enumerate() {
            for &s in &info.systems {
                members[s].push(d);
            }
        }
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use crate::loader::{load_patients, load_reference_data};

    fn network() -> DiseaseNetwork {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        load_patients(&mut store, &sample::patients()).unwrap();
        DiseaseNetwork::from_store(&store)
    }

    fn index(network: &DiseaseNetwork, name: &str) -> usize {
        network.diseases.iter().position(|d| d.name == name).unwrap()
    }

    #[test]
    fn test_projection_sizes() {
        let network = network();
        assert_eq!(network.diseases.len(), 16);
        assert_eq!(network.systems.len(), 15);
        assert_eq!(network.links.len(), 18);
        assert_eq!(network.interactions.len(), 6);
        assert_eq!(network.patients.len(), 3);
    }

    #[test]
    fn test_hub_flag_follows_derived_attribute() {
        let mut store = GraphStore::new();
        load_reference_data(&mut store, &sample::reference_dataset()).unwrap();
        let before = DiseaseNetwork::from_store(&store);
        assert!(before.diseases.iter().all(|d| !d.is_hub));

        crate::derived::recompute_hub_labels(&mut store, 6).unwrap();
        let after = DiseaseNetwork::from_store(&store);
        let hubs: Vec<&str> = after.diseases.iter().filter(|d| d.is_hub).map(|d| d.name.as_str()).collect();
        assert_eq!(hubs, vec![sample::T2DM]);
    }

    #[test]
    fn test_cooccurrence_is_undirected() {
        let network = network();
        let anxiety = index(&network, sample::ANXIETY);
        let depression = index(&network, sample::DEPRESSION);

        let from_anxiety = network.neighbours(anxiety, &[RelationshipKind::CommonlyOccursWith], 0.6);
        assert_eq!(from_anxiety.len(), 1);
        assert_eq!(from_anxiety[0].0, depression);
        assert_eq!(
            network.link_between(anxiety, depression, RelationshipKind::CommonlyOccursWith, 0.0),
            Some(0.7)
        );
    }

    #[test]
    fn test_progression_is_directed() {
        let network = network();
        let neuropathy = index(&network, sample::DIABETIC_NEUROPATHY);
        assert!(network
            .neighbours(neuropathy, &[RelationshipKind::LeadsTo], 0.0)
            .is_empty());
    }

    #[test]
    fn test_empty_store() {
        let network = DiseaseNetwork::from_store(&GraphStore::new());
        assert!(network.is_empty());
        assert!(network.diseases_by_system().is_empty());
    }
}
