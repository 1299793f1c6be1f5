//! Turning a detected community labelling into the cluster partition the view
//! layer works with: named clusters, a membership index, and aggregated
//! inter-cluster edges.

use super::louvain::Louvain;
use super::traits::CommunityDetection;
use crate::graph::{Dataset, RawNode};
use crate::palette::{ColorSet, Palette};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Prefix of generated cluster ids.
pub const CLUSTER_ID_PREFIX: &str = "c";

/// A detected community.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Cluster id, disjoint from every node id in the dataset.
    pub id: String,
    /// Member node ids.
    pub members: Vec<String>,
    /// Total weight of edges with both endpoints inside the cluster.
    pub sum_tot: f64,
    /// Colors shared by the aggregated node and every member.
    pub color: ColorSet,
}

/// Aggregated edges between two clusters, keyed by direction.
///
/// `source == target` represents the cluster's internal edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterEdge {
    /// Source cluster id.
    pub source: String,
    /// Target cluster id.
    pub target: String,
    /// Summed weight of the underlying edges.
    pub count: f64,
}

impl ClusterEdge {
    /// Whether this aggregate stands for intra-cluster edges.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Clusters, membership and inter-cluster aggregates for one dataset.
#[derive(Debug, Clone, Default)]
pub struct ClusterPartition {
    clusters: Vec<Cluster>,
    cluster_edges: Vec<ClusterEdge>,
    membership: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl ClusterPartition {
    /// Build a partition from an explicit labelling.
    ///
    /// `assignment[i]` is the community of `dataset.nodes[i]` (`None` leaves
    /// the node unassigned). Unassigned nodes and nodes past the end of
    /// `assignment` become singleton clusters. Labels are renumbered in order
    /// of first appearance.
    pub fn from_assignment(
        dataset: &Dataset,
        assignment: &[Option<usize>],
        palette: &Palette,
    ) -> Self {
        let node_ids: HashSet<&str> = dataset.nodes.iter().map(|n| n.id.as_str()).collect();

        let mut label_to_cluster: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut membership: HashMap<String, usize> = HashMap::new();

        for (i, node) in dataset.nodes.iter().enumerate() {
            if membership.contains_key(&node.id) {
                // duplicate ids stay listed under their first cluster
                let c = membership[&node.id];
                groups[c].push(node.id.clone());
                continue;
            }
            let cluster = match assignment.get(i).copied().flatten() {
                Some(label) => *label_to_cluster.entry(label).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                }),
                None => {
                    tracing::debug!(node = %node.id, "unassigned node becomes a singleton cluster");
                    groups.push(Vec::new());
                    groups.len() - 1
                }
            };
            groups[cluster].push(node.id.clone());
            membership.insert(node.id.clone(), cluster);
        }

        let mut taken: HashSet<String> = HashSet::new();
        let clusters: Vec<Cluster> = groups
            .into_iter()
            .enumerate()
            .map(|(i, members)| Cluster {
                id: cluster_id(i, &node_ids, &mut taken),
                members,
                sum_tot: 0.0,
                color: palette.get(i).clone(),
            })
            .collect();
        let by_id = clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let mut partition = Self {
            clusters,
            cluster_edges: Vec::new(),
            membership,
            by_id,
        };
        partition.aggregate_edges(dataset);
        partition
    }

    fn aggregate_edges(&mut self, dataset: &Dataset) {
        let mut index: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<ClusterEdge> = Vec::new();
        for edge in &dataset.edges {
            let (Some(&cs), Some(&ct)) = (
                self.membership.get(&edge.source),
                self.membership.get(&edge.target),
            ) else {
                continue;
            };
            let w = edge.weight_or_default();
            if cs == ct {
                self.clusters[cs].sum_tot += w;
            }
            let slot = *index.entry((cs, ct)).or_insert_with(|| {
                edges.push(ClusterEdge {
                    source: self.clusters[cs].id.clone(),
                    target: self.clusters[ct].id.clone(),
                    count: 0.0,
                });
                edges.len() - 1
            });
            edges[slot].count += w;
        }
        self.cluster_edges = edges;
    }

    /// All clusters, in detection order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Directed inter-cluster aggregates (including self pairs).
    pub fn cluster_edges(&self) -> &[ClusterEdge] {
        &self.cluster_edges
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the partition has no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster by id.
    pub fn cluster(&self, id: &str) -> Option<&Cluster> {
        self.by_id.get(id).map(|&i| &self.clusters[i])
    }

    /// Whether `id` names a cluster.
    pub fn is_cluster_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Cluster owning node `node_id`.
    pub fn cluster_of(&self, node_id: &str) -> Option<&Cluster> {
        self.membership.get(node_id).map(|&i| &self.clusters[i])
    }

    /// Attach synthesized nodes to `cluster_id`, growing its member list and
    /// its internal edge total by `new_edges`.
    ///
    /// Returns `false` if the cluster does not exist.
    pub fn attach(&mut self, cluster_id: &str, nodes: &[RawNode], new_edges: usize) -> bool {
        let Some(&idx) = self.by_id.get(cluster_id) else {
            return false;
        };
        for node in nodes {
            if self.membership.contains_key(&node.id) {
                continue;
            }
            self.membership.insert(node.id.clone(), idx);
            self.clusters[idx].members.push(node.id.clone());
        }
        self.clusters[idx].sum_tot += new_edges as f64;
        true
    }
}

fn cluster_id(i: usize, node_ids: &HashSet<&str>, taken: &mut HashSet<String>) -> String {
    let mut candidate = format!("{CLUSTER_ID_PREFIX}{i}");
    while node_ids.contains(candidate.as_str()) || taken.contains(&candidate) {
        candidate.push('_');
    }
    taken.insert(candidate.clone());
    candidate
}

/// Partitions a dataset into clusters.
#[derive(Debug, Clone, Default)]
pub struct ClusterDetector<D = Louvain> {
    algorithm: D,
    palette: Palette,
}

impl<D: CommunityDetection> ClusterDetector<D> {
    /// Detector using `algorithm` and the default palette.
    pub fn new(algorithm: D) -> Self {
        Self {
            algorithm,
            palette: Palette::default(),
        }
    }

    /// Use a specific palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Run community detection and build the partition.
    ///
    /// An empty dataset yields an empty partition.
    pub fn detect(&self, dataset: &Dataset) -> ClusterPartition {
        let (graph, ids, skipped) = dataset.to_ungraph();
        for edge in &skipped {
            tracing::warn!(edge = %edge, "edge references an unknown node; ignored by clustering");
        }
        let labels = self.algorithm.detect(&graph);

        let by_id: HashMap<&str, usize> = ids
            .iter()
            .zip(labels.iter().copied())
            .map(|(id, label)| (id.as_str(), label))
            .collect();
        let assignment: Vec<Option<usize>> = dataset
            .nodes
            .iter()
            .map(|n| by_id.get(n.id.as_str()).copied())
            .collect();

        let partition = ClusterPartition::from_assignment(dataset, &assignment, &self.palette);
        tracing::debug!(
            nodes = dataset.nodes.len(),
            clusters = partition.len(),
            resolution = self.algorithm.resolution(),
            "cluster partition computed"
        );
        partition
    }
}
