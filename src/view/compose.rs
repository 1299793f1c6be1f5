//! Mixed-graph composition.

use super::style;
use super::{MixedView, ViewEdge, ViewNode, Warning, CLUSTER_LEVEL, REAL_LEVEL};
use crate::community::{Cluster, ClusterPartition};
use crate::graph::{Dataset, IdAllocator, RawEdge, RawNode, EDGE_ID_PREFIX};
use std::collections::{HashMap, HashSet};

/// Derives the mixed view from the dataset, its partition and the set of
/// expanded cluster ids.
#[derive(Debug, Clone, Copy)]
pub struct ViewCompositor<'a> {
    dataset: &'a Dataset,
    partition: &'a ClusterPartition,
}

impl<'a> ViewCompositor<'a> {
    /// Compositor over a dataset and its partition.
    pub fn new(dataset: &'a Dataset, partition: &'a ClusterPartition) -> Self {
        Self { dataset, partition }
    }

    /// Compose the mixed view.
    ///
    /// - an expanded cluster contributes its real members, a collapsed one a
    ///   single aggregated node;
    /// - a dataset edge is kept when both clusters are expanded, rerouted to
    ///   the aggregated side as a virtual edge when exactly one is, and left
    ///   to the cluster aggregates otherwise;
    /// - a cluster aggregate is kept only while neither endpoint is expanded.
    ///
    /// Nothing outside the returned view is touched.
    pub fn compose(&self, expanded: &HashSet<String>) -> MixedView {
        let mut view = MixedView::default();
        let raw: HashMap<&str, &RawNode> = self
            .dataset
            .nodes
            .iter()
            .rev()
            .map(|n| (n.id.as_str(), n))
            .collect();

        let mut node_ids: HashSet<String> = HashSet::new();
        for cluster in self.partition.clusters() {
            if expanded.contains(&cluster.id) {
                for member in &cluster.members {
                    let node = real_node(member, raw.get(member.as_str()).copied(), cluster);
                    push_unique(&mut view, &mut node_ids, node);
                }
            } else {
                push_unique(&mut view, &mut node_ids, aggregated_node(cluster));
            }
        }

        let mut edge_ids = IdAllocator::default();
        for edge in &self.dataset.edges {
            let (Some(cs), Some(ct)) = (
                self.partition.cluster_of(&edge.source),
                self.partition.cluster_of(&edge.target),
            ) else {
                let warning = Warning::DanglingEdge {
                    edge_id: edge.id_str().to_string(),
                    source_id: edge.source.clone(),
                    target_id: edge.target.clone(),
                };
                tracing::warn!("{warning}");
                view.warnings.push(warning);
                continue;
            };
            let id_base = match edge.id.as_deref() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => format!("{EDGE_ID_PREFIX}{}-{}", edge.source, edge.target),
            };
            match (expanded.contains(&cs.id), expanded.contains(&ct.id)) {
                (true, true) => {
                    view.edges.push(real_edge(edge_ids.claim(&id_base), edge));
                }
                (true, false) => {
                    let id = edge_ids.claim(&format!("{id_base}-v"));
                    view.edges
                        .push(virtual_edge(id, &edge.source, &ct.id, edge.weight_or_default()));
                }
                (false, true) => {
                    let id = edge_ids.claim(&format!("{id_base}-v"));
                    view.edges
                        .push(virtual_edge(id, &cs.id, &edge.target, edge.weight_or_default()));
                }
                (false, false) => {}
            }
        }

        for aggregate in self.partition.cluster_edges() {
            if expanded.contains(&aggregate.source) || expanded.contains(&aggregate.target) {
                continue;
            }
            let id = edge_ids.claim(&format!(
                "{EDGE_ID_PREFIX}{}-{}",
                aggregate.source, aggregate.target
            ));
            view.edges.push(virtual_edge(
                id,
                &aggregate.source,
                &aggregate.target,
                aggregate.count,
            ));
        }

        view.retain_resolvable();
        view.recompute_degrees();
        style::apply(&mut view);
        view
    }
}

fn push_unique(view: &mut MixedView, ids: &mut HashSet<String>, mut node: ViewNode) {
    if ids.contains(&node.id) {
        let mut n = 1;
        let mut renamed = format!("{}#{n}", node.id);
        while ids.contains(&renamed) {
            n += 1;
            renamed = format!("{}#{n}", node.id);
        }
        let warning = Warning::DuplicateNode {
            id: node.id.clone(),
            renamed: renamed.clone(),
        };
        tracing::warn!("{warning}");
        view.warnings.push(warning);
        node.id = renamed;
    }
    ids.insert(node.id.clone());
    view.nodes.push(node);
}

fn real_node(id: &str, raw: Option<&RawNode>, cluster: &Cluster) -> ViewNode {
    ViewNode {
        id: id.to_string(),
        label: raw
            .and_then(|n| n.label.clone())
            .unwrap_or_else(|| id.to_string()),
        level: REAL_LEVEL,
        cluster_id: Some(cluster.id.clone()),
        parent_id: Some(cluster.id.clone()),
        degree: 0,
        in_degree: 0,
        out_degree: 0,
        count: None,
        color: cluster.color.clone(),
        position: None,
        style: style::NodeStyle::for_level(REAL_LEVEL),
        hidden: false,
    }
}

fn aggregated_node(cluster: &Cluster) -> ViewNode {
    ViewNode {
        id: cluster.id.clone(),
        label: cluster.id.clone(),
        level: CLUSTER_LEVEL,
        cluster_id: Some(cluster.id.clone()),
        parent_id: None,
        degree: 0,
        in_degree: 0,
        out_degree: 0,
        count: Some(cluster.members.len()),
        color: cluster.color.clone(),
        position: None,
        style: style::NodeStyle::for_level(CLUSTER_LEVEL),
        hidden: false,
    }
}

fn real_edge(id: String, edge: &RawEdge) -> ViewEdge {
    ViewEdge {
        id,
        source: edge.source.clone(),
        target: edge.target.clone(),
        label: edge
            .label
            .clone()
            .unwrap_or_else(|| format!("{}-{}", edge.source, edge.target)),
        is_real: true,
        is_virtual: false,
        count: edge.weight_or_default(),
        style: style::EdgeStyle::default(),
        hidden: false,
    }
}

fn virtual_edge(id: String, source: &str, target: &str, count: f64) -> ViewEdge {
    ViewEdge {
        id,
        source: source.to_string(),
        target: target.to_string(),
        label: String::new(),
        is_real: false,
        is_virtual: true,
        count,
        style: style::EdgeStyle::default(),
        hidden: false,
    }
}
