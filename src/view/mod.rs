//! The mixed view handed to the rendering collaborator.
//!
//! A mixed view combines real nodes of expanded clusters with one aggregated
//! node per collapsed cluster. Nodes and edges are flat, id-keyed lists;
//! adjacency is derived from edge endpoints when needed.

mod compose;
pub mod style;

pub use compose::ViewCompositor;
pub use style::{EdgeShape, EdgeStyle, NodeStyle};

use crate::palette::ColorSet;
use crate::positions::Position;
use serde::Serialize;
use std::collections::HashSet;

/// Level of a real (dataset) node.
pub const REAL_LEVEL: u32 = 0;

/// Level of a node aggregating one detected cluster.
pub const CLUSTER_LEVEL: u32 = 1;

/// A node of the mixed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    /// Id, unique within the view.
    pub id: String,
    /// Full label.
    pub label: String,
    /// 0 = real, 1 = aggregated cluster, 2+ = meta-aggregation.
    pub level: u32,
    /// Owning cluster (the node's own id for aggregated nodes).
    pub cluster_id: Option<String>,
    /// Aggregated node this one was expanded from.
    pub parent_id: Option<String>,
    /// In + out degree within the view.
    pub degree: usize,
    /// Incoming edges within the view.
    pub in_degree: usize,
    /// Outgoing edges within the view.
    pub out_degree: usize,
    /// Member count (aggregated nodes only).
    pub count: Option<usize>,
    /// Cluster colors.
    pub color: ColorSet,
    /// Current or seeded coordinates.
    pub position: Option<Position>,
    /// Rendering hints.
    pub style: NodeStyle,
    /// Hidden by the user.
    pub hidden: bool,
}

impl ViewNode {
    /// Whether this is a real dataset node.
    pub fn is_real(&self) -> bool {
        self.level == REAL_LEVEL
    }

    /// Whether this node stands for a cluster (or a group of clusters).
    pub fn is_aggregated(&self) -> bool {
        self.level > REAL_LEVEL
    }
}

/// An edge of the mixed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEdge {
    /// Id, unique within the view.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Label (empty for synthesized edges).
    pub label: String,
    /// Both endpoints are real nodes.
    pub is_real: bool,
    /// Synthesized to stand in for connectivity hidden by a collapsed cluster.
    pub is_virtual: bool,
    /// Aggregated multiplicity (summed weight).
    pub count: f64,
    /// Rendering hints.
    pub style: EdgeStyle,
    /// Hidden by the user (or because an endpoint is hidden).
    pub hidden: bool,
}

impl ViewEdge {
    /// Whether source and target coincide.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A non-fatal problem met while building a view.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// An edge endpoint does not resolve to a node of the view; the edge was
    /// dropped.
    #[error("edge {edge_id} ({source_id} -> {target_id}) references a node outside the view")]
    DanglingEdge {
        /// Dropped edge.
        edge_id: String,
        /// Its source id.
        source_id: String,
        /// Its target id.
        target_id: String,
    },
    /// A node id appeared twice; the later copy was renamed.
    #[error("node {id} exists already; renamed to {renamed}")]
    DuplicateNode {
        /// Original id.
        id: String,
        /// Id given to the duplicate.
        renamed: String,
    },
}

/// The node/edge set currently rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MixedView {
    /// Nodes.
    pub nodes: Vec<ViewNode>,
    /// Edges; every endpoint resolves to a node in `nodes`.
    pub edges: Vec<ViewEdge>,
    /// Problems met while composing.
    pub warnings: Vec<Warning>,
}

impl MixedView {
    /// Node by id.
    pub fn node(&self, id: &str) -> Option<&ViewNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Mutable node by id.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut ViewNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Edge by id.
    pub fn edge(&self, id: &str) -> Option<&ViewEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Mutable edge by id.
    pub fn edge_mut(&mut self, id: &str) -> Option<&mut ViewEdge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    /// Number of aggregated nodes.
    pub fn aggregated_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_aggregated()).count()
    }

    /// Drop edges whose endpoints are not in the view, recording a warning
    /// for each.
    pub fn retain_resolvable(&mut self) {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut dropped = Vec::new();
        self.edges.retain(|e| {
            let ok = ids.contains(e.source.as_str()) && ids.contains(e.target.as_str());
            if !ok {
                dropped.push(Warning::DanglingEdge {
                    edge_id: e.id.clone(),
                    source_id: e.source.clone(),
                    target_id: e.target.clone(),
                });
            }
            ok
        });
        for warning in dropped {
            tracing::warn!("{warning}");
            self.warnings.push(warning);
        }
    }

    /// Recompute degree counters from the edge list.
    pub fn recompute_degrees(&mut self) {
        let index: std::collections::HashMap<String, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        for node in &mut self.nodes {
            node.degree = 0;
            node.in_degree = 0;
            node.out_degree = 0;
        }
        for edge in &self.edges {
            if let Some(&s) = index.get(&edge.source) {
                self.nodes[s].degree += 1;
                self.nodes[s].out_degree += 1;
            }
            if let Some(&t) = index.get(&edge.target) {
                self.nodes[t].degree += 1;
                self.nodes[t].in_degree += 1;
            }
        }
    }
}
