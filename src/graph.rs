//! Raw dataset ingestion.
//!
//! The data-loading collaborator hands over a flat `{nodes, edges}` document.
//! Everything downstream (clustering, composition, neighbor synthesis) works
//! from this id-indexed form; adjacency is derived on demand, never stored as
//! back references between nodes and edges.

use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Prefix carried by every edge id once a dataset is normalized.
pub const EDGE_ID_PREFIX: &str = "edge-";

/// A node as supplied by the data loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Unique node id.
    pub id: String,
    /// Optional display label (defaults to the id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RawNode {
    /// Node with just an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }
}

/// An edge as supplied by the data loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    /// Edge id; allocated during normalization when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Optional label (defaults to `"<source>-<target>"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional weight; `value` is accepted as an alias.
    #[serde(default, alias = "value", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl RawEdge {
    /// Unweighted edge without an id.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            label: None,
            weight: None,
        }
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Weight, defaulting to 1.
    pub fn weight_or_default(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    /// Edge id, or an empty string before normalization.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

/// The full in-memory dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Node list.
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    /// Edge list.
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl Dataset {
    /// Build a dataset from node ids and `(source, target)` pairs.
    pub fn from_pairs<'a>(
        nodes: impl IntoIterator<Item = &'a str>,
        edges: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(RawNode::new).collect(),
            edges: edges
                .into_iter()
                .map(|(s, t)| RawEdge::new(s, t))
                .collect(),
        }
    }

    /// Parse a dataset from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| Error::Parse {
            what: "dataset",
            source,
        })
    }

    /// Read and parse a dataset from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Give every edge a unique `edge-` prefixed id and a default label.
    ///
    /// Returns the allocator seeded with every id now in use, so later
    /// synthesized items cannot collide with existing ones.
    pub fn normalize(&mut self) -> IdAllocator {
        let mut ids = IdAllocator::default();
        for node in &self.nodes {
            ids.reserve(&node.id);
        }
        for edge in &mut self.edges {
            let base = match edge.id.take() {
                Some(id) if id.starts_with(EDGE_ID_PREFIX) => id,
                Some(id) => format!("{EDGE_ID_PREFIX}{id}"),
                None => format!("{EDGE_ID_PREFIX}{}", ids.next_serial()),
            };
            edge.id = Some(ids.claim(&base));
            if edge.label.is_none() {
                edge.label = Some(format!("{}-{}", edge.source, edge.target));
            }
        }
        ids
    }

    /// Look up a node by id (first occurrence wins).
    pub fn node(&self, id: &str) -> Option<&RawNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Append a synthesized subgraph.
    pub fn merge(&mut self, nodes: &[RawNode], edges: &[RawEdge]) {
        self.nodes.extend_from_slice(nodes);
        self.edges.extend_from_slice(edges);
    }

    /// Convert to a weighted undirected petgraph.
    ///
    /// Node `i` of the returned graph is `ids[i]`. Duplicate node ids collapse
    /// onto their first occurrence; edges naming unknown nodes are skipped and
    /// reported in the third tuple element.
    pub fn to_ungraph(&self) -> (UnGraph<(), f64>, Vec<String>, Vec<String>) {
        let mut graph = UnGraph::<(), f64>::with_capacity(self.nodes.len(), self.edges.len());
        let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        let mut ids = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if index.contains_key(node.id.as_str()) {
                continue;
            }
            let idx = graph.add_node(());
            index.insert(node.id.as_str(), idx);
            ids.push(node.id.clone());
        }

        let mut skipped = Vec::new();
        for edge in &self.edges {
            match (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(s, t, edge.weight_or_default());
                }
                _ => skipped.push(edge.id_str().to_string()),
            }
        }
        (graph, ids, skipped)
    }
}

/// Hands out ids that do not collide with anything already reserved.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    taken: HashSet<String>,
    serial: u64,
}

impl IdAllocator {
    /// Mark an id as used.
    pub fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    /// Whether an id is already used.
    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Claim `base`, or `base-<n>` for the first free `n` if `base` is taken.
    pub fn claim(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 1u64;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    /// Claim a fresh id of the form `<prefix><serial>`.
    pub fn fresh(&mut self, prefix: &str) -> String {
        loop {
            let candidate = format!("{prefix}{}", self.next_serial());
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn next_serial(&mut self) -> u64 {
        let s = self.serial;
        self.serial += 1;
        s
    }
}
