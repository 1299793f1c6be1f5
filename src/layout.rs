//! Force-simulation tuning.
//!
//! The simulation itself belongs to the rendering side. What lives here is
//! the per-item parameterization: aggregated nodes push harder and sit
//! farther apart, real neighbors are pulled close, isolates are gently drawn
//! in, and nodes that already had a position are made heavy so a rebuild does
//! not shake the whole picture.

use crate::positions::PositionCache;
use crate::view::{MixedView, ViewEdge, ViewNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base values the per-item parameters are derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub link_distance: f64,
    pub edge_strength: f64,
    pub node_strength: f64,
    pub node_spacing: f64,
    /// Strength given to degree-0 nodes (negative attracts).
    pub isolate_strength: f64,
    /// Fixed collision size overriding each node's own size.
    pub node_size: Option<f64>,
    /// Collision size for nodes without a usable size.
    pub fallback_node_size: f64,
    pub stable_mass: f64,
    pub default_mass: f64,
    pub min_movement: f64,
    /// Convergence threshold used after a rebuild.
    pub reflow_min_movement: f64,
    pub max_iteration: usize,
    pub damping: f64,
    pub prevent_overlap: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            link_distance: 225.0,
            edge_strength: 50.0,
            node_strength: 200.0,
            node_spacing: 5.0,
            isolate_strength: -10.0,
            node_size: None,
            fallback_node_size: 50.0,
            stable_mass: 5.0,
            default_mass: 1.0,
            min_movement: 0.01,
            reflow_min_movement: 0.0001,
            max_iteration: 5000,
            damping: 0.99,
            prevent_overlap: true,
        }
    }
}

/// Global simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSettings {
    pub min_movement: f64,
    pub max_iteration: usize,
    pub damping: f64,
    pub prevent_overlap: bool,
}

/// Parameters for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTuning {
    pub id: String,
    pub strength: f64,
    pub spacing: f64,
    pub mass: f64,
    pub size: f64,
}

/// Parameters for one edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTuning {
    pub id: String,
    pub distance: f64,
    pub strength: f64,
}

/// Everything the simulation needs for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutTuning {
    pub settings: SimulationSettings,
    pub nodes: Vec<NodeTuning>,
    pub edges: Vec<EdgeTuning>,
}

impl LayoutTuning {
    /// Tuning of node `id`.
    pub fn node(&self, id: &str) -> Option<&NodeTuning> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Tuning of edge `id`.
    pub fn edge(&self, id: &str) -> Option<&EdgeTuning> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Derives simulation parameters from view metadata.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParameterizer<'a> {
    config: &'a LayoutConfig,
    positions: &'a PositionCache,
}

impl<'a> LayoutParameterizer<'a> {
    pub fn new(config: &'a LayoutConfig, positions: &'a PositionCache) -> Self {
        Self { config, positions }
    }

    /// Rest length of an edge between `source` and `target`.
    pub fn link_distance(&self, source: &ViewNode, target: &ViewNode) -> f64 {
        let base = self.config.link_distance;
        match (source.is_aggregated(), target.is_aggregated()) {
            (true, true) => base * 3.0,
            (true, false) | (false, true) => base * 1.5,
            (false, false) => base * 0.3,
        }
    }

    /// Attraction along an edge.
    pub fn edge_strength(&self, source: &ViewNode, target: &ViewNode) -> f64 {
        if source.is_aggregated() && target.is_aggregated() {
            self.config.edge_strength / 2.0
        } else {
            self.config.edge_strength
        }
    }

    /// Repulsion of a node.
    pub fn node_strength(&self, node: &ViewNode) -> f64 {
        if node.degree == 0 {
            self.config.isolate_strength
        } else if node.is_aggregated() {
            self.config.node_strength * 2.0
        } else {
            self.config.node_strength
        }
    }

    /// Minimum gap kept around a node.
    pub fn node_spacing(&self, node: &ViewNode) -> f64 {
        if node.degree == 0 {
            self.config.node_spacing * 2.0
        } else {
            self.config.node_spacing
        }
    }

    pub fn mass(&self, node: &ViewNode) -> f64 {
        if self.positions.contains(&node.id) {
            self.config.stable_mass
        } else {
            self.config.default_mass
        }
    }

    /// Collision size.
    pub fn node_size(&self, node: &ViewNode) -> f64 {
        match self.config.node_size {
            Some(size) => size,
            None if node.style.size > 0.0 => node.style.size,
            None => self.config.fallback_node_size,
        }
    }

    /// Simulation settings; `reflow` selects the tighter threshold used when
    /// a previous layout is being continued.
    pub fn settings(&self, reflow: bool) -> SimulationSettings {
        SimulationSettings {
            min_movement: if reflow {
                self.config.reflow_min_movement
            } else {
                self.config.min_movement
            },
            max_iteration: self.config.max_iteration,
            damping: self.config.damping,
            prevent_overlap: self.config.prevent_overlap,
        }
    }

    /// Parameterize every item of `view`.
    ///
    /// Edges whose endpoints are missing from the view are skipped.
    pub fn tune(&self, view: &MixedView, reflow: bool) -> LayoutTuning {
        let by_id: HashMap<&str, &ViewNode> =
            view.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let nodes = view
            .nodes
            .iter()
            .map(|n| NodeTuning {
                id: n.id.clone(),
                strength: self.node_strength(n),
                spacing: self.node_spacing(n),
                mass: self.mass(n),
                size: self.node_size(n),
            })
            .collect();

        let edges = view
            .edges
            .iter()
            .filter_map(|e: &ViewEdge| {
                let s = by_id.get(e.source.as_str())?;
                let t = by_id.get(e.target.as_str())?;
                Some(EdgeTuning {
                    id: e.id.clone(),
                    distance: self.link_distance(s, t),
                    strength: self.edge_strength(s, t),
                })
            })
            .collect();

        LayoutTuning {
            settings: self.settings(reflow),
            nodes,
            edges,
        }
    }
}
