//! Position stabilization across view rebuilds.
//!
//! Before every rebuild the coordinates the simulation reached are recorded;
//! afterwards nodes that survive keep them, and new nodes are dropped near the
//! point the user last interacted with so the layout grows from there instead
//! of from the canvas origin.

use crate::view::{ViewEdge, ViewNode};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Radius of the circle new nodes are scattered on around the interaction point.
pub const SEED_RADIUS: f64 = 30.0;

/// Extra gap between a positioned node's rim and a neighbor placed next to it.
pub const NEIGHBOR_GAP: f64 = 20.0;

/// A point in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// New position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn offset(self, radius: f64, angle: f64) -> Self {
        Self {
            x: self.x + radius * angle.cos(),
            y: self.y + radius * angle.sin(),
        }
    }
}

/// A cached coordinate with the level the node had when it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CachedPosition {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Node level at snapshot time.
    pub level: u32,
}

/// Node coordinates remembered across rebuilds.
#[derive(Debug, Clone)]
pub struct PositionCache {
    entries: HashMap<String, CachedPosition>,
    interaction_point: Option<Position>,
    rng: StdRng,
}

impl PositionCache {
    /// Empty cache; `seed` makes scatter offsets reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            entries: HashMap::new(),
            interaction_point: None,
            rng: match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            },
        }
    }

    /// Record the coordinates of every positioned node.
    ///
    /// Entries are overwritten per id; ids that left the view keep their last
    /// known coordinates.
    pub fn snapshot(&mut self, nodes: &[ViewNode]) {
        for node in nodes {
            if let Some(p) = node.position {
                self.entries.insert(
                    node.id.clone(),
                    CachedPosition {
                        x: p.x,
                        y: p.y,
                        level: node.level,
                    },
                );
            }
        }
    }

    /// Position `nodes` for a freshly composed view.
    pub fn seed(&mut self, nodes: &mut [ViewNode], edges: &[ViewEdge]) {
        for node in nodes.iter_mut() {
            if let Some(cached) = self.entries.get(&node.id) {
                node.position = Some(Position::new(cached.x, cached.y));
            } else if node.position.is_none() {
                if let Some(center) = self.interaction_point {
                    let angle = self.rng.random_range(0.0..TAU);
                    node.position = Some(center.offset(SEED_RADIUS, angle));
                }
            }
        }

        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        for edge in edges {
            let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            let (anchor, loose) = match (nodes[s].position, nodes[t].position) {
                (Some(_), None) => (s, t),
                (None, Some(_)) => (t, s),
                _ => continue,
            };
            let Some(at) = nodes[anchor].position else {
                continue;
            };
            let gap = nodes[anchor].style.size / 2.0 + NEIGHBOR_GAP;
            let angle = self.rng.random_range(0.0..TAU);
            nodes[loose].position = Some(at.offset(gap, angle));
        }
    }

    /// Remember where the user last acted.
    pub fn set_interaction_point(&mut self, point: Option<Position>) {
        if point.is_some() {
            self.interaction_point = point;
        }
    }

    /// Last interaction point.
    pub fn interaction_point(&self) -> Option<Position> {
        self.interaction_point
    }

    /// Cached entry for `id`.
    pub fn get(&self, id: &str) -> Option<&CachedPosition> {
        self.entries.get(id)
    }

    /// Whether `id` has a cached position.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::new(None)
    }
}
