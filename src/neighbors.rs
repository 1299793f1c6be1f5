//! Simulated neighbor discovery.
//!
//! There is no backing store to query for the neighbors of a node, so this
//! module *invents* them: each visited node grows a random number of fresh
//! children, level by level, up to the requested depth. The result is a
//! placeholder for exploration UX and never reflects real connectivity.

use crate::graph::{IdAllocator, RawEdge, RawNode};
use rand::prelude::*;

/// Prefix of synthesized node ids.
pub const NEIGHBOR_ID_PREFIX: &str = "nb-";

/// Nodes and edges produced by one simulation, excluding the center.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborSubgraph {
    /// New nodes.
    pub nodes: Vec<RawNode>,
    /// New edges, each touching a new node.
    pub edges: Vec<RawEdge>,
}

/// Generates random neighbor subgraphs.
#[derive(Debug, Clone)]
pub struct NeighborSimulator {
    max_per_node: usize,
    rng: StdRng,
}

impl NeighborSimulator {
    /// Simulator growing at most `max_per_node` children per node (at least 1).
    pub fn new(max_per_node: usize, seed: Option<u64>) -> Self {
        Self {
            max_per_node: max_per_node.max(1),
            rng: match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            },
        }
    }

    /// Maximum children per node.
    pub fn max_per_node(&self) -> usize {
        self.max_per_node
    }

    /// Grow `steps` levels of neighbors around `center_id`.
    ///
    /// Returns `None` when `steps == 0`. Node and edge ids come from `ids`, so
    /// they never collide with anything the allocator already handed out.
    pub fn simulate(
        &mut self,
        center_id: &str,
        steps: usize,
        ids: &mut IdAllocator,
    ) -> Option<NeighborSubgraph> {
        if steps == 0 {
            return None;
        }
        let mut out = NeighborSubgraph::default();
        let mut frontier = vec![center_id.to_string()];
        for _ in 0..steps {
            let mut next = Vec::new();
            for parent in &frontier {
                let children = self.rng.random_range(1..=self.max_per_node);
                for _ in 0..children {
                    let child = ids.fresh(NEIGHBOR_ID_PREFIX);
                    let (source, target) = if self.rng.random_bool(0.5) {
                        (parent.clone(), child.clone())
                    } else {
                        (child.clone(), parent.clone())
                    };
                    let label = format!("{source}-{target}");
                    out.edges.push(RawEdge {
                        id: Some(ids.fresh(crate::graph::EDGE_ID_PREFIX)),
                        source,
                        target,
                        label: Some(label),
                        weight: None,
                    });
                    out.nodes.push(RawNode::new(child.clone()));
                    next.push(child);
                }
            }
            frontier = next;
        }
        tracing::debug!(
            center = %center_id,
            steps,
            nodes = out.nodes.len(),
            "simulated neighbor subgraph"
        );
        Some(out)
    }
}
