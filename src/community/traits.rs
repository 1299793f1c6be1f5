//! Community detection traits.

use petgraph::graph::UnGraph;

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a weighted graph.
    ///
    /// Returns a mapping from node index to community ID. Community IDs are
    /// consecutive and numbered in order of first appearance, so node 0 is
    /// always in community 0. An empty graph yields an empty mapping.
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Vec<usize>;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}

/// Renumber labels to consecutive integers in order of first appearance.
pub(crate) fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut seen = std::collections::HashMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = seen.len();
            *seen.entry(l).or_insert(next)
        })
        .collect()
}
