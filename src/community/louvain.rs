//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Repeatedly move nodes to the neighboring community with the highest
//!    modularity gain until no move improves it.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities;
//!    internal edges become self-loops.
//!
//! 3. **Iterate** on the meta-graph until modularity stops improving.
//!
//! Edge weights are taken from the graph. Ties between equally good moves are
//! broken by community index, and the node visiting order is shuffled only
//! when a seed is set, so two runs with the same seed agree. Callers should
//! still not rely on a particular partition of symmetric graphs.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::traits::{renumber, CommunityDetection};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::HashMap;

type WeightedEdges = Vec<(usize, usize, f64)>;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum iterations per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
    /// Seed for shuffling the visiting order.
    seed: Option<u64>,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
            seed: None,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum iterations per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    /// Shuffle the node visiting order with this seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Modularity of `communities` on `graph` at this detector's resolution.
    pub fn modularity<N>(&self, graph: &UnGraph<N, f64>, communities: &[usize]) -> f64 {
        let (edges, self_loops) = weighted_edges(graph);
        self.modularity_weighted(graph.node_count(), &edges, &self_loops, communities)
    }

    fn modularity_weighted(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> f64 {
        let m = total_weight(edges, self_loops);
        if m == 0.0 {
            return 0.0;
        }
        let degrees = weighted_degrees(n, edges, self_loops);

        // Σ_in and Σ_tot per community give Q in one pass.
        let mut inner: HashMap<usize, f64> = HashMap::new();
        let mut totals: HashMap<usize, f64> = HashMap::new();
        for &(i, j, w) in edges {
            if communities[i] == communities[j] {
                *inner.entry(communities[i]).or_insert(0.0) += w;
            }
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            *inner.entry(communities[i]).or_insert(0.0) += sl;
        }
        for (i, &d) in degrees.iter().enumerate() {
            *totals.entry(communities[i]).or_insert(0.0) += d;
        }

        totals
            .iter()
            .map(|(c, &tot)| {
                let inside = inner.get(c).copied().unwrap_or(0.0);
                inside / m - self.resolution * (tot / (2.0 * m)).powi(2)
            })
            .sum()
    }

    /// Phase 1: local moving. Returns (communities, improved).
    fn local_moving(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        rng: &mut Option<StdRng>,
    ) -> (Vec<usize>, bool) {
        let mut adj: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        for &(i, j, w) in edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }

        let m = total_weight(edges, self_loops);
        if m == 0.0 {
            return ((0..n).collect(), false);
        }
        let degrees = weighted_degrees(n, edges, self_loops);

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut any_improved = false;

        let mut order: Vec<usize> = (0..n).collect();
        if let Some(rng) = rng.as_mut() {
            order.shuffle(rng);
        }

        for _iter in 0..self.max_iter {
            let mut improved = false;

            for &node in &order {
                let current = communities[node];
                let ki = degrees[node];

                // Take the node out of its community before scoring.
                community_degrees[current] -= ki;

                let mut community_weights: HashMap<usize, f64> = HashMap::new();
                for (&neighbor, &w) in &adj[node] {
                    *community_weights.entry(communities[neighbor]).or_insert(0.0) += w;
                }
                let mut candidates: Vec<(usize, f64)> = community_weights.into_iter().collect();
                candidates.sort_unstable_by_key(|&(c, _)| c);

                let gain_of = |comm: usize, ki_in: f64| {
                    ki_in / m - self.resolution * community_degrees[comm] * ki / (2.0 * m * m)
                };
                let stay_in = candidates
                    .iter()
                    .find(|&&(c, _)| c == current)
                    .map_or(0.0, |&(_, w)| w);
                let mut best = current;
                let mut best_gain = gain_of(current, stay_in);

                for &(comm, ki_in) in &candidates {
                    let gain = gain_of(comm, ki_in);
                    if gain > best_gain + f64::EPSILON {
                        best_gain = gain;
                        best = comm;
                    }
                }

                community_degrees[best] += ki;
                if best != current {
                    communities[node] = best;
                    improved = true;
                    any_improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }

    /// Phase 2: aggregate graph based on communities.
    /// Returns (new_edges, new_self_loops, new_to_old mapping).
    fn aggregate(
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> (WeightedEdges, Vec<f64>, Vec<Vec<usize>>) {
        let dense = renumber(communities);
        let n_new = dense.iter().copied().max().map_or(0, |c| c + 1);

        let mut new_to_old: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for (node, &comm) in dense.iter().enumerate() {
            new_to_old[comm].push(node);
        }

        let mut new_self_loops = vec![0.0; n_new];
        for (i, &sl) in self_loops.iter().enumerate() {
            new_self_loops[dense[i]] += sl;
        }

        let mut new_edge_weights: HashMap<(usize, usize), f64> = HashMap::new();
        for &(i, j, w) in edges {
            let (ci, cj) = (dense[i], dense[j]);
            if ci == cj {
                new_self_loops[ci] += w;
                continue;
            }
            let key = if ci < cj { (ci, cj) } else { (cj, ci) };
            *new_edge_weights.entry(key).or_insert(0.0) += w;
        }

        let mut new_edges: WeightedEdges = new_edge_weights
            .into_iter()
            .map(|((i, j), w)| (i, j, w))
            .collect();
        new_edges.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        (new_edges, new_self_loops, new_to_old)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Vec<usize> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }

        let (edges, self_loops) = weighted_edges(graph);
        if edges.is_empty() {
            // Only isolates (and self-loops): each node is its own community.
            return (0..n).collect();
        }

        let mut rng = self.seed.map(StdRng::seed_from_u64);

        let mut current_n = n;
        let mut current_edges = edges;
        let mut current_self_loops = self_loops;

        // membership[i] = aggregated node that original node i currently lives in
        let mut membership: Vec<usize> = (0..n).collect();
        let mut prev_modularity = f64::NEG_INFINITY;

        for _level in 0..self.max_levels {
            let (partition, improved) =
                self.local_moving(current_n, &current_edges, &current_self_loops, &mut rng);
            if !improved {
                break;
            }

            let mod_now = self.modularity_weighted(
                current_n,
                &current_edges,
                &current_self_loops,
                &partition,
            );
            if mod_now - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = mod_now;

            let (new_edges, new_self_loops, node_mapping) =
                Self::aggregate(&current_edges, &current_self_loops, &partition);
            if node_mapping.len() == current_n {
                break;
            }

            let mut old_to_new = vec![0; current_n];
            for (new, olds) in node_mapping.iter().enumerate() {
                for &old in olds {
                    old_to_new[old] = new;
                }
            }
            for slot in &mut membership {
                *slot = old_to_new[*slot];
            }

            current_n = node_mapping.len();
            current_edges = new_edges;
            current_self_loops = new_self_loops;
        }

        renumber(&membership)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

/// Undirected edge list with `i < j`, plus per-node self-loop weight.
fn weighted_edges<N>(graph: &UnGraph<N, f64>) -> (WeightedEdges, Vec<f64>) {
    let mut edges = Vec::with_capacity(graph.edge_count());
    let mut self_loops = vec![0.0; graph.node_count()];
    for edge in graph.edge_references() {
        let i = edge.source().index();
        let j = edge.target().index();
        let w = *edge.weight();
        if i == j {
            self_loops[i] += w;
        } else {
            edges.push((i.min(j), i.max(j), w));
        }
    }
    (edges, self_loops)
}

fn total_weight(edges: &[(usize, usize, f64)], self_loops: &[f64]) -> f64 {
    edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>()
}

fn weighted_degrees(n: usize, edges: &[(usize, usize, f64)], self_loops: &[f64]) -> Vec<f64> {
    let mut degrees = vec![0.0; n];
    for &(i, j, w) in edges {
        degrees[i] += w;
        degrees[j] += w;
    }
    for (i, &sl) in self_loops.iter().enumerate() {
        // self-loops count twice toward degree
        degrees[i] += 2.0 * sl;
    }
    degrees
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles(bridge_weight: f64) -> UnGraph<(), f64> {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
        for &(a, b) in &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
            let _ = graph.add_edge(n[a], n[b], 1.0);
        }
        let _ = graph.add_edge(n[2], n[3], bridge_weight);
        graph
    }

    #[test]
    fn test_louvain_triangle() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());
        let _ = graph.add_edge(n0, n1, 1.0);
        let _ = graph.add_edge(n1, n2, 1.0);
        let _ = graph.add_edge(n0, n2, 1.0);

        let communities = Louvain::new().detect(&graph);
        assert_eq!(communities, vec![0, 0, 0]);
    }

    #[test]
    fn test_louvain_two_cliques() {
        let graph = two_triangles(1.0);
        let communities = Louvain::new().detect(&graph);

        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
        // first-appearance numbering
        assert_eq!(communities[0], 0);
    }

    #[test]
    fn test_louvain_heavy_bridge_merges() {
        // A bridge heavier than both triangles together pulls them into one.
        let graph = two_triangles(50.0);
        let communities = Louvain::new().detect(&graph);
        assert_eq!(communities[2], communities[3]);
    }

    #[test]
    fn test_louvain_empty_graph_is_empty_partition() {
        let graph = UnGraph::<(), f64>::new_undirected();
        assert!(Louvain::new().detect(&graph).is_empty());
    }

    #[test]
    fn test_louvain_disconnected() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let _ = graph.add_node(());
        let _ = graph.add_node(());

        let communities = Louvain::new().detect(&graph);
        assert_eq!(communities, vec![0, 1]);
    }

    #[test]
    fn test_louvain_seeded_runs_agree() {
        let graph = two_triangles(1.0);
        let a = Louvain::new().with_seed(7).detect(&graph);
        let b = Louvain::new().with_seed(7).detect(&graph);
        assert_eq!(a, b);
    }

    #[test]
    fn test_modularity_prefers_split_cliques() {
        let graph = two_triangles(1.0);
        let louvain = Louvain::new();
        let split = louvain.modularity(&graph, &[0, 0, 0, 1, 1, 1]);
        let merged = louvain.modularity(&graph, &[0; 6]);
        assert!(split > merged);
        assert!(merged.abs() < 1e-12);
    }
}
