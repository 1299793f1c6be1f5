//! Community detection and the cluster partition built from it.
//!
//! Given the raw dataset, find groups of nodes that are densely connected to
//! each other and sparsely connected to the rest. Each group becomes a
//! [`Cluster`] that the view layer can show either as one aggregated node or
//! as its real members.
//!
//! ## The Modularity Objective
//!
//! Louvain optimizes **modularity** Q, which compares the weight of edges
//! inside communities with the weight expected in a random graph with the same
//! degree sequence:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where m is the total edge weight, A_ij the weight between i and j, k_i the
//! weighted degree of i and γ the resolution. Raising γ yields smaller
//! communities.
//!
//! ## Usage
//!
//! ```rust
//! use tierview::community::{ClusterDetector, Louvain};
//! use tierview::graph::Dataset;
//!
//! let mut data = Dataset::from_pairs(
//!     ["a", "b", "c", "d"],
//!     [("a", "b"), ("c", "d")],
//! );
//! let _ = data.normalize();
//! let partition = ClusterDetector::new(Louvain::new()).detect(&data);
//! assert_eq!(partition.len(), 2);
//! ```

mod louvain;
mod partition;
mod traits;

pub use louvain::Louvain;
pub use partition::{Cluster, ClusterDetector, ClusterEdge, ClusterPartition, CLUSTER_ID_PREFIX};
pub use traits::CommunityDetection;
