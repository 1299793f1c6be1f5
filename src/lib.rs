//! # tierview
//!
//! Multi-level aggregation for exploring graphs too large to draw in full.
//!
//! A dataset is partitioned into communities once. The rendered *mixed view*
//! shows each community either as a single aggregated node or as its real
//! members, within a node budget: expanding one more community collapses the
//! oldest expansion that is not an ancestor of it. Only when every remaining
//! expansion is protected can the view stay over budget.
//!
//! ```text
//!   Dataset ──> ClusterDetector ──> ClusterPartition
//!                                         │
//!   Command ──> Explorer ──> ExpansionTracker ──> ViewCompositor ──> MixedView
//!                  │                                                    │
//!                  └── NeighborSimulator        PositionCache, LayoutParameterizer
//! ```
//!
//! The crate draws nothing and runs no physics. A rendering collaborator
//! consumes [`MixedView`] and [`LayoutTuning`], implements [`Simulation`],
//! and reports interactions back as [`Command`]s or menu tokens.

pub mod command;
pub mod community;
pub mod config;
/// Error types used across `tierview`.
pub mod error;
pub mod expansion;
pub mod graph;
pub mod layout;
pub mod neighbors;
pub mod palette;
pub mod positions;
pub mod session;
pub mod view;

#[cfg(test)]
mod session_tests;

pub use command::{ActionToken, Command};
pub use community::{ClusterDetector, ClusterPartition, CommunityDetection, Louvain};
pub use config::ExplorerConfig;
pub use error::{Error, Result};
pub use expansion::{CollapseRecord, ExpandRecord, ExpansionTracker};
pub use graph::{Dataset, RawEdge, RawNode};
pub use layout::{LayoutConfig, LayoutParameterizer, LayoutTuning};
pub use neighbors::{NeighborSimulator, NeighborSubgraph};
pub use positions::{Position, PositionCache};
pub use session::{EdgeClickPayload, Explorer, NodeClickPayload, Simulation};
pub use view::{MixedView, ViewCompositor, ViewEdge, ViewNode, Warning};
