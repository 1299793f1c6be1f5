//! The exploration session.
//!
//! [`Explorer`] owns the dataset, its cluster partition and every piece of
//! interaction state. Each action runs to completion: it updates the
//! expansion records (or the dataset, for neighbor simulation), recomposes
//! the mixed view, restores positions and hands the result to the attached
//! [`Simulation`].
//!
//! ```rust
//! use tierview::{Command, Dataset, Explorer, ExplorerConfig};
//!
//! let data = Dataset::from_pairs(
//!     ["a", "b", "c", "x", "y", "z"],
//!     [("a", "b"), ("b", "c"), ("c", "a"), ("x", "y"), ("y", "z"), ("z", "x")],
//! );
//! let config = ExplorerConfig { seed: Some(1), ..Default::default() };
//! let mut explorer = Explorer::from_dataset(config, data).unwrap();
//! assert_eq!(explorer.view().nodes.len(), 2);
//!
//! let cluster = explorer.partition().clusters()[0].id.clone();
//! let view = explorer.dispatch(Command::Expand { node_id: cluster }).unwrap();
//! assert_eq!(view.nodes.len(), 4);
//! ```

use crate::command::{Command, DEFAULT_RECOLOR};
use crate::community::{ClusterDetector, ClusterPartition, Louvain};
use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::expansion::{ExpandRecord, ExpansionTracker};
use crate::graph::{Dataset, IdAllocator};
use crate::layout::{LayoutParameterizer, LayoutTuning};
use crate::neighbors::NeighborSimulator;
use crate::positions::{Position, PositionCache};
use crate::view::{style, MixedView, ViewCompositor, CLUSTER_LEVEL};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// The force simulation driven by the rendering side.
pub trait Simulation {
    /// Halt the running simulation. Best effort: a tick in flight may still
    /// land.
    fn stop(&mut self);

    /// Start simulating `view` with `tuning`.
    fn start(&mut self, view: &MixedView, tuning: &LayoutTuning);
}

/// Emitted when a node is clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeClickPayload {
    /// Clicked node id.
    pub id: String,
}

/// Emitted when an edge is clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeClickPayload {
    /// Clicked edge id.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Edge label, `"<source>-<target>"` unless the dataset set one.
    pub label: String,
}

#[derive(Debug, Clone, Default)]
struct NodeOverride {
    fill: String,
    stroke: String,
}

#[derive(Debug, Clone, Default)]
struct EdgeOverride {
    endpoints: Option<(String, String)>,
    stroke: Option<String>,
}

/// Interactive exploration state over one dataset.
pub struct Explorer {
    config: ExplorerConfig,
    detector: ClusterDetector<Louvain>,
    dataset: Dataset,
    partition: ClusterPartition,
    ids: IdAllocator,
    tracker: ExpansionTracker,
    positions: PositionCache,
    neighbors: NeighborSimulator,
    view: MixedView,
    hidden: HashSet<String>,
    node_overrides: HashMap<String, NodeOverride>,
    edge_overrides: HashMap<String, EdgeOverride>,
    simulation: Option<Box<dyn Simulation>>,
    rebuilds: usize,
}

impl Explorer {
    /// Session with no data.
    pub fn new(config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        let mut louvain = Louvain::new().with_resolution(config.resolution);
        if let Some(seed) = config.seed {
            louvain = louvain.with_seed(seed);
        }
        let detector = ClusterDetector::new(louvain).with_palette(config.build_palette());
        Ok(Self {
            detector,
            dataset: Dataset::default(),
            partition: ClusterPartition::default(),
            ids: IdAllocator::default(),
            tracker: ExpansionTracker::new(config.node_budget),
            positions: PositionCache::new(config.seed),
            neighbors: NeighborSimulator::new(config.neighbor_fanout, config.seed),
            view: MixedView::default(),
            hidden: HashSet::new(),
            node_overrides: HashMap::new(),
            edge_overrides: HashMap::new(),
            simulation: None,
            rebuilds: 0,
            config,
        })
    }

    /// Session over `dataset`.
    pub fn from_dataset(config: ExplorerConfig, dataset: Dataset) -> Result<Self> {
        let mut explorer = Self::new(config)?;
        explorer.set_dataset(dataset);
        Ok(explorer)
    }

    /// Replace the dataset.
    ///
    /// Clusters are recomputed; expansions, hidden items and overrides are
    /// dropped. Cached positions are kept.
    pub fn set_dataset(&mut self, mut dataset: Dataset) -> &MixedView {
        self.ids = dataset.normalize();
        self.partition = self.detector.detect(&dataset);
        for cluster in self.partition.clusters() {
            self.ids.reserve(&cluster.id);
        }
        self.dataset = dataset;
        self.tracker.clear();
        self.hidden.clear();
        self.node_overrides.clear();
        self.edge_overrides.clear();
        self.refresh(None);
        &self.view
    }

    /// Register the simulation started after every rebuild.
    pub fn attach_simulation(&mut self, simulation: Box<dyn Simulation>) {
        self.simulation = Some(simulation);
    }

    /// Remove the simulation, returning it.
    pub fn detach_simulation(&mut self) -> Option<Box<dyn Simulation>> {
        self.simulation.take()
    }

    /// Active configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// The dataset, including simulated neighbors.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Cluster partition of the dataset.
    pub fn partition(&self) -> &ClusterPartition {
        &self.partition
    }

    /// Expand and collapse records.
    pub fn tracker(&self) -> &ExpansionTracker {
        &self.tracker
    }

    /// Positions cached from earlier views.
    pub fn positions(&self) -> &PositionCache {
        &self.positions
    }

    /// The current mixed view.
    pub fn view(&self) -> &MixedView {
        &self.view
    }

    /// Feed back coordinates reached by the simulation.
    ///
    /// Unknown ids are ignored.
    pub fn sync_positions<I, S>(&mut self, positions: I)
    where
        I: IntoIterator<Item = (S, Position)>,
        S: AsRef<str>,
    {
        for (id, p) in positions {
            if let Some(node) = self.view.node_mut(id.as_ref()) {
                node.position = Some(p);
            }
        }
    }

    /// Remember where the user acted last; new nodes appear around it.
    pub fn set_interaction_point(&mut self, point: Position) {
        self.positions.set_interaction_point(Some(point));
    }

    /// Simulation tuning for the current view.
    pub fn layout_tuning(&self) -> LayoutTuning {
        LayoutParameterizer::new(&self.config.layout, &self.positions)
            .tune(&self.view, self.rebuilds > 1)
    }

    /// Run a command; `None` means the view did not change.
    pub fn dispatch(&mut self, command: Command) -> Option<MixedView> {
        let changed = match command {
            Command::Expand { node_id } => self.expand(&node_id),
            Command::Collapse { node_id } => self.collapse(&node_id),
            Command::CollapseAll => self.collapse_all(),
            Command::Hide { item_id } => self.hide(&item_id),
            Command::Show => self.show_all(),
            Command::Neighbors { node_id, steps } => self.expand_neighbors(&node_id, steps),
            Command::ChangeNodeColor {
                node_id,
                fill,
                stroke,
            } => self.change_node_color(&node_id, fill, stroke),
            Command::ChangeEdgeColor {
                edge_id,
                source,
                target,
                stroke,
            } => {
                let endpoints = match (source, target) {
                    (Some(s), Some(t)) => Some((s, t)),
                    (None, None) => None,
                    (s, t) => {
                        tracing::warn!(
                            edge = %edge_id,
                            source = ?s,
                            target = ?t,
                            "rewiring needs both endpoints; keeping the current ones"
                        );
                        None
                    }
                };
                self.change_edge(&edge_id, endpoints, stroke)
            }
        };
        changed.then(|| self.view.clone())
    }

    /// Parse a menu token fired on `item` and run it.
    pub fn dispatch_token(&mut self, token: &str, item: Option<&str>) -> Result<Option<MixedView>> {
        let command = Command::from_token(token, item)?;
        Ok(self.dispatch(command))
    }

    /// Expand aggregated node `node_id` into its members.
    ///
    /// Older expansions are collapsed while the view is over budget. Refused
    /// only when the cluster alone has more members than the budget.
    pub fn expand(&mut self, node_id: &str) -> bool {
        let Some(node) = self.view.node(node_id) else {
            return false;
        };
        let Some(cluster) = self.partition.cluster(node_id) else {
            tracing::debug!(node = %node_id, "only aggregated nodes can be expanded");
            return false;
        };
        if self.tracker.is_expanded(node_id) {
            return false;
        }

        if cluster.members.len() > self.tracker.node_budget() {
            tracing::warn!(
                cluster = %node_id,
                members = cluster.members.len(),
                budget = self.tracker.node_budget(),
                "cluster has more members than the node budget"
            );
            return false;
        }

        let mut record = ExpandRecord::new(node_id, node.level);
        if let Some(parent) = &node.parent_id {
            record = record.with_parent(parent.clone());
        }
        let displayed = self.view.nodes.len() - 1 + cluster.members.len();
        self.positions.set_interaction_point(node.position);

        if let Some(evicted) = self.tracker.request_expand(record.clone(), displayed) {
            tracing::debug!(evicted = %evicted.id, "collapsed to make room");
        }
        self.refresh(Some(&record));
        true
    }

    /// Collapse the cluster named by `node_id`: a cluster id, or any node in
    /// the view that belongs to a cluster.
    pub fn collapse(&mut self, node_id: &str) -> bool {
        let node = self.view.node(node_id);
        let cluster_id = match self.partition.cluster(node_id) {
            Some(cluster) => cluster.id.clone(),
            None => match node.and_then(|n| n.cluster_id.clone()) {
                Some(id) => id,
                None => return false,
            },
        };
        let record = ExpandRecord::new(cluster_id.as_str(), CLUSTER_LEVEL);
        let point = self
            .positions
            .get(&cluster_id)
            .map(|c| Position::new(c.x, c.y))
            .or(node.and_then(|n| n.position));
        if !self.tracker.request_collapse(&record) {
            return false;
        }
        self.positions.set_interaction_point(point);
        self.refresh(None);
        true
    }

    /// Collapse every cluster.
    pub fn collapse_all(&mut self) -> bool {
        if self.tracker.expanded().is_empty() {
            return false;
        }
        self.tracker.clear();
        self.refresh(None);
        true
    }

    /// Hide a node (with its edges) or an edge.
    pub fn hide(&mut self, item_id: &str) -> bool {
        let known = self.view.node(item_id).is_some() || self.view.edge(item_id).is_some();
        if !known || !self.hidden.insert(item_id.to_string()) {
            return false;
        }
        apply_hidden(&mut self.view, &self.hidden);
        true
    }

    /// Unhide every hidden item.
    pub fn show_all(&mut self) -> bool {
        if self.hidden.is_empty() {
            return false;
        }
        self.hidden.clear();
        apply_hidden(&mut self.view, &self.hidden);
        true
    }

    /// Grow simulated neighbors `steps` levels deep around real node
    /// `node_id` and add them to its cluster.
    pub fn expand_neighbors(&mut self, node_id: &str, steps: usize) -> bool {
        let Some(node) = self.view.node(node_id) else {
            return false;
        };
        if !node.is_real() {
            tracing::debug!(node = %node_id, "neighbors can only be found for real nodes");
            return false;
        }
        let Some(cluster_id) = node.cluster_id.clone() else {
            return false;
        };
        let point = node.position;
        let Some(subgraph) = self.neighbors.simulate(node_id, steps, &mut self.ids) else {
            return false;
        };

        self.dataset.merge(&subgraph.nodes, &subgraph.edges);
        self.partition
            .attach(&cluster_id, &subgraph.nodes, subgraph.edges.len());
        self.positions.set_interaction_point(point);

        let record = ExpandRecord::new(cluster_id.as_str(), CLUSTER_LEVEL);
        self.refresh(Some(&record));
        true
    }

    /// Override the fill and stroke of node `node_id`.
    pub fn change_node_color(
        &mut self,
        node_id: &str,
        fill: Option<String>,
        stroke: Option<String>,
    ) -> bool {
        if self.view.node(node_id).is_none() {
            return false;
        }
        self.node_overrides.insert(
            node_id.to_string(),
            NodeOverride {
                fill: fill.unwrap_or_else(|| DEFAULT_RECOLOR.to_string()),
                stroke: stroke.unwrap_or_else(|| DEFAULT_RECOLOR.to_string()),
            },
        );
        apply_node_overrides(&mut self.view, &self.node_overrides);
        true
    }

    /// Reconnect edge `edge_id` to `endpoints` and/or set its stroke.
    ///
    /// Endpoints outside the current view are ignored.
    pub fn change_edge(
        &mut self,
        edge_id: &str,
        endpoints: Option<(String, String)>,
        stroke: Option<String>,
    ) -> bool {
        if self.view.edge(edge_id).is_none() {
            return false;
        }
        let endpoints = endpoints.filter(|(s, t)| {
            let ok = self.view.node(s).is_some() && self.view.node(t).is_some();
            if !ok {
                tracing::warn!(edge = %edge_id, source = %s, target = %t, "rewire target not in view");
            }
            ok
        });
        let entry = self.edge_overrides.entry(edge_id.to_string()).or_default();
        if endpoints.is_some() {
            entry.endpoints = endpoints;
        }
        entry.stroke = Some(stroke.unwrap_or_else(|| DEFAULT_RECOLOR.to_string()));
        self.refresh(None);
        true
    }

    /// Payload for a click on node `id`.
    pub fn node_click(&self, id: &str) -> Option<NodeClickPayload> {
        self.view
            .node(id)
            .map(|n| NodeClickPayload { id: n.id.clone() })
    }

    /// Payload for a click on edge `id`.
    pub fn edge_click(&self, id: &str) -> Option<EdgeClickPayload> {
        self.view.edge(id).map(|e| EdgeClickPayload {
            id: e.id.clone(),
            source: e.source.clone(),
            target: e.target.clone(),
            label: e.label.clone(),
        })
    }

    fn compose(&self) -> MixedView {
        ViewCompositor::new(&self.dataset, &self.partition).compose(&self.tracker.expanded_ids())
    }

    /// Stop, recompose (evicting on behalf of `protect` while over budget),
    /// restore positions, start.
    fn refresh(&mut self, protect: Option<&ExpandRecord>) {
        if let Some(sim) = self.simulation.as_mut() {
            sim.stop();
        }
        self.positions.snapshot(&self.view.nodes);

        let mut view = self.compose();
        if let Some(record) = protect {
            while view.nodes.len() > self.tracker.node_budget() {
                if self.tracker.evict_for(record).is_none() {
                    break;
                }
                view = self.compose();
            }
            if view.nodes.len() > self.tracker.node_budget() {
                tracing::warn!(
                    requested = %record.id,
                    nodes = view.nodes.len(),
                    budget = self.tracker.node_budget(),
                    "view stays over the node budget; nothing left to collapse"
                );
            }
        }

        self.decorate(&mut view);
        self.positions.seed(&mut view.nodes, &view.edges);
        self.view = view;
        self.rebuilds += 1;
        tracing::debug!(
            nodes = self.view.nodes.len(),
            edges = self.view.edges.len(),
            expanded = self.tracker.expanded().len(),
            "view rebuilt"
        );

        let tuning = self.layout_tuning();
        if let Some(sim) = self.simulation.as_mut() {
            sim.start(&self.view, &tuning);
        }
    }

    /// Reapply user overrides to a freshly composed view.
    fn decorate(&self, view: &mut MixedView) {
        let mut rewired = false;
        for (id, o) in &self.edge_overrides {
            let Some((s, t)) = &o.endpoints else {
                continue;
            };
            if view.node(s).is_none() || view.node(t).is_none() {
                continue;
            }
            if let Some(edge) = view.edge_mut(id) {
                edge.source = s.clone();
                edge.target = t.clone();
                rewired = true;
            }
        }
        if rewired {
            view.recompute_degrees();
            style::apply(view);
        }
        for (id, o) in &self.edge_overrides {
            if let (Some(edge), Some(stroke)) = (view.edge_mut(id), &o.stroke) {
                edge.style.stroke = stroke.clone();
            }
        }
        apply_node_overrides(view, &self.node_overrides);
        apply_hidden(view, &self.hidden);
    }
}

fn apply_node_overrides(view: &mut MixedView, overrides: &HashMap<String, NodeOverride>) {
    for node in &mut view.nodes {
        if let Some(o) = overrides.get(&node.id) {
            node.color.main_fill = o.fill.clone();
            node.color.main_stroke = o.stroke.clone();
        }
    }
}

fn apply_hidden(view: &mut MixedView, hidden: &HashSet<String>) {
    for node in &mut view.nodes {
        node.hidden = hidden.contains(&node.id);
    }
    for edge in &mut view.edges {
        edge.hidden = hidden.contains(&edge.id)
            || hidden.contains(&edge.source)
            || hidden.contains(&edge.target);
    }
}
