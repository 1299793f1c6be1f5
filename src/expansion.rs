//! Expand/collapse bookkeeping under a node budget.
//!
//! The tracker keeps two ordered lists: what the user expanded and what was
//! collapsed since. When an expansion pushes the displayed node count past the
//! budget, the oldest expansion that is not an ancestor of the new one is
//! evicted.
//!
//! ```text
//!   expanded: [g (lvl 2)] [k (lvl 1, parent g)] [z (lvl 1)]
//!   request:  w (lvl 1, parent z), displayed > budget
//!
//!   protected = {w, z}         (ancestor walk from w)
//!   candidate = g              (first unprotected)
//!   g is level 2 -> evict its expanded child k instead
//! ```

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Separator between id segments of nested aggregates.
pub const ID_SEGMENT_SEPARATOR: char = '-';

/// A recorded expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRecord {
    /// Id of the expanded aggregate.
    pub id: String,
    /// Level of the expanded aggregate.
    pub level: u32,
    /// Aggregate it was itself expanded from.
    pub parent_id: Option<String>,
}

impl ExpandRecord {
    /// Record for a top-level aggregate.
    pub fn new(id: impl Into<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            level,
            parent_id: None,
        }
    }

    /// Set the parent aggregate.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// A recorded collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapseRecord {
    /// Id of the collapsed aggregate.
    pub id: String,
    /// Level it collapses to.
    pub level: u32,
    /// Aggregate the collapse originated from.
    pub parent_id: Option<String>,
}

impl From<ExpandRecord> for CollapseRecord {
    fn from(r: ExpandRecord) -> Self {
        Self {
            id: r.id,
            level: r.level,
            parent_id: r.parent_id,
        }
    }
}

/// Drop the last `-`-separated segment of `id`.
///
/// An id without a separator is returned whole.
pub fn truncate_segment(id: &str) -> &str {
    id.rsplit_once(ID_SEGMENT_SEPARATOR)
        .map_or(id, |(head, _)| head)
}

/// Ordered expand and collapse records plus the node budget.
#[derive(Debug, Clone)]
pub struct ExpansionTracker {
    expanded: Vec<ExpandRecord>,
    collapsed: Vec<CollapseRecord>,
    node_budget: usize,
}

impl ExpansionTracker {
    /// Empty tracker with the given budget.
    pub fn new(node_budget: usize) -> Self {
        Self {
            expanded: Vec::new(),
            collapsed: Vec::new(),
            node_budget,
        }
    }

    /// Maximum number of displayed nodes.
    pub fn node_budget(&self) -> usize {
        self.node_budget
    }

    /// Current expansions, oldest first.
    pub fn expanded(&self) -> &[ExpandRecord] {
        &self.expanded
    }

    /// Collapse history, oldest first.
    pub fn collapsed(&self) -> &[CollapseRecord] {
        &self.collapsed
    }

    /// Whether `id` is currently expanded.
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.iter().any(|r| r.id == id)
    }

    /// Ids of every current expansion.
    pub fn expanded_ids(&self) -> HashSet<String> {
        self.expanded.iter().map(|r| r.id.clone()).collect()
    }

    /// Record an expansion that would display `displayed` nodes.
    ///
    /// Over budget, one unprotected expansion is evicted first and returned.
    /// Re-expanding an expanded id changes nothing.
    pub fn request_expand(&mut self, record: ExpandRecord, displayed: usize) -> Option<ExpandRecord> {
        if self.is_expanded(&record.id) {
            return None;
        }
        let evicted = if displayed > self.node_budget {
            self.evict_for(&record)
        } else {
            None
        };
        self.expanded.push(record);
        evicted
    }

    /// Evict one expansion that is neither `record` nor one of its ancestors.
    ///
    /// Returns the evicted record, or `None` when everything is protected.
    pub fn evict_for(&mut self, record: &ExpandRecord) -> Option<ExpandRecord> {
        let protected = self.ancestors(record);
        let candidate = self
            .expanded
            .iter()
            .position(|r| !protected.contains(&r.id))?;

        let victim = if self.expanded[candidate].level == 2 {
            let parent = self.expanded[candidate].id.clone();
            self.expanded
                .iter()
                .position(|r| {
                    r.level == 1
                        && r.parent_id.as_deref() == Some(parent.as_str())
                        && !protected.contains(&r.id)
                })
                .unwrap_or(candidate)
        } else {
            candidate
        };

        let evicted = self.expanded.remove(victim);
        self.collapsed.push(CollapseRecord {
            id: truncate_segment(&evicted.id).to_string(),
            level: evicted.level.saturating_sub(1),
            parent_id: Some(evicted.id.clone()),
        });
        tracing::debug!(
            evicted = %evicted.id,
            level = evicted.level,
            requested = %record.id,
            "node budget exceeded; evicted expansion"
        );
        Some(evicted)
    }

    /// Ids of `record` and every ancestor reachable through expanded
    /// records' parent pointers.
    fn ancestors(&self, record: &ExpandRecord) -> HashSet<String> {
        let index: HashMap<&str, usize> = self
            .expanded
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let mut protected = HashSet::new();
        protected.insert(record.id.clone());
        let mut current = record.parent_id.as_deref();
        while let Some(id) = current {
            // a repeated id means the parent chain loops
            if !protected.insert(id.to_string()) {
                break;
            }
            current = index
                .get(id)
                .and_then(|&i| self.expanded[i].parent_id.as_deref());
        }
        protected
    }

    /// Collapse `record`'s id.
    ///
    /// Returns `false`, recording nothing, when it is not expanded.
    pub fn request_collapse(&mut self, record: &ExpandRecord) -> bool {
        let Some(i) = self.expanded.iter().position(|r| r.id == record.id) else {
            return false;
        };
        let removed = self.expanded.remove(i);
        self.collapsed.push(removed.into());
        true
    }

    /// Forget every expansion and collapse.
    pub fn clear(&mut self) {
        self.expanded.clear();
        self.collapsed.clear();
    }
}
