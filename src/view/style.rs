//! Rendering hints attached to view items.
//!
//! The core does not draw anything; it only decides sizes, label text, widths
//! and edge shapes so every renderer shows the same mixed view the same way.

use super::{MixedView, REAL_LEVEL};
use serde::Serialize;
use std::collections::HashMap;

/// Diameter of a real node.
pub const REAL_NODE_SIZE: f64 = 20.0;
/// Diameter of an aggregated node.
pub const AGGREGATED_NODE_SIZE: f64 = 53.0;
/// Characters kept before a label is truncated.
pub const LABEL_MAX_LENGTH: usize = 5;
/// Suffix appended to truncated labels.
pub const LABEL_ELLIPSIS: &str = "...";
/// Font size of real node labels.
pub const REAL_LABEL_FONT_SIZE: f64 = 12.0;
/// Edge stroke color.
pub const EDGE_STROKE: &str = "#acaeaf";
/// Edge stroke opacity.
pub const EDGE_OPACITY: f64 = 0.2;
/// Edge width range widths are mapped into.
pub const EDGE_WIDTH_RANGE: (f64, f64) = (1.0, 7.0);
/// Loop distance for self-referencing edges.
pub const LOOP_DIST: f64 = 20.0;
/// Offset step between parallel edges.
pub const PARALLEL_OFFSET: f64 = 12.5;

/// Node rendering hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    /// Diameter.
    pub size: f64,
    /// Label as displayed (possibly truncated).
    pub label: String,
    /// Label font size.
    pub label_font_size: f64,
}

impl NodeStyle {
    /// Default hints for a node level.
    pub fn for_level(level: u32) -> Self {
        Self {
            size: if level == REAL_LEVEL {
                REAL_NODE_SIZE
            } else {
                AGGREGATED_NODE_SIZE
            },
            label: String::new(),
            label_font_size: REAL_LABEL_FONT_SIZE,
        }
    }
}

/// Edge geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeShape {
    /// Straight line.
    Line,
    /// Quadratic curve bowed by `curve_offset`.
    Quadratic {
        /// Signed control point offset.
        #[serde(rename = "curveOffset")]
        curve_offset: f64,
    },
    /// Self loop.
    Loop {
        /// Distance of the loop from the node rim.
        dist: f64,
    },
}

/// Edge rendering hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    /// Geometry.
    pub shape: EdgeShape,
    /// Stroke width.
    pub width: f64,
    /// Stroke color.
    pub stroke: String,
    /// Stroke opacity.
    pub opacity: f64,
    /// Dash pattern; `None` draws solid.
    pub dash: Option<[f64; 2]>,
    /// Draw an arrow head at the target.
    pub end_arrow: bool,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            shape: EdgeShape::Line,
            width: EDGE_WIDTH_RANGE.0,
            stroke: EDGE_STROKE.to_string(),
            opacity: EDGE_OPACITY,
            dash: None,
            end_arrow: true,
        }
    }
}

/// Truncate `text` to [`LABEL_MAX_LENGTH`] characters plus an ellipsis.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() > LABEL_MAX_LENGTH {
        let head: String = text.chars().take(LABEL_MAX_LENGTH).collect();
        format!("{head}{LABEL_ELLIPSIS}")
    } else {
        text.to_string()
    }
}

/// Fill in node and edge hints for a composed view.
pub fn apply(view: &mut MixedView) {
    let max_count = view
        .nodes
        .iter()
        .filter_map(|n| n.count)
        .max()
        .unwrap_or(0);
    for node in &mut view.nodes {
        let mut style = NodeStyle::for_level(node.level);
        style.label = truncate_label(&node.label);
        if let (Some(count), true) = (node.count, max_count > 0) {
            style.label_font_size = 6.0 + count as f64 / max_count as f64 * 6.0;
        }
        node.style = style;
    }

    let (min, max) = view.edges.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), e| {
        (lo.min(e.count), hi.max(e.count))
    });
    let range = max - min;
    let (lo_w, hi_w) = EDGE_WIDTH_RANGE;
    for edge in &mut view.edges {
        let width = if range > 0.0 && range.is_finite() {
            (edge.count - min) / range * (hi_w - lo_w) + lo_w
        } else {
            lo_w
        };
        let dash = (!edge.is_real).then(|| {
            let d = width.max(2.0);
            [d, d]
        });
        edge.style = EdgeStyle {
            shape: if edge.is_loop() {
                EdgeShape::Loop { dist: LOOP_DIST }
            } else {
                EdgeShape::Line
            },
            width,
            dash,
            end_arrow: !edge.is_loop(),
            ..EdgeStyle::default()
        };
    }

    bend_parallel_edges(view);
}

/// Spread edges sharing the same endpoint pair onto alternating curves.
///
/// For an odd group the first edge stays straight; reversed edges mirror
/// their offset so opposite directions do not overlap.
fn bend_parallel_edges(view: &mut MixedView) {
    let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (i, edge) in view.edges.iter().enumerate() {
        if edge.is_loop() {
            continue;
        }
        let key = if edge.source <= edge.target {
            (edge.source.clone(), edge.target.clone())
        } else {
            (edge.target.clone(), edge.source.clone())
        };
        groups.entry(key).or_default().push(i);
    }

    for members in groups.values().filter(|m| m.len() > 1) {
        let len = members.len();
        let first_source = view.edges[members[0]].source.clone();
        for (k, &i) in members.iter().enumerate() {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            let mut offset = if len % 2 == 1 {
                sign * k.div_ceil(2) as f64 * PARALLEL_OFFSET
            } else {
                sign * ((k / 2) as f64 * PARALLEL_OFFSET + PARALLEL_OFFSET)
            };
            if view.edges[i].source != first_source {
                offset = -offset;
            }
            view.edges[i].style.shape = EdgeShape::Quadratic {
                curve_offset: offset,
            };
        }
    }
}
