//! User actions.
//!
//! Interaction layers send either a [`Command`] directly or one of the menu
//! action tokens (`expand`, `neighbor-2`, ...) together with the id of the
//! item the menu was opened on.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fill and stroke applied by a recolor without explicit colors.
pub const DEFAULT_RECOLOR: &str = "#fff";

/// An action on the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Expand an aggregated node into its members.
    Expand { node_id: String },
    /// Collapse the cluster a node belongs to (or the aggregated node itself).
    Collapse { node_id: String },
    /// Collapse everything and forget the expansion history.
    CollapseAll,
    /// Hide a node or an edge.
    Hide { item_id: String },
    /// Unhide everything.
    Show,
    /// Grow simulated neighbors `steps` levels deep around a real node.
    Neighbors { node_id: String, steps: usize },
    /// Override the fill and stroke of a node.
    ChangeNodeColor {
        node_id: String,
        fill: Option<String>,
        stroke: Option<String>,
    },
    /// Reconnect an edge and/or change its stroke.
    ChangeEdgeColor {
        edge_id: String,
        source: Option<String>,
        target: Option<String>,
        stroke: Option<String>,
    },
}

/// Menu action tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionToken {
    Expand,
    Collapse,
    CollapseAll,
    Hide,
    Show,
    /// `neighbor-<steps>`
    Neighbor(usize),
    ChangeNodeColor,
    ChangeEdgeColor,
}

impl FromStr for ActionToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "expand" => Self::Expand,
            "collapse" => Self::Collapse,
            "collapseAll" => Self::CollapseAll,
            "hide" => Self::Hide,
            "show" => Self::Show,
            "changeNodeColor" => Self::ChangeNodeColor,
            "changeEdgeColor" => Self::ChangeEdgeColor,
            other => match other.strip_prefix("neighbor-").map(str::parse::<usize>) {
                Some(Ok(steps)) => Self::Neighbor(steps),
                _ => return Err(Error::UnknownAction(other.to_string())),
            },
        })
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expand => f.write_str("expand"),
            Self::Collapse => f.write_str("collapse"),
            Self::CollapseAll => f.write_str("collapseAll"),
            Self::Hide => f.write_str("hide"),
            Self::Show => f.write_str("show"),
            Self::Neighbor(steps) => write!(f, "neighbor-{steps}"),
            Self::ChangeNodeColor => f.write_str("changeNodeColor"),
            Self::ChangeEdgeColor => f.write_str("changeEdgeColor"),
        }
    }
}

impl ActionToken {
    /// Whether the action needs the id of the item the menu was opened on.
    pub fn needs_item(self) -> bool {
        !matches!(self, Self::CollapseAll | Self::Show)
    }
}

impl Command {
    /// Build the command for a menu token fired on `item`.
    ///
    /// Recolor tokens carry no colors; the session falls back to
    /// [`DEFAULT_RECOLOR`].
    pub fn from_token(token: &str, item: Option<&str>) -> Result<Self> {
        let token: ActionToken = token.parse()?;
        let item = match (token.needs_item(), item) {
            (true, None) => {
                return Err(Error::InvalidParameter {
                    name: "item",
                    message: "action requires a target item",
                })
            }
            (_, item) => item.unwrap_or_default().to_string(),
        };
        Ok(match token {
            ActionToken::Expand => Self::Expand { node_id: item },
            ActionToken::Collapse => Self::Collapse { node_id: item },
            ActionToken::CollapseAll => Self::CollapseAll,
            ActionToken::Hide => Self::Hide { item_id: item },
            ActionToken::Show => Self::Show,
            ActionToken::Neighbor(steps) => Self::Neighbors {
                node_id: item,
                steps,
            },
            ActionToken::ChangeNodeColor => Self::ChangeNodeColor {
                node_id: item,
                fill: None,
                stroke: None,
            },
            ActionToken::ChangeEdgeColor => Self::ChangeEdgeColor {
                edge_id: item,
                source: None,
                target: None,
                stroke: None,
            },
        })
    }
}
