//! Session configuration.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```json
//! { "nodeBudget": 40, "seed": 7, "layout": { "linkDistance": 180 } }
//! ```

use crate::error::{Error, Result};
use crate::layout::LayoutConfig;
use crate::palette::{Palette, DARK_BACKGROUND, SUBJECT_COLORS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of an [`Explorer`](crate::session::Explorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// Maximum number of nodes displayed at once.
    pub node_budget: usize,
    /// Maximum children grown per node by neighbor simulation.
    pub neighbor_fanout: usize,
    /// Louvain resolution.
    pub resolution: f64,
    /// Seed for clustering, neighbor simulation and position scatter.
    pub seed: Option<u64>,
    /// Subject colors assigned to clusters.
    pub palette: Vec<String>,
    /// Canvas background the palette is mixed into.
    pub background: String,
    pub layout: LayoutConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            node_budget: 20,
            neighbor_fanout: 10,
            resolution: 1.0,
            seed: None,
            palette: SUBJECT_COLORS.iter().map(|c| c.to_string()).collect(),
            background: DARK_BACKGROUND.to_string(),
            layout: LayoutConfig::default(),
        }
    }
}

impl ExplorerConfig {
    /// Parse a config from JSON text and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|source| Error::Parse {
            what: "config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.node_budget == 0 {
            return Err(Error::InvalidParameter {
                name: "nodeBudget",
                message: "must be at least 1",
            });
        }
        if self.neighbor_fanout == 0 {
            return Err(Error::InvalidParameter {
                name: "neighborFanout",
                message: "must be at least 1",
            });
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be a positive number",
            });
        }
        if self.palette.is_empty() {
            return Err(Error::InvalidParameter {
                name: "palette",
                message: "needs at least one color",
            });
        }
        Ok(())
    }

    /// Palette built from the configured subjects and background.
    pub fn build_palette(&self) -> Palette {
        Palette::new(&self.palette, &self.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.node_budget, 20);
        assert_eq!(config.neighbor_fanout, 10);
        assert_eq!(config.palette.len(), 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ExplorerConfig::from_json(r#"{"nodeBudget": 40, "layout": {"linkDistance": 180}}"#)
                .unwrap();
        assert_eq!(config.node_budget, 40);
        assert_eq!(config.layout.link_distance, 180.0);
        assert_eq!(config.layout.edge_strength, 50.0);
        assert_eq!(config.resolution, 1.0);
    }

    #[test]
    fn test_validation_errors() {
        let err = ExplorerConfig::from_json(r#"{"nodeBudget": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "nodeBudget", .. }));

        let err = ExplorerConfig::from_json(r#"{"palette": []}"#).unwrap_err();
        assert!(err.to_string().contains("palette"));

        let err = ExplorerConfig::from_json(r#"{"resolution": -1}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "resolution", .. }));
    }

    #[test]
    fn test_load() {
        assert_eq!(ExplorerConfig::load(None).unwrap(), ExplorerConfig::default());

        let path = std::env::temp_dir().join(format!("tierview-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"seed": 9}"#).unwrap();
        drop(file);
        let config = ExplorerConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.seed, Some(9));

        let missing = ExplorerConfig::load(Some(Path::new("/nonexistent/tierview.json")));
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
