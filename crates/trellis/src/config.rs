//! Runtime configuration for diagram output.
//!
//! [`AppConfig`] is deserialized from an optional TOML file by the CLI and
//! passed to the dot renderer. Every field has a default, so an empty (or
//! absent) configuration file is valid.

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Graph-level output settings.
    pub graph: GraphConfig,
}

/// Graph-level settings applied to the rendered dot output.
///
/// Attributes written in the document's `title { … }` block take
/// precedence over these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Layout direction (`LR`, `TB`, …).
    pub rankdir: String,
    /// Font face used for table labels.
    pub font: String,
    /// Color of relation edges.
    pub edge_color: String,
    /// Line style of relation edges.
    pub edge_style: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            rankdir: "LR".to_string(),
            font: "Helvetica".to_string(),
            edge_color: "gray50".to_string(),
            edge_style: "dashed".to_string(),
        }
    }
}
