//! Configuration loading from grid.toml
//!
//! Engine configuration can be specified in a `grid.toml` file in the
//! project root. The configuration is automatically discovered by walking
//! up from the current directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gridbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GridConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for matrix execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Keep a backend running across all iterations of one argument set
    /// instead of restarting it per iteration
    #[serde(default)]
    pub hold_backend: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            hold_backend: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default storage target; a `.db` suffix selects the relational sink
    #[serde(default = "default_target")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_target(),
        }
    }
}

fn default_target() -> String {
    "results".to_string()
}

impl GridConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("grid.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Gridbench Configuration

[runner]
# Keep a backend running across all iterations of one argument set
# (default restarts it per iteration for strict isolation)
hold_backend = false

[output]
# Storage target; a path ending in .db selects the relational sink
directory = "results"
"#
        .to_string()
    }
}
