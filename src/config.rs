//! App-config lookup for the logging transport precondition.
//!
//! The surrounding tool owns a JSON config file with a `logging.transports`
//! array; the pipeline only needs to know whether the `file` transport is in
//! it. When no config file is given, transports default to `file` + `stdout`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_transports")]
    pub transports: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            transports: default_transports(),
        }
    }
}

fn default_transports() -> Vec<String> {
    vec!["file".to_string(), "stdout".to_string()]
}

impl LoggingConfig {
    pub fn file_enabled(&self) -> bool {
        self.transports.iter().any(|t| t == "file")
    }
}

/// Load an app config file (JSON).
pub fn load(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
