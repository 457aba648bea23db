//! Optional `weld.toml` at the module root
//!
//! ```toml
//! [index]
//! paths = ["tools/packages.weld.yaml"]
//! discover = false
//!
//! [generate]
//! hoist = true
//! ```
//!
//! Command-line flags take precedence over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "weld.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Index files, relative to the module root
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Search the module for `*.weld.{yaml,yml,json}` files
    #[serde(default = "default_true")]
    pub discover: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            discover: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerateConfig {
    #[serde(default)]
    pub hoist: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `weld.toml` from `module_dir`, falling back to defaults
    pub fn load(module_dir: &Path) -> Result<Self> {
        let path = module_dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        tracing::debug!("Loading config from {}", path.display());
        Self::from_file(&path)
    }
}
