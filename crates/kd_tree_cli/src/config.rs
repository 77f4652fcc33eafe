//! Configuration file for the kd-tree builder.
//!
//! ```toml
//! use_cache = true
//!
//! [build]
//! max_depth = 18
//! parallel = true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use kd_tree::BuildConfig;
use serde::Deserialize;

/// Root configuration. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Tree build parameters.
  pub build: BuildConfig,
  /// Read and write the `<mesh>.tree` side-car cache.
  pub use_cache: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      build: BuildConfig::default(),
      use_cache: true,
    }
  }
}

impl Config {
  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = Self::parse(&content).with_context(|| "Failed to parse config TOML")?;
    Ok(config)
  }

  pub fn parse(content: &str) -> Result<Self> {
    let config: Config = toml::from_str(content)?;
    if config.build.max_depth == 0 {
      anyhow::bail!("build.max_depth must be at least 1");
    }
    Ok(config)
  }
}
