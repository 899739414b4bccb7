//! Command implementations

pub mod check;
pub mod clean;
pub mod names;
pub mod parse;
pub mod presets;

use anyhow::{Context, Result};
use logrig::{ConfigParams, LoadedConfig, PresetCatalog};
use std::path::Path;

/// Load a config file layered over the `LOGRIG_*` environment
pub fn load_config(file: &Path) -> Result<LoadedConfig> {
    PresetCatalog::new()
        .load_file(file, &ConfigParams::from_env())
        .with_context(|| format!("Failed to load {}", file.display()))
}
