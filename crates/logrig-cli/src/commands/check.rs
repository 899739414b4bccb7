//! Check command implementation

use anyhow::Result;
use std::path::Path;

use crate::output::print_settings;

pub fn execute(file: &Path) -> Result<()> {
    let loaded = super::load_config(file)?;
    print_settings(&loaded.config.settings(), &loaded.loggers);
    Ok(())
}
