//! Presets command implementation

use anyhow::Result;
use logrig::BuiltinPreset;

use crate::output::{print_presets_table, PresetRow};

pub fn execute() -> Result<()> {
    let rows = BuiltinPreset::ALL
        .iter()
        .map(|p| PresetRow::new(p.as_str(), p.description(), &p.settings()))
        .collect();
    print_presets_table(rows);
    Ok(())
}
