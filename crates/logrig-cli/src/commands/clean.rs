//! Clean command implementation

use anyhow::{bail, Context, Result};
use logrig_logs::clean_rotated;
use serde::Serialize;
use tracing::debug;

use crate::cli::CleanArgs;
use crate::output::{is_json_mode, print_info, print_success, print_success_json};

#[derive(Serialize)]
struct CleanedJson {
    logger: String,
    removed: Vec<String>,
}

pub fn execute(args: CleanArgs) -> Result<()> {
    let loaded = super::load_config(&args.file)?;
    let settings = loaded.config.settings();

    let Some(dir) = settings.log_dir() else {
        bail!("{} logs to the console; nothing to clean", args.file.display());
    };

    let names = if args.names.is_empty() {
        loaded.loggers
    } else {
        args.names
    };
    if names.is_empty() {
        bail!("No loggers given and {} lists none", args.file.display());
    }

    let naming = settings.naming();
    let mut report = Vec::with_capacity(names.len());
    for name in names {
        let component = settings.component(&name).to_string();
        debug!("Cleaning '{}' in {}", component, dir.display());
        let removed = clean_rotated(&dir, &component, &naming, settings.retention)
            .with_context(|| format!("Failed to clean logs for '{}'", name))?;
        report.push(CleanedJson {
            logger: name,
            removed: removed.iter().map(|p| p.display().to_string()).collect(),
        });
    }

    if is_json_mode() {
        let message = format!("Cleaned {} logger(s)", report.len());
        print_success_json(&message, Some(report));
        return Ok(());
    }

    for entry in &report {
        if entry.removed.is_empty() {
            print_info(&format!("{}: nothing to remove", entry.logger));
        } else {
            print_success(&format!(
                "{}: removed {} rotated file(s)",
                entry.logger,
                entry.removed.len()
            ));
        }
    }
    Ok(())
}
