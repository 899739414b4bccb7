//! Names command implementation

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use logrig::{ConfigParams, LoggerSettings};
use serde::Serialize;

use crate::cli::NamesArgs;
use crate::output::{print_fields, FieldRow};

#[derive(Serialize)]
struct NamesJson {
    active: String,
    rotated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_rotation: Option<NaiveDateTime>,
}

pub fn execute(args: NamesArgs) -> Result<()> {
    let mut params = ConfigParams::new().rotation(args.rotation.as_str());
    if let Some(template) = args.active_name {
        params = params.active_name(template);
    }
    if let Some(template) = args.rotated_name {
        params = params.rotated_name(template);
    }
    let settings = LoggerSettings::from_params(&params)?;

    let at = match args.at.as_deref() {
        Some(text) => parse_instant(text)?,
        None => Local::now().naive_local(),
    };

    let naming = settings.naming();
    let names = NamesJson {
        active: naming.active_file(&args.name),
        rotated: naming.rotated_file(&args.name, at),
        next_rotation: settings.rotation.rule.next_trigger(at),
    };

    let mut rows = vec![
        FieldRow::new("active", &names.active),
        FieldRow::new("rotated", &names.rotated),
    ];
    if let Some(next) = names.next_rotation {
        rows.push(FieldRow::new("next rotation", next.format("%Y-%m-%d %H:%M:%S")));
    }
    print_fields(rows, &names);
    Ok(())
}

fn parse_instant(text: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(at);
        }
    }
    if let Some(at) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(at);
    }
    bail!("Invalid time '{}': expected YYYY-MM-DD[ HH:MM[:SS]]", text)
}
