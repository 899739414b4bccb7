//! Parse command implementation

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use logrig::{RetentionRule, RotationSpec};
use serde::Serialize;

use crate::cli::ParseArgs;
use crate::output::{print_fields, FieldRow};

#[derive(Serialize)]
struct ParsedJson {
    expression: String,
    kind: &'static str,
    canonical: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_trigger: Option<NaiveDateTime>,
}

pub fn execute(args: ParseArgs) -> Result<()> {
    let parsed = if args.retention {
        let rule: RetentionRule = args.expression.parse()?;
        ParsedJson {
            expression: args.expression,
            kind: rule.kind(),
            canonical: rule.to_string(),
            preset: None,
            next_trigger: None,
        }
    } else {
        let spec: RotationSpec = args.expression.parse()?;
        ParsedJson {
            expression: args.expression,
            kind: spec.rule.kind(),
            canonical: spec.rule.to_string(),
            preset: spec.preset.map(|p| p.to_string()),
            next_trigger: spec.rule.next_trigger(Local::now().naive_local()),
        }
    };

    let mut rows = vec![
        FieldRow::new("expression", &parsed.expression),
        FieldRow::new("kind", parsed.kind),
        FieldRow::new("canonical", &parsed.canonical),
    ];
    if let Some(preset) = &parsed.preset {
        rows.push(FieldRow::new("preset", preset));
    }
    if let Some(next) = parsed.next_trigger {
        rows.push(FieldRow::new("next trigger", next.format("%Y-%m-%d %H:%M:%S")));
    }
    print_fields(rows, &parsed);
    Ok(())
}
