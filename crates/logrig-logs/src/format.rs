//! Line rendering from a format template
//!
//! Recognized placeholders: `{time}`, `{level}`, `{name}`, `{message}` and
//! `{fields}`. Anything else in braces is copied through untouched.

use chrono::NaiveDateTime;
use logrig_core::Level;
use std::collections::BTreeMap;

/// Structured key/value pairs attached to a record
pub type Fields = BTreeMap<String, serde_json::Value>;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render one record. Substitution is single-pass, so placeholder-looking
/// text inside the message or fields is never expanded.
pub fn render_line(
    format: &str,
    at: NaiveDateTime,
    level: Level,
    name: &str,
    message: &str,
    fields: &Fields,
) -> String {
    let mut out = String::with_capacity(format.len() + message.len() + 32);
    let mut rest = format;
    let mut fields_used = false;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            rest = "";
            break;
        };
        match &tail[1..close] {
            "time" => out.push_str(&at.format(TIME_FORMAT).to_string()),
            "level" => out.push_str(level.as_str()),
            "name" => out.push_str(name),
            "message" => out.push_str(message),
            "fields" => {
                fields_used = true;
                out.push_str(&render_fields(fields));
            }
            _ => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);

    if !fields_used && !fields.is_empty() {
        out.push_str(" | ");
        out.push_str(&render_fields(fields));
    }
    out
}

/// `key=value` pairs separated by spaces; strings are unquoted
pub fn render_fields(fields: &Fields) -> String {
    fields
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
