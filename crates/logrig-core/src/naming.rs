//! File naming templates for active and rotated log files
//!
//! Templates are plain strings with named placeholders. `{name}` is the
//! component name; the time tokens are rendered from the moment the rotated
//! file's period began:
//!
//! | token | example |
//! |---|---|
//! | `{YYYYMMDD}` | `20250113` |
//! | `{YYYYMM}` | `202501` |
//! | `{YYYY}W{WW}` | `2025W03` (ISO week-year and week) |
//! | `{YYYY}` `{MM}` `{DD}` | `2025` `01` `13` |
//! | `{HHMM}` `{HH}` | `0930` `09` |
//! | `{WW}` | `03` |
//! | `{timestamp}` | `20250113-093000` |

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const NAME_TOKEN: &str = "{name}";

/// Time tokens with their chrono format and the digits they render to,
/// longest first so that prefixes like `{YYYY}` never shadow `{YYYY}W{WW}`
const TIME_TOKENS: &[(&str, &str, &str)] = &[
    ("{YYYY}W{WW}", "%GW%V", r"\d{4}W\d{2}"),
    ("{YYYYMMDD}", "%Y%m%d", r"\d{8}"),
    ("{YYYYMM}", "%Y%m", r"\d{6}"),
    ("{timestamp}", "%Y%m%d-%H%M%S", r"\d{8}-\d{6}"),
    ("{HHMM}", "%H%M", r"\d{4}"),
    ("{YYYY}", "%Y", r"\d{4}"),
    ("{MM}", "%m", r"\d{2}"),
    ("{DD}", "%d", r"\d{2}"),
    ("{HH}", "%H", r"\d{2}"),
    ("{WW}", "%V", r"\d{2}"),
];

/// Pair of file name patterns: the file currently written to, and the name it
/// gets once rotated out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingTemplate {
    pub active: String,
    pub rotated: String,
}

impl NamingTemplate {
    pub fn new(active: impl Into<String>, rotated: impl Into<String>) -> Self {
        Self {
            active: active.into(),
            rotated: rotated.into(),
        }
    }

    /// Check that both patterns identify the component and that rotated
    /// names vary over time
    pub fn validate(&self) -> Result<()> {
        if !self.active.contains(NAME_TOKEN) {
            return Err(Error::config(format!(
                "active file name '{}' must contain {}",
                self.active, NAME_TOKEN
            )));
        }
        if !self.rotated.contains(NAME_TOKEN) {
            return Err(Error::config(format!(
                "rotated file name '{}' must contain {}",
                self.rotated, NAME_TOKEN
            )));
        }
        if !has_time_token(&self.rotated) {
            return Err(Error::config(format!(
                "rotated file name '{}' must contain a time token",
                self.rotated
            )));
        }
        Ok(())
    }

    /// Name of the file currently being written
    pub fn active_file(&self, name: &str) -> String {
        self.active.replace(NAME_TOKEN, name)
    }

    /// Name of a file rotated out for the period starting at `at`
    pub fn rotated_file(&self, name: &str, at: NaiveDateTime) -> String {
        render(&self.rotated, name, at)
    }

    /// Pattern matching every rotated file of component `name`
    ///
    /// Covers the `.N` collision suffix placed before the extension and a
    /// trailing `.gz`.
    pub fn rotated_pattern(&self, name: &str) -> Result<Regex> {
        // the extension is the last dot after every placeholder
        let tail_start = self.rotated.rfind('}').map_or(0, |i| i + 1);
        let (head, ext) = match self.rotated[tail_start..].rfind('.') {
            Some(dot) => self.rotated.split_at(tail_start + dot),
            None => (self.rotated.as_str(), ""),
        };
        let pattern = format!(
            r"^{}(?:\.\d+)?{}(?:\.gz)?$",
            template_pattern(head, name),
            regex::escape(ext)
        );
        Regex::new(&pattern).map_err(|e| Error::config(format!("rotated file name pattern: {}", e)))
    }

    /// Whether `file_name` is a rotated file of component `name`
    pub fn is_rotated_file(&self, name: &str, file_name: &str) -> bool {
        file_name != self.active_file(name)
            && self
                .rotated_pattern(name)
                .map(|re| re.is_match(file_name))
                .unwrap_or(false)
    }
}

fn has_time_token(template: &str) -> bool {
    TIME_TOKENS.iter().any(|(token, _, _)| template.contains(token))
}

/// Regex source for `template`: literals escaped, `{name}` fixed to `name`,
/// time tokens as digits
fn template_pattern(template: &str, name: &str) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix(NAME_TOKEN) {
            out.push_str(&regex::escape(name));
            rest = tail;
            continue;
        }
        if let Some((token, _, digits)) = TIME_TOKENS.iter().find(|(t, _, _)| rest.starts_with(t)) {
            out.push_str(digits);
            rest = &rest[token.len()..];
            continue;
        }
        out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Render a template for component `name` at time `at`
pub fn render(template: &str, name: &str, at: NaiveDateTime) -> String {
    let mut out = template.to_string();
    for (token, fmt, _) in TIME_TOKENS {
        if out.contains(token) {
            out = out.replace(token, &at.format(fmt).to_string());
        }
    }
    // name last, so a component name can never be read as a time token
    out.replace(NAME_TOKEN, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    #[test]
    fn test_render_daily() {
        let naming = NamingTemplate::new("[{name}]daily_latest.temp.log", "[{name}]{YYYYMMDD}.log");
        assert_eq!(naming.active_file("svc"), "[svc]daily_latest.temp.log");
        assert_eq!(naming.rotated_file("svc", at(2025, 1, 13, 0, 0)), "[svc]20250113.log");
    }

    #[test]
    fn test_render_iso_week_year() {
        // 2024-12-30 is in ISO week 1 of 2025
        let naming = NamingTemplate::new("[{name}]weekly_latest.temp.log", "[{name}]week_{YYYY}W{WW}.log");
        assert_eq!(naming.rotated_file("api", at(2024, 12, 30, 0, 0)), "[api]week_2025W01.log");
        assert_eq!(naming.rotated_file("api", at(2025, 1, 13, 0, 0)), "[api]week_2025W03.log");
    }

    #[test]
    fn test_render_hour_and_minute_tokens() {
        assert_eq!(
            render("[{name}]{YYYYMMDD}_{HHMM}.log", "w", at(2025, 3, 9, 7, 5)),
            "[w]20250309_0705.log"
        );
        assert_eq!(render("{name}-{timestamp}.log", "w", at(2025, 3, 9, 7, 5)), "w-20250309-070500.log");
    }

    #[test]
    fn test_name_is_not_interpreted() {
        assert_eq!(render("[{name}]{HH}.log", "{HH}", at(2025, 3, 9, 7, 5)), "[{HH}]07.log");
    }

    #[test]
    fn test_rotated_file_matching() {
        let naming = NamingTemplate::new("[{name}]daily_latest.temp.log", "[{name}]{YYYYMMDD}.log");
        assert!(naming.is_rotated_file("svc", "[svc]20250113.log"));
        assert!(naming.is_rotated_file("svc", "[svc]20250113.log.gz"));
        assert!(naming.is_rotated_file("svc", "[svc]20250113.2.log.gz"));
        assert!(!naming.is_rotated_file("svc", "[svc]daily_latest.temp.log"));
        assert!(!naming.is_rotated_file("svc", "[other]20250113.log"));
        assert!(!naming.is_rotated_file("svc", "[svc]notes.txt"));
        assert!(!naming.is_rotated_file("svc", "[svc]2025011.log"));
    }

    #[test]
    fn test_rotated_matching_with_dotted_names() {
        let naming = NamingTemplate::new("{name}.log", "{name}.{timestamp}.log");
        assert!(naming.is_rotated_file("svc", "svc.20250113-093000.log"));
        assert!(naming.is_rotated_file("svc", "svc.20250113-093000.1.log"));
        assert!(!naming.is_rotated_file("svc", "svc.api.log"));
        assert!(!naming.is_rotated_file("svc", "svc.api.20250113-093000.log"));
        assert!(naming.is_rotated_file("svc.api", "svc.api.20250113-093000.log"));
        assert!(!naming.is_rotated_file("svc.api", "svcXapi.20250113-093000.log"));
    }

    #[test]
    fn test_rotated_matching_week_tokens() {
        let naming = NamingTemplate::new("[{name}]weekly_latest.temp.log", "[{name}]week_{YYYY}W{WW}.log");
        assert!(naming.is_rotated_file("api", "[api]week_2025W03.log"));
        assert!(!naming.is_rotated_file("api", "[api]week_2025.log"));
    }

    #[test]
    fn test_validate() {
        assert!(NamingTemplate::new("{name}.log", "{name}.{timestamp}.log").validate().is_ok());
        assert!(NamingTemplate::new("app.log", "{name}.{timestamp}.log").validate().is_err());
        assert!(NamingTemplate::new("{name}.log", "{name}.old.log").validate().is_err());
    }
}
