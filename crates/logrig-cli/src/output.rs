//! Table and JSON output formatting

use colored::Colorize;
use logrig::LoggerSettings;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Global flag for JSON output mode
static JSON_MODE: AtomicBool = AtomicBool::new(false);

/// Enable or disable JSON output mode
pub fn set_json_mode(enabled: bool) {
    JSON_MODE.store(enabled, Ordering::SeqCst);
}

/// Check if JSON output mode is enabled
pub fn is_json_mode() -> bool {
    JSON_MODE.load(Ordering::SeqCst)
}

#[derive(Tabled, Serialize)]
pub struct PresetRow {
    #[tabled(rename = "name")]
    pub name: String,
    #[tabled(rename = "level")]
    pub level: String,
    #[tabled(rename = "path")]
    pub path: String,
    #[tabled(rename = "rotation")]
    pub rotation: String,
    #[tabled(rename = "retention")]
    pub retention: String,
    #[tabled(rename = "compression")]
    pub compression: String,
    #[tabled(rename = "description")]
    pub description: String,
}

impl PresetRow {
    pub fn new(name: &str, description: &str, settings: &LoggerSettings) -> Self {
        Self {
            name: name.to_string(),
            level: settings.level.to_string(),
            path: format_destination(settings.path.as_deref()),
            rotation: settings.rotation.to_string(),
            retention: settings.retention.to_string(),
            compression: settings.compression.to_string(),
            description: description.to_string(),
        }
    }
}

pub fn print_presets_table(rows: Vec<PresetRow>) {
    if is_json_mode() {
        print_json(&rows);
        return;
    }

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .to_string();

    println!("{}", table);
}

/// JSON representation of resolved settings
#[derive(Serialize)]
pub struct SettingsJson {
    #[serde(flatten)]
    pub settings: LoggerSettings,
    pub log_dir: Option<String>,
    pub active_template: String,
    pub rotated_template: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loggers: Vec<String>,
}

impl SettingsJson {
    pub fn new(settings: &LoggerSettings, loggers: &[String]) -> Self {
        let naming = settings.naming();
        Self {
            settings: settings.clone(),
            log_dir: settings.log_dir().map(|d| d.display().to_string()),
            active_template: naming.active,
            rotated_template: naming.rotated,
            loggers: loggers.to_vec(),
        }
    }
}

pub fn print_settings(settings: &LoggerSettings, loggers: &[String]) {
    if is_json_mode() {
        print_json(&SettingsJson::new(settings, loggers));
        return;
    }

    let naming = settings.naming();
    println!("{}", "─".repeat(50));
    println!("  {} │ {}", "Level".bold(), settings.level);
    println!(
        "  {} │ {}",
        "Destination".bold(),
        format_destination(settings.log_dir().as_deref())
    );
    println!("  {} │ {}", "Rotation".bold(), settings.rotation);
    println!("  {} │ {}", "Retention".bold(), settings.retention);
    println!("  {} │ {}", "Compression".bold(), settings.compression);
    println!("  {} │ {}", "Format".bold(), settings.format);
    println!("{}", "─".repeat(50));
    println!("  {} │ {}", "Active".bold(), naming.active);
    println!("  {} │ {}", "Rotated".bold(), naming.rotated);
    if let Some(component) = &settings.component_name {
        println!("  {} │ {}", "Component".bold(), component);
    }
    if settings.proxy {
        println!("  {} │ enabled", "Proxy".bold());
    }
    if settings.auto_clean {
        println!("  {} │ enabled", "Auto clean".bold());
    }
    if !loggers.is_empty() {
        println!("  {} │ {}", "Loggers".bold(), loggers.join(", "));
    }
    println!("{}", "─".repeat(50));
}

/// Key/value rows for single-item views
#[derive(Tabled, Serialize)]
pub struct FieldRow {
    #[tabled(rename = "field")]
    pub field: String,
    #[tabled(rename = "value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Print `rows` as a two-column table, or `json` in JSON mode
pub fn print_fields<T: Serialize>(rows: Vec<FieldRow>, json: &T) {
    if is_json_mode() {
        print_json(json);
        return;
    }

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .to_string();

    println!("{}", table);
}

/// Where lines go: a directory, or the console
pub fn format_destination(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "console".to_string(),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing to JSON: {}", e),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// JSON wrapper for generic responses
#[derive(Serialize)]
pub struct ResponseJson<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Print a success message in JSON format if enabled
pub fn print_success_json<T: Serialize>(message: &str, data: Option<T>) {
    if is_json_mode() {
        let response = ResponseJson {
            success: true,
            message: Some(message.to_string()),
            data,
        };
        if let Ok(json) = serde_json::to_string_pretty(&response) {
            println!("{}", json);
        }
    } else {
        print_success(message);
    }
}

/// Print an error message in JSON format if enabled
pub fn print_error_json(message: &str) {
    if is_json_mode() {
        let response: ResponseJson<()> = ResponseJson {
            success: false,
            message: Some(message.to_string()),
            data: None,
        };
        if let Ok(json) = serde_json::to_string_pretty(&response) {
            eprintln!("{}", json);
        }
    } else {
        print_error(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrig::{BuiltinPreset, ConfigParams};

    #[test]
    fn test_preset_row() {
        let row = PresetRow::new("production", "desc", &BuiltinPreset::Production.settings());
        assert_eq!(row.level, "INFO");
        assert_eq!(row.path, "/var/log/app");
        assert_eq!(row.rotation, "50 MB");
        assert_eq!(row.retention, "30 days");
        assert_eq!(row.compression, "gzip");
    }

    #[test]
    fn test_format_destination() {
        assert_eq!(format_destination(None), "console");
        assert_eq!(format_destination(Some(Path::new("logs/dev"))), "logs/dev");
    }

    #[test]
    fn test_settings_json_includes_naming() {
        let settings = LoggerSettings::from_params(&ConfigParams::new().rotation("daily")).unwrap();
        let json = serde_json::to_value(SettingsJson::new(&settings, &["svc".to_string()])).unwrap();
        assert_eq!(json["rotation"], "daily");
        assert_eq!(json["rotated_template"], "[{name}]{YYYYMMDD}.log");
        assert_eq!(json["loggers"][0], "svc");
        assert!(json["log_dir"].is_null());
    }

    #[test]
    fn test_response_json_skips_empty() {
        let response: ResponseJson<()> = ResponseJson {
            success: false,
            message: Some("boom".to_string()),
            data: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(!json.contains("data"));
    }
}
