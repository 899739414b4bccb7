//! Configuration file parsing for logrig
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)
//!
//! A file holds the same keys as [`ConfigParams`], plus an optional base
//! `preset` and the `loggers` the configuration should be attached to.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::settings::ConfigParams;
use crate::types::Expression;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    fn require(path: &Path) -> Result<Self> {
        Self::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })
    }
}

/// Configuration file structure (logrig.toml/yaml/json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Registered preset layered underneath the keys below
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Logger names to attach once loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loggers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, alias = "log_path", skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(default, alias = "logger_format", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdirectory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated_name: Option<String>,
    #[serde(default, alias = "use_proxy", skip_serializing_if = "Option::is_none")]
    pub proxy: Option<bool>,
    #[serde(default, alias = "start_cleaner", skip_serializing_if = "Option::is_none")]
    pub auto_clean: Option<bool>,
}

impl ConfigFile {
    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::require(path)?;
        let content = std::fs::read_to_string(path)?;
        debug!("Loading {:?} config from {}", format, path.display());
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => Self::from_toml(content),
            ConfigFormat::Yaml => Self::from_yaml(content),
            ConfigFormat::Json => Self::from_json(content),
        }
    }

    /// Parse TOML config content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ConfigFile = toml::from_str(content)?;
        Ok(config)
    }

    /// Parse YAML config content
    pub fn from_yaml(content: &str) -> Result<Self> {
        // an empty YAML document is null, not an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ConfigFile = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Parse JSON config content
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ConfigFile = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Find and load config file from a directory
    pub fn find_and_load(dir: &Path) -> Result<(Self, PathBuf)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }
        Err(Error::ConfigError(format!(
            "No config file found in {}. Expected one of: {:?}",
            dir.display(),
            CONFIG_FILES
        )))
    }

    /// Build a file body from parameters
    pub fn from_params(params: ConfigParams, loggers: Vec<String>) -> Self {
        Self {
            preset: None,
            loggers,
            level: params.level,
            path: params.path,
            rotation: params.rotation,
            retention: params.retention,
            compression: params.compression,
            format: params.format,
            component_name: params.component_name,
            subdirectory: params.subdirectory,
            active_name: params.active_name,
            rotated_name: params.rotated_name,
            proxy: params.proxy,
            auto_clean: params.auto_clean,
        }
    }

    /// Split into the base preset, the parameter overrides, and the loggers
    pub fn into_parts(self) -> (Option<String>, ConfigParams, Vec<String>) {
        let params = ConfigParams {
            level: self.level,
            path: self.path,
            rotation: self.rotation,
            retention: self.retention,
            compression: self.compression,
            format: self.format,
            component_name: self.component_name,
            subdirectory: self.subdirectory,
            active_name: self.active_name,
            rotated_name: self.rotated_name,
            proxy: self.proxy,
            auto_clean: self.auto_clean,
        };
        (self.preset, params, self.loggers)
    }

    /// Serialize in the given format
    pub fn to_string_as(&self, format: ConfigFormat) -> Result<String> {
        Ok(match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Write to `path`, picking the format from its extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = ConfigFormat::require(path)?;
        let body = self.to_string_as(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, body)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LoggerSettings;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yaml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
preset = "daily"
loggers = ["api", "db"]
level = "debug"
path = "/var/log/app"
retention = 5
"#;
        let config = ConfigFile::from_toml(content).unwrap();
        let (preset, params, loggers) = config.into_parts();
        assert_eq!(preset.as_deref(), Some("daily"));
        assert_eq!(loggers, vec!["api", "db"]);
        assert_eq!(params.retention, Some(Expression::Number(5)));
        assert_eq!(params.path, Some(PathBuf::from("/var/log/app")));
    }

    #[test]
    fn test_parse_yaml() {
        let content = r#"
level: warning
rotation: "every 6 hours"
retention: "7 days"
compression: gzip
logger_format: "{level} {message}"
"#;
        let (_, params, _) = ConfigFile::from_yaml(content).unwrap().into_parts();
        let settings = LoggerSettings::from_params(&params).unwrap();
        assert_eq!(settings.format, "{level} {message}");
        assert!(settings.compression.is_enabled());
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{ "rotation": 1048576, "auto_clean": true }"#;
        let (_, params, _) = ConfigFile::from_json(content).unwrap().into_parts();
        assert_eq!(params.rotation, Some(Expression::Number(1_048_576)));
        assert_eq!(params.auto_clean, Some(true));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ConfigFile::from_toml("rotaton = \"daily\"").is_err());
        assert!(ConfigFile::from_json(r#"{"levle": "info"}"#).is_err());
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(ConfigFile::from_yaml("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_load_not_found() {
        let result = ConfigFile::load(Path::new("/nonexistent/logrig.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_save_and_load_each_format() {
        let dir = TempDir::new().unwrap();
        let params = ConfigParams::new()
            .level("ERROR")
            .rotation("monthly")
            .retention(4u64)
            .path("logs");
        let file = ConfigFile::from_params(params, vec!["svc".to_string()]);

        for name in ["cfg.toml", "cfg.yaml", "cfg.json"] {
            let path = dir.path().join(name);
            file.save(&path).unwrap();
            assert_eq!(ConfigFile::load(&path).unwrap(), file, "{}", name);
        }
        assert!(file.save(&dir.path().join("cfg.ini")).is_err());
    }

    #[test]
    fn test_find_and_load() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigFile::find_and_load(dir.path()).is_err());

        std::fs::write(dir.path().join("logrig.yml"), "level: debug\n").unwrap();
        let (config, path) = ConfigFile::find_and_load(dir.path()).unwrap();
        assert_eq!(config.level.as_deref(), Some("debug"));
        assert!(path.ends_with("logrig.yml"));
    }
}
