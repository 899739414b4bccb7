//! Preset configurations
//!
//! Built-in presets are fixed recipes: every call produces a fresh
//! [`LoggerConfig`] with the same literal values and no shared state.
//! [`PresetCatalog`] adds user-registered presets on top of them.

use logrig_core::rotation::{DAY, MIB};
use logrig_core::{
    Compression, ConfigFile, ConfigParams, Error, Level, LoggerSettings, Result, RetentionRule,
    RotationPreset, RotationRule, RotationSpec,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::config::LoggerConfig;
use crate::registry::LoggerRegistry;

/// Built-in preset identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinPreset {
    Development,
    Production,
    Testing,
    Performance,
    Daily,
    Hourly,
    Weekly,
    Monthly,
    Minute,
}

impl BuiltinPreset {
    pub const ALL: [BuiltinPreset; 9] = [
        BuiltinPreset::Development,
        BuiltinPreset::Production,
        BuiltinPreset::Testing,
        BuiltinPreset::Performance,
        BuiltinPreset::Daily,
        BuiltinPreset::Hourly,
        BuiltinPreset::Weekly,
        BuiltinPreset::Monthly,
        BuiltinPreset::Minute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinPreset::Development => "development",
            BuiltinPreset::Production => "production",
            BuiltinPreset::Testing => "testing",
            BuiltinPreset::Performance => "performance",
            BuiltinPreset::Daily => "daily",
            BuiltinPreset::Hourly => "hourly",
            BuiltinPreset::Weekly => "weekly",
            BuiltinPreset::Monthly => "monthly",
            BuiltinPreset::Minute => "minute",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltinPreset::Development => "Verbose local logging in logs/dev",
            BuiltinPreset::Production => "Compressed, self-cleaning logs in /var/log/app",
            BuiltinPreset::Testing => "Warnings and above in logs/test",
            BuiltinPreset::Performance => "Errors only, large files, deferred writes",
            BuiltinPreset::Daily => "New file every midnight",
            BuiltinPreset::Hourly => "New file every hour",
            BuiltinPreset::Weekly => "New file every Monday",
            BuiltinPreset::Monthly => "New file on the 1st of each month",
            BuiltinPreset::Minute => "New file every minute",
        }
    }

    /// The preset's literal values. Changing these breaks callers relying on
    /// them; add a new preset instead.
    pub fn settings(&self) -> LoggerSettings {
        let size = |mib: u64| RotationSpec::from_rule(RotationRule::Size {
            threshold_bytes: mib * MIB,
        });
        let days = |n: u64| RetentionRule::MaxAge { seconds: n * DAY };
        let timed = |preset: RotationPreset| LoggerSettings {
            level: Level::Info,
            path: Some(PathBuf::from("logs")),
            rotation: preset.into(),
            retention: preset.default_retention(),
            ..LoggerSettings::default()
        };

        match self {
            BuiltinPreset::Development => LoggerSettings {
                level: Level::Debug,
                path: Some(PathBuf::from("logs/dev")),
                rotation: size(10),
                retention: days(7),
                ..LoggerSettings::default()
            },
            BuiltinPreset::Production => LoggerSettings {
                level: Level::Info,
                path: Some(PathBuf::from("/var/log/app")),
                rotation: size(50),
                retention: days(30),
                compression: Compression::Gzip,
                auto_clean: true,
                ..LoggerSettings::default()
            },
            BuiltinPreset::Testing => LoggerSettings {
                level: Level::Warning,
                path: Some(PathBuf::from("logs/test")),
                rotation: size(5),
                retention: days(3),
                ..LoggerSettings::default()
            },
            BuiltinPreset::Performance => LoggerSettings {
                level: Level::Error,
                path: Some(PathBuf::from("logs/perf")),
                rotation: size(500),
                retention: days(7),
                compression: Compression::Gzip,
                proxy: true,
                ..LoggerSettings::default()
            },
            BuiltinPreset::Daily => timed(RotationPreset::Daily),
            BuiltinPreset::Hourly => timed(RotationPreset::Hourly),
            BuiltinPreset::Weekly => timed(RotationPreset::Weekly),
            BuiltinPreset::Monthly => timed(RotationPreset::Monthly),
            BuiltinPreset::Minute => timed(RotationPreset::Minute),
        }
    }

    pub fn create(&self) -> LoggerConfig {
        LoggerConfig::from_settings(self.settings())
    }
}

impl FromStr for BuiltinPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        BuiltinPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for BuiltinPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Factories for the built-in presets
pub struct ConfigTemplates;

impl ConfigTemplates {
    /// DEBUG, `logs/dev`, 10 MB, 7 days
    pub fn development() -> LoggerConfig {
        BuiltinPreset::Development.create()
    }

    /// INFO, `/var/log/app`, 50 MB, 30 days, gzip, auto clean
    pub fn production() -> LoggerConfig {
        BuiltinPreset::Production.create()
    }

    /// WARNING, `logs/test`, 5 MB, 3 days
    pub fn testing() -> LoggerConfig {
        BuiltinPreset::Testing.create()
    }

    /// ERROR, `logs/perf`, 500 MB, 7 days, gzip, proxy mode
    pub fn performance() -> LoggerConfig {
        BuiltinPreset::Performance.create()
    }

    pub fn daily() -> LoggerConfig {
        BuiltinPreset::Daily.create()
    }

    pub fn hourly() -> LoggerConfig {
        BuiltinPreset::Hourly.create()
    }

    pub fn weekly() -> LoggerConfig {
        BuiltinPreset::Weekly.create()
    }

    pub fn monthly() -> LoggerConfig {
        BuiltinPreset::Monthly.create()
    }

    pub fn minute() -> LoggerConfig {
        BuiltinPreset::Minute.create()
    }

    /// Built-in preset by name
    pub fn get(name: &str) -> Result<LoggerConfig> {
        Ok(name.parse::<BuiltinPreset>()?.create())
    }

    /// Environment preset by name or short alias (`dev`, `prod`, `test`, `perf`)
    pub fn for_environment(env: &str) -> Result<LoggerConfig> {
        let preset = match env.trim().to_lowercase().as_str() {
            "development" | "dev" => BuiltinPreset::Development,
            "production" | "prod" => BuiltinPreset::Production,
            "testing" | "test" => BuiltinPreset::Testing,
            "performance" | "perf" => BuiltinPreset::Performance,
            _ => return Err(Error::UnknownPreset(env.to_string())),
        };
        Ok(preset.create())
    }

    pub fn names() -> Vec<&'static str> {
        BuiltinPreset::ALL.iter().map(BuiltinPreset::as_str).collect()
    }
}

/// A config read from a file, with the loggers it asks to be attached to
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: LoggerConfig,
    pub loggers: Vec<String>,
}

impl LoadedConfig {
    /// Attach the config to the file's `loggers`
    pub fn apply(&self, registry: &LoggerRegistry) -> Result<Vec<logrig_logs::LoggerHandle>> {
        self.config.apply_to(registry, &self.loggers)
    }
}

/// Built-in presets plus user-registered ones
#[derive(Debug, Default)]
pub struct PresetCatalog {
    custom: RwLock<BTreeMap<String, LoggerSettings>>,
}

impl PresetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preset. Built-in and already registered names are refused so
    /// existing presets never change meaning.
    pub fn register(&self, name: &str, params: ConfigParams) -> Result<()> {
        let settings = LoggerSettings::from_params(&params)?;
        self.insert(name, settings)
    }

    /// Add a preset holding a snapshot of `config`'s current settings
    pub fn register_config(&self, name: &str, config: &LoggerConfig) -> Result<()> {
        self.insert(name, config.settings())
    }

    fn insert(&self, name: &str, settings: LoggerSettings) -> Result<()> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return Err(Error::config("preset name must not be empty"));
        }
        if key.parse::<BuiltinPreset>().is_ok() {
            return Err(Error::PresetAlreadyExists(key));
        }
        let mut custom = self.custom.write();
        if custom.contains_key(&key) {
            return Err(Error::PresetAlreadyExists(key));
        }
        info!("Registered preset '{}'", key);
        custom.insert(key, settings);
        Ok(())
    }

    /// Remove a user preset; built-ins cannot be removed
    pub fn unregister(&self, name: &str) -> bool {
        self.custom.write().remove(&name.trim().to_lowercase()).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.settings(name).is_ok()
    }

    /// Built-in names first, then user presets in name order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = ConfigTemplates::names().into_iter().map(String::from).collect();
        names.extend(self.custom.read().keys().cloned());
        names
    }

    pub fn settings(&self, name: &str) -> Result<LoggerSettings> {
        if let Ok(builtin) = name.parse::<BuiltinPreset>() {
            return Ok(builtin.settings());
        }
        self.custom
            .read()
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    /// Fresh config from a preset
    pub fn create(&self, name: &str) -> Result<LoggerConfig> {
        Ok(LoggerConfig::from_settings(self.settings(name)?))
    }

    /// Build a config from a parsed file. Precedence: file keys, then
    /// `env`, then the file's `preset`, then built-in defaults.
    pub fn from_file(&self, file: ConfigFile, env: &ConfigParams) -> Result<LoadedConfig> {
        let (preset, params, loggers) = file.into_parts();
        let base = match preset {
            Some(name) => self.settings(&name)?,
            None => LoggerSettings::default(),
        };
        let settings = base.with_overrides(&env.clone().merged(&params))?;
        Ok(LoadedConfig {
            config: LoggerConfig::from_settings(settings),
            loggers,
        })
    }

    /// Load and build a config from `path`
    pub fn load_file(&self, path: &Path, env: &ConfigParams) -> Result<LoadedConfig> {
        self.from_file(ConfigFile::load(path)?, env)
    }
}
