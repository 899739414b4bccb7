//! The shareable logger configuration entity

use logrig_core::{ConfigFile, ConfigParams, LoggerSettings, Result};
use logrig_logs::LoggerHandle;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::attach::{self, ConfigShared};
use crate::presets::BuiltinPreset;
use crate::registry::LoggerRegistry;

static NEXT_CONFIG_ID: AtomicU64 = AtomicU64::new(1);

/// Logger parameters that can be attached to any number of named loggers.
/// [`LoggerConfig::update`] re-applies the new parameters to all of them
/// before returning.
///
/// `Clone` makes an independent copy with no attachments. Use
/// [`LoggerConfig::share`] for another reference to the same config.
pub struct LoggerConfig {
    shared: Arc<ConfigShared>,
}

impl LoggerConfig {
    /// Defaults overridden by `params`; any invalid field fails here
    pub fn new(params: ConfigParams) -> Result<Self> {
        Ok(Self::from_settings(LoggerSettings::from_params(&params)?))
    }

    /// Defaults, then the `LOGRIG_*` environment, then `params`
    pub fn from_env(params: ConfigParams) -> Result<Self> {
        Self::new(ConfigParams::from_env().merged(&params))
    }

    pub fn from_settings(settings: LoggerSettings) -> Self {
        Self {
            shared: Arc::new(ConfigShared::new(
                NEXT_CONFIG_ID.fetch_add(1, Ordering::Relaxed),
                settings,
            )),
        }
    }

    /// Process-unique identity of this config
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> LoggerSettings {
        self.shared.state.lock().settings.clone()
    }

    /// Another reference to this same config; updates through either are
    /// seen by both
    pub fn share(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn ptr_eq(&self, other: &LoggerConfig) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Independent copy with `overrides` applied; starts with no attachments
    pub fn clone_with(&self, overrides: ConfigParams) -> Result<Self> {
        let settings = self.settings().with_overrides(&overrides)?;
        Ok(Self::from_settings(settings))
    }

    /// Same as `base.clone_with(overrides)`
    pub fn inherit_from(base: &LoggerConfig, overrides: ConfigParams) -> Result<Self> {
        base.clone_with(overrides)
    }

    /// Apply `overrides` and broadcast the result to every attached logger.
    /// On error neither the config nor any logger has changed.
    pub fn update(&self, overrides: ConfigParams) -> Result<&Self> {
        attach::broadcast(&self.shared, &overrides)?;
        Ok(self)
    }

    /// Bind each name in `registry` to this config (moving it away from any
    /// previous config) and apply the current settings to its handle
    pub fn apply_to<I, S>(&self, registry: &LoggerRegistry, names: I) -> Result<Vec<LoggerHandle>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .filter(|n| seen.insert(n.clone()))
            .collect();
        attach::bind(&self.shared, registry, &names)
    }

    /// Stop broadcasting to `names`; their handles keep the last settings.
    /// Returns the names that were actually attached.
    pub fn detach<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        attach::detach(&self.shared, Some(&names))
    }

    pub fn detach_all(&self) -> Vec<String> {
        attach::detach(&self.shared, None)
    }

    /// Attached logger names, sorted
    pub fn attached_names(&self) -> Vec<String> {
        attach::attached_names(&self.shared)
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.attached_names().iter().any(|n| n == name)
    }

    /// Write the current settings and attached names; the format follows
    /// the file extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = ConfigFile::from_params(self.settings().to_params(), self.attached_names());
        file.save(path)
    }

    /// Read a config written by [`LoggerConfig::save`] (or by hand). A
    /// `preset` key must name a built-in preset; the `loggers` list is not
    /// applied here.
    pub fn load(path: &Path) -> Result<Self> {
        let (preset, params, _) = ConfigFile::load(path)?.into_parts();
        let base = match preset {
            Some(name) => name.parse::<BuiltinPreset>()?.settings(),
            None => LoggerSettings::default(),
        };
        Ok(Self::from_settings(base.with_overrides(&params)?))
    }
}

impl Clone for LoggerConfig {
    fn clone(&self) -> Self {
        Self::from_settings(self.settings())
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::from_settings(LoggerSettings::default())
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("id", &self.shared.id)
            .field("settings", &self.settings())
            .field("attached", &self.attached_names())
            .finish()
    }
}
