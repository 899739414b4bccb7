//! Logger parameters: raw overrides and their validated, normalized form

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::constants::{self, *};
use crate::error::{Error, Result};
use crate::naming::NamingTemplate;
use crate::rotation::{RetentionRule, RotationRule, RotationSpec};
use crate::types::{Compression, Expression, Level};

/// Optional overrides for every logger parameter, as written by a caller or a
/// config file. Nothing here is validated until it becomes [`LoggerSettings`].
///
/// Empty strings clear the optional text fields (`path`, `component_name`,
/// `subdirectory`, `active_name`, `rotated_name`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, alias = "log_path", skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Integer rotation is a size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Expression>,
    /// Integer retention is a file count
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

impl ConfigParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides from the `LOGRIG_*` process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overrides from an arbitrary key lookup using the `LOGRIG_*` names
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            level: get(ENV_LEVEL),
            path: get(ENV_PATH).map(PathBuf::from),
            rotation: get(ENV_ROTATION).map(Expression::Text),
            retention: get(ENV_RETENTION).map(Expression::Text),
            compression: get(ENV_COMPRESSION),
            format: get(ENV_FORMAT),
            ..Self::default()
        }
    }

    /// Overrides from a plain map, e.g. one loaded from a `.env` file
    pub fn from_map(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn rotation(mut self, rotation: impl Into<Expression>) -> Self {
        self.rotation = Some(rotation.into());
        self
    }

    pub fn retention(mut self, retention: impl Into<Expression>) -> Self {
        self.retention = Some(retention.into());
        self
    }

    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn component_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = Some(name.into());
        self
    }

    pub fn subdirectory(mut self, subdirectory: impl Into<String>) -> Self {
        self.subdirectory = Some(subdirectory.into());
        self
    }

    pub fn active_name(mut self, template: impl Into<String>) -> Self {
        self.active_name = Some(template.into());
        self
    }

    pub fn rotated_name(mut self, template: impl Into<String>) -> Self {
        self.rotated_name = Some(template.into());
        self
    }

    pub fn proxy(mut self, proxy: bool) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn auto_clean(mut self, auto_clean: bool) -> Self {
        self.auto_clean = Some(auto_clean);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    pub fn merged(mut self, overrides: &ConfigParams) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if overrides.$field.is_some() {
                    self.$field = overrides.$field.clone();
                })*
            };
        }
        take!(
            level,
            path,
            rotation,
            retention,
            compression,
            format,
            component_name,
            subdirectory,
            active_name,
            rotated_name,
            proxy,
            auto_clean
        );
        self
    }
}

/// Validated logger parameters. Every rotation and retention value here is a
/// concrete rule; invalid input never gets this far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    pub level: Level,
    pub path: Option<PathBuf>,
    pub rotation: RotationSpec,
    pub retention: RetentionRule,
    pub compression: Compression,
    pub format: String,
    pub component_name: Option<String>,
    pub subdirectory: Option<String>,
    /// Custom active file template, overriding the rotation preset's
    pub active_name: Option<String>,
    /// Custom rotated file template, overriding the rotation preset's
    pub rotated_name: Option<String>,
    /// Defer formatting and I/O to an asynchronous queue
    pub proxy: bool,
    pub auto_clean: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: Level::Info,
            path: None,
            rotation: RotationSpec::from_rule(RotationRule::Size {
                threshold_bytes: 20 * 1024 * 1024,
            }),
            retention: RetentionRule::MaxAge {
                seconds: 30 * 24 * 60 * 60,
            },
            compression: Compression::None,
            format: DEFAULT_FORMAT.to_string(),
            component_name: None,
            subdirectory: None,
            active_name: None,
            rotated_name: None,
            proxy: false,
            auto_clean: false,
        }
    }
}

impl LoggerSettings {
    /// Build settings from defaults plus `params`
    pub fn from_params(params: &ConfigParams) -> Result<Self> {
        Self::default().with_overrides(params)
    }

    /// Validate `params` against a copy of `self`. `self` is untouched, so a
    /// failed override leaves no partial state behind.
    pub fn with_overrides(&self, params: &ConfigParams) -> Result<Self> {
        let mut next = self.clone();

        if let Some(level) = &params.level {
            next.level = level.parse().map_err(|e| Error::field("level", e))?;
        }
        if let Some(path) = &params.path {
            next.path = if path.as_os_str().is_empty() {
                None
            } else {
                Some(path.clone())
            };
        }
        if let Some(rotation) = &params.rotation {
            next.rotation = parse_rotation(rotation).map_err(|e| Error::field("rotation", e))?;
        }
        if let Some(retention) = &params.retention {
            next.retention = retention
                .as_text()
                .parse()
                .map_err(|e| Error::field("retention", e))?;
        }
        if let Some(compression) = &params.compression {
            next.compression = compression
                .parse()
                .map_err(|e| Error::field("compression", e))?;
        }
        if let Some(format) = &params.format {
            if !format.contains("{message}") {
                return Err(Error::field(
                    "format",
                    Error::config(format!("format '{}' must contain {{message}}", format)),
                ));
            }
            next.format = format.clone();
        }
        if let Some(name) = &params.component_name {
            if name.contains(['/', '\\']) {
                return Err(Error::field(
                    "component_name",
                    Error::config(format!("component name '{}' must not contain a path separator", name)),
                ));
            }
            next.component_name = non_empty(name);
        }
        if let Some(subdirectory) = &params.subdirectory {
            if !is_plain_relative(Path::new(subdirectory)) {
                return Err(Error::field(
                    "subdirectory",
                    Error::config(format!("subdirectory '{}' must be a relative path", subdirectory)),
                ));
            }
            next.subdirectory = non_empty(subdirectory);
        }
        if let Some(active) = &params.active_name {
            next.active_name = non_empty(active);
        }
        if let Some(rotated) = &params.rotated_name {
            next.rotated_name = non_empty(rotated);
        }
        if params.active_name.is_some() || params.rotated_name.is_some() {
            let naming = next.naming();
            naming.validate().map_err(|e| {
                let field = if params.rotated_name.is_some() {
                    "rotated_name"
                } else {
                    "active_name"
                };
                Error::field(field, e)
            })?;
        }
        if let Some(proxy) = params.proxy {
            next.proxy = proxy;
        }
        if let Some(auto_clean) = params.auto_clean {
            next.auto_clean = auto_clean;
        }

        Ok(next)
    }

    /// Effective naming pair: custom templates, else the rotation preset's,
    /// else the defaults
    pub fn naming(&self) -> NamingTemplate {
        let base = self
            .rotation
            .naming()
            .unwrap_or_else(|| NamingTemplate::new(DEFAULT_ACTIVE_NAME, DEFAULT_ROTATED_NAME));
        NamingTemplate {
            active: self.active_name.clone().unwrap_or(base.active),
            rotated: self.rotated_name.clone().unwrap_or(base.rotated),
        }
    }

    /// Name used in file names for a logger called `logger_name`
    pub fn component<'a>(&'a self, logger_name: &'a str) -> &'a str {
        self.component_name.as_deref().unwrap_or(logger_name)
    }

    /// Directory log files go to; `None` means console only
    pub fn log_dir(&self) -> Option<PathBuf> {
        let base = constants::expand_home(self.path.as_ref()?);
        Some(match &self.subdirectory {
            Some(sub) => base.join(sub),
            None => base,
        })
    }

    /// Full path of the active file for `logger_name`
    pub fn active_file(&self, logger_name: &str) -> Option<PathBuf> {
        let dir = self.log_dir()?;
        Some(dir.join(self.naming().active_file(self.component(logger_name))))
    }

    /// Whether switching from `self` to `other` needs a new file sink
    pub fn sink_differs(&self, other: &LoggerSettings, logger_name: &str) -> bool {
        self.active_file(logger_name) != other.active_file(logger_name)
    }

    /// Overrides that reproduce these settings exactly
    pub fn to_params(&self) -> ConfigParams {
        let retention = match self.retention {
            RetentionRule::MaxCount(n) => Expression::Number(n as u64),
            other => Expression::Text(other.to_string()),
        };
        ConfigParams {
            level: Some(self.level.to_string()),
            path: self.path.clone(),
            rotation: Some(Expression::Text(self.rotation.to_string())),
            retention: Some(retention),
            compression: Some(self.compression.to_string()),
            format: Some(self.format.clone()),
            component_name: self.component_name.clone(),
            subdirectory: self.subdirectory.clone(),
            active_name: self.active_name.clone(),
            rotated_name: self.rotated_name.clone(),
            proxy: Some(self.proxy),
            auto_clean: Some(self.auto_clean),
        }
    }
}

fn parse_rotation(expr: &Expression) -> Result<RotationSpec> {
    match expr {
        Expression::Number(0) => Err(Error::InvalidRotationExpression("0".to_string())),
        Expression::Number(bytes) => Ok(RotationSpec::from_rule(RotationRule::Size {
            threshold_bytes: *bytes,
        })),
        Expression::Text(text) => text.parse().map_err(|e| match e {
            Error::UnknownPreset(_) => Error::InvalidRotationExpression(text.clone()),
            other => other,
        }),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
