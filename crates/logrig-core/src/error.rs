//! Error types for logrig

use std::path::PathBuf;

/// logrig error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unparsable rotation, retention or compression expression
    #[error("Invalid rotation expression: '{0}'")]
    InvalidRotationExpression(String),

    #[error("Invalid level: '{0}'")]
    InvalidLevel(String),

    #[error("Invalid value for '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Preset already exists: {0}")]
    PresetAlreadyExists(String),

    #[error("Logger handle unavailable: {0}")]
    HandleUnavailable(String),

    #[error("Sink I/O failure for '{name}': {source}")]
    SinkIo {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for logrig
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    /// Tag a validation error with the config field it came from
    pub fn field(field: &'static str, source: Error) -> Self {
        Error::InvalidField {
            field,
            source: Box::new(source),
        }
    }

    pub fn sink_io<S: Into<String>>(name: S, source: std::io::Error) -> Self {
        Error::SinkIo {
            name: name.into(),
            source,
        }
    }

    /// Field name for field-tagged validation errors
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            Error::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The innermost error, looking through field tags
    pub fn root(&self) -> &Error {
        match self {
            Error::InvalidField { source, .. } => source.root(),
            other => other,
        }
    }
}
