//! logrig core - shared types, rotation parsing, configuration and error handling

pub mod config;
pub mod constants;
pub mod error;
pub mod naming;
pub mod rotation;
pub mod settings;
pub mod types;

pub use config::{ConfigFile, ConfigFormat};
pub use error::{Error, Result};
pub use naming::NamingTemplate;
pub use rotation::{RetentionRule, RotationPreset, RotationRule, RotationSpec};
pub use settings::{ConfigParams, LoggerSettings};
pub use types::{Compression, Expression, Level};
