//! logrig - reusable logger configurations
//!
//! A [`LoggerConfig`] holds validated sink parameters (level, path,
//! rotation, retention, compression, format, naming). Attach it to any
//! number of named loggers in a [`LoggerRegistry`] with
//! [`LoggerConfig::apply_to`]; a later [`LoggerConfig::update`] reaches all
//! of them before it returns.
//!
//! ```no_run
//! use logrig::{ConfigParams, ConfigTemplates, LoggerRegistry};
//!
//! # fn main() -> logrig::Result<()> {
//! let registry = LoggerRegistry::new();
//! let config = ConfigTemplates::development();
//! config.apply_to(&registry, ["api", "db"])?;
//! config.update(ConfigParams::new().level("INFO").rotation("20 MB"))?;
//! # Ok(())
//! # }
//! ```

mod attach;
mod config;
mod event;
mod presets;
mod registry;

pub use config::LoggerConfig;
pub use event::LoggerEvent;
pub use presets::{BuiltinPreset, ConfigTemplates, LoadedConfig, PresetCatalog};
pub use registry::LoggerRegistry;

pub use logrig_core::rotation::parse as parse_rotation;
pub use logrig_core::{
    Compression, ConfigFile, ConfigFormat, ConfigParams, Error, Expression, Level, LoggerSettings,
    NamingTemplate, Result, RetentionRule, RotationPreset, RotationRule, RotationSpec,
};
pub use logrig_events::{Event, EventBus, Subscription, WILDCARD};
pub use logrig_logs::{Fields, LoggerHandle};
