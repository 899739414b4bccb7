//! Lifecycle events published on a registry's bus

use logrig_events::Event;
use logrig_logs::LoggerHandle;

/// Something happened to a named logger
#[derive(Debug, Clone)]
pub enum LoggerEvent {
    /// The registry constructed a new handle
    Registered { name: String, handle: LoggerHandle },
    /// A config was bound to the name
    Bound { name: String, config_id: u64 },
    /// A config update reached the handle
    Updated { name: String, handle: LoggerHandle },
    /// The name was detached from its config; the handle keeps its settings
    Detached { name: String, config_id: u64 },
    /// The handle was closed and removed from the registry
    Unregistered { name: String },
}

impl LoggerEvent {
    pub fn name(&self) -> &str {
        match self {
            LoggerEvent::Registered { name, .. }
            | LoggerEvent::Bound { name, .. }
            | LoggerEvent::Updated { name, .. }
            | LoggerEvent::Detached { name, .. }
            | LoggerEvent::Unregistered { name } => name,
        }
    }
}

impl Event for LoggerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LoggerEvent::Registered { .. } => "registered",
            LoggerEvent::Bound { .. } => "bound",
            LoggerEvent::Updated { .. } => "updated",
            LoggerEvent::Detached { .. } => "detached",
            LoggerEvent::Unregistered { .. } => "unregistered",
        }
    }
}
