//! Core types for logrig

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Success,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Whether a record at `record` passes a sink filtered at `self`
    pub fn allows(&self, record: Level) -> bool {
        record >= *self
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "success" => Ok(Level::Success),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Codec applied to rotated files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "off" | "false" => Ok(Compression::None),
            "gzip" | "gz" | "on" | "true" => Ok(Compression::Gzip),
            _ => Err(Error::InvalidRotationExpression(s.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rotation or retention value as written by the user: text, or a bare number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Number(u64),
    Text(String),
}

impl Expression {
    /// Textual form handed to the parser
    pub fn as_text(&self) -> String {
        match self {
            Expression::Number(n) => n.to_string(),
            Expression::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::Text(s.to_string())
    }
}

impl From<String> for Expression {
    fn from(s: String) -> Self {
        Expression::Text(s)
    }
}

impl From<u64> for Expression {
    fn from(n: u64) -> Self {
        Expression::Number(n)
    }
}

impl From<u32> for Expression {
    fn from(n: u32) -> Self {
        Expression::Number(n as u64)
    }
}

impl From<usize> for Expression {
    fn from(n: usize) -> Self {
        Expression::Number(n as u64)
    }
}
