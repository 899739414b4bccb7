//! Rotation and retention expression parsing
//!
//! Turns human expressions such as `"10 MB"`, `"1 day"`, `"00:00"`,
//! `"friday at 18:00"` or `"daily"` into concrete trigger rules. Parsing is
//! case-insensitive and never falls back to a default: anything that does not
//! match the grammar is an [`Error::InvalidRotationExpression`].

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::naming::NamingTemplate;

pub const KIB: u64 = 1024;
pub const MIB: u64 = KIB * 1024;
pub const GIB: u64 = MIB * 1024;
pub const TIB: u64 = GIB * 1024;

pub const MINUTE: u64 = 60;
pub const HOUR: u64 = 60 * MINUTE;
pub const DAY: u64 = 24 * HOUR;
pub const WEEK: u64 = 7 * DAY;
pub const MONTH: u64 = 30 * DAY;
pub const YEAR: u64 = 365 * DAY;

/// Longest interval or age an expression may describe
pub const MAX_INTERVAL: u64 = 100 * YEAR;

static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*(b|bytes?|kb|kib|mb|mib|gb|gib|tb|tib)$")
        .expect("Invalid size regex")
});

static INTERVAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(every\s+)?(\d+(?:\.\d+)?)?\s*(s|secs?|seconds?|min|mins|minutes?|h|hrs?|hours?|d|days?|w|weeks?|months?|years?)$",
    )
    .expect("Invalid interval regex")
});

static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:at\s+)?(\d{1,2}):(\d{2})$").expect("Invalid clock regex"));

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:every\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|wed|thu|fri|sat|sun)(?:\s+at\s+(\d{1,2}):(\d{2}))?$",
    )
    .expect("Invalid weekday regex")
});

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^day\s+(\d{1,2})\s+of\s+(?:the\s+)?month(?:\s+at\s+(\d{1,2}):(\d{2}))?$")
        .expect("Invalid month day regex")
});

static COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\s*files?)?$").expect("Invalid count regex"));

/// Normalized condition that rolls a sink over to a new file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationRule {
    /// Active file reached this many bytes
    Size { threshold_bytes: u64 },
    /// Every day at a fixed wall-clock time
    Clock { hour: u32, minute: u32 },
    /// Every week on a given day and time
    Weekday { day: Weekday, hour: u32, minute: u32 },
    /// Fixed interval since the active file was opened
    Interval { seconds: u64 },
    /// Every month on a given day (1-28) and time
    MonthDay { day: u32, hour: u32, minute: u32 },
}

impl RotationRule {
    pub fn kind(&self) -> &'static str {
        match self {
            RotationRule::Size { .. } => "size",
            RotationRule::Clock { .. } => "clock",
            RotationRule::Weekday { .. } => "weekday",
            RotationRule::Interval { .. } => "interval",
            RotationRule::MonthDay { .. } => "month_day",
        }
    }

    pub fn is_time_based(&self) -> bool {
        !matches!(self, RotationRule::Size { .. })
    }

    /// Next rollover instant strictly after `after`, for time-based rules
    pub fn next_trigger(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            RotationRule::Size { .. } => None,
            RotationRule::Interval { seconds } => {
                let step = Duration::try_seconds(i64::try_from(seconds).ok()?)?;
                after.checked_add_signed(step)
            }
            RotationRule::Clock { hour, minute } => {
                let candidate = after.date().and_hms_opt(hour, minute, 0)?;
                if candidate > after {
                    Some(candidate)
                } else {
                    candidate.checked_add_signed(Duration::days(1))
                }
            }
            RotationRule::Weekday { day, hour, minute } => {
                let ahead = (7 + day.num_days_from_monday() as i64
                    - after.weekday().num_days_from_monday() as i64)
                    % 7;
                let candidate = after
                    .date()
                    .checked_add_signed(Duration::days(ahead))?
                    .and_hms_opt(hour, minute, 0)?;
                if candidate > after {
                    Some(candidate)
                } else {
                    candidate.checked_add_signed(Duration::days(7))
                }
            }
            RotationRule::MonthDay { day, hour, minute } => {
                let date = after.date();
                let candidate =
                    NaiveDate::from_ymd_opt(date.year(), date.month(), day)?.and_hms_opt(hour, minute, 0)?;
                if candidate > after {
                    return Some(candidate);
                }
                let (year, month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
            }
        }
    }
}

impl fmt::Display for RotationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RotationRule::Size { threshold_bytes } => write!(f, "{}", format_size(threshold_bytes)),
            RotationRule::Clock { hour, minute } => write!(f, "{:02}:{:02}", hour, minute),
            RotationRule::Weekday { day, hour, minute } => {
                write!(f, "{} at {:02}:{:02}", weekday_name(day), hour, minute)
            }
            RotationRule::Interval { seconds } => write!(f, "{}", format_duration(seconds)),
            RotationRule::MonthDay { day, hour, minute } => {
                write!(f, "day {} of month at {:02}:{:02}", day, hour, minute)
            }
        }
    }
}

/// Named rotation recipes carrying their own file naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPreset {
    Daily,
    Hourly,
    Weekly,
    Monthly,
    Minute,
    Detailed,
    Simple,
}

impl RotationPreset {
    pub const ALL: [RotationPreset; 7] = [
        RotationPreset::Daily,
        RotationPreset::Hourly,
        RotationPreset::Weekly,
        RotationPreset::Monthly,
        RotationPreset::Minute,
        RotationPreset::Detailed,
        RotationPreset::Simple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationPreset::Daily => "daily",
            RotationPreset::Hourly => "hourly",
            RotationPreset::Weekly => "weekly",
            RotationPreset::Monthly => "monthly",
            RotationPreset::Minute => "minute",
            RotationPreset::Detailed => "detailed",
            RotationPreset::Simple => "simple",
        }
    }

    pub fn rule(&self) -> RotationRule {
        match self {
            RotationPreset::Daily => RotationRule::Clock { hour: 0, minute: 0 },
            RotationPreset::Hourly => RotationRule::Interval { seconds: HOUR },
            RotationPreset::Weekly => RotationRule::Weekday {
                day: Weekday::Mon,
                hour: 0,
                minute: 0,
            },
            RotationPreset::Monthly => RotationRule::MonthDay {
                day: 1,
                hour: 0,
                minute: 0,
            },
            RotationPreset::Minute => RotationRule::Interval { seconds: MINUTE },
            RotationPreset::Detailed | RotationPreset::Simple => RotationRule::Size {
                threshold_bytes: 20 * MIB,
            },
        }
    }

    pub fn naming(&self) -> NamingTemplate {
        match self {
            RotationPreset::Daily => {
                NamingTemplate::new("[{name}]daily_latest.temp.log", "[{name}]{YYYYMMDD}.log")
            }
            RotationPreset::Hourly => {
                NamingTemplate::new("[{name}]hourly_latest.temp.log", "[{name}]{YYYYMMDD}_{HH}.log")
            }
            RotationPreset::Weekly => {
                NamingTemplate::new("[{name}]weekly_latest.temp.log", "[{name}]week_{YYYY}W{WW}.log")
            }
            RotationPreset::Monthly => {
                NamingTemplate::new("[{name}]monthly_latest.temp.log", "[{name}]{YYYYMM}.log")
            }
            RotationPreset::Minute => {
                NamingTemplate::new("[{name}]minute_latest.temp.log", "[{name}]{YYYYMMDD}_{HHMM}.log")
            }
            RotationPreset::Detailed => {
                NamingTemplate::new("[{name}]latest.temp.log", "[{name}]{timestamp}.log")
            }
            RotationPreset::Simple => NamingTemplate::new("{name}.log", "{name}.{timestamp}.log"),
        }
    }

    /// Retention that goes with the preset when none is given
    pub fn default_retention(&self) -> RetentionRule {
        let seconds = match self {
            RotationPreset::Daily => 30 * DAY,
            RotationPreset::Hourly => 7 * DAY,
            RotationPreset::Weekly => 12 * WEEK,
            RotationPreset::Monthly => 12 * MONTH,
            RotationPreset::Minute => 24 * HOUR,
            RotationPreset::Detailed | RotationPreset::Simple => 30 * DAY,
        };
        RetentionRule::MaxAge { seconds }
    }
}

impl FromStr for RotationPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "daily" => Ok(RotationPreset::Daily),
            "hourly" => Ok(RotationPreset::Hourly),
            "weekly" => Ok(RotationPreset::Weekly),
            "monthly" => Ok(RotationPreset::Monthly),
            "minute" => Ok(RotationPreset::Minute),
            "detailed" => Ok(RotationPreset::Detailed),
            "simple" => Ok(RotationPreset::Simple),
            _ => Err(Error::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for RotationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed rotation expression: the trigger plus the preset it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationSpec {
    pub rule: RotationRule,
    pub preset: Option<RotationPreset>,
}

impl RotationSpec {
    pub fn from_rule(rule: RotationRule) -> Self {
        Self { rule, preset: None }
    }

    /// Naming pair implied by the preset, if any
    pub fn naming(&self) -> Option<NamingTemplate> {
        self.preset.map(|p| p.naming())
    }
}

impl From<RotationPreset> for RotationSpec {
    fn from(preset: RotationPreset) -> Self {
        Self {
            rule: preset.rule(),
            preset: Some(preset),
        }
    }
}

impl FromStr for RotationSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(preset) = s.parse::<RotationPreset>() {
            return Ok(preset.into());
        }
        parse(s).map(RotationSpec::from_rule)
    }
}

impl fmt::Display for RotationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.preset {
            Some(preset) => write!(f, "{}", preset),
            None => write!(f, "{}", self.rule),
        }
    }
}

impl Serialize for RotationSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RotationSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a rotation expression into a trigger rule
pub fn parse(expression: &str) -> Result<RotationRule> {
    let invalid = || Error::InvalidRotationExpression(expression.to_string());
    let expr = normalize(expression);
    if expr.is_empty() {
        return Err(invalid());
    }

    if let Ok(preset) = expr.parse::<RotationPreset>() {
        return Ok(preset.rule());
    }

    if let Some(caps) = SIZE_RE.captures(&expr) {
        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let bytes = scaled(value, size_unit(&caps[2]), i64::MAX as u64).ok_or_else(invalid)?;
        return Ok(RotationRule::Size {
            threshold_bytes: bytes,
        });
    }

    match expr.as_str() {
        "midnight" => return Ok(RotationRule::Clock { hour: 0, minute: 0 }),
        "noon" => return Ok(RotationRule::Clock { hour: 12, minute: 0 }),
        _ => {}
    }

    if let Some(caps) = CLOCK_RE.captures(&expr) {
        let (hour, minute) = clock(&caps[1], &caps[2]).ok_or_else(invalid)?;
        return Ok(RotationRule::Clock { hour, minute });
    }

    if let Some(caps) = WEEKDAY_RE.captures(&expr) {
        let day: Weekday = caps[1].parse().map_err(|_| invalid())?;
        let (hour, minute) = match (caps.get(2), caps.get(3)) {
            (Some(h), Some(m)) => clock(h.as_str(), m.as_str()).ok_or_else(invalid)?,
            _ => (0, 0),
        };
        return Ok(RotationRule::Weekday { day, hour, minute });
    }

    if let Some(caps) = MONTH_DAY_RE.captures(&expr) {
        let day: u32 = caps[1].parse().map_err(|_| invalid())?;
        if !(1..=28).contains(&day) {
            return Err(invalid());
        }
        let (hour, minute) = match (caps.get(2), caps.get(3)) {
            (Some(h), Some(m)) => clock(h.as_str(), m.as_str()).ok_or_else(invalid)?,
            _ => (0, 0),
        };
        return Ok(RotationRule::MonthDay { day, hour, minute });
    }

    let seconds = interval_seconds(&expr, true).ok_or_else(invalid)?;
    Ok(RotationRule::Interval { seconds })
}

/// How long, or how many, rotated files to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetentionRule {
    MaxAge { seconds: u64 },
    MaxCount(usize),
}

impl RetentionRule {
    pub fn kind(&self) -> &'static str {
        match self {
            RetentionRule::MaxAge { .. } => "max_age",
            RetentionRule::MaxCount(_) => "max_count",
        }
    }

    pub fn max_age(&self) -> Option<std::time::Duration> {
        match *self {
            RetentionRule::MaxAge { seconds } => Some(std::time::Duration::from_secs(seconds)),
            RetentionRule::MaxCount(_) => None,
        }
    }
}

impl FromStr for RetentionRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRotationExpression(s.to_string());
        let expr = normalize(s);

        if let Some(caps) = COUNT_RE.captures(&expr) {
            let count: usize = caps[1].parse().map_err(|_| invalid())?;
            if count == 0 {
                return Err(invalid());
            }
            return Ok(RetentionRule::MaxCount(count));
        }

        let seconds = interval_seconds(&expr, false).ok_or_else(invalid)?;
        Ok(RetentionRule::MaxAge { seconds })
    }
}

impl fmt::Display for RetentionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RetentionRule::MaxAge { seconds } => write!(f, "{}", format_duration(seconds)),
            RetentionRule::MaxCount(1) => write!(f, "1 file"),
            RetentionRule::MaxCount(n) => write!(f, "{} files", n),
        }
    }
}

impl Serialize for RetentionRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RetentionRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn size_unit(unit: &str) -> u64 {
    match unit {
        "kb" | "kib" => KIB,
        "mb" | "mib" => MIB,
        "gb" | "gib" => GIB,
        "tb" | "tib" => TIB,
        _ => 1,
    }
}

fn time_unit(unit: &str) -> u64 {
    match unit.trim_end_matches('s') {
        "" | "sec" | "second" => 1,
        "min" | "minute" => MINUTE,
        "h" | "hr" | "hour" => HOUR,
        "d" | "day" => DAY,
        "w" | "week" => WEEK,
        "month" => MONTH,
        "year" => YEAR,
        _ => 0,
    }
}

fn interval_seconds(expr: &str, allow_every: bool) -> Option<u64> {
    let caps = INTERVAL_RE.captures(expr)?;
    let every = caps.get(1).is_some();
    if every && !allow_every {
        return None;
    }
    let unit = &caps[3];
    let value: f64 = match caps.get(2) {
        Some(n) => n.as_str().parse().ok()?,
        // a lone "s" or "h" reads as noise, not "1 second"
        None if !every && unit.len() == 1 => return None,
        None => 1.0,
    };
    scaled(value, time_unit(unit), MAX_INTERVAL)
}

/// `value * unit` as a whole number in `1..=max`
fn scaled(value: f64, unit: u64, max: u64) -> Option<u64> {
    let product = (value * unit as f64).trunc();
    if !product.is_finite() || product < 1.0 || product > max as f64 {
        return None;
    }
    Some(product as u64)
}

fn clock(hour: &str, minute: &str) -> Option<(u32, u32)> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Human form of a byte count that parses back to the same value
pub fn format_size(bytes: u64) -> String {
    for (unit, name) in [(TIB, "TB"), (GIB, "GB"), (MIB, "MB"), (KIB, "KB")] {
        if bytes >= unit && bytes % unit == 0 {
            return format!("{} {}", bytes / unit, name);
        }
    }
    format!("{} B", bytes)
}

/// Human form of a second count that parses back to the same value
pub fn format_duration(seconds: u64) -> String {
    for (unit, name) in [(WEEK, "week"), (DAY, "day"), (HOUR, "hour"), (MINUTE, "minute")] {
        if seconds >= unit && seconds % unit == 0 {
            let n = seconds / unit;
            return if n == 1 {
                format!("1 {}", name)
            } else {
                format!("{} {}s", n, name)
            };
        }
    }
    if seconds == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", seconds)
    }
}
