//! Rotation policies and the clock they are evaluated against

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Interval for time-triggered rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RotateWhen {
    Second,
    Minute,
    Hour,
    /// 24 hours after the file was opened
    Day,
    /// At the next local-day boundary
    #[default]
    Midnight,
}

impl RotateWhen {
    /// Short config name (`S`, `M`, `H`, `D`, `MIDNIGHT`)
    pub fn as_str(&self) -> &'static str {
        match self {
            RotateWhen::Second => "S",
            RotateWhen::Minute => "M",
            RotateWhen::Hour => "H",
            RotateWhen::Day => "D",
            RotateWhen::Midnight => "MIDNIGHT",
        }
    }

    /// `strftime` pattern for the suffix of a rotated-out file
    pub fn suffix_format(&self) -> &'static str {
        match self {
            RotateWhen::Second => "%Y-%m-%d_%H-%M-%S",
            RotateWhen::Minute => "%Y-%m-%d_%H-%M",
            RotateWhen::Hour => "%Y-%m-%d_%H",
            RotateWhen::Day | RotateWhen::Midnight => "%Y-%m-%d",
        }
    }

    /// The rollover boundary for a segment opened at `opened_at`
    pub fn next_rollover(&self, opened_at: DateTime<Local>) -> DateTime<Local> {
        match self {
            RotateWhen::Second => opened_at + Duration::seconds(1),
            RotateWhen::Minute => opened_at + Duration::minutes(1),
            RotateWhen::Hour => opened_at + Duration::hours(1),
            RotateWhen::Day => opened_at + Duration::days(1),
            RotateWhen::Midnight => next_local_midnight(opened_at),
        }
    }
}

fn next_local_midnight(from: DateTime<Local>) -> DateTime<Local> {
    from.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        // a DST jump can swallow 00:00; earliest() picks the first valid instant
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or_else(|| from + Duration::days(1))
}

impl fmt::Display for RotateWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotateWhen {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" | "SECOND" => Ok(RotateWhen::Second),
            "M" | "MINUTE" => Ok(RotateWhen::Minute),
            "H" | "HOUR" => Ok(RotateWhen::Hour),
            "D" | "DAY" => Ok(RotateWhen::Day),
            "MIDNIGHT" => Ok(RotateWhen::Midnight),
            _ => Err(ConfigurationError::UnrecognizedRotateWhen(s.to_string())),
        }
    }
}

impl TryFrom<String> for RotateWhen {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RotateWhen> for String {
    fn from(when: RotateWhen) -> Self {
        when.as_str().to_string()
    }
}

/// When a rotating file destination starts a new segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Rotate before a write that would push the file past `max_bytes`
    SizeTriggered { max_bytes: u64 },
    /// Rotate before the first write at or after the rollover boundary
    TimeTriggered { interval: RotateWhen },
}

impl RotationPolicy {
    /// Size-triggered policy; `max_bytes` must be positive
    pub fn size(max_bytes: u64) -> Result<Self, ConfigurationError> {
        if max_bytes == 0 {
            return Err(ConfigurationError::InvalidMaxBytes);
        }
        Ok(RotationPolicy::SizeTriggered { max_bytes })
    }

    pub fn time(interval: RotateWhen) -> Self {
        RotationPolicy::TimeTriggered { interval }
    }

    /// Whether a write of `incoming` bytes at `now` must be preceded by a rotation
    pub fn is_due(
        &self,
        size_bytes: u64,
        opened_at: DateTime<Local>,
        incoming: u64,
        now: DateTime<Local>,
    ) -> bool {
        match self {
            RotationPolicy::SizeTriggered { max_bytes } => {
                size_bytes.saturating_add(incoming) > *max_bytes
            }
            RotationPolicy::TimeTriggered { interval } => now >= interval.next_rollover(opened_at),
        }
    }
}

/// Source of "now" for rotation decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        if let Ok(mut current) = self.now.lock() {
            *current = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut current) = self.now.lock() {
            *current = *current + by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
