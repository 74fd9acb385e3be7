use std::fmt;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for schedule parameters that cannot describe a real trigger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid time of day {hour}:{minute}:{second}")]
    InvalidTime { hour: i64, minute: i64, second: i64 },

    #[error("repeat interval must be positive")]
    InvalidInterval,
}

/// Wall-clock time of day a daily notification fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDailyTime")]
pub struct DailyTime {
    hour: u8,
    minute: u8,
    second: u8,
}

/// Unvalidated form used when decoding. Missing minute/second read as zero.
#[derive(Deserialize)]
struct RawDailyTime {
    hour: i64,
    #[serde(default)]
    minute: i64,
    #[serde(default)]
    second: i64,
}

impl TryFrom<RawDailyTime> for DailyTime {
    type Error = ScheduleError;

    fn try_from(raw: RawDailyTime) -> Result<Self, Self::Error> {
        DailyTime::new(raw.hour, raw.minute, raw.second)
    }
}

impl DailyTime {
    pub fn new(hour: i64, minute: i64, second: i64) -> Result<Self, ScheduleError> {
        if !(0..24).contains(&hour) || !(0..60).contains(&minute) || !(0..60).contains(&second) {
            return Err(ScheduleError::InvalidTime {
                hour,
                minute,
                second,
            });
        }

        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), self.second.into())
            .unwrap_or(NaiveTime::MIN)
    }

    /// First occurrence of this time of day strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.as_naive_time());
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// How an identifier's notification repeats.
///
/// One-shot and delayed notifications have no recurrence and are never
/// stored; an absent entry is the third case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceConfig {
    /// Fires every day at a wall-clock time
    DailyAt(DailyTime),
    /// Fires every `seconds` seconds
    RepeatingInterval { seconds: u64 },
}

impl RecurrenceConfig {
    pub fn daily(time: DailyTime) -> Self {
        Self::DailyAt(time)
    }

    pub fn repeating(seconds: u64) -> Result<Self, ScheduleError> {
        if seconds == 0 {
            return Err(ScheduleError::InvalidInterval);
        }
        Ok(Self::RepeatingInterval { seconds })
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        match self {
            Self::DailyAt(_) => Ok(()),
            Self::RepeatingInterval { seconds: 0 } => Err(ScheduleError::InvalidInterval),
            Self::RepeatingInterval { .. } => Ok(()),
        }
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DailyAt(_) => "daily",
            Self::RepeatingInterval { .. } => "interval",
        }
    }
}
