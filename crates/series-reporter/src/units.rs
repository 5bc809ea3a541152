use std::str::FromStr;

use derive_more::Display;
use thiserror::Error;

/// Unit used to express converted rates and durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TimeUnit {
    #[display("nanoseconds")]
    Nanoseconds,
    #[display("microseconds")]
    Microseconds,
    #[display("milliseconds")]
    Milliseconds,
    #[display("seconds")]
    Seconds,
    #[display("minutes")]
    Minutes,
    #[display("hours")]
    Hours,
    #[display("days")]
    Days,
}

impl TimeUnit {
    /// Length of one unit in nanoseconds.
    pub fn as_nanos_f64(self) -> f64 {
        match self {
            TimeUnit::Nanoseconds => 1.0,
            TimeUnit::Microseconds => 1e3,
            TimeUnit::Milliseconds => 1e6,
            TimeUnit::Seconds => 1e9,
            TimeUnit::Minutes => 60.0 * 1e9,
            TimeUnit::Hours => 3_600.0 * 1e9,
            TimeUnit::Days => 86_400.0 * 1e9,
        }
    }

    /// Length of one unit in seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.as_nanos_f64() / 1e9
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown time unit `{0}`")]
pub struct UnknownTimeUnit(pub String);

impl FromStr for TimeUnit {
    type Err = UnknownTimeUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ns" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            "us" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ms" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "seconds" => Ok(TimeUnit::Seconds),
            "m" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hours" => Ok(TimeUnit::Hours),
            "d" | "days" => Ok(TimeUnit::Days),
            _ => Err(UnknownTimeUnit(s.to_string())),
        }
    }
}
