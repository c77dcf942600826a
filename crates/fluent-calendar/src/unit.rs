//! Calendar units used to parameterize arithmetic, boundaries and diffs.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CalendarError;

pub const MONTHS_PER_QUARTER: i64 = 3;
pub const MONTHS_PER_YEAR: i64 = 12;
pub const YEARS_PER_DECADE: i64 = 10;
pub const YEARS_PER_CENTURY: i64 = 100;
pub const DAYS_PER_WEEK: i64 = 7;
pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3600;
pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Decade,
    Century,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 10] = [
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
        TimeUnit::Week,
        TimeUnit::Month,
        TimeUnit::Quarter,
        TimeUnit::Year,
        TimeUnit::Decade,
        TimeUnit::Century,
    ];

    /// Singular name, also the key used in locale phrase tables.
    pub fn name(self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
            TimeUnit::Quarter => "quarter",
            TimeUnit::Year => "year",
            TimeUnit::Decade => "decade",
            TimeUnit::Century => "century",
        }
    }

    /// Length in months for month-based units.
    pub fn months(self) -> Option<i64> {
        match self {
            TimeUnit::Month => Some(1),
            TimeUnit::Quarter => Some(MONTHS_PER_QUARTER),
            TimeUnit::Year => Some(MONTHS_PER_YEAR),
            TimeUnit::Decade => Some(MONTHS_PER_YEAR * YEARS_PER_DECADE),
            TimeUnit::Century => Some(MONTHS_PER_YEAR * YEARS_PER_CENTURY),
            _ => None,
        }
    }

    /// Fixed length in seconds for sub-day units.
    pub fn seconds(self) -> Option<i64> {
        match self {
            TimeUnit::Second => Some(1),
            TimeUnit::Minute => Some(SECONDS_PER_MINUTE),
            TimeUnit::Hour => Some(SECONDS_PER_HOUR),
            _ => None,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => TimeUnit::Second,
            "min" | "mins" | "minute" | "minutes" => TimeUnit::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => TimeUnit::Hour,
            "d" | "day" | "days" => TimeUnit::Day,
            "w" | "wk" | "wks" | "week" | "weeks" => TimeUnit::Week,
            "month" | "months" => TimeUnit::Month,
            "quarter" | "quarters" => TimeUnit::Quarter,
            "y" | "year" | "years" => TimeUnit::Year,
            "decade" | "decades" => TimeUnit::Decade,
            "century" | "centuries" => TimeUnit::Century,
            _ => {
                return Err(CalendarError::InvalidArgument(format!(
                    "unknown time unit '{s}'"
                )))
            }
        };
        Ok(unit)
    }
}
