//! # fluent-calendar
//!
//! Fluent, timezone-aware date/time values.
//!
//! A [`Moment`] is an immutable instant plus an IANA timezone. Every
//! operation returns a new value: calendar arithmetic with configurable
//! month overflow, period boundaries, comparisons, calendar-aware
//! differences, localized human-readable differences and a small
//! relative-phrase language (`"next monday at noon"`).
//!
//! Settings that would otherwise be global (frozen test clock, default
//! timezone, locale, week rules, month overflow) live in a [`Context`] that
//! each moment carries.
//!
//! ```
//! use fluent_calendar::{Components, Context};
//!
//! let ctx = Context::new().with_timezone("America/Toronto").unwrap();
//! let m = ctx.create(Components::date(2023, 1, 31), None).unwrap();
//! assert_eq!(m.add_month().to_date_string(), "2023-03-03");
//! assert_eq!(m.add_months_no_overflow(1).to_date_string(), "2023-02-28");
//! ```
//!
//! ## Modules
//!
//! - [`context`]: Configuration and construction (`now`, `create`, `parse`, …)
//! - [`moment`]: The value type: accessors, setters, formatting, comparison
//! - [`arithmetic`]: Adding and subtracting units, weekday arithmetic
//! - [`boundary`]: Start/end of periods, nth weekday, next/previous
//! - [`diff`]: Differences, filtered differences, `diff_for_humans`
//! - [`relative`]: Relative phrase evaluation
//! - [`lang`]: Embedded locale tables and plural rules
//! - [`calendar`]: Date helpers on plain `NaiveDate`s
//! - [`zone`]: Timezone parsing and local-time resolution
//! - [`format`]: Named output formats
//! - [`unit`]: Time units and constants
//! - [`error`]: Error types

pub mod arithmetic;
pub mod boundary;
pub mod calendar;
pub mod context;
pub mod diff;
pub mod error;
pub mod format;
pub mod lang;
pub mod moment;
pub mod relative;
pub mod unit;
pub mod zone;

pub use chrono::Weekday;
pub use chrono_tz::Tz;
pub use context::{Components, Context, WeekRules, WeekdaySet};
pub use diff::{CalendarInterval, Period};
pub use error::{CalendarError, ParseErrors, Result};
pub use lang::Locale;
pub use moment::{Field, Moment};
pub use relative::has_relative_keywords;
pub use unit::TimeUnit;
