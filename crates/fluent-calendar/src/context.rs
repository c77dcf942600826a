//! Explicit configuration and construction.
//!
//! A [`Context`] holds what would otherwise be process-wide state: the frozen
//! test clock, the default timezone, the locale used for human-readable
//! differences, the week rules and the month-overflow policy. It is a small
//! `Copy` value; every [`Moment`] built from it carries a copy, so two
//! contexts never observe each other's settings.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{CalendarError, ParseErrors, Result};
use crate::format::DEFAULT_TO_STRING_FORMAT;
use crate::lang::{self, Locale};
use crate::moment::{Field, Moment};
use crate::relative;
use crate::unit::TimeUnit;
use crate::zone::{parse_timezone, resolve_local};

// ── Week rules ──────────────────────────────────────────────────────────────

/// A set of weekdays, stored as a bitmask indexed from Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new(days: &[Weekday]) -> Self {
        let mut set = WeekdaySet(0);
        for day in days {
            set.0 |= 1 << day.num_days_from_monday();
        }
        set
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Members in Monday..Sunday order.
    pub fn days(self) -> Vec<Weekday> {
        let mut day = Weekday::Mon;
        let mut out = Vec::new();
        for _ in 0..7 {
            if self.contains(day) {
                out.push(day);
            }
            day = day.succ();
        }
        out
    }
}

/// Which weekday opens and closes a week, and which days count as weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRules {
    pub starts_at: Weekday,
    pub ends_at: Weekday,
    pub weekend: WeekdaySet,
}

impl Default for WeekRules {
    fn default() -> Self {
        Self {
            starts_at: Weekday::Mon,
            ends_at: Weekday::Sun,
            weekend: WeekdaySet::new(&[Weekday::Sat, Weekday::Sun]),
        }
    }
}

// ── Components ──────────────────────────────────────────────────────────────

/// Optional calendar fields for [`Context::create`]. Unset fields default
/// from the current time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Components {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
}

impl Components {
    pub fn date(year: i64, month: i64, day: i64) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            ..Default::default()
        }
    }

    pub fn time(hour: i64, minute: i64, second: i64) -> Self {
        Self {
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
            ..Default::default()
        }
    }

    pub fn date_time(year: i64, month: i64, day: i64, hour: i64, minute: i64, second: i64) -> Self {
        Self {
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
            ..Self::date(year, month, day)
        }
    }

    fn get(&self, field: Field) -> Option<i64> {
        match field {
            Field::Year => self.year,
            Field::Month => self.month,
            Field::Day => self.day,
            Field::Hour => self.hour,
            Field::Minute => self.minute,
            Field::Second => self.second,
        }
    }
}

/// Accepted ranges for [`Context::create_safe`], checked in this order.
const SAFE_RANGES: [(Field, i64, i64); 6] = [
    (Field::Year, 0, 9999),
    (Field::Month, 0, 12),
    (Field::Day, 0, 31),
    (Field::Hour, 0, 24),
    (Field::Minute, 0, 59),
    (Field::Second, 0, 59),
];

const MIN_CLAMPED_YEAR: i64 = 0;
const MAX_CLAMPED_YEAR: i64 = 9999;

/// Serialized wire form of a [`Moment`].
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SerializedMoment {
    pub date: String,
    pub timezone: String,
}

// ── Context ─────────────────────────────────────────────────────────────────

/// Clock, timezone, locale, week rules and overflow policy shared by the
/// moments built from it.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    timezone: Tz,
    test_now: Option<DateTime<Tz>>,
    week: WeekRules,
    month_overflow: bool,
    locale: &'static Locale,
    to_string_format: &'static str,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            test_now: None,
            week: WeekRules::default(),
            month_overflow: true,
            locale: lang::fallback(),
            to_string_format: DEFAULT_TO_STRING_FORMAT,
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Settings ────────────────────────────────────────────────────────

    /// Default timezone for constructors called without one.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn with_timezone(self, tz: &str) -> Result<Self> {
        Ok(self.with_tz(parse_timezone(tz)?))
    }

    pub fn with_tz(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// Freeze "now" at `instant`. Passing `None` restores the real clock.
    pub fn with_test_now(mut self, instant: Option<DateTime<Tz>>) -> Self {
        self.set_test_now(instant);
        self
    }

    pub fn set_test_now(&mut self, instant: Option<DateTime<Tz>>) {
        if let Some(frozen) = &instant {
            tracing::debug!(test_now = %frozen.to_rfc3339(), "freezing clock");
        }
        self.test_now = instant;
    }

    pub fn test_now(&self) -> Option<DateTime<Tz>> {
        self.test_now
    }

    pub fn has_test_now(&self) -> bool {
        self.test_now.is_some()
    }

    pub fn week_rules(&self) -> WeekRules {
        self.week
    }

    pub fn week_starts_at(&self) -> Weekday {
        self.week.starts_at
    }

    pub fn week_ends_at(&self) -> Weekday {
        self.week.ends_at
    }

    pub fn weekend_days(&self) -> Vec<Weekday> {
        self.week.weekend.days()
    }

    pub fn with_week_starts_at(mut self, day: Weekday) -> Self {
        self.week.starts_at = day;
        self
    }

    pub fn with_week_ends_at(mut self, day: Weekday) -> Self {
        self.week.ends_at = day;
        self
    }

    pub fn with_weekend_days(mut self, days: &[Weekday]) -> Self {
        self.week.weekend = WeekdaySet::new(days);
        self
    }

    pub fn is_weekend_day(&self, day: Weekday) -> bool {
        self.week.weekend.contains(day)
    }

    /// Select month arithmetic policy: `true` lets the day roll into the next
    /// month, `false` snaps to the last day of the target month.
    pub fn use_months_overflow(mut self, overflow: bool) -> Self {
        self.month_overflow = overflow;
        self
    }

    pub fn reset_months_overflow(self) -> Self {
        self.use_months_overflow(true)
    }

    pub fn should_overflow_months(&self) -> bool {
        self.month_overflow
    }

    /// Switch the locale used by human-readable differences. Unknown locales
    /// leave the current one in place and return `false`.
    pub fn set_locale(&mut self, code: &str) -> bool {
        match lang::find(code) {
            Some(locale) => {
                self.locale = locale;
                true
            }
            None => {
                tracing::warn!(locale = code, current = self.locale.code(), "locale not found");
                false
            }
        }
    }

    pub fn with_locale(mut self, code: &str) -> Self {
        self.set_locale(code);
        self
    }

    pub fn locale(&self) -> &'static str {
        self.locale.code()
    }

    pub fn translator(&self) -> &'static Locale {
        self.locale
    }

    /// Format used by `Display` for moments built from this context.
    pub fn with_to_string_format(mut self, format: &'static str) -> Self {
        self.to_string_format = format;
        self
    }

    pub fn reset_to_string_format(self) -> Self {
        self.with_to_string_format(DEFAULT_TO_STRING_FORMAT)
    }

    pub fn to_string_format(&self) -> &'static str {
        self.to_string_format
    }

    // ── Construction ────────────────────────────────────────────────────

    fn zone(&self, tz: Option<&str>) -> Result<Tz> {
        tz.map(parse_timezone).unwrap_or(Ok(self.timezone))
    }

    pub(crate) fn now_in(&self, tz: Tz) -> DateTime<Tz> {
        match self.test_now {
            Some(frozen) => frozen.with_timezone(&tz),
            None => Utc::now().with_timezone(&tz),
        }
    }

    /// Wrap an engine value.
    pub fn instance(&self, dt: DateTime<Tz>) -> Moment {
        Moment::from_parts(dt, *self)
    }

    /// The frozen test instant when set, else the real current instant.
    pub fn now(&self, tz: Option<&str>) -> Result<Moment> {
        let tz = self.zone(tz)?;
        Ok(self.instance(self.now_in(tz)))
    }

    pub fn today(&self, tz: Option<&str>) -> Result<Moment> {
        Ok(self.now(tz)?.start_of_day())
    }

    pub fn tomorrow(&self, tz: Option<&str>) -> Result<Moment> {
        Ok(self.today(tz)?.add_day())
    }

    pub fn yesterday(&self, tz: Option<&str>) -> Result<Moment> {
        Ok(self.today(tz)?.sub_day())
    }

    /// Largest supported value: 9999-12-31 23:59:59 UTC.
    pub fn max_value(&self) -> Moment {
        self.instance(Tz::UTC.from_utc_datetime(&far_naive(9999, 12, 31, (23, 59, 59))))
    }

    /// Smallest supported value: 0000-01-01 00:00:00 UTC.
    pub fn min_value(&self) -> Moment {
        self.instance(Tz::UTC.from_utc_datetime(&far_naive(0, 1, 1, (0, 0, 0))))
    }

    /// Build a moment from components.
    ///
    /// Unset date fields come from now. When `hour` is set, unset
    /// `minute`/`second` are 0; when it is not, all three come from now.
    /// Out-of-range values roll over into neighbouring periods, and years
    /// outside `0..=9999` are clamped then re-applied with year arithmetic.
    pub fn create(&self, components: Components, tz: Option<&str>) -> Result<Moment> {
        let tz = self.zone(tz)?;
        let now = self.now_in(tz);

        let year = components.year.unwrap_or(now.year() as i64);
        let month = components.month.unwrap_or(now.month() as i64);
        let day = components.day.unwrap_or(now.day() as i64);
        let (hour, minute, second) = match components.hour {
            Some(hour) => (
                hour,
                components.minute.unwrap_or(0),
                components.second.unwrap_or(0),
            ),
            None => (
                now.hour() as i64,
                components.minute.unwrap_or(now.minute() as i64),
                components.second.unwrap_or(now.second() as i64),
            ),
        };

        let (base_year, year_fix) = if year < MIN_CLAMPED_YEAR {
            (MIN_CLAMPED_YEAR, Some(year))
        } else if year > MAX_CLAMPED_YEAR {
            (MAX_CLAMPED_YEAR, Some(year - MAX_CLAMPED_YEAR))
        } else {
            (year, None)
        };

        let out_of_range = || CalendarError::InvalidArgument(format!(
            "date components out of range: {year}-{month}-{day} {hour}:{minute}:{second}"
        ));
        let naive = calendar::lenient_seconds(hour, minute, second)
            .and_then(|seconds| calendar::lenient_datetime(base_year as i32, month, day, seconds))
            .ok_or_else(out_of_range)?;

        let moment = self.instance(resolve_local(&tz, &naive));
        match year_fix {
            Some(years) => moment.checked_add(TimeUnit::Year, years).ok_or_else(out_of_range),
            None => Ok(moment),
        }
    }

    /// Date from the arguments, time of day from now.
    pub fn create_from_date(&self, year: i64, month: i64, day: i64, tz: Option<&str>) -> Result<Moment> {
        self.create(Components::date(year, month, day), tz)
    }

    /// Time of day from the arguments, date from now.
    pub fn create_from_time(&self, hour: i64, minute: i64, second: i64, tz: Option<&str>) -> Result<Moment> {
        self.create(Components::time(hour, minute, second), tz)
    }

    /// Like [`create`](Self::create) but rejects out-of-range fields and
    /// values that would roll over, with [`CalendarError::InvalidDate`].
    pub fn create_safe(&self, components: Components, tz: Option<&str>) -> Result<Moment> {
        for (field, min, max) in SAFE_RANGES {
            if let Some(value) = components.get(field) {
                if value < min || value > max {
                    return Err(CalendarError::InvalidDate { field, value });
                }
            }
        }

        let moment = self.create(components, tz)?;

        for (field, _, _) in SAFE_RANGES.iter().rev() {
            if let Some(value) = components.get(*field) {
                if value != moment.get(*field) {
                    return Err(CalendarError::InvalidDate {
                        field: *field,
                        value,
                    });
                }
            }
        }
        Ok(moment)
    }

    /// Strict parse of `text` with chrono strftime tokens.
    ///
    /// Formats carrying an offset keep the parsed instant, converted into
    /// `tz`. Formats without a time of day take it from now; formats without
    /// a date take today.
    pub fn create_from_format(&self, format: &str, text: &str, tz: Option<&str>) -> Result<Moment> {
        let tz = self.zone(tz)?;
        let mut errors = ParseErrors::default();

        match DateTime::parse_from_str(text, format) {
            Ok(dt) => return Ok(self.instance(dt.with_timezone(&tz))),
            Err(e) => errors.push(e.to_string()),
        }
        match NaiveDateTime::parse_from_str(text, format) {
            Ok(naive) => return Ok(self.instance(resolve_local(&tz, &naive))),
            Err(e) => errors.push(e.to_string()),
        }
        let now = self.now_in(tz);
        match NaiveDate::parse_from_str(text, format) {
            Ok(date) => {
                let naive = date.and_time(now.time());
                return Ok(self.instance(resolve_local(&tz, &naive)));
            }
            Err(e) => errors.push(e.to_string()),
        }
        match NaiveTime::parse_from_str(text, format) {
            Ok(time) => {
                let naive = now.date_naive().and_time(time);
                return Ok(self.instance(resolve_local(&tz, &naive)));
            }
            Err(e) => errors.push(e.to_string()),
        }

        errors.errors.dedup();
        Err(CalendarError::InvalidFormat {
            format: format.to_string(),
            text: text.to_string(),
            errors,
        })
    }

    pub fn create_from_timestamp(&self, timestamp: i64, tz: Option<&str>) -> Result<Moment> {
        let tz = self.zone(tz)?;
        let dt = tz.timestamp_opt(timestamp, 0).single().ok_or_else(|| {
            CalendarError::InvalidArgument(format!("timestamp out of range: {timestamp}"))
        })?;
        Ok(self.instance(dt))
    }

    pub fn create_from_timestamp_utc(&self, timestamp: i64) -> Result<Moment> {
        self.create_from_timestamp(timestamp, Some("UTC"))
    }

    /// Parse free text: empty or `"now"`, relative phrases (evaluated against
    /// the frozen test instant when one is set), or an absolute date/time.
    pub fn parse(&self, text: &str, tz: Option<&str>) -> Result<Moment> {
        let now = self.now(tz)?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("now") {
            return Ok(now);
        }
        if let Some(dt) = parse_absolute(trimmed, &now.tz()) {
            return Ok(self.instance(dt));
        }
        now.modify(trimmed).map_err(|e| {
            if relative::has_relative_keywords(trimmed) {
                e
            } else {
                CalendarError::InvalidArgument(format!("cannot parse date/time '{trimmed}'"))
            }
        })
    }

    /// Inverse of [`Moment::to_serialized`].
    pub fn from_serialized(&self, value: &str) -> Result<Moment> {
        let invalid = || CalendarError::InvalidArgument("Invalid serialized value.".to_string());
        let wire: SerializedMoment = serde_json::from_str(value).map_err(|_| invalid())?;
        let tz = parse_timezone(&wire.timezone).map_err(|_| invalid())?;
        let dt = DateTime::parse_from_rfc3339(&wire.date).map_err(|_| invalid())?;
        Ok(self.instance(dt.with_timezone(&tz)))
    }
}

fn far_naive(year: i32, month: u32, day: u32, (h, m, s): (u32, u32, u32)) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .unwrap_or_default()
}

/// Absolute formats accepted by [`Context::parse`].
fn parse_absolute(s: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(tz));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(tz));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(resolve_local(tz, &naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| resolve_local(tz, &date.and_time(NaiveTime::MIN)))
}
