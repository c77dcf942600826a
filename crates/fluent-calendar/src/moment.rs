//! The calendar value: an instant, its timezone, and the context it was built
//! from.
//!
//! `Moment` is `Copy` and every mutator returns a new value. This module holds
//! field access, formatting, comparison and calendar predicates; arithmetic,
//! boundaries, differences and relative phrases live in sibling modules as
//! further `impl Moment` blocks.

use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar;
use crate::context::{Context, SerializedMoment};
use crate::error::{CalendarError, Result};
use crate::format;
use crate::zone::{self, parse_timezone, resolve_local};

// ── Field ───────────────────────────────────────────────────────────────────

/// A settable calendar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
            Field::Second => "second",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" | "years" => Ok(Field::Year),
            "month" | "months" => Ok(Field::Month),
            "day" | "days" => Ok(Field::Day),
            "hour" | "hours" => Ok(Field::Hour),
            "minute" | "minutes" => Ok(Field::Minute),
            "second" | "seconds" => Ok(Field::Second),
            _ => Err(CalendarError::InvalidArgument(format!(
                "Unknown getter/setter '{s}'"
            ))),
        }
    }
}

// ── Moment ──────────────────────────────────────────────────────────────────

/// An instant in a timezone, together with the [`Context`] it was built from.
#[derive(Debug, Clone, Copy)]
pub struct Moment {
    dt: DateTime<Tz>,
    ctx: Context,
}

impl Moment {
    pub(crate) fn from_parts(dt: DateTime<Tz>, ctx: Context) -> Self {
        Self { dt, ctx }
    }

    /// Same context, different instant.
    pub(crate) fn with_datetime(&self, dt: DateTime<Tz>) -> Self {
        Self { dt, ctx: self.ctx }
    }

    /// Same context and timezone, instant taken from a local wall-clock time.
    pub(crate) fn with_local(&self, naive: NaiveDateTime) -> Self {
        self.with_datetime(resolve_local(&self.tz(), &naive))
    }

    /// Rebuild from possibly out-of-range fields, rolling excess into
    /// neighbouring periods. Out of the engine's range, nothing changes.
    fn rebuild(&self, year: i64, month: i64, day: i64, (hour, minute, second): (i64, i64, i64)) -> Self {
        let naive = i32::try_from(year)
            .ok()
            .zip(calendar::lenient_seconds(hour, minute, second))
            .and_then(|(year, seconds)| calendar::lenient_datetime(year, month, day, seconds))
            .and_then(|naive| {
                naive.checked_add_signed(Duration::nanoseconds(self.dt.nanosecond() as i64))
            });
        match naive {
            Some(naive) => self.with_local(naive),
            None => {
                tracing::warn!(year, month, day, hour, minute, second, "date outside engine range, left unchanged");
                *self
            }
        }
    }

    /// "Now" in this moment's timezone, per its context.
    pub(crate) fn now(&self) -> Moment {
        self.with_datetime(self.ctx.now_in(self.tz()))
    }

    pub(crate) fn other_or_now(&self, other: Option<&Moment>) -> Moment {
        other.copied().unwrap_or_else(|| self.now())
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Same instant under a different context.
    pub fn with_context(self, ctx: Context) -> Self {
        Self { ctx, ..self }
    }

    pub fn datetime(&self) -> DateTime<Tz> {
        self.dt
    }

    pub fn tz(&self) -> Tz {
        self.dt.timezone()
    }

    pub fn naive_local(&self) -> NaiveDateTime {
        self.dt.naive_local()
    }

    pub fn naive_utc(&self) -> NaiveDateTime {
        self.dt.naive_utc()
    }

    pub fn date_naive(&self) -> NaiveDate {
        self.dt.date_naive()
    }

    // ── Getters ─────────────────────────────────────────────────────────

    pub fn year(&self) -> i32 {
        self.dt.year()
    }

    /// ISO 8601 week-numbering year.
    pub fn year_iso(&self) -> i32 {
        self.dt.iso_week().year()
    }

    pub fn month(&self) -> u32 {
        self.dt.month()
    }

    pub fn day(&self) -> u32 {
        self.dt.day()
    }

    pub fn hour(&self) -> u32 {
        self.dt.hour()
    }

    pub fn minute(&self) -> u32 {
        self.dt.minute()
    }

    pub fn second(&self) -> u32 {
        self.dt.second()
    }

    pub fn micro(&self) -> u32 {
        self.dt.timestamp_subsec_micros()
    }

    pub fn day_of_week(&self) -> Weekday {
        self.dt.weekday()
    }

    /// 1-based day of the year.
    pub fn day_of_year(&self) -> u32 {
        self.dt.ordinal()
    }

    /// 1 for days 1-7, 2 for days 8-14, and so on.
    pub fn week_of_month(&self) -> u32 {
        (self.day() - 1) / 7 + 1
    }

    /// ISO 8601 week number.
    pub fn week_of_year(&self) -> u32 {
        self.dt.iso_week().week()
    }

    pub fn days_in_month(&self) -> u32 {
        calendar::days_in_month(self.year(), self.month())
    }

    pub fn quarter(&self) -> u32 {
        (self.month() - 1) / 3 + 1
    }

    pub fn timestamp(&self) -> i64 {
        self.dt.timestamp()
    }

    /// Offset from UTC in seconds.
    pub fn offset(&self) -> i32 {
        zone::offset_seconds(&self.dt)
    }

    pub fn offset_hours(&self) -> i32 {
        self.offset() / 3600
    }

    pub fn is_dst(&self) -> bool {
        zone::is_dst_active(&self.dt)
    }

    /// Whether this moment's offset matches the context's default timezone.
    pub fn is_local(&self) -> bool {
        let local = self.dt.with_timezone(&self.ctx.timezone());
        self.offset() == zone::offset_seconds(&local)
    }

    pub fn is_utc(&self) -> bool {
        self.offset() == 0
    }

    pub fn timezone_name(&self) -> &'static str {
        self.tz().name()
    }

    /// Whole years between this moment and now.
    pub fn age(&self) -> i64 {
        self.diff_in_years(None, true)
    }

    pub fn get(&self, field: Field) -> i64 {
        match field {
            Field::Year => self.year() as i64,
            Field::Month => self.month() as i64,
            Field::Day => self.day() as i64,
            Field::Hour => self.hour() as i64,
            Field::Minute => self.minute() as i64,
            Field::Second => self.second() as i64,
        }
    }

    // ── Setters ─────────────────────────────────────────────────────────
    //
    // Out-of-range values roll over: `with_month(13)` is January of the next
    // year, `with_day(0)` the last day of the previous month.

    fn time_fields(&self) -> (i64, i64, i64) {
        (self.hour() as i64, self.minute() as i64, self.second() as i64)
    }

    pub fn set(&self, field: Field, value: i64) -> Self {
        let (y, m, d) = (self.year() as i64, self.month() as i64, self.day() as i64);
        let (h, i, s) = self.time_fields();
        match field {
            Field::Year => self.rebuild(value, m, d, (h, i, s)),
            Field::Month => self.rebuild(y, value, d, (h, i, s)),
            Field::Day => self.rebuild(y, m, value, (h, i, s)),
            Field::Hour => self.rebuild(y, m, d, (value, i, s)),
            Field::Minute => self.rebuild(y, m, d, (h, value, s)),
            Field::Second => self.rebuild(y, m, d, (h, i, value)),
        }
    }

    pub fn with_year(&self, year: i64) -> Self {
        self.set(Field::Year, year)
    }

    pub fn with_month(&self, month: i64) -> Self {
        self.set(Field::Month, month)
    }

    pub fn with_day(&self, day: i64) -> Self {
        self.set(Field::Day, day)
    }

    pub fn with_hour(&self, hour: i64) -> Self {
        self.set(Field::Hour, hour)
    }

    pub fn with_minute(&self, minute: i64) -> Self {
        self.set(Field::Minute, minute)
    }

    pub fn with_second(&self, second: i64) -> Self {
        self.set(Field::Second, second)
    }

    pub fn set_date(&self, year: i64, month: i64, day: i64) -> Self {
        self.rebuild(year, month, day, self.time_fields())
    }

    /// Set the time of day; sub-second precision is dropped.
    pub fn set_time(&self, hour: i64, minute: i64, second: i64) -> Self {
        let (y, m, d) = (self.year() as i64, self.month() as i64, self.day() as i64);
        self.set_date_time(y, m, d, hour, minute, second)
    }

    pub fn set_date_time(
        &self,
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
        second: i64,
    ) -> Self {
        self.truncate_subsec()
            .rebuild(year, month, day, (hour, minute, second))
    }

    /// Set the time from `"HH:MM"` or `"HH:MM:SS"`.
    pub fn set_time_from_time_string(&self, time: &str) -> Result<Self> {
        let parts = time
            .trim()
            .split(':')
            .map(|p| p.parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| CalendarError::InvalidArgument(format!("invalid time string '{time}'")))?;
        match parts.as_slice() {
            [h] => Ok(self.set_time(*h, 0, 0)),
            [h, m] => Ok(self.set_time(*h, *m, 0)),
            [h, m, s] => Ok(self.set_time(*h, *m, *s)),
            _ => Err(CalendarError::InvalidArgument(format!(
                "invalid time string '{time}'"
            ))),
        }
    }

    pub fn with_timestamp(&self, timestamp: i64) -> Result<Self> {
        let moment = self.ctx.create_from_timestamp(timestamp, Some(self.timezone_name()))?;
        Ok(moment.with_context(self.ctx))
    }

    /// Same instant, expressed in another timezone.
    pub fn set_timezone(&self, tz: &str) -> Result<Self> {
        Ok(self.with_tz(parse_timezone(tz)?))
    }

    pub fn with_tz(&self, tz: Tz) -> Self {
        self.with_datetime(self.dt.with_timezone(&tz))
    }

    pub fn utc(&self) -> Self {
        self.with_tz(Tz::UTC)
    }

    fn truncate_subsec(&self) -> Self {
        self.with_datetime(self.dt - Duration::nanoseconds(self.dt.nanosecond() as i64))
    }

    // ── Formatting ──────────────────────────────────────────────────────

    /// Format with chrono strftime tokens. Unknown specifiers are rejected.
    pub fn format(&self, fmt: &str) -> Result<String> {
        if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
            return Err(CalendarError::InvalidArgument(format!(
                "invalid format string '{fmt}'"
            )));
        }
        Ok(self.render(fmt))
    }

    fn render(&self, fmt: &str) -> String {
        let mut out = String::new();
        if write!(out, "{}", self.dt.format(fmt)).is_err() {
            tracing::warn!(format = fmt, "format string could not be rendered");
        }
        out
    }

    pub fn to_date_string(&self) -> String {
        self.render(format::DATE)
    }

    pub fn to_formatted_date_string(&self) -> String {
        self.render(format::FORMATTED_DATE)
    }

    pub fn to_time_string(&self) -> String {
        self.render(format::TIME)
    }

    pub fn to_date_time_string(&self) -> String {
        self.render(format::DATE_TIME)
    }

    pub fn to_day_date_time_string(&self) -> String {
        self.render(format::DAY_DATE_TIME)
    }

    pub fn to_atom_string(&self) -> String {
        self.render(format::ATOM)
    }

    pub fn to_cookie_string(&self) -> String {
        self.render(format::COOKIE)
    }

    pub fn to_iso8601_string(&self) -> String {
        self.render(format::ISO8601)
    }

    pub fn to_rfc822_string(&self) -> String {
        self.render(format::RFC822)
    }

    pub fn to_rfc850_string(&self) -> String {
        self.render(format::RFC850)
    }

    pub fn to_rfc1036_string(&self) -> String {
        self.render(format::RFC1036)
    }

    pub fn to_rfc1123_string(&self) -> String {
        self.render(format::RFC1123)
    }

    pub fn to_rfc2822_string(&self) -> String {
        self.render(format::RFC2822)
    }

    pub fn to_rfc3339_string(&self) -> String {
        self.render(format::RFC3339)
    }

    pub fn to_rss_string(&self) -> String {
        self.render(format::RSS)
    }

    pub fn to_w3c_string(&self) -> String {
        self.render(format::W3C)
    }

    /// JSON wire form, readable by [`Context::from_serialized`].
    pub fn to_serialized(&self) -> String {
        serde_json::to_string(&self.wire()).unwrap_or_default()
    }

    fn wire(&self) -> SerializedMoment {
        SerializedMoment {
            date: self.dt.to_rfc3339(),
            timezone: self.timezone_name().to_string(),
        }
    }

    // ── Comparison ──────────────────────────────────────────────────────

    pub fn eq(&self, other: &Moment) -> bool {
        self == other
    }

    pub fn ne(&self, other: &Moment) -> bool {
        self != other
    }

    pub fn gt(&self, other: &Moment) -> bool {
        self > other
    }

    pub fn gte(&self, other: &Moment) -> bool {
        self >= other
    }

    pub fn lt(&self, other: &Moment) -> bool {
        self < other
    }

    pub fn lte(&self, other: &Moment) -> bool {
        self <= other
    }

    /// Whether this moment lies between `a` and `b`, in either order.
    pub fn between(&self, a: &Moment, b: &Moment, inclusive: bool) -> bool {
        let (low, high) = if a > b { (b, a) } else { (a, b) };
        if inclusive {
            self >= low && self <= high
        } else {
            self > low && self < high
        }
    }

    /// The candidate nearer in absolute seconds. On an exact tie `b` wins.
    pub fn closest(&self, a: &Moment, b: &Moment) -> Moment {
        if self.diff_in_seconds(Some(a), true) < self.diff_in_seconds(Some(b), true) {
            *a
        } else {
            *b
        }
    }

    /// The candidate further in absolute seconds. On an exact tie `b` wins.
    pub fn farthest(&self, a: &Moment, b: &Moment) -> Moment {
        if self.diff_in_seconds(Some(a), true) > self.diff_in_seconds(Some(b), true) {
            *a
        } else {
            *b
        }
    }

    /// The earlier of this moment and `other` (now when `None`). On a tie the
    /// other moment is returned.
    pub fn minimum(&self, other: Option<&Moment>) -> Moment {
        let other = self.other_or_now(other);
        if self.lt(&other) {
            *self
        } else {
            other
        }
    }

    /// The later of this moment and `other` (now when `None`). On a tie the
    /// other moment is returned.
    pub fn maximum(&self, other: Option<&Moment>) -> Moment {
        let other = self.other_or_now(other);
        if self.gt(&other) {
            *self
        } else {
            other
        }
    }

    // ── Predicates ──────────────────────────────────────────────────────

    pub fn is_weekday(&self) -> bool {
        !self.is_weekend()
    }

    pub fn is_weekend(&self) -> bool {
        self.ctx.is_weekend_day(self.day_of_week())
    }

    pub fn is_day_of_week(&self, day: Weekday) -> bool {
        self.day_of_week() == day
    }

    pub fn is_yesterday(&self) -> bool {
        self.date_naive() == self.now().sub_day().date_naive()
    }

    pub fn is_today(&self) -> bool {
        self.date_naive() == self.now().date_naive()
    }

    pub fn is_tomorrow(&self) -> bool {
        self.date_naive() == self.now().add_day().date_naive()
    }

    pub fn is_next_week(&self) -> bool {
        self.dt.iso_week() == self.now().add_week().dt.iso_week()
    }

    pub fn is_last_week(&self) -> bool {
        self.dt.iso_week() == self.now().sub_week().dt.iso_week()
    }

    pub fn is_next_month(&self) -> bool {
        self.is_same_month(Some(&self.now().add_months_no_overflow(1)), true)
    }

    pub fn is_last_month(&self) -> bool {
        self.is_same_month(Some(&self.now().sub_months_no_overflow(1)), true)
    }

    pub fn is_next_year(&self) -> bool {
        self.year() == self.now().year() + 1
    }

    pub fn is_last_year(&self) -> bool {
        self.year() == self.now().year() - 1
    }

    pub fn is_future(&self) -> bool {
        self.gt(&self.now())
    }

    pub fn is_past(&self) -> bool {
        self.lt(&self.now())
    }

    pub fn is_leap_year(&self) -> bool {
        calendar::days_in_month(self.year(), 2) == 29
    }

    /// Whether the ISO week-numbering year has 53 weeks.
    pub fn is_long_year(&self) -> bool {
        NaiveDate::from_ymd_opt(self.year(), 12, 28)
            .map(|d| d.iso_week().week() == 53)
            .unwrap_or(false)
    }

    /// Whether both moments render identically under `fmt` (other: now when
    /// `None`), read in this moment's timezone.
    pub fn is_same_as(&self, fmt: &str, other: Option<&Moment>) -> Result<bool> {
        let other = self.other_or_now(other).with_tz(self.tz());
        Ok(self.format(fmt)? == other.format(fmt)?)
    }

    pub fn is_current_year(&self) -> bool {
        self.is_same_year(None)
    }

    pub fn is_same_year(&self, other: Option<&Moment>) -> bool {
        self.year() == self.other_or_now(other).with_tz(self.tz()).year()
    }

    pub fn is_current_month(&self) -> bool {
        self.is_same_month(None, true)
    }

    pub fn is_same_month(&self, other: Option<&Moment>, of_same_year: bool) -> bool {
        let other = self.other_or_now(other).with_tz(self.tz());
        self.month() == other.month() && (!of_same_year || self.year() == other.year())
    }

    pub fn is_same_day(&self, other: &Moment) -> bool {
        self.date_naive() == other.with_tz(self.tz()).date_naive()
    }

    /// Same month and day as `other` (now when `None`).
    pub fn is_birthday(&self, other: Option<&Moment>) -> bool {
        let other = self.other_or_now(other).with_tz(self.tz());
        (self.month(), self.day()) == (other.month(), other.day())
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.ctx.to_string_format()))
    }
}

impl PartialEq for Moment {
    fn eq(&self, other: &Self) -> bool {
        self.dt == other.dt
    }
}

impl Eq for Moment {}

impl PartialOrd for Moment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Moment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dt.cmp(&other.dt)
    }
}

impl Hash for Moment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dt.timestamp().hash(state);
        self.dt.timestamp_subsec_nanos().hash(state);
    }
}

impl Serialize for Moment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.wire().serialize(serializer)
    }
}

/// Deserialized moments carry the default [`Context`].
impl<'de> Deserialize<'de> for Moment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = SerializedMoment::deserialize(deserializer)?;
        let tz = parse_timezone(&wire.timezone).map_err(serde::de::Error::custom)?;
        let dt = DateTime::parse_from_rfc3339(&wire.date).map_err(serde::de::Error::custom)?;
        Ok(Context::default().instance(dt.with_timezone(&tz)))
    }
}
