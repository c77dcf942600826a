//! Differences between moments.
//!
//! Calendar units (years, months, weeks, days) come from a [`CalendarInterval`]
//! built on wall-clock time in the receiver's timezone. Hours, minutes and
//! seconds are elapsed time: epoch-second distance, truncated.
//!
//! Every `diff_*` method is signed from the receiver's point of view: positive
//! when the other moment is later. `None` as the other moment means now.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::calendar;
use crate::lang::{self, Locale};
use crate::moment::Moment;
use crate::unit::{
    TimeUnit, DAYS_PER_WEEK, MONTHS_PER_QUARTER, MONTHS_PER_YEAR, SECONDS_PER_HOUR,
    SECONDS_PER_MINUTE, YEARS_PER_CENTURY, YEARS_PER_DECADE,
};

// ── Calendar interval ───────────────────────────────────────────────────────

/// Calendar-aware decomposition of the distance between two moments.
///
/// Components are always non-negative; `invert` is true when the other moment
/// precedes the receiver. Days borrowed during normalization take the length
/// of the earlier moment's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarInterval {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Whole days between the two wall-clock times.
    pub total_days: i64,
    pub invert: bool,
}

impl CalendarInterval {
    fn between(earlier: NaiveDateTime, later: NaiveDateTime, invert: bool) -> Self {
        let mut seconds = later.second() as i64 - earlier.second() as i64;
        let mut minutes = later.minute() as i64 - earlier.minute() as i64;
        let mut hours = later.hour() as i64 - earlier.hour() as i64;
        let mut days = later.day() as i64 - earlier.day() as i64;
        let mut months = later.month() as i64 - earlier.month() as i64;
        let mut years = later.year() as i64 - earlier.year() as i64;

        // A partial second on the earlier side makes the last second incomplete.
        if later.nanosecond() < earlier.nanosecond() {
            seconds -= 1;
        }
        if seconds < 0 {
            seconds += SECONDS_PER_MINUTE;
            minutes -= 1;
        }
        if minutes < 0 {
            minutes += 60;
            hours -= 1;
        }
        if hours < 0 {
            hours += 24;
            days -= 1;
        }
        if days < 0 {
            days += calendar::days_in_month(earlier.year(), earlier.month()) as i64;
            months -= 1;
        }
        if months < 0 {
            months += MONTHS_PER_YEAR;
            years -= 1;
        }

        Self {
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
            total_days: (later - earlier).num_days(),
            invert,
        }
    }

    /// `value` with this interval's direction, unless `absolute`.
    fn signed(&self, value: i64, absolute: bool) -> i64 {
        if self.invert && !absolute {
            -value
        } else {
            value
        }
    }
}

/// ISO 8601 duration, `-` prefixed when inverted: `P1Y2M3DT4H5M6S`.
impl fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invert {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        for (value, designator) in [(self.years, 'Y'), (self.months, 'M'), (self.days, 'D')] {
            if value != 0 {
                write!(f, "{value}{designator}")?;
            }
        }
        let clock = [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')];
        if clock.iter().any(|(value, _)| *value != 0) {
            f.write_str("T")?;
            for (value, designator) in clock {
                if value != 0 {
                    write!(f, "{value}{designator}")?;
                }
            }
        } else if self.years == 0 && self.months == 0 && self.days == 0 {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

// ── Period ──────────────────────────────────────────────────────────────────

/// Moments from `start` in `step`-sized increments, up to but excluding `end`.
///
/// The k-th item is `start + k * step`, so month steps never drift when an
/// intermediate month is short.
#[derive(Debug, Clone)]
pub struct Period {
    start: Moment,
    end: Moment,
    step: TimeUnit,
    index: i64,
}

impl Period {
    pub fn new(start: Moment, end: Moment, step: TimeUnit) -> Self {
        Self {
            start,
            end,
            step,
            index: 0,
        }
    }
}

impl Iterator for Period {
    type Item = Moment;

    fn next(&mut self) -> Option<Moment> {
        let current = self.start.checked_add(self.step, self.index)?;
        if current >= self.end {
            return None;
        }
        self.index += 1;
        Some(current)
    }
}

// ── Diff methods ────────────────────────────────────────────────────────────

impl Moment {
    /// Calendar interval to `other` (now when `None`), read as wall-clock time
    /// in this moment's timezone.
    pub fn diff(&self, other: Option<&Moment>) -> CalendarInterval {
        let other = self.other_or_now(other).with_tz(self.tz());
        let (a, b) = (self.naive_local(), other.naive_local());
        if other < *self {
            CalendarInterval::between(b, a, true)
        } else {
            CalendarInterval::between(a, b, false)
        }
    }

    pub fn diff_in_years(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        let interval = self.diff(other);
        interval.signed(interval.years, absolute)
    }

    pub fn diff_in_months(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        let interval = self.diff(other);
        interval.signed(interval.years * MONTHS_PER_YEAR + interval.months, absolute)
    }

    pub fn diff_in_weeks(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        self.diff_in_days(other, absolute) / DAYS_PER_WEEK
    }

    pub fn diff_in_days(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        let interval = self.diff(other);
        interval.signed(interval.total_days, absolute)
    }

    pub fn diff_in_hours(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        self.diff_in_seconds(other, absolute) / SECONDS_PER_HOUR
    }

    pub fn diff_in_minutes(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        self.diff_in_seconds(other, absolute) / SECONDS_PER_MINUTE
    }

    pub fn diff_in_seconds(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        let value = self.other_or_now(other).timestamp() - self.timestamp();
        if absolute {
            value.abs()
        } else {
            value
        }
    }

    /// Difference counted in `unit`.
    pub fn diff_in(&self, unit: TimeUnit, other: Option<&Moment>, absolute: bool) -> i64 {
        match unit {
            TimeUnit::Second => self.diff_in_seconds(other, absolute),
            TimeUnit::Minute => self.diff_in_minutes(other, absolute),
            TimeUnit::Hour => self.diff_in_hours(other, absolute),
            TimeUnit::Day => self.diff_in_days(other, absolute),
            TimeUnit::Week => self.diff_in_weeks(other, absolute),
            TimeUnit::Month => self.diff_in_months(other, absolute),
            TimeUnit::Quarter => self.diff_in_months(other, absolute) / MONTHS_PER_QUARTER,
            TimeUnit::Year => self.diff_in_years(other, absolute),
            TimeUnit::Decade => self.diff_in_years(other, absolute) / YEARS_PER_DECADE,
            TimeUnit::Century => self.diff_in_years(other, absolute) / YEARS_PER_CENTURY,
        }
    }

    // ── Filtered ────────────────────────────────────────────────────────

    /// Number of `step`-sized increments between the two moments for which
    /// `filter` holds, walking from the earlier one.
    pub fn diff_filtered<F>(
        &self,
        step: TimeUnit,
        filter: F,
        other: Option<&Moment>,
        absolute: bool,
    ) -> i64
    where
        F: Fn(&Moment) -> bool,
    {
        let other = self.other_or_now(other);
        let (start, end, inverse) = if other < *self {
            (other, *self, true)
        } else {
            (*self, other, false)
        };
        let count = Period::new(start, end, step)
            .filter(|m| filter(m))
            .count() as i64;
        if inverse && !absolute {
            -count
        } else {
            count
        }
    }

    pub fn diff_in_days_filtered<F>(&self, filter: F, other: Option<&Moment>, absolute: bool) -> i64
    where
        F: Fn(&Moment) -> bool,
    {
        self.diff_filtered(TimeUnit::Day, filter, other, absolute)
    }

    pub fn diff_in_hours_filtered<F>(&self, filter: F, other: Option<&Moment>, absolute: bool) -> i64
    where
        F: Fn(&Moment) -> bool,
    {
        self.diff_filtered(TimeUnit::Hour, filter, other, absolute)
    }

    pub fn diff_in_weekdays(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        self.diff_in_days_filtered(Moment::is_weekday, other, absolute)
    }

    pub fn diff_in_weekend_days(&self, other: Option<&Moment>, absolute: bool) -> i64 {
        self.diff_in_days_filtered(Moment::is_weekend, other, absolute)
    }

    pub fn seconds_since_midnight(&self) -> i64 {
        self.start_of_day().diff_in_seconds(Some(self), true)
    }

    pub fn seconds_until_end_of_day(&self) -> i64 {
        self.diff_in_seconds(Some(&self.end_of_day()), true)
    }

    // ── Human readable ──────────────────────────────────────────────────

    /// Difference as a localized phrase.
    ///
    /// Against now (`other` is `None`): "2 days ago" / "2 days from now".
    /// Against another moment: "2 days before" / "2 days after". With
    /// `absolute` only the quantity is rendered ("2 days").
    ///
    /// Only the largest non-zero unit is kept; seven days or more read as
    /// weeks, and a zero difference reads as one second.
    pub fn diff_for_humans(&self, other: Option<&Moment>, absolute: bool) -> String {
        let is_now = other.is_none();
        let interval = self.diff(other);

        let (unit, count) = if interval.years > 0 {
            ("year", interval.years)
        } else if interval.months > 0 {
            ("month", interval.months)
        } else if interval.days > 0 {
            if interval.days >= DAYS_PER_WEEK {
                ("week", interval.days / DAYS_PER_WEEK)
            } else {
                ("day", interval.days)
            }
        } else if interval.hours > 0 {
            ("hour", interval.hours)
        } else if interval.minutes > 0 {
            ("minute", interval.minutes)
        } else {
            ("second", interval.seconds)
        };
        let count = count.max(1);

        let locale = self.context().translator();
        let quantity = choice(locale, unit, count);
        if absolute {
            return quantity;
        }

        let is_future = interval.invert;
        let relation = match (is_now, is_future) {
            (true, true) => "from_now",
            (true, false) => "ago",
            (false, true) => "after",
            (false, false) => "before",
        };

        let tense_key = format!("{unit}_{relation}");
        let quantity = if locale.has(&tense_key) {
            choice(locale, &tense_key, count)
        } else {
            quantity
        };

        locale
            .trans(relation, &quantity)
            .or_else(|| lang::fallback().trans(relation, &quantity))
            .unwrap_or(quantity)
    }
}

/// Pluralized `key` from `locale`, then English, then a bare "count key".
fn choice(locale: &Locale, key: &str, count: i64) -> String {
    locale
        .trans_choice(key, count)
        .or_else(|| lang::fallback().trans_choice(key, count))
        .unwrap_or_else(|| format!("{count} {key}"))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};
    use chrono_tz::Tz;

    use super::*;
    use crate::context::{Components, Context};

    fn frozen(y: i32, m: u32, d: u32, h: u32, i: u32, s: u32) -> Context {
        let now: DateTime<Tz> = Tz::UTC.with_ymd_and_hms(y, m, d, h, i, s).unwrap();
        Context::new().with_test_now(Some(now))
    }

    fn at(ctx: &Context, y: i64, m: i64, d: i64, h: i64, i: i64, s: i64) -> Moment {
        ctx.create(Components::date_time(y, m, d, h, i, s), None).unwrap()
    }

    #[test]
    fn test_interval_borrows_from_earlier_month() {
        let ctx = Context::new();
        let a = at(&ctx, 2023, 1, 31, 0, 0, 0);
        let b = at(&ctx, 2023, 3, 1, 0, 0, 0);
        let interval = a.diff(Some(&b));
        assert_eq!((interval.years, interval.months, interval.days), (0, 1, 1));
        assert_eq!(interval.total_days, 29);
        assert!(!interval.invert);
        assert!(b.diff(Some(&a)).invert);
    }

    #[test]
    fn test_interval_time_borrow() {
        let ctx = Context::new();
        let a = at(&ctx, 2024, 5, 10, 22, 45, 50);
        let b = at(&ctx, 2025, 5, 11, 1, 15, 10);
        let i = a.diff(Some(&b));
        assert_eq!(
            (i.years, i.months, i.days, i.hours, i.minutes, i.seconds),
            (1, 0, 0, 2, 29, 20)
        );
    }

    #[test]
    fn test_interval_display() {
        let ctx = Context::new();
        let a = at(&ctx, 2024, 5, 10, 22, 45, 50);
        let b = at(&ctx, 2025, 5, 11, 1, 15, 10);
        assert_eq!(a.diff(Some(&b)).to_string(), "P1YT2H29M20S");
        assert_eq!(b.diff(Some(&a)).to_string(), "-P1YT2H29M20S");
        assert_eq!(a.diff(Some(&a)).to_string(), "PT0S");
        assert_eq!(a.diff(Some(&a.add_days(3))).to_string(), "P3D");
    }

    #[test]
    fn test_diff_signs() {
        let ctx = Context::new();
        let a = at(&ctx, 2020, 1, 1, 0, 0, 0);
        let b = at(&ctx, 2023, 7, 1, 12, 0, 0);
        assert_eq!(a.diff_in_years(Some(&b), false), 3);
        assert_eq!(b.diff_in_years(Some(&a), false), -3);
        assert_eq!(b.diff_in_years(Some(&a), true), 3);
        assert_eq!(a.diff_in_months(Some(&b), false), 42);
        assert_eq!(a.diff_in(TimeUnit::Quarter, Some(&b), false), 14);
        assert_eq!(a.diff_in(TimeUnit::Decade, Some(&b), false), 0);
    }

    #[test]
    fn test_days_and_weeks() {
        let ctx = Context::new();
        let a = at(&ctx, 2026, 2, 1, 10, 0, 0);
        let b = at(&ctx, 2026, 2, 16, 9, 0, 0);
        assert_eq!(a.diff_in_days(Some(&b), false), 14);
        assert_eq!(a.diff_in_weeks(Some(&b), false), 2);
        assert_eq!(b.diff_in_weeks(Some(&a), false), -2);
    }

    #[test]
    fn test_elapsed_units_ignore_dst() {
        let ctx = Context::new().with_timezone("America/Toronto").unwrap();
        // Spring forward on 2026-03-08: the local day is only 23 hours long.
        let a = at(&ctx, 2026, 3, 8, 0, 0, 0);
        let b = at(&ctx, 2026, 3, 9, 0, 0, 0);
        assert_eq!(a.diff_in_days(Some(&b), false), 1);
        assert_eq!(a.diff_in_hours(Some(&b), false), 23);
        assert_eq!(a.diff_in_minutes(Some(&b), false), 23 * 60);
    }

    #[test]
    fn test_seconds_symmetric() {
        let ctx = Context::new();
        let a = at(&ctx, 2026, 1, 1, 0, 0, 0);
        let b = at(&ctx, 2026, 1, 1, 1, 2, 3);
        assert_eq!(a.diff_in_seconds(Some(&b), false), 3723);
        assert_eq!(b.diff_in_seconds(Some(&a), false), -3723);
        assert_eq!(b.diff_in_seconds(Some(&a), true), 3723);
        assert_eq!(a.diff_in_hours(Some(&b), false), 1);
    }

    #[test]
    fn test_period_excludes_end() {
        let ctx = Context::new();
        let a = at(&ctx, 2026, 1, 31, 0, 0, 0);
        let b = at(&ctx, 2026, 4, 30, 0, 0, 0);
        let steps: Vec<String> = Period::new(a, b, TimeUnit::Month)
            .map(|m| m.to_date_string())
            .collect();
        assert_eq!(steps, vec!["2026-01-31", "2026-03-03", "2026-03-31"]);
    }

    #[test]
    fn test_weekdays_and_weekend_days() {
        let ctx = Context::new();
        // Mon 2026-02-16 .. Mon 2026-03-02: two full weeks.
        let a = at(&ctx, 2026, 2, 16, 0, 0, 0);
        let b = at(&ctx, 2026, 3, 2, 0, 0, 0);
        assert_eq!(a.diff_in_weekdays(Some(&b), false), 10);
        assert_eq!(a.diff_in_weekend_days(Some(&b), false), 4);
        assert_eq!(b.diff_in_weekdays(Some(&a), false), -10);
        assert_eq!(b.diff_in_weekdays(Some(&a), true), 10);
    }

    #[test]
    fn test_hours_filtered() {
        let ctx = Context::new();
        let a = at(&ctx, 2026, 2, 16, 0, 0, 0);
        let b = at(&ctx, 2026, 2, 17, 0, 0, 0);
        let working = a.diff_in_hours_filtered(|m| (9..17).contains(&m.hour()), Some(&b), false);
        assert_eq!(working, 8);
    }

    #[test]
    fn test_seconds_since_midnight_and_until_end() {
        let m = at(&Context::new(), 2026, 2, 16, 1, 1, 1);
        assert_eq!(m.seconds_since_midnight(), 3661);
        assert_eq!(m.seconds_until_end_of_day(), 86_399 - 3661);
    }

    #[test]
    fn test_humans_against_now() {
        let ctx = frozen(2026, 2, 18, 12, 0, 0);
        let now = ctx.now(None).unwrap();
        assert_eq!(now.sub_hour().diff_for_humans(None, false), "1 hour ago");
        assert_eq!(now.add_days(2).diff_for_humans(None, false), "2 days from now");
        assert_eq!(now.sub_days(15).diff_for_humans(None, false), "2 weeks ago");
        assert_eq!(now.diff_for_humans(None, false), "1 second ago");
        assert_eq!(now.sub_years(3).diff_for_humans(None, true), "3 years");
    }

    #[test]
    fn test_humans_against_other() {
        let ctx = Context::new();
        let a = at(&ctx, 2026, 1, 1, 0, 0, 0);
        let b = at(&ctx, 2026, 3, 1, 0, 0, 0);
        assert_eq!(a.diff_for_humans(Some(&b), false), "2 months before");
        assert_eq!(b.diff_for_humans(Some(&a), false), "2 months after");
    }

    #[test]
    fn test_humans_localized_with_tense_keys() {
        let ctx = frozen(2026, 2, 18, 12, 0, 0).with_locale("de");
        let now = ctx.now(None).unwrap();
        assert_eq!(now.sub_days(3).diff_for_humans(None, false), "vor 3 Tagen");
        assert_eq!(now.add_hours(2).diff_for_humans(None, false), "in 2 Stunden");
        assert_eq!(now.sub_days(3).diff_for_humans(None, true), "3 Tage");
    }

    #[test]
    fn test_humans_russian_plural_forms() {
        let ctx = frozen(2026, 2, 18, 12, 0, 0).with_locale("ru");
        let now = ctx.now(None).unwrap();
        let one = now.sub_minutes(21).diff_for_humans(None, true);
        let few = now.sub_minutes(3).diff_for_humans(None, true);
        let many = now.sub_minutes(5).diff_for_humans(None, true);
        assert_ne!(one, few);
        assert_ne!(few, many);
        assert!(one.starts_with("21 "));
    }
}
