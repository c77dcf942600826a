//! Signed arithmetic on moments.
//!
//! Each unit has one signed implementation; `sub_*` is `add_*` with the
//! amount negated. Month-based units (month, quarter, year, decade, century)
//! are all month arithmetic and follow the context's overflow policy. Days
//! and weeks move the local date and keep the wall-clock time; hours,
//! minutes and seconds move the instant.
//!
//! Results outside the engine's range leave the moment unchanged; use
//! [`Moment::checked_add`] to detect that case.

use chrono::{Duration, NaiveDate};

use crate::calendar;
use crate::moment::Moment;
use crate::unit::{TimeUnit, DAYS_PER_WEEK};

/// Generates `add_<plural>`, `add_<singular>`, `sub_<plural>`, `sub_<singular>`.
macro_rules! unit_shortcuts {
    ($($unit:expr => $add_n:ident, $add_1:ident, $sub_n:ident, $sub_1:ident;)*) => {
        impl Moment {
            $(
                pub fn $add_n(&self, value: i64) -> Moment {
                    self.add($unit, value)
                }

                pub fn $add_1(&self) -> Moment {
                    self.add($unit, 1)
                }

                pub fn $sub_n(&self, value: i64) -> Moment {
                    self.sub($unit, value)
                }

                pub fn $sub_1(&self) -> Moment {
                    self.sub($unit, 1)
                }
            )*
        }
    };
}

unit_shortcuts! {
    TimeUnit::Century => add_centuries, add_century, sub_centuries, sub_century;
    TimeUnit::Decade => add_decades, add_decade, sub_decades, sub_decade;
    TimeUnit::Year => add_years, add_year, sub_years, sub_year;
    TimeUnit::Quarter => add_quarters, add_quarter, sub_quarters, sub_quarter;
    TimeUnit::Month => add_months, add_month, sub_months, sub_month;
    TimeUnit::Week => add_weeks, add_week, sub_weeks, sub_week;
    TimeUnit::Day => add_days, add_day, sub_days, sub_day;
    TimeUnit::Hour => add_hours, add_hour, sub_hours, sub_hour;
    TimeUnit::Minute => add_minutes, add_minute, sub_minutes, sub_minute;
    TimeUnit::Second => add_seconds, add_second, sub_seconds, sub_second;
}

impl Moment {
    /// Add `value` units, or `None` when the result leaves the engine's range.
    pub fn checked_add(&self, unit: TimeUnit, value: i64) -> Option<Moment> {
        if let Some(months) = unit.months() {
            let overflow = self.context().should_overflow_months();
            return self.shift_months(months.checked_mul(value)?, overflow);
        }
        if let Some(seconds) = unit.seconds() {
            let delta = Duration::try_seconds(seconds.checked_mul(value)?)?;
            return self.datetime().checked_add_signed(delta).map(|dt| self.with_datetime(dt));
        }
        let days = match unit {
            TimeUnit::Week => value.checked_mul(DAYS_PER_WEEK)?,
            _ => value,
        };
        self.shift_days(days)
    }

    pub fn add(&self, unit: TimeUnit, value: i64) -> Moment {
        self.checked_add(unit, value).unwrap_or_else(|| {
            tracing::warn!(%unit, value, "arithmetic leaves the supported range, left unchanged");
            *self
        })
    }

    pub fn sub(&self, unit: TimeUnit, value: i64) -> Moment {
        self.add(unit, value.saturating_neg())
    }

    fn shift_days(&self, days: i64) -> Option<Moment> {
        let local = self.naive_local();
        let date = local.date().checked_add_signed(Duration::try_days(days)?)?;
        Some(self.with_local(date.and_time(local.time())))
    }

    fn shift_months(&self, months: i64, overflow: bool) -> Option<Moment> {
        let local = self.naive_local();
        let date = if overflow {
            calendar::add_months_overflow(local.date(), months)?
        } else {
            calendar::add_months_no_overflow(local.date(), months)?
        };
        Some(self.with_local(date.and_time(local.time())))
    }

    fn shift_months_or_keep(&self, months: i64, overflow: bool) -> Moment {
        self.shift_months(months, overflow).unwrap_or(*self)
    }

    /// Month arithmetic that lets the day roll over, whatever the context says.
    pub fn add_months_with_overflow(&self, value: i64) -> Moment {
        self.shift_months_or_keep(value, true)
    }

    pub fn sub_months_with_overflow(&self, value: i64) -> Moment {
        self.shift_months_or_keep(value.saturating_neg(), true)
    }

    /// Month arithmetic that snaps to the end of a too-short target month,
    /// whatever the context says.
    pub fn add_months_no_overflow(&self, value: i64) -> Moment {
        self.shift_months_or_keep(value, false)
    }

    pub fn sub_months_no_overflow(&self, value: i64) -> Moment {
        self.shift_months_or_keep(value.saturating_neg(), false)
    }

    /// Move by `value` weekdays, skipping the context's weekend days and
    /// keeping the time of day. Starting on a weekend, the first weekday in
    /// the direction of travel counts as one.
    pub fn add_weekdays(&self, value: i64) -> Moment {
        match self.weekday_target(value) {
            Some(date) => self.with_local(date.and_time(self.naive_local().time())),
            None => {
                tracing::warn!(value, "no weekdays configured or out of range, left unchanged");
                *self
            }
        }
    }

    pub fn add_weekday(&self) -> Moment {
        self.add_weekdays(1)
    }

    pub fn sub_weekdays(&self, value: i64) -> Moment {
        self.add_weekdays(value.saturating_neg())
    }

    pub fn sub_weekday(&self) -> Moment {
        self.add_weekdays(-1)
    }

    fn weekday_target(&self, value: i64) -> Option<NaiveDate> {
        let ctx = self.context();
        let per_week = self.weekdays_per_week();
        let mut date = self.date_naive();
        if value == 0 {
            return Some(date);
        }
        if per_week == 0 {
            return None;
        }
        let step = value.signum();
        let mut remaining = i64::try_from(value.unsigned_abs()).ok()?;

        // Skip whole weeks first; each holds exactly `per_week` weekdays.
        let whole_weeks = (remaining - 1) / per_week;
        date = date.checked_add_signed(Duration::try_weeks(whole_weeks * step)?)?;
        remaining -= whole_weeks * per_week;

        while remaining > 0 {
            date = date.checked_add_signed(Duration::days(step))?;
            if !ctx.is_weekend_day(chrono::Datelike::weekday(&date)) {
                remaining -= 1;
            }
        }
        Some(date)
    }

    fn weekdays_per_week(&self) -> i64 {
        DAYS_PER_WEEK - self.context().weekend_days().len() as i64
    }

    /// Midpoint between this moment and `other` (now when `None`).
    pub fn average(&self, other: Option<&Moment>) -> Moment {
        self.add_seconds(self.diff_in_seconds(other, false) / 2)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use crate::context::{Components, Context};
    use crate::moment::Moment;
    use crate::unit::TimeUnit;

    fn at(y: i64, m: i64, d: i64, h: i64, i: i64, s: i64) -> Moment {
        Context::new()
            .create(Components::date_time(y, m, d, h, i, s), None)
            .unwrap()
    }

    #[test]
    fn test_add_months_overflow_default() {
        let jan31 = at(2023, 1, 31, 10, 0, 0);
        assert_eq!(jan31.add_months(1).to_date_time_string(), "2023-03-03 10:00:00");
        let leap = at(2024, 1, 31, 10, 0, 0);
        assert_eq!(leap.add_month().to_date_string(), "2024-03-02");
    }

    #[test]
    fn test_add_months_no_overflow_context() {
        let ctx = Context::new().use_months_overflow(false);
        let jan31 = ctx.create(Components::date_time(2023, 1, 31, 10, 0, 0), None).unwrap();
        assert_eq!(jan31.add_months(1).to_date_time_string(), "2023-02-28 10:00:00");
        assert_eq!(jan31.sub_months(2).to_date_string(), "2022-11-30");
    }

    #[test]
    fn test_forced_modes_ignore_context() {
        let jan31 = at(2023, 1, 31, 0, 0, 0);
        assert_eq!(jan31.add_months_no_overflow(1).to_date_string(), "2023-02-28");
        let ctx = Context::new().use_months_overflow(false);
        let jan31 = jan31.with_context(ctx);
        assert_eq!(jan31.add_months_with_overflow(1).to_date_string(), "2023-03-03");
        assert_eq!(jan31.sub_months_with_overflow(2).to_date_string(), "2022-12-01");
    }

    #[test]
    fn test_quarter_decade_century_are_months() {
        let m = at(2020, 11, 30, 0, 0, 0);
        assert_eq!(m.add_quarter().to_date_string(), "2021-03-02");
        assert_eq!(m.add_decades(2).to_date_string(), "2040-11-30");
        assert_eq!(m.sub_century().to_date_string(), "1920-11-30");
        let feb29 = at(2024, 2, 29, 0, 0, 0);
        assert_eq!(feb29.add_year().to_date_string(), "2025-03-01");
        let ctx = Context::new().use_months_overflow(false);
        assert_eq!(feb29.with_context(ctx).add_year().to_date_string(), "2025-02-28");
    }

    #[test]
    fn test_add_then_sub_days() {
        let m = at(2026, 3, 1, 12, 30, 0);
        for n in [-400, -1, 0, 1, 45, 1000] {
            assert_eq!(m.add_days(n).sub_days(n), m);
        }
    }

    #[test]
    fn test_days_keep_wall_clock_across_dst() {
        let ctx = Context::new();
        let before = ctx
            .create(Components::date_time(2026, 3, 7, 10, 0, 0), Some("America/New_York"))
            .unwrap();
        let after = before.add_day();
        assert_eq!(after.to_date_time_string(), "2026-03-08 10:00:00");
        assert_eq!(after.timestamp() - before.timestamp(), 23 * 3600);
        assert_eq!(before.add_hours(24).to_date_time_string(), "2026-03-08 11:00:00");
    }

    #[test]
    fn test_add_weekdays_skips_weekend_and_keeps_time() {
        // 2026-02-20 is a Friday.
        let fri = at(2026, 2, 20, 14, 15, 0);
        assert_eq!(fri.add_weekday().to_date_time_string(), "2026-02-23 14:15:00");
        assert_eq!(fri.add_weekdays(6).to_date_string(), "2026-03-02");
        assert_eq!(fri.sub_weekdays(5).to_date_string(), "2026-02-13");
        let sat = at(2026, 2, 21, 9, 0, 0);
        assert_eq!(sat.add_weekday().to_date_string(), "2026-02-23");
        assert_eq!(sat.sub_weekday().to_date_string(), "2026-02-20");
        assert_eq!(sat.add_weekdays(0), sat);
    }

    #[test]
    fn test_add_weekdays_custom_weekend() {
        let ctx = Context::new().with_weekend_days(&[Weekday::Fri, Weekday::Sat]);
        let thu = ctx.create(Components::date(2026, 2, 19), None).unwrap();
        assert_eq!(thu.add_weekday().day_of_week(), Weekday::Sun);
        let never = Context::new().with_weekend_days(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]);
        assert_eq!(thu.with_context(never).add_weekdays(3), thu);
    }

    #[test]
    fn test_sub_time_units() {
        let m = at(2026, 1, 1, 0, 0, 30);
        assert_eq!(m.sub_seconds(31).to_date_time_string(), "2025-12-31 23:59:59");
        assert_eq!(m.sub_minute().to_date_time_string(), "2025-12-31 23:59:30");
        assert_eq!(m.add(TimeUnit::Hour, 3).hour(), 3);
        assert_eq!(m.sub(TimeUnit::Week, 1).to_date_string(), "2025-12-25");
    }

    #[test]
    fn test_checked_add_out_of_range() {
        let m = at(2026, 1, 1, 0, 0, 0);
        assert!(m.checked_add(TimeUnit::Century, 1_000_000).is_none());
        assert_eq!(m.add_centuries(1_000_000), m);
    }

    #[test]
    fn test_average() {
        let a = at(2026, 1, 1, 0, 0, 0);
        let b = at(2026, 1, 3, 0, 0, 0);
        assert_eq!(a.average(Some(&b)).to_date_time_string(), "2026-01-02 00:00:00");
        assert_eq!(b.average(Some(&a)).to_date_time_string(), "2026-01-02 00:00:00");
    }
}
