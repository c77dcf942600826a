//! Period boundaries: start/end of day through century, nth weekday of a
//! month, quarter or year, and next/previous weekday.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::calendar::{self, last_weekday_on_or_before, nth_weekday_between};
use crate::moment::Moment;
use crate::unit::{TimeUnit, SECONDS_PER_HOUR, SECONDS_PER_MINUTE, YEARS_PER_CENTURY, YEARS_PER_DECADE};

/// The last representable second of a day.
const END_OF_DAY: (u32, u32, u32) = (23, 59, 59);

impl Moment {
    /// This moment's timezone, the given date, at `h:m:s`.
    fn at_date(&self, date: NaiveDate, (h, m, s): (u32, u32, u32)) -> Moment {
        match date.and_hms_opt(h, m, s) {
            Some(naive) => self.with_local(naive),
            None => *self,
        }
    }

    fn at_ymd(&self, year: i32, month: u32, day: u32, time: (u32, u32, u32)) -> Moment {
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => self.at_date(date, time),
            None => *self,
        }
    }

    /// Start of the `span`-second slice of the local clock containing this
    /// moment. Moves the instant itself, so a moment in the repeated hour of
    /// a DST fold keeps its offset.
    fn floor_seconds(&self, span: i64) -> Moment {
        let into = (self.naive_local().num_seconds_from_midnight() as i64).rem_euclid(span);
        let back = Duration::seconds(into) + Duration::nanoseconds(self.datetime().nanosecond() as i64);
        match self.datetime().checked_sub_signed(back) {
            Some(dt) => self.with_datetime(dt),
            None => *self,
        }
    }

    fn ceil_seconds(&self, span: i64) -> Moment {
        let start = self.floor_seconds(span);
        match start.datetime().checked_add_signed(Duration::seconds(span - 1)) {
            Some(dt) => self.with_datetime(dt),
            None => *self,
        }
    }

    pub fn start_of(&self, unit: TimeUnit) -> Moment {
        match unit {
            TimeUnit::Second => self.floor_seconds(1),
            TimeUnit::Minute => self.floor_seconds(SECONDS_PER_MINUTE),
            TimeUnit::Hour => self.floor_seconds(SECONDS_PER_HOUR),
            TimeUnit::Day => self.start_of_day(),
            TimeUnit::Week => self.start_of_week(),
            TimeUnit::Month => self.start_of_month(),
            TimeUnit::Quarter => self.start_of_quarter(),
            TimeUnit::Year => self.start_of_year(),
            TimeUnit::Decade => self.start_of_decade(),
            TimeUnit::Century => self.start_of_century(),
        }
    }

    pub fn end_of(&self, unit: TimeUnit) -> Moment {
        match unit {
            TimeUnit::Second => self.floor_seconds(1),
            TimeUnit::Minute => self.ceil_seconds(SECONDS_PER_MINUTE),
            TimeUnit::Hour => self.ceil_seconds(SECONDS_PER_HOUR),
            TimeUnit::Day => self.end_of_day(),
            TimeUnit::Week => self.end_of_week(),
            TimeUnit::Month => self.end_of_month(),
            TimeUnit::Quarter => self.end_of_quarter(),
            TimeUnit::Year => self.end_of_year(),
            TimeUnit::Decade => self.end_of_decade(),
            TimeUnit::Century => self.end_of_century(),
        }
    }

    pub fn start_of_day(&self) -> Moment {
        self.at_date(self.date_naive(), (0, 0, 0))
    }

    pub fn end_of_day(&self) -> Moment {
        self.at_date(self.date_naive(), END_OF_DAY)
    }

    /// Walk back to the context's week-start day, then midnight.
    pub fn start_of_week(&self) -> Moment {
        let target = self.context().week_starts_at();
        let mut date = self.date_naive();
        for _ in 0..7 {
            if date.weekday() == target {
                break;
            }
            date = date - Duration::days(1);
        }
        self.at_date(date, (0, 0, 0))
    }

    /// Walk forward to the context's week-end day, then 23:59:59.
    pub fn end_of_week(&self) -> Moment {
        let target = self.context().week_ends_at();
        let mut date = self.date_naive();
        for _ in 0..7 {
            if date.weekday() == target {
                break;
            }
            date = date + Duration::days(1);
        }
        self.at_date(date, END_OF_DAY)
    }

    pub fn start_of_month(&self) -> Moment {
        self.at_ymd(self.year(), self.month(), 1, (0, 0, 0))
    }

    pub fn end_of_month(&self) -> Moment {
        self.at_ymd(self.year(), self.month(), self.days_in_month(), END_OF_DAY)
    }

    pub fn start_of_quarter(&self) -> Moment {
        let month = (self.quarter() - 1) * 3 + 1;
        self.at_ymd(self.year(), month, 1, (0, 0, 0))
    }

    pub fn end_of_quarter(&self) -> Moment {
        let month = self.quarter() * 3;
        let last = calendar::days_in_month(self.year(), month);
        self.at_ymd(self.year(), month, last, END_OF_DAY)
    }

    pub fn start_of_year(&self) -> Moment {
        self.at_ymd(self.year(), 1, 1, (0, 0, 0))
    }

    pub fn end_of_year(&self) -> Moment {
        self.at_ymd(self.year(), 12, 31, END_OF_DAY)
    }

    /// January 1st of the year ending in 0.
    pub fn start_of_decade(&self) -> Moment {
        let year = self.year() - self.year().rem_euclid(YEARS_PER_DECADE as i32);
        self.at_ymd(year, 1, 1, (0, 0, 0))
    }

    pub fn end_of_decade(&self) -> Moment {
        let year = self.year() - self.year().rem_euclid(YEARS_PER_DECADE as i32)
            + YEARS_PER_DECADE as i32
            - 1;
        self.at_ymd(year, 12, 31, END_OF_DAY)
    }

    /// Centuries run from year xx01 through (xx+1)00.
    pub fn start_of_century(&self) -> Moment {
        let year = self.century_base() + 1;
        self.at_ymd(year, 1, 1, (0, 0, 0))
    }

    pub fn end_of_century(&self) -> Moment {
        let year = self.century_base() + YEARS_PER_CENTURY as i32;
        self.at_ymd(year, 12, 31, END_OF_DAY)
    }

    fn century_base(&self) -> i32 {
        let y = self.year() - 1;
        y - y.rem_euclid(YEARS_PER_CENTURY as i32)
    }

    // ── Weekday navigation ──────────────────────────────────────────────

    /// Midnight of the next `weekday` strictly after today (the same weekday
    /// next week when `None`).
    pub fn next(&self, weekday: Option<Weekday>) -> Moment {
        let target = weekday.unwrap_or_else(|| self.day_of_week());
        let ahead = match calendar::days_until(self.day_of_week(), target) {
            0 => 7,
            n => n,
        };
        self.at_date(self.date_naive() + Duration::days(ahead), (0, 0, 0))
    }

    /// Midnight of the last `weekday` strictly before today (the same weekday
    /// last week when `None`).
    pub fn previous(&self, weekday: Option<Weekday>) -> Moment {
        let target = weekday.unwrap_or_else(|| self.day_of_week());
        let back = match calendar::days_until(target, self.day_of_week()) {
            0 => 7,
            n => n,
        };
        self.at_date(self.date_naive() - Duration::days(back), (0, 0, 0))
    }

    // ── First / last / nth of a period ──────────────────────────────────

    fn period_bounds(&self, unit: TimeUnit) -> (NaiveDate, NaiveDate) {
        let start = self.start_of(unit).date_naive();
        let end = self.end_of(unit).date_naive();
        (start, end)
    }

    fn first_in(&self, unit: TimeUnit, weekday: Option<Weekday>) -> Moment {
        let (start, end) = self.period_bounds(unit);
        let date = match weekday {
            Some(day) => nth_weekday_between(start, end, day, 1).unwrap_or(start),
            None => start,
        };
        self.at_date(date, (0, 0, 0))
    }

    fn last_in(&self, unit: TimeUnit, weekday: Option<Weekday>) -> Moment {
        let (_, end) = self.period_bounds(unit);
        let date = match weekday {
            Some(day) => last_weekday_on_or_before(end, day),
            None => end,
        };
        self.at_date(date, (0, 0, 0))
    }

    /// Midnight of the `nth` `weekday` in the period, or `None` when that
    /// occurrence falls outside it.
    fn nth_in(&self, unit: TimeUnit, nth: i64, weekday: Weekday) -> Option<Moment> {
        let (start, end) = self.period_bounds(unit);
        nth_weekday_between(start, end, weekday, nth).map(|date| self.at_date(date, (0, 0, 0)))
    }

    /// First day of the month, or its first `weekday`, at midnight.
    pub fn first_of_month(&self, weekday: Option<Weekday>) -> Moment {
        self.first_in(TimeUnit::Month, weekday)
    }

    /// Last day of the month, or its last `weekday`, at midnight.
    pub fn last_of_month(&self, weekday: Option<Weekday>) -> Moment {
        self.last_in(TimeUnit::Month, weekday)
    }

    pub fn nth_of_month(&self, nth: i64, weekday: Weekday) -> Option<Moment> {
        self.nth_in(TimeUnit::Month, nth, weekday)
    }

    pub fn first_of_quarter(&self, weekday: Option<Weekday>) -> Moment {
        self.first_in(TimeUnit::Quarter, weekday)
    }

    pub fn last_of_quarter(&self, weekday: Option<Weekday>) -> Moment {
        self.last_in(TimeUnit::Quarter, weekday)
    }

    pub fn nth_of_quarter(&self, nth: i64, weekday: Weekday) -> Option<Moment> {
        self.nth_in(TimeUnit::Quarter, nth, weekday)
    }

    pub fn first_of_year(&self, weekday: Option<Weekday>) -> Moment {
        self.first_in(TimeUnit::Year, weekday)
    }

    pub fn last_of_year(&self, weekday: Option<Weekday>) -> Moment {
        self.last_in(TimeUnit::Year, weekday)
    }

    pub fn nth_of_year(&self, nth: i64, weekday: Weekday) -> Option<Moment> {
        self.nth_in(TimeUnit::Year, nth, weekday)
    }

    /// Same date, given time of day.
    pub(crate) fn at_time(&self, time: NaiveTime) -> Moment {
        self.with_local(self.date_naive().and_time(time))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use crate::context::{Components, Context};
    use crate::moment::Moment;
    use crate::unit::TimeUnit;

    fn at(ctx: &Context, y: i64, m: i64, d: i64, h: i64) -> Moment {
        ctx.create(Components::date_time(y, m, d, h, 30, 15), None).unwrap()
    }

    #[test]
    fn test_start_and_end_of_day() {
        let m = at(&Context::new(), 2026, 2, 18, 14);
        assert_eq!(m.start_of_day().to_date_time_string(), "2026-02-18 00:00:00");
        assert_eq!(m.end_of_day().to_date_time_string(), "2026-02-18 23:59:59");
    }

    #[test]
    fn test_week_boundaries_default_monday() {
        // Wednesday Feb 18 2026.
        let m = at(&Context::new(), 2026, 2, 18, 14);
        assert_eq!(m.start_of_week().to_date_time_string(), "2026-02-16 00:00:00");
        assert_eq!(m.end_of_week().to_date_time_string(), "2026-02-22 23:59:59");
    }

    #[test]
    fn test_week_boundaries_sunday_start() {
        let ctx = Context::new()
            .with_week_starts_at(Weekday::Sun)
            .with_week_ends_at(Weekday::Sat);
        let m = at(&ctx, 2026, 2, 18, 14);
        assert_eq!(m.start_of_week().to_date_string(), "2026-02-15");
        assert_eq!(m.end_of_week().to_date_string(), "2026-02-21");
        let sunday = at(&ctx, 2026, 2, 15, 9);
        assert_eq!(sunday.start_of_week().to_date_string(), "2026-02-15");
    }

    #[test]
    fn test_month_quarter_year() {
        let m = at(&Context::new(), 2024, 2, 10, 8);
        assert_eq!(m.start_of_month().to_date_time_string(), "2024-02-01 00:00:00");
        assert_eq!(m.end_of_month().to_date_time_string(), "2024-02-29 23:59:59");
        assert_eq!(m.start_of_quarter().to_date_string(), "2024-01-01");
        assert_eq!(m.end_of_quarter().to_date_time_string(), "2024-03-31 23:59:59");
        assert_eq!(m.start_of_year().to_date_string(), "2024-01-01");
        assert_eq!(m.end_of_year().to_date_time_string(), "2024-12-31 23:59:59");
        let nov = at(&Context::new(), 2024, 11, 10, 8);
        assert_eq!(nov.start_of_quarter().to_date_string(), "2024-10-01");
        assert_eq!(nov.end_of_quarter().to_date_string(), "2024-12-31");
    }

    #[test]
    fn test_decade_and_century() {
        let ctx = Context::new();
        let m = at(&ctx, 2026, 6, 1, 0);
        assert_eq!(m.start_of_decade().to_date_string(), "2020-01-01");
        assert_eq!(m.end_of_decade().to_date_time_string(), "2029-12-31 23:59:59");
        assert_eq!(m.start_of_century().to_date_string(), "2001-01-01");
        assert_eq!(m.end_of_century().to_date_string(), "2100-12-31");
        let y2k = at(&ctx, 2000, 6, 1, 0);
        assert_eq!(y2k.start_of_century().to_date_string(), "1901-01-01");
        assert_eq!(y2k.end_of_century().to_date_string(), "2000-12-31");
        assert_eq!(y2k.start_of_decade().to_date_string(), "2000-01-01");
    }

    #[test]
    fn test_sub_day_units() {
        let m = at(&Context::new(), 2026, 2, 18, 14);
        assert_eq!(m.start_of(TimeUnit::Hour).to_time_string(), "14:00:00");
        assert_eq!(m.end_of(TimeUnit::Hour).to_time_string(), "14:59:59");
        assert_eq!(m.start_of(TimeUnit::Minute).to_time_string(), "14:30:00");
        assert_eq!(m.end_of(TimeUnit::Minute).to_time_string(), "14:30:59");
    }

    #[test]
    fn test_sub_day_units_in_dst_fold() {
        // 01:00-02:00 happens twice in New York on 2026-11-01.
        let ctx = Context::new().with_timezone("America/New_York").unwrap();
        let first = ctx.create(Components::date_time(2026, 11, 1, 1, 30, 0), None).unwrap();
        assert_eq!(first.to_rfc3339_string(), "2026-11-01T01:30:00-04:00");
        assert_eq!(first.end_of(TimeUnit::Hour).to_rfc3339_string(), "2026-11-01T01:59:59-04:00");

        let second = first.add_hour();
        assert_eq!(second.to_rfc3339_string(), "2026-11-01T01:30:00-05:00");
        assert_eq!(second.start_of(TimeUnit::Second), second);
        assert_eq!(second.end_of(TimeUnit::Second), second);
        assert_eq!(second.start_of(TimeUnit::Minute).to_rfc3339_string(), "2026-11-01T01:30:00-05:00");
        assert_eq!(second.end_of(TimeUnit::Minute).to_rfc3339_string(), "2026-11-01T01:30:59-05:00");
        assert_eq!(second.start_of(TimeUnit::Hour).to_rfc3339_string(), "2026-11-01T01:00:00-05:00");
        assert_eq!(second.end_of(TimeUnit::Hour).to_rfc3339_string(), "2026-11-01T01:59:59-05:00");
        for unit in TimeUnit::ALL {
            assert!(second.start_of(unit) <= second, "{unit}");
            assert!(second.end_of(unit) >= second, "{unit}");
        }
    }

    #[test]
    fn test_sub_day_units_drop_fraction_and_keep_half_hour_zones() {
        let ctx = Context::new().with_timezone("Asia/Kolkata").unwrap();
        let m = ctx.create(Components::date_time(2026, 2, 18, 14, 30, 15), None).unwrap();
        let m = m.with_datetime(m.datetime() + chrono::Duration::milliseconds(250));
        assert_eq!(m.start_of(TimeUnit::Second).datetime().timestamp_subsec_nanos(), 0);
        assert_eq!(m.start_of(TimeUnit::Hour).to_rfc3339_string(), "2026-02-18T14:00:00+05:30");
        assert_eq!(m.end_of(TimeUnit::Hour).to_rfc3339_string(), "2026-02-18T14:59:59+05:30");
    }

    #[test]
    fn test_next_and_previous() {
        let wed = at(&Context::new(), 2026, 2, 18, 14);
        assert_eq!(wed.next(Some(Weekday::Mon)).to_date_time_string(), "2026-02-23 00:00:00");
        assert_eq!(wed.next(Some(Weekday::Wed)).to_date_string(), "2026-02-25");
        assert_eq!(wed.next(None).to_date_string(), "2026-02-25");
        assert_eq!(wed.previous(Some(Weekday::Tue)).to_date_string(), "2026-02-17");
        assert_eq!(wed.previous(None).to_date_string(), "2026-02-11");
    }

    #[test]
    fn test_nth_of_month() {
        let m = at(&Context::new(), 2026, 3, 20, 14);
        let third_tue = m.nth_of_month(3, Weekday::Tue).unwrap();
        assert_eq!(third_tue.to_date_time_string(), "2026-03-17 00:00:00");
        assert_eq!(m.nth_of_month(1, Weekday::Sun).unwrap().to_date_string(), "2026-03-01");
        assert!(m.nth_of_month(5, Weekday::Wed).is_none());
        assert!(m.nth_of_month(0, Weekday::Wed).is_none());
    }

    #[test]
    fn test_first_and_last_of_month() {
        let m = at(&Context::new(), 2026, 2, 18, 14);
        assert_eq!(m.first_of_month(None).to_date_time_string(), "2026-02-01 00:00:00");
        assert_eq!(m.first_of_month(Some(Weekday::Mon)).to_date_string(), "2026-02-02");
        assert_eq!(m.last_of_month(None).to_date_string(), "2026-02-28");
        assert_eq!(m.last_of_month(Some(Weekday::Fri)).to_date_string(), "2026-02-27");
    }

    #[test]
    fn test_quarter_and_year_nth() {
        let m = at(&Context::new(), 2026, 2, 18, 14);
        assert_eq!(m.first_of_quarter(None).to_date_string(), "2026-01-01");
        assert_eq!(m.last_of_quarter(None).to_date_string(), "2026-03-31");
        assert_eq!(m.first_of_quarter(Some(Weekday::Thu)).to_date_string(), "2026-01-01");
        assert_eq!(m.last_of_quarter(Some(Weekday::Mon)).to_date_string(), "2026-03-30");
        assert_eq!(m.nth_of_quarter(2, Weekday::Fri).unwrap().to_date_string(), "2026-01-09");
        assert!(m.nth_of_quarter(14, Weekday::Fri).is_none());
        assert_eq!(m.first_of_year(Some(Weekday::Mon)).to_date_string(), "2026-01-05");
        assert_eq!(m.last_of_year(None).to_date_string(), "2026-12-31");
        assert_eq!(m.nth_of_year(53, Weekday::Thu).unwrap().to_date_string(), "2026-12-31");
        assert!(m.nth_of_year(53, Weekday::Fri).is_none());
    }
}
