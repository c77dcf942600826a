//! Pure calendar helpers on naive dates: month lengths, month arithmetic with
//! and without day overflow, and nth-weekday resolution.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Shift a (year, month) pair by `months`, normalizing the month into 1..=12.
pub fn shift_year_month(year: i32, month: u32, months: i64) -> Option<(i32, u32)> {
    let total = (year as i64 * 12 + (month as i64 - 1)).checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    Some((year, month))
}

/// Add months letting the day roll into the following month when the target
/// month is too short (Jan 31 + 1 month → Mar 3).
pub fn add_months_overflow(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let (year, month) = shift_year_month(date.year(), date.month(), months)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(Duration::days(date.day() as i64 - 1))
}

/// Add months; when the raw (overflowing) result lands on a different day of
/// the month, snap back to the last day of the intended month.
pub fn add_months_no_overflow(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let raw = add_months_overflow(date, months)?;
    if raw.day() == date.day() {
        return Some(raw);
    }
    last_day_of_previous_month(raw)
}

pub fn first_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(days_in_month(date.year(), date.month()))
}

fn last_day_of_previous_month(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date)?.pred_opt()
}

/// Build a date from possibly out-of-range components, rolling excess months,
/// days into neighbouring periods (month 13 → January next year, day 0 → last
/// day of the previous month).
pub fn lenient_date(year: i32, month: i64, day: i64) -> Option<NaiveDate> {
    let (y, m) = shift_year_month(year, 1, month.checked_sub(1)?)?;
    NaiveDate::from_ymd_opt(y, m, 1)?.checked_add_signed(Duration::try_days(day.checked_sub(1)?)?)
}

/// Seconds from midnight for possibly out-of-range `h:m:s`, or `None` when
/// the sum does not fit.
pub fn lenient_seconds(hour: i64, minute: i64, second: i64) -> Option<i64> {
    hour.checked_mul(3600)?
        .checked_add(minute.checked_mul(60)?)?
        .checked_add(second)
}

/// [`lenient_date`] at midnight, then `seconds` later (negative rolls back
/// into previous days).
pub fn lenient_datetime(year: i32, month: i64, day: i64, seconds: i64) -> Option<NaiveDateTime> {
    lenient_date(year, month, day)?
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Days from `from` forward to the next `to` (0 when equal).
pub fn days_until(from: Weekday, to: Weekday) -> i64 {
    (to.num_days_from_monday() as i64 - from.num_days_from_monday() as i64).rem_euclid(7)
}

/// First `weekday` on or after `start`, advanced by `nth - 1` weeks. Returns
/// `None` when the result is after `last` or `nth < 1`.
pub fn nth_weekday_between(
    start: NaiveDate,
    last: NaiveDate,
    weekday: Weekday,
    nth: i64,
) -> Option<NaiveDate> {
    if nth < 1 {
        return None;
    }
    let first = start + Duration::days(days_until(start.weekday(), weekday));
    let target = first.checked_add_signed(Duration::try_weeks(nth - 1)?)?;
    (target <= last).then_some(target)
}

/// Last `weekday` on or before `end`.
pub fn last_weekday_on_or_before(end: NaiveDate, weekday: Weekday) -> NaiveDate {
    end - Duration::days(days_until(weekday, end.weekday()))
}
