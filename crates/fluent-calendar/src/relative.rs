//! Relative date/time expressions.
//!
//! [`Moment::modify`] evaluates a phrase such as `"next monday at noon"`,
//! `"first day of next month"`, `"+1 weekday"` or `"3 days ago"` against a
//! moment. Phrases are matched by a cascade of `try_*` parsers; when none
//! matches the whole phrase, it is split in two and the right half is
//! evaluated against the result of the left (`"tomorrow 14:00"`,
//! `"tomorrow +2 hours"`).

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Duration, Month, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

use crate::calendar::{self, days_until, last_weekday_on_or_before, nth_weekday_between};
use crate::error::{CalendarError, Result};
use crate::moment::Moment;
use crate::unit::TimeUnit;

/// Phrases longer than this are not split into sub-phrases.
const MAX_WORDS: usize = 8;

fn keyword_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)this|next|last|tomorrow|yesterday|midnight|today|[+-]|first|ago")
            .expect("keyword regex is valid")
    })
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{1,2}-\d{1,2}").expect("date regex is valid"))
}

/// Whether `text` reads as relative to now rather than as an absolute date.
///
/// Anything containing a `YYYY-MM-DD` date is absolute, even with a `+` offset
/// or a keyword elsewhere in it.
pub fn has_relative_keywords(text: &str) -> bool {
    if text.trim().is_empty() || date_pattern().is_match(text) {
        return false;
    }
    keyword_pattern().is_match(text)
}

impl Moment {
    /// Evaluate a relative expression against this moment.
    ///
    /// ```
    /// use fluent_calendar::{Components, Context};
    ///
    /// let ctx = Context::new();
    /// let m = ctx.create(Components::date_time(2026, 2, 18, 14, 30, 0), None).unwrap();
    /// assert_eq!(m.modify("next friday").unwrap().to_date_time_string(), "2026-02-20 00:00:00");
    /// assert_eq!(m.modify("+1 weekday").unwrap().to_date_string(), "2026-02-19");
    /// ```
    pub fn modify(&self, expression: &str) -> Result<Moment> {
        let normalized = normalize_expression(expression);
        let words: Vec<&str> = normalized.split_whitespace().collect();
        if words.is_empty() {
            return Err(CalendarError::InvalidArgument(
                "empty relative expression".to_string(),
            ));
        }
        evaluate(self, &words).ok_or_else(|| {
            tracing::debug!(expression, "relative expression not understood");
            CalendarError::InvalidArgument(format!(
                "Unable to parse relative expression '{expression}'"
            ))
        })
    }
}

// ── Expression evaluation ───────────────────────────────────────────────────

/// Lowercase, drop "the", collapse whitespace.
fn normalize_expression(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|word| *word != "the")
        .collect::<Vec<_>>()
        .join(" ")
}

fn evaluate(base: &Moment, words: &[&str]) -> Option<Moment> {
    let s = words.join(" ");
    try_single(&s, base).or_else(|| try_sequence(words, base))
}

fn try_single(s: &str, base: &Moment) -> Option<Moment> {
    try_anchored(s, base)
        .or_else(|| try_iso_date(s, base))
        .or_else(|| try_time_of_day_named(s, base))
        .or_else(|| try_explicit_time(s, base))
        .or_else(|| try_at_time(s, base))
        .or_else(|| try_first_last_day(s, base))
        .or_else(|| try_ordinal_weekday(s, base))
        .or_else(|| try_weekday_relative(s, base))
        .or_else(|| try_period_relative(s, base))
        .or_else(|| try_offset_chain(s, base))
}

/// Left part evaluated against `base`, right part against that result.
fn try_sequence(words: &[&str], base: &Moment) -> Option<Moment> {
    if words.len() < 2 || words.len() > MAX_WORDS {
        return None;
    }
    (1..words.len()).find_map(|split| {
        let left = evaluate(base, &words[..split])?;
        evaluate(&left, &words[split..])
    })
}

/// "now", "today", "midnight", "tomorrow", "yesterday".
fn try_anchored(s: &str, base: &Moment) -> Option<Moment> {
    match s {
        "now" => Some(*base),
        "today" | "midnight" => Some(base.start_of_day()),
        "tomorrow" => Some(base.add_day().start_of_day()),
        "yesterday" => Some(base.sub_day().start_of_day()),
        _ => None,
    }
}

/// "2026-03-10" → that date at midnight.
fn try_iso_date(s: &str, base: &Moment) -> Option<Moment> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(base.with_local(date.and_time(NaiveTime::MIN)))
}

fn try_time_of_day_named(s: &str, base: &Moment) -> Option<Moment> {
    named_time(s).map(|time| base.at_time(time))
}

fn try_explicit_time(s: &str, base: &Moment) -> Option<Moment> {
    clock_time(s).map(|time| base.at_time(time))
}

/// "at noon", "at 2pm".
fn try_at_time(s: &str, base: &Moment) -> Option<Moment> {
    let rest = s.strip_prefix("at ")?;
    let time = named_time(rest).or_else(|| clock_time(rest))?;
    Some(base.at_time(time))
}

/// "first day of next month", "last day of february 2024". Keeps the time.
fn try_first_last_day(s: &str, base: &Moment) -> Option<Moment> {
    let (which, rest) = s.split_once(" day of ")?;
    let (first, last) = resolve_period(rest, base)?;
    let date = match which {
        "first" => first,
        "last" => last,
        _ => return None,
    };
    Some(base.with_local(date.and_time(base.naive_local().time())))
}

/// "second tuesday of march 2026", "last friday of this month". Midnight.
fn try_ordinal_weekday(s: &str, base: &Moment) -> Option<Moment> {
    let (head, rest) = s.split_once(" of ")?;
    let (ordinal, weekday) = head.split_once(' ')?;
    let weekday = weekday_word(weekday)?;
    let ordinal = ordinal_word(ordinal)?;
    let (first, last) = resolve_period(rest, base)?;

    let date = if ordinal > 0 {
        nth_weekday_between(first, last, weekday, ordinal)?
    } else {
        last_weekday_on_or_before(last, weekday)
    };
    Some(base.with_local(date.and_time(NaiveTime::MIN)))
}

/// "monday", "this monday" (on or after today), "next monday" (strictly
/// after), "last monday" / "previous monday" (strictly before). Midnight.
fn try_weekday_relative(s: &str, base: &Moment) -> Option<Moment> {
    let (modifier, day) = match s.split_once(' ') {
        Some((modifier, day)) => (modifier, day),
        None => ("this", s),
    };
    let weekday = weekday_word(day)?;

    match modifier {
        "this" => {
            let ahead = days_until(base.day_of_week(), weekday);
            let date = base.date_naive() + Duration::days(ahead);
            Some(base.with_local(date.and_time(NaiveTime::MIN)))
        }
        "next" => Some(base.next(Some(weekday))),
        "last" | "previous" => Some(base.previous(Some(weekday))),
        _ => None,
    }
}

/// "next week", "last month", "this year". Keeps the time.
fn try_period_relative(s: &str, base: &Moment) -> Option<Moment> {
    let (modifier, unit) = s.split_once(' ')?;
    let step = match modifier {
        "this" => 0,
        "next" => 1,
        "last" | "previous" => -1,
        _ => return None,
    };
    match unit {
        "weekday" => Some(base.add_weekdays(step)),
        "fortnight" => base.checked_add(TimeUnit::Week, step * 2),
        _ => {
            let unit = TimeUnit::from_str(unit).ok()?;
            base.checked_add(unit, step)
        }
    }
}

/// "+1 day", "-2 weeks 3 hours", "in 3 days", "2 months ago",
/// "a week from now", "+2 weekdays". Each count carries its own sign; "ago"
/// flips the whole chain.
fn try_offset_chain(s: &str, base: &Moment) -> Option<Moment> {
    let (body, direction) = if let Some(rest) = s.strip_prefix("in ") {
        (rest, 1)
    } else if let Some(rest) = s.strip_suffix(" ago") {
        (rest, -1)
    } else if let Some(rest) = s.strip_suffix(" from now") {
        (rest, 1)
    } else {
        (s, 1)
    };

    let words: Vec<&str> = body.split_whitespace().collect();
    if words.is_empty() || words.len() % 2 != 0 {
        return None;
    }

    let mut result = *base;
    for pair in words.chunks(2) {
        let count = count_word(pair[0])?.checked_mul(direction)?;
        result = apply_offset(&result, count, pair[1])?;
    }
    Some(result)
}

fn apply_offset(moment: &Moment, count: i64, unit: &str) -> Option<Moment> {
    match unit {
        "weekday" | "weekdays" => Some(moment.add_weekdays(count)),
        "fortnight" | "fortnights" => moment.checked_add(TimeUnit::Week, count.checked_mul(2)?),
        _ => moment.checked_add(TimeUnit::from_str(unit).ok()?, count),
    }
}

/// First and last date of a month or year reference.
fn resolve_period(s: &str, base: &Moment) -> Option<(NaiveDate, NaiveDate)> {
    let words: Vec<&str> = s.split_whitespace().collect();
    let (year, month) = (base.year(), base.month());

    let shift = |modifier: &str| -> Option<i64> {
        match modifier {
            "this" => Some(0),
            "next" => Some(1),
            "last" | "previous" => Some(-1),
            _ => None,
        }
    };

    let month_bounds = |y: i32, m: u32| {
        let first = NaiveDate::from_ymd_opt(y, m, 1)?;
        Some((first, calendar::last_day_of_month(first)?))
    };
    let year_bounds = |y: i32| {
        Some((
            NaiveDate::from_ymd_opt(y, 1, 1)?,
            NaiveDate::from_ymd_opt(y, 12, 31)?,
        ))
    };

    match words.as_slice() {
        ["month"] => month_bounds(year, month),
        ["year"] => year_bounds(year),
        [modifier, "month"] => {
            let (y, m) = calendar::shift_year_month(year, month, shift(*modifier)?)?;
            month_bounds(y, m)
        }
        [modifier, "year"] => year_bounds(year.checked_add(shift(*modifier)? as i32)?),
        [name] => month_bounds(year, month_word(*name)?),
        [name, y] => month_bounds(y.parse().ok()?, month_word(*name)?),
        _ => None,
    }
}

// ── Vocabulary ──────────────────────────────────────────────────────────────
//
// Weekday and month names go through chrono's own `FromStr` (full names and
// three-letter abbreviations); the tables below only hold what it lacks.

const WEEKDAY_ALIASES: [(&str, Weekday); 2] = [("tues", Weekday::Tue), ("thurs", Weekday::Thu)];

const ORDINAL_WORDS: [&str; 5] = ["first", "second", "third", "fourth", "fifth"];

const COUNT_WORDS: [&str; 12] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven", "twelve",
];

/// Named times of day and their hour.
const NAMED_TIMES: [(&str, u32); 12] = [
    ("midnight", 0),
    ("morning", 9),
    ("sob", 9),
    ("start of business", 9),
    ("noon", 12),
    ("midday", 12),
    ("lunch", 12),
    ("afternoon", 13),
    ("eob", 17),
    ("end of business", 17),
    ("evening", 18),
    ("night", 21),
];

fn weekday_word(word: &str) -> Option<Weekday> {
    word.parse::<Weekday>().ok().or_else(|| {
        WEEKDAY_ALIASES
            .iter()
            .find_map(|(alias, day)| (*alias == word).then_some(*day))
    })
}

/// Month number for a month name or abbreviation ("sept" included).
fn month_word(word: &str) -> Option<u32> {
    if word == "sept" {
        return Some(9);
    }
    word.parse::<Month>().ok().map(|month| month.number_from_month())
}

/// Position of an ordinal word or "1st".."5th"; "last" is -1.
fn ordinal_word(word: &str) -> Option<i64> {
    if word == "last" {
        return Some(-1);
    }
    if let Some(index) = ORDINAL_WORDS.iter().position(|w| *w == word) {
        return Some(index as i64 + 1);
    }
    let n: i64 = word.get(..word.len().checked_sub(2)?)?.parse().ok()?;
    let suffix = match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    ((1..=5).contains(&n) && word.ends_with(suffix)).then_some(n)
}

/// A signed integer, "a"/"an", or a count word up to twelve.
fn count_word(word: &str) -> Option<i64> {
    if let Ok(n) = word.parse::<i64>() {
        return Some(n);
    }
    if word == "a" || word == "an" {
        return Some(1);
    }
    COUNT_WORDS
        .iter()
        .position(|w| *w == word)
        .map(|index| index as i64 + 1)
}

fn named_time(phrase: &str) -> Option<NaiveTime> {
    let (_, hour) = NAMED_TIMES.iter().find(|(name, _)| *name == phrase)?;
    NaiveTime::from_hms_opt(*hour, 0, 0)
}

/// "2pm", "2:30pm", "2 pm", "14:00", "14:30:00".
fn clock_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();

    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Some(t);
    }

    let compact = s.replace(' ', "");
    let (clock, is_pm) = if let Some(clock) = compact.strip_suffix("pm") {
        (clock, true)
    } else if let Some(clock) = compact.strip_suffix("am") {
        (clock, false)
    } else {
        return None;
    };

    let mut parts = clock.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    let second: u32 = parts.next().map_or(Some(0), |s| s.parse().ok())?;
    if !(1..=12).contains(&hour) || parts.next().is_some() {
        return None;
    }

    let hour24 = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, second)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Tz;

    use super::*;
    use crate::context::Context;

    /// Wednesday 2026-02-18 14:30:00 UTC.
    fn base() -> Moment {
        let frozen = Tz::UTC.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
        Context::new()
            .with_test_now(Some(frozen))
            .now(None)
            .unwrap()
    }

    fn eval(expr: &str) -> String {
        base()
            .modify(expr)
            .unwrap_or_else(|e| panic!("{expr}: {e}"))
            .to_date_time_string()
    }

    #[test]
    fn test_normalize_expression() {
        assert_eq!(normalize_expression("  Last   Day of THE Month "), "last day of month");
    }

    #[test]
    fn test_vocabulary() {
        assert_eq!(weekday_word("thurs"), Some(Weekday::Thu));
        assert_eq!(weekday_word("sun"), Some(Weekday::Sun));
        assert_eq!(weekday_word("monda"), None);
        assert_eq!(month_word("sept"), Some(9));
        assert_eq!(month_word("may"), Some(5));
        assert_eq!(month_word("decembre"), None);
        assert_eq!(ordinal_word("third"), Some(3));
        assert_eq!(ordinal_word("2nd"), Some(2));
        assert_eq!(ordinal_word("2th"), None);
        assert_eq!(ordinal_word("6th"), None);
        assert_eq!(ordinal_word("last"), Some(-1));
        assert_eq!(count_word("twelve"), Some(12));
        assert_eq!(count_word("an"), Some(1));
        assert_eq!(count_word("-4"), Some(-4));
        assert_eq!(named_time("end of business"), NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(named_time("dusk"), None);
    }

    #[test]
    fn test_anchors() {
        assert_eq!(eval("now"), "2026-02-18 14:30:00");
        assert_eq!(eval("Today"), "2026-02-18 00:00:00");
        assert_eq!(eval("midnight"), "2026-02-18 00:00:00");
        assert_eq!(eval("noon"), "2026-02-18 12:00:00");
        assert_eq!(eval("tomorrow"), "2026-02-19 00:00:00");
        assert_eq!(eval("yesterday"), "2026-02-17 00:00:00");
    }

    #[test]
    fn test_weekday_phrases() {
        assert_eq!(eval("next friday"), "2026-02-20 00:00:00");
        assert_eq!(eval("next wednesday"), "2026-02-25 00:00:00");
        assert_eq!(eval("last tuesday"), "2026-02-17 00:00:00");
        assert_eq!(eval("previous wednesday"), "2026-02-11 00:00:00");
        assert_eq!(eval("this sunday"), "2026-02-22 00:00:00");
        assert_eq!(eval("wednesday"), "2026-02-18 00:00:00");
        assert_eq!(eval("mon"), "2026-02-23 00:00:00");
    }

    #[test]
    fn test_offset_chains() {
        assert_eq!(eval("+1 day"), "2026-02-19 14:30:00");
        assert_eq!(eval("-2 weeks 3 hours"), "2026-02-04 17:30:00");
        assert_eq!(eval("in 3 days"), "2026-02-21 14:30:00");
        assert_eq!(eval("2 months ago"), "2025-12-18 14:30:00");
        assert_eq!(eval("a week from now"), "2026-02-25 14:30:00");
        assert_eq!(eval("three hours ago"), "2026-02-18 11:30:00");
        assert_eq!(eval("+1 fortnight"), "2026-03-04 14:30:00");
    }

    #[test]
    fn test_weekday_offsets_skip_weekend() {
        assert_eq!(eval("+1 weekday"), "2026-02-19 14:30:00");
        assert_eq!(eval("+3 weekdays"), "2026-02-23 14:30:00");
        assert_eq!(eval("3 weekdays ago"), "2026-02-13 14:30:00");
    }

    #[test]
    fn test_period_phrases() {
        assert_eq!(eval("next month"), "2026-03-18 14:30:00");
        assert_eq!(eval("last year"), "2025-02-18 14:30:00");
        assert_eq!(eval("next week"), "2026-02-25 14:30:00");
        assert_eq!(eval("this month"), "2026-02-18 14:30:00");
    }

    #[test]
    fn test_first_and_last_day_keep_time() {
        assert_eq!(eval("first day of next month"), "2026-03-01 14:30:00");
        assert_eq!(eval("last day of previous month"), "2026-01-31 14:30:00");
        assert_eq!(eval("last day of february 2024"), "2024-02-29 14:30:00");
        assert_eq!(eval("first day of the month"), "2026-02-01 14:30:00");
        assert_eq!(eval("last day of next year"), "2027-12-31 14:30:00");
    }

    #[test]
    fn test_ordinal_weekdays() {
        assert_eq!(eval("second tuesday of march 2026"), "2026-03-10 00:00:00");
        assert_eq!(eval("last friday of this month"), "2026-02-27 00:00:00");
        assert_eq!(eval("first monday of next month"), "2026-03-02 00:00:00");
        assert!(base().modify("fifth monday of this month").is_err());
    }

    #[test]
    fn test_explicit_times() {
        assert_eq!(eval("2pm"), "2026-02-18 14:00:00");
        assert_eq!(eval("9:15am"), "2026-02-18 09:15:00");
        assert_eq!(eval("12am"), "2026-02-18 00:00:00");
        assert_eq!(eval("09:15"), "2026-02-18 09:15:00");
        assert_eq!(eval("at 2 pm"), "2026-02-18 14:00:00");
    }

    #[test]
    fn test_combinations() {
        assert_eq!(eval("tomorrow 14:00"), "2026-02-19 14:00:00");
        assert_eq!(eval("next monday at noon"), "2026-02-23 12:00:00");
        assert_eq!(eval("tomorrow at 2pm"), "2026-02-19 14:00:00");
        assert_eq!(eval("yesterday evening"), "2026-02-17 18:00:00");
        assert_eq!(eval("tomorrow +2 hours"), "2026-02-19 02:00:00");
        assert_eq!(eval("2026-03-10 at 9am"), "2026-03-10 09:00:00");
    }

    #[test]
    fn test_unparseable_is_invalid_argument() {
        let err = base().modify("blorp the zorp").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(base().modify("   ").is_err());
        assert!(base().modify("13pm").is_err());
    }

    #[test]
    fn test_relative_keywords() {
        assert!(has_relative_keywords("next monday"));
        assert!(has_relative_keywords("+1 day"));
        assert!(has_relative_keywords("3 days ago"));
        assert!(has_relative_keywords("Tomorrow"));
        assert!(!has_relative_keywords("2026-02-18"));
        assert!(!has_relative_keywords("2026-02-18 +1 day"));
        assert!(!has_relative_keywords("March 3"));
        assert!(!has_relative_keywords(""));
    }

    #[test]
    fn test_respects_timezone_of_receiver() {
        let m = base().set_timezone("Asia/Tokyo").unwrap();
        // 23:30 in Tokyo; "tomorrow" is the Tokyo calendar day.
        let next = m.modify("tomorrow").unwrap();
        assert_eq!(next.to_date_time_string(), "2026-02-19 00:00:00");
        assert_eq!(next.timezone_name(), "Asia/Tokyo");
    }
}
