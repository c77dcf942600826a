//! Timezone specifiers and wall-clock resolution.
//!
//! Everything that turns a local (naive) date/time back into an instant goes
//! through [`resolve_local`], so DST gaps and folds are handled in one place:
//! a local time inside a gap is pushed forward by the gap length, an
//! ambiguous local time resolves to the earlier instant.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::{OffsetComponents, Tz};

use crate::error::{CalendarError, Result};

/// Parse a timezone specifier into a `Tz`.
///
/// Accepts IANA names (`"Europe/Paris"`, `"UTC"`) and whole-hour offsets
/// (`"+5"`, `"-3"`, `"0"`), the latter mapped onto the `Etc/GMT` zones.
pub fn parse_timezone(spec: &str) -> Result<Tz> {
    let trimmed = spec.trim();
    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Ok(tz);
    }
    from_hour_offset(trimmed)
        .ok_or_else(|| CalendarError::InvalidArgument(format!("Unknown or bad timezone ({spec})")))
}

/// `Etc/GMT` zones carry the inverted POSIX sign: UTC+5 is `Etc/GMT-5`.
fn from_hour_offset(s: &str) -> Option<Tz> {
    let hours: i32 = s.strip_prefix('+').unwrap_or(s).parse().ok()?;
    if !(-12..=14).contains(&hours) {
        return None;
    }
    let name = match hours {
        0 => "Etc/GMT".to_string(),
        h if h > 0 => format!("Etc/GMT-{h}"),
        h => format!("Etc/GMT+{}", -h),
    };
    name.parse().ok()
}

/// Map a local wall-clock time onto an instant in `tz`.
pub fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Read the wall time with the offset in force before the gap.
            let before = tz.offset_from_utc_datetime(&(*naive - Duration::days(1)));
            let offset = before.fix().local_minus_utc();
            tz.from_utc_datetime(&(*naive - Duration::seconds(offset as i64)))
        }
    }
}

/// Offset from UTC in seconds.
pub fn offset_seconds(dt: &DateTime<Tz>) -> i32 {
    dt.offset().fix().local_minus_utc()
}

/// Format the UTC offset as a string (e.g., "-05:00", "+09:00").
pub fn format_utc_offset(dt: &DateTime<Tz>) -> String {
    let offset_secs = offset_seconds(dt);
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs_secs / 3600, (abs_secs % 3600) / 60)
}

/// Whether daylight saving time is in effect at this instant.
pub fn is_dst_active(dt: &DateTime<Tz>) -> bool {
    dt.offset().dst_offset() != Duration::zero()
}
