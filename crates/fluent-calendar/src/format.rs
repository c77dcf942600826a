//! Named output formats, as chrono strftime strings.

pub const ATOM: &str = "%Y-%m-%dT%H:%M:%S%:z";
pub const COOKIE: &str = "%A, %d-%b-%Y %H:%M:%S %Z";
pub const ISO8601: &str = "%Y-%m-%dT%H:%M:%S%z";
pub const RFC822: &str = "%a, %d %b %y %H:%M:%S %z";
pub const RFC850: &str = "%A, %d-%b-%y %H:%M:%S %Z";
pub const RFC1036: &str = "%a, %d %b %y %H:%M:%S %z";
pub const RFC1123: &str = "%a, %d %b %Y %H:%M:%S %z";
pub const RFC2822: &str = "%a, %d %b %Y %H:%M:%S %z";
pub const RFC3339: &str = "%Y-%m-%dT%H:%M:%S%:z";
pub const RSS: &str = "%a, %d %b %Y %H:%M:%S %z";
pub const W3C: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub const DEFAULT_TO_STRING_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DATE: &str = "%Y-%m-%d";
pub const FORMATTED_DATE: &str = "%b %-d, %Y";
pub const TIME: &str = "%H:%M:%S";
pub const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";
pub const DAY_DATE_TIME: &str = "%a, %b %-d, %Y %-I:%M %p";
