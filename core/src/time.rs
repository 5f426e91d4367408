//! Time related utils.

use crate::Error;
use chrono::Utc;

/// DateTime is the alias of chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into ISO 8601 with separators: "2022-03-13T07:20:04Z"
///
/// This is the layout of the RPC `Timestamp` parameter.
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Format time into http date: "Sun, 06 Nov 1994 08:49:37 GMT"
///
/// ## Note
///
/// HTTP dates are always expressed in GMT, never in local time.
///
/// Reference: <https://httpwg.org/specs/rfc9110.html#http.date>
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse time from RFC 3339, used by credential expirations: "2021-10-20T04:27:09Z"
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("parse {s} into rfc3339 failed")).with_source(e))
}

/// Parse time from RFC 2822: "Mon, 15 Aug 2022 16:50:12 GMT"
pub fn parse_rfc2822(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc2822(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("parse {s} into rfc2822 failed")).with_source(e))
}
