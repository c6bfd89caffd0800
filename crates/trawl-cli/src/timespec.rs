//! Parsing of `--since`/`--until` time expressions.
//!
//! Accepted forms:
//!
//! - `all`: the Unix epoch
//! - `now`: the reference instant
//! - `<n><unit>` with unit `s`, `m`, `h`, `d` or `w`: that long before the
//!   reference instant
//! - RFC 3339, or `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`
//!   in local time

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CliError, Result};

/// `<count><unit>`, e.g. `42m`.
static RELATIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([smhdw])$").unwrap_or_else(|_| unreachable!()));

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parses `expr` relative to `now`.
///
/// # Errors
///
/// Returns [`CliError::InvalidTime`] if `expr` matches none of the accepted forms.
pub fn parse_time(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let expr = expr.trim();
    let invalid = || CliError::InvalidTime(expr.to_string());

    match expr {
        "all" => return Ok(DateTime::UNIX_EPOCH),
        "now" => return Ok(now),
        _ => {}
    }

    if let Some(caps) = RELATIVE_REGEX.captures(expr) {
        let count: i64 = caps[1].parse().map_err(|_| invalid())?;
        let span = match &caps[2] {
            "s" => Duration::try_seconds(count),
            "m" => Duration::try_minutes(count),
            "h" => Duration::try_hours(count),
            "d" => Duration::try_days(count),
            _ => Duration::try_weeks(count),
        }
        .ok_or_else(invalid)?;
        return now.checked_sub_signed(span).ok_or_else(invalid);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(expr) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(expr, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(expr, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-10T12:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .expect("valid instant")
    }

    #[test_case("30s", Duration::seconds(30) ; "seconds")]
    #[test_case("42m", Duration::minutes(42) ; "minutes")]
    #[test_case("1h", Duration::hours(1) ; "hours")]
    #[test_case("2d", Duration::days(2) ; "days")]
    #[test_case("1w", Duration::weeks(1) ; "weeks")]
    #[test_case("0m", Duration::zero() ; "zero")]
    fn relative(expr: &str, ago: Duration) {
        assert_eq!(parse_time(expr, now()).expect("parses"), now() - ago);
    }

    #[test]
    fn keywords() {
        assert_eq!(parse_time("all", now()).expect("parses"), DateTime::UNIX_EPOCH);
        assert_eq!(parse_time("now", now()).expect("parses"), now());
    }

    #[test]
    fn rfc3339_keeps_offset() {
        let parsed = parse_time("2013-01-02T13:23:37+02:00", now()).expect("parses");
        assert_eq!(parsed.to_rfc3339(), "2013-01-02T11:23:37+00:00");
    }

    #[test_case("2013-01-02T13:23:37" ; "t separator")]
    #[test_case("2013-01-02 13:23:37" ; "space separator")]
    fn local_timestamp(expr: &str) {
        let expected = Local
            .with_ymd_and_hms(2013, 1, 2, 13, 23, 37)
            .earliest()
            .expect("unambiguous")
            .with_timezone(&Utc);
        assert_eq!(parse_time(expr, now()).expect("parses"), expected);
    }

    #[test]
    fn local_date_is_midnight() {
        let expected = Local
            .with_ymd_and_hms(2013, 1, 2, 0, 0, 0)
            .earliest()
            .expect("unambiguous")
            .with_timezone(&Utc);
        assert_eq!(parse_time("2013-01-02", now()).expect("parses"), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("yesterday" ; "word")]
    #[test_case("5y" ; "unknown unit")]
    #[test_case("-5m" ; "negative")]
    #[test_case("2013-13-40" ; "bad date")]
    #[test_case("99999999999999999999m" ; "overflow")]
    fn rejects(expr: &str) {
        assert!(matches!(parse_time(expr, now()), Err(CliError::InvalidTime(_))));
    }
}
