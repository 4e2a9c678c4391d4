use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse the schedule's compact `D-Mon-YY` / `DD-Mon-YY` date form.
///
/// The two-digit year is read as `2000 + YY`. Anything that is not exactly
/// three hyphen-separated tokens with a known month abbreviation and numeric
/// day and year returns `None`.
pub fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    let mut tokens = raw.trim().split('-');
    let (day, month, year) = (tokens.next()?, tokens.next()?, tokens.next()?);
    if tokens.next().is_some() {
        return None;
    }

    let day = parse_digits(day)?;
    let year = parse_digits(year)?;
    let month = month_number(month)?;

    NaiveDate::from_ymd_opt(2000 + year as i32, month, day)
}

pub fn format_compact_date(date: NaiveDate) -> String {
    let month = MONTHS[date.month0() as usize];
    format!("{:02}-{}-{:02}", date.day(), month, date.year().rem_euclid(100))
}

/// Whole days from `planned` (taken at midnight UTC) to `observed`,
/// truncated toward zero.
pub fn days_between(planned: NaiveDate, observed: DateTime<Utc>) -> i64 {
    let start = planned.and_time(NaiveTime::MIN).and_utc();
    (observed - start).num_days()
}

/// Parse an inventory `updated_at` cell: RFC 3339, or a naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD` read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_digits(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn month_number(token: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(token))
        .map(|idx| idx as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_padded_and_unpadded_days() {
        assert_eq!(
            parse_compact_date("5-Jan-26"),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
        assert_eq!(
            parse_compact_date("05-Jan-26"),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
        assert_eq!(
            parse_compact_date("31-dec-25"),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_compact_date(""), None);
        assert_eq!(parse_compact_date("15-Jan"), None);
        assert_eq!(parse_compact_date("15-Jan-26-01"), None);
        assert_eq!(parse_compact_date("15-Foo-26"), None);
        assert_eq!(parse_compact_date("xx-Jan-26"), None);
        assert_eq!(parse_compact_date("15-Jan-yy"), None);
        assert_eq!(parse_compact_date("31-Feb-26"), None);
        assert_eq!(parse_compact_date("2026-01-15"), None);
    }

    #[test]
    fn format_then_parse_returns_same_date() {
        for raw in ["1-Mar-24", "09-Aug-25", "29-Feb-24", "31-Dec-99", "1-Jan-00"] {
            let parsed = parse_compact_date(raw).expect("well-formed date");
            let formatted = format_compact_date(parsed);
            assert_eq!(parse_compact_date(&formatted), Some(parsed), "{raw}");
        }
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_compact_date(date), "07-Mar-26");
    }

    #[test]
    fn days_between_truncates_partial_days() {
        let planned = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let same_evening = Utc.with_ymd_and_hms(2026, 1, 15, 23, 59, 0).unwrap();
        let next_morning = Utc.with_ymd_and_hms(2026, 1, 16, 8, 0, 0).unwrap();
        let day_before = Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap();

        assert_eq!(days_between(planned, same_evening), 0);
        assert_eq!(days_between(planned, next_morning), 1);
        assert_eq!(days_between(planned, day_before), 0);
    }

    #[test]
    fn parses_inventory_timestamps() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 16, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-01-16T08:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-16T11:30:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-16 08:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2026-01-16"),
            Some(Utc.with_ymd_and_hms(2026, 1, 16, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
