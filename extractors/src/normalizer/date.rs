use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Resolves a candidate's date field to a concrete instant.
///
/// Relative tokens are resolved against `now`; RFC 3339 timestamps and bare
/// `YYYY-MM-DD` dates are parsed; anything else falls back to `now`.
pub fn resolve_tx_date(date: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return now;
    };

    match raw.to_lowercase().as_str() {
        "today" | "hari ini" => return now,
        "yesterday" | "kemarin" => return now - Duration::days(1),
        _ => {}
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }

    now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_relative_tokens() {
        assert_eq!(resolve_tx_date(Some("today"), now()), now());
        assert_eq!(resolve_tx_date(Some("Hari Ini"), now()), now());
        assert_eq!(resolve_tx_date(Some("kemarin"), now()).day(), 9);
        assert_eq!(resolve_tx_date(Some("yesterday"), now()).day(), 9);
    }

    #[test]
    fn test_iso_dates() {
        let parsed = resolve_tx_date(Some("2025-01-05T08:00:00Z"), now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap());

        let parsed = resolve_tx_date(Some("2025-01-05"), now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_or_garbage_is_now() {
        assert_eq!(resolve_tx_date(None, now()), now());
        assert_eq!(resolve_tx_date(Some(""), now()), now());
        assert_eq!(resolve_tx_date(Some("minggu lalu"), now()), now());
    }
}
