use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Minute-precision UTC format used for every stored publication date.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses a feed or meta-tag date and renders it as `YYYY-MM-DDTHH:MM` in UTC.
///
/// Accepts RFC 2822 (`pubDate`), RFC 3339 (Atom, `article:published_time`) and a
/// few zone-less variants, which are taken as UTC. Returns `None` when nothing fits;
/// an unparseable date never fails the item it belongs to.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    match parsed {
        Some(dt) => Some(dt.format(DATE_FORMAT).to_string()),
        None => {
            tracing::debug!(date = %raw, "Unparseable date, leaving empty");
            None
        }
    }
}

/// Current time in the stored date format.
pub fn now_minute() -> String {
    Utc::now().format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc2822_is_converted_to_utc() {
        assert_eq!(
            normalize_date("Tue, 17 Feb 2026 09:20:00 -0300").as_deref(),
            Some("2026-02-17T12:20")
        );
    }

    #[test]
    fn test_rfc2822_gmt() {
        assert_eq!(
            normalize_date("Mon, 02 Mar 2026 18:05:59 GMT").as_deref(),
            Some("2026-03-02T18:05")
        );
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            normalize_date("2026-01-05T10:30:00+01:00").as_deref(),
            Some("2026-01-05T09:30")
        );
    }

    #[test]
    fn test_naive_formats_taken_as_utc() {
        assert_eq!(
            normalize_date("2026-01-05 10:30:00").as_deref(),
            Some("2026-01-05T10:30")
        );
        assert_eq!(normalize_date("2026-01-05").as_deref(), Some("2026-01-05T00:00"));
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(normalize_date("ontem à tarde"), None);
        assert_eq!(normalize_date("   "), None);
    }
}
