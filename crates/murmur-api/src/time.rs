use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// SQLite's datetime('now') writes "YYYY-MM-DD HH:MM:SS" without a zone;
/// rows written by other tooling may carry full RFC 3339. Accept both,
/// reading the naive form as UTC.
pub(crate) fn parse_sqlite_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_default_format() {
        let ts = parse_sqlite_timestamp("2026-08-07 12:34:56");
        assert_eq!(ts.to_rfc3339(), "2026-08-07T12:34:56+00:00");
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_sqlite_timestamp("2026-08-07T12:34:56Z");
        assert_eq!(ts.to_rfc3339(), "2026-08-07T12:34:56+00:00");
    }

    #[test]
    fn corrupt_input_falls_back_to_epoch() {
        let ts = parse_sqlite_timestamp("yesterday-ish");
        assert_eq!(ts, DateTime::<Utc>::default());
    }
}
