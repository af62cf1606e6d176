//! Time utilities: timezone-aware deadline parsing for callers that hold
//! local wall-clock times.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse a deadline like "2026-08-06 17:00" in an IANA tz like
/// "Europe/Warsaw", returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_warsaw_deadline() {
        // August is CEST (UTC+2)
        let utc = parse_local_deadline_to_utc("2026-08-06 17:00", "Europe/Warsaw").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-08-06T15:00:00+00:00");
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(parse_local_deadline_to_utc("2026-08-06 17:00", "Mars/Olympus").is_err());
        assert!(parse_local_deadline_to_utc("next friday", "Europe/Warsaw").is_err());
    }
}
