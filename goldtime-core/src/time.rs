//! Time utilities: timezone-aware parsing and the calendar day a review
//! belongs to.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse().map_err(|_| anyhow!("invalid timezone: {tz}"))
}

/// Parse a wall-clock time like "2024-11-01 15:00:00" in an IANA tz like
/// "Asia/Tokyo", returning UTC.
pub fn parse_local_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz = parse_tz(tz)?;
    let local = local.trim();

    let ndt = LOCAL_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(local, f).ok())
        .ok_or_else(|| anyhow!("invalid local datetime '{local}'"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Calendar date of `at` in `tz`; daily progress rows are keyed by it.
pub fn local_date(at: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    Ok(at.with_timezone(&parse_tz(tz)?).date_naive())
}
