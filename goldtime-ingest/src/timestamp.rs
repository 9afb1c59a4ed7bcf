//! Tolerant timestamp parsing for review histories and CLI arguments.
//!
//! Accepted forms:
//!   2024-11-01T06:00:00Z          RFC 3339, any offset
//!   2024-11-01 15:00[:00]         wall clock in the supplied timezone
//!   now | -2d | +3h | -90m | +1w  relative to the supplied "now"

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use goldtime_core::time::parse_local_to_utc;
use regex::Regex;

fn parse_relative(s: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    if s.eq_ignore_ascii_case("now") {
        return Ok(Some(now));
    }

    let re = Regex::new(r"^(?P<sign>[+-])(?P<n>\d+(?:\.\d+)?)\s*(?P<unit>[mhdw])$")?;
    let Some(caps) = re.captures(s) else {
        return Ok(None);
    };

    let n: f64 = caps["n"]
        .parse()
        .with_context(|| format!("invalid offset '{s}'"))?;
    let unit_secs = match &caps["unit"] {
        "m" => 60.0,
        "h" => 3_600.0,
        "d" => 86_400.0,
        _ => 604_800.0,
    };
    let millis = (n * unit_secs * 1000.0).round();
    let offset = (millis < i64::MAX as f64)
        .then(|| Duration::try_milliseconds(millis as i64))
        .flatten()
        .ok_or_else(|| anyhow!("offset '{s}' is out of range"))?;

    let shifted = if &caps["sign"] == "-" {
        now.checked_sub_signed(offset)
    } else {
        now.checked_add_signed(offset)
    };
    shifted
        .map(Some)
        .ok_or_else(|| anyhow!("offset '{s}' is out of range"))
}

/// Parse `raw` into UTC. Naive wall-clock times are read in `tz`.
pub fn parse_timestamp(raw: &str, tz: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        bail!("empty timestamp");
    }
    if let Some(rel) = parse_relative(s, now)? {
        return Ok(rel);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_local_to_utc(s, tz).with_context(|| format!("unrecognised timestamp '{s}'"))
}
