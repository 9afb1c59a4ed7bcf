//! Parse exported review histories into typed review events.
//!
//! Expected header (column order is free, extra columns are ignored):
//!   card_id,timestamp,feedback
//!
//! `feedback` must be one of -1, 0, +1. Rows whose timestamp cannot be
//! read are skipped with a warning; an out-of-range feedback value fails
//! the whole file.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use goldtime_core::{FeedbackTier, ReviewEvent};
use std::io::Read;
use std::path::Path;

use crate::timestamp::parse_timestamp;

struct Columns {
    card_id: usize,
    timestamp: usize,
    feedback: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("missing '{name}' column"))
        };
        Ok(Self {
            card_id: find("card_id")?,
            timestamp: find("timestamp")?,
            feedback: find("feedback")?,
        })
    }
}

/// Parse a review-history CSV file. Naive timestamps are read in `tz`.
pub fn parse_review_csv(path: impl AsRef<Path>, tz: &str, now: DateTime<Utc>) -> Result<Vec<ReviewEvent>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_review_reader(file, tz, now).with_context(|| format!("parsing {}", path.display()))
}

/// Same as [`parse_review_csv`] over any reader.
pub fn parse_review_reader<R: Read>(reader: R, tz: &str, now: DateTime<Utc>) -> Result<Vec<ReviewEvent>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let cols = Columns::from_headers(rdr.headers()?)?;
    let mut events = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = i + 2;

        let card_id = record.get(cols.card_id).unwrap_or("");
        if card_id.is_empty() {
            log::warn!("line {line}: empty card_id, skipped");
            continue;
        }

        let raw_ts = record.get(cols.timestamp).unwrap_or("");
        let timestamp = match parse_timestamp(raw_ts, tz, now) {
            Ok(ts) => ts,
            Err(e) => {
                log::warn!("line {line}: {e:#}, skipped");
                continue;
            }
        };

        let raw_fb = record.get(cols.feedback).unwrap_or("");
        let value: i64 = raw_fb
            .trim_start_matches('+')
            .parse()
            .with_context(|| format!("line {line}: feedback '{raw_fb}' is not an integer"))?;
        let tier = match FeedbackTier::try_from(value) {
            Ok(t) => t,
            Err(e) => bail!("line {line}: {e}"),
        };

        events.push(ReviewEvent::new(card_id, timestamp, tier));
    }

    log::debug!("parsed {} review events", events.len());
    Ok(events)
}
