//! Deterministic synthetic review history for training without real data.
//!
//! The history is one card reviewed `samples` times after an anchor review.
//! The first third are lapses with sub-day gaps, the middle third are
//! hesitant recalls one to three days apart, and the last third are
//! confident recalls two to six days apart.

use chrono::{DateTime, Duration, Utc};
use goldtime_core::{FeedbackTier, ReviewEvent};

pub const SYNTHETIC_CARD: &str = "synthetic";

pub const DEFAULT_SAMPLES: usize = 200;

/// Tier and gap (in days) of the `i`th synthetic review out of `n`.
fn step(i: usize, n: usize) -> (FeedbackTier, f64) {
    let k = (i % 3) as f64;
    if i < n / 3 {
        (FeedbackTier::Forgot, 2.0 / 24.0 + k / 36.0)
    } else if i < 2 * n / 3 {
        (FeedbackTier::Unsure, 1.0 + k)
    } else {
        (FeedbackTier::Confident, 2.0 * (1.0 + k))
    }
}

/// Build `samples + 1` events starting at `start`; differencing them yields
/// exactly `samples` gap samples.
pub fn synthetic_history(samples: usize, start: DateTime<Utc>) -> Vec<ReviewEvent> {
    let mut events = Vec::with_capacity(samples + 1);
    events.push(ReviewEvent::new(SYNTHETIC_CARD, start, FeedbackTier::Unsure));

    let mut at = start;
    for i in 0..samples {
        let (tier, gap_days) = step(i, samples);
        at += Duration::milliseconds((gap_days * 86_400_000.0).round() as i64);
        events.push(ReviewEvent::new(SYNTHETIC_CARD, at, tier));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use goldtime_core::derive_gap_samples;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn thirds_have_expected_tiers_and_gaps() {
        let events = synthetic_history(9, start());
        assert_eq!(events.len(), 10);

        let tiers: Vec<i64> = events[1..].iter().map(|e| e.feedback_tier.value()).collect();
        assert_eq!(tiers, vec![-1, -1, -1, 0, 0, 0, 1, 1, 1]);

        // 2h, 2h40m, 3h20m
        assert_eq!(events[1].timestamp - events[0].timestamp, Duration::hours(2));
        assert_eq!(events[2].timestamp - events[1].timestamp, Duration::minutes(160));
        assert_eq!(events[3].timestamp - events[2].timestamp, Duration::minutes(200));
        assert_eq!(events[4].timestamp - events[3].timestamp, Duration::days(1));
        assert_eq!(events[9].timestamp - events[8].timestamp, Duration::days(6));
    }

    #[test]
    fn differencing_yields_one_sample_per_review() {
        let samples = derive_gap_samples(&synthetic_history(DEFAULT_SAMPLES, start()));
        assert_eq!(samples.len(), DEFAULT_SAMPLES);
        assert!(samples.iter().all(|s| s.days_since_last_review > 0.0));
        // lapses never reach a whole day, so recall point stays at -1
        assert!(samples[..DEFAULT_SAMPLES / 3].iter().all(|s| s.recall_point == -1));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(synthetic_history(30, start()), synthetic_history(30, start()));
    }
}
