//! Review events and the gap samples a forecaster is trained on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::feedback::{recall_point, FeedbackTier};

/// One recorded review of a card. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub card_id: String,
    pub timestamp: DateTime<Utc>,
    pub feedback_tier: FeedbackTier,
}

impl ReviewEvent {
    pub fn new(card_id: impl Into<String>, timestamp: DateTime<Utc>, feedback_tier: FeedbackTier) -> Self {
        Self {
            card_id: card_id.into(),
            timestamp,
            feedback_tier,
        }
    }
}

/// Training-time observation: the gap that preceded a review and the recall
/// point it produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapSample {
    /// Fractional days since the previous review of the same card.
    pub days_since_last_review: f64,
    pub recall_point: i64,
}

/// Difference consecutive reviews of each card into gap samples.
///
/// Events are grouped per card and ordered by time; a card's first review has
/// no predecessor and yields no sample. The returned series is ordered by the
/// timestamp of the review that closed each gap (card id breaks ties).
pub fn derive_gap_samples(events: &[ReviewEvent]) -> Vec<GapSample> {
    let mut by_card: BTreeMap<&str, Vec<&ReviewEvent>> = BTreeMap::new();
    for ev in events {
        by_card.entry(ev.card_id.as_str()).or_default().push(ev);
    }

    let mut keyed: Vec<(DateTime<Utc>, &str, GapSample)> = Vec::new();
    for (card, mut evs) in by_card {
        evs.sort_by_key(|e| e.timestamp);
        for pair in evs.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let secs = (cur.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
            let days = (secs / 86_400.0).max(0.0);
            let whole = days.floor() as i64;
            keyed.push((
                cur.timestamp,
                card,
                GapSample {
                    days_since_last_review: days,
                    recall_point: recall_point(cur.feedback_tier, whole),
                },
            ));
        }
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    keyed.into_iter().map(|(_, _, s)| s).collect()
}
