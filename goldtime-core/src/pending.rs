//! FeedbackBuffer: reviews recorded in a session, waiting to be synced.
//!
//! - One entry per card: recording a card again replaces its entry in place,
//!   so each sync cycle carries a single scheduling intent per card.
//! - Insertion order is preserved for the sync report.
//! - Single writer. Hosts that share it across threads must lock it themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::feedback::FeedbackTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFeedback {
    pub card_id: String,
    pub feedback_tier: FeedbackTier,
    pub predicted_due: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct FeedbackBuffer {
    entries: Vec<PendingFeedback>,
    // card_id -> position in `entries`
    idx: HashMap<String, usize>,
}

impl FeedbackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, card_id: &str) -> Option<&PendingFeedback> {
        self.idx.get(card_id).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingFeedback> {
        self.entries.iter()
    }

    /// Insert or replace the entry for a card. Returns true when an earlier
    /// entry for the same card was replaced.
    pub fn upsert(&mut self, entry: PendingFeedback) -> bool {
        match self.idx.get(&entry.card_id) {
            Some(&i) => {
                self.entries[i] = entry;
                true
            }
            None => {
                self.idx.insert(entry.card_id.clone(), self.entries.len());
                self.entries.push(entry);
                false
            }
        }
    }

    /// Remove and return every entry, leaving the buffer empty.
    pub fn take_all(&mut self) -> Vec<PendingFeedback> {
        self.idx.clear();
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(card: &str, tier: FeedbackTier, days: i64) -> PendingFeedback {
        let base = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        PendingFeedback {
            card_id: card.to_string(),
            feedback_tier: tier,
            predicted_due: base + Duration::days(days),
        }
    }

    #[test]
    fn later_feedback_replaces_in_place() {
        let mut b = FeedbackBuffer::new();
        assert!(!b.upsert(entry("a", FeedbackTier::Forgot, 1)));
        assert!(!b.upsert(entry("b", FeedbackTier::Unsure, 2)));
        assert!(b.upsert(entry("a", FeedbackTier::Confident, 5)));

        assert_eq!(b.len(), 2);
        assert_eq!(b.get("a").unwrap().feedback_tier, FeedbackTier::Confident);
        let order: Vec<&str> = b.iter().map(|e| e.card_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn take_all_empties_buffer() {
        let mut b = FeedbackBuffer::new();
        b.upsert(entry("a", FeedbackTier::Forgot, 1));
        b.upsert(entry("b", FeedbackTier::Forgot, 1));

        let taken = b.take_all();
        assert_eq!(taken.len(), 2);
        assert!(b.is_empty());
        assert!(b.get("a").is_none());

        // Index is rebuilt from scratch after a drain.
        assert!(!b.upsert(entry("a", FeedbackTier::Unsure, 3)));
        assert_eq!(b.len(), 1);
    }
}
