//! Scheduling context: next-due prediction, feedback intake and best-effort
//! batch sync.
//!
//! One `SchedulingContext` is built per process or session and passed by
//! reference; it owns the loaded forecaster and the pending-feedback buffer.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, StoreError};
use crate::feedback::{elapsed_whole_days, recall_point, DailyTally, FeedbackTier};
use crate::forecaster::Forecaster;
use crate::pending::{FeedbackBuffer, PendingFeedback};
use crate::store::{CardStore, ProgressStore};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerPolicy {
    /// Offset applied when no forecaster is loaded.
    pub fallback_interval: Duration,
    /// Floor for degenerate (non-positive or NaN) forecasts.
    pub min_gap: Duration,
    /// Ceiling for runaway extrapolation.
    pub max_gap: Duration,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            fallback_interval: Duration::days(2),
            min_gap: Duration::hours(1),
            max_gap: Duration::days(3650),
        }
    }
}

/// Where a predicted due time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Forecast,
    /// Forecast was out of range and clamped to the policy bounds.
    Clamped,
    /// No forecaster loaded; fixed offset used.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuePrediction {
    pub due: DateTime<Utc>,
    pub recall_point: i64,
    /// Gap actually applied, in days.
    pub gap_days: f64,
    pub source: PredictionSource,
}

/// Outcome of persisting one buffered entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    pub entry: PendingFeedback,
    pub outcome: Result<(), StoreError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub date: NaiveDate,
    pub items: Vec<ItemReport>,
    /// Tier counts added to the day's tally (every attempted entry counts).
    pub tally: DailyTally,
    /// `None` when there was nothing to sync and the tally was not touched.
    pub tally_outcome: Option<Result<(), StoreError>>,
}

impl SyncReport {
    pub fn persisted(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.persisted()
    }

    /// True when every entry and the tally were persisted.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0 && !matches!(self.tally_outcome, Some(Err(_)))
    }
}

pub struct SchedulingContext {
    forecaster: Option<Forecaster>,
    policy: SchedulerPolicy,
    pending: FeedbackBuffer,
}

impl SchedulingContext {
    pub fn new(forecaster: Option<Forecaster>, policy: SchedulerPolicy) -> Self {
        Self {
            forecaster,
            policy,
            pending: FeedbackBuffer::new(),
        }
    }

    /// False when predictions use the fixed fallback offset.
    pub fn has_forecaster(&self) -> bool {
        self.forecaster.is_some()
    }

    pub fn policy(&self) -> &SchedulerPolicy {
        &self.policy
    }

    pub fn pending(&self) -> &FeedbackBuffer {
        &self.pending
    }

    /// Predict the next due time for a card reviewed at `now`.
    ///
    /// A missing `last_due` is treated as `now`. Never fails: without a
    /// forecaster the fixed fallback offset is used, and degenerate
    /// forecasts are clamped into `[min_gap, max_gap]`.
    pub fn predict(&self, last_due: Option<DateTime<Utc>>, tier: FeedbackTier, now: DateTime<Utc>) -> DuePrediction {
        let base = last_due.unwrap_or(now);
        let rp = recall_point(tier, elapsed_whole_days(last_due, now));

        let Some(model) = &self.forecaster else {
            let (due, gap) = self.advance(base, self.policy.fallback_interval);
            return DuePrediction {
                due,
                recall_point: rp,
                gap_days: days_of(gap),
                source: PredictionSource::Fallback,
            };
        };

        let raw = model.predict(rp);
        let (min, max) = (days_of(self.policy.min_gap), days_of(self.policy.max_gap));
        let (gap_days, source) = if raw.is_nan() || raw <= 0.0 {
            log::warn!("degenerate forecast {raw} for recall point {rp}; clamping to {min} days");
            (min, PredictionSource::Clamped)
        } else if raw < min {
            (min, PredictionSource::Clamped)
        } else if raw > max {
            log::warn!("forecast {raw} days exceeds ceiling; clamping to {max} days");
            (max, PredictionSource::Clamped)
        } else {
            (raw, PredictionSource::Forecast)
        };

        let gap = Duration::try_milliseconds((gap_days * MILLIS_PER_DAY).round() as i64)
            .unwrap_or(self.policy.max_gap);
        let (due, applied) = self.advance(base, gap);
        let source = if applied == gap { source } else { PredictionSource::Clamped };
        DuePrediction {
            due,
            recall_point: rp,
            gap_days: days_of(applied),
            source,
        }
    }

    /// `base + gap`, falling back to `max_gap` and then to the latest
    /// representable instant when the sum overflows.
    fn advance(&self, base: DateTime<Utc>, gap: Duration) -> (DateTime<Utc>, Duration) {
        if let Some(due) = base.checked_add_signed(gap) {
            return (due, gap);
        }
        log::warn!("due time overflows from {base} by {gap}; using the {} ceiling", self.policy.max_gap);
        match base.checked_add_signed(self.policy.max_gap) {
            Some(due) => (due, self.policy.max_gap),
            None => (DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MAX_UTC - base),
        }
    }

    pub fn predict_next_due(&self, last_due: Option<DateTime<Utc>>, tier: FeedbackTier, now: DateTime<Utc>) -> DateTime<Utc> {
        self.predict(last_due, tier, now).due
    }

    /// Validate a raw tier, predict the card's next due time and buffer it.
    ///
    /// Touches no durable state. An unreadable gold time is treated as due now.
    pub fn record_feedback<S: CardStore + ?Sized>(
        &mut self,
        cards: &S,
        card_id: &str,
        tier: i64,
        now: DateTime<Utc>,
    ) -> Result<PendingFeedback, SchedulingError> {
        let tier = FeedbackTier::try_from(tier)?;

        let last_due = cards.get_last_due(card_id).unwrap_or_else(|e| {
            log::warn!("could not read gold time for {card_id}: {e}; treating as due now");
            None
        });

        let entry = PendingFeedback {
            card_id: card_id.to_string(),
            feedback_tier: tier,
            predicted_due: self.predict_next_due(last_due, tier, now),
        };
        if self.pending.upsert(entry.clone()) {
            log::debug!("replaced pending feedback for {card_id}");
        }
        Ok(entry)
    }

    /// Persist every buffered entry, then add the tier counts to `date`'s tally.
    ///
    /// Not transactional: each entry is written independently, failures are
    /// reported per item and the buffer is cleared regardless.
    pub fn flush_pending<C, P>(&mut self, cards: &mut C, progress: &mut P, date: NaiveDate) -> SyncReport
    where
        C: CardStore + ?Sized,
        P: ProgressStore + ?Sized,
    {
        let entries = self.pending.take_all();
        let mut tally = DailyTally::default();
        let mut items = Vec::with_capacity(entries.len());

        for entry in entries {
            let outcome = cards.set_due(&entry.card_id, entry.predicted_due);
            if let Err(e) = &outcome {
                log::warn!("failed to persist gold time for {}: {e}", entry.card_id);
            }
            tally.record(entry.feedback_tier);
            items.push(ItemReport { entry, outcome });
        }

        let tally_outcome = if tally.is_empty() {
            None
        } else {
            let res = progress.increment_daily_tally(date, &tally);
            if let Err(e) = &res {
                log::warn!("failed to update study progress for {date}: {e}");
            }
            Some(res)
        };

        let report = SyncReport {
            date,
            items,
            tally,
            tally_outcome,
        };
        log::info!(
            "synced {} of {} pending reviews for {date}",
            report.persisted(),
            report.items.len()
        );
        report
    }
}

fn days_of(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Card;
    use crate::forecaster::GapModel;
    use crate::store::{InMemoryCardStore, InMemoryProgressStore};
    use chrono::TimeZone;
    use std::sync::Arc;

    struct ConstGap(f64);
    impl GapModel for ConstGap {
        fn predict(&self, _recall_point: i64) -> f64 {
            self.0
        }
    }

    /// Gap grows with the recall point so the seeding can be observed.
    struct LinearGap;
    impl GapModel for LinearGap {
        fn predict(&self, recall_point: i64) -> f64 {
            1.0 + recall_point as f64
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 20, 10, 0, 0).unwrap()
    }

    fn ctx(model: Option<Forecaster>) -> SchedulingContext {
        SchedulingContext::new(model, SchedulerPolicy::default())
    }

    #[test]
    fn fallback_adds_two_days_to_last_due() {
        let c = ctx(None);
        let now = now();
        let yesterday = now - Duration::days(1);
        for tier in FeedbackTier::ALL {
            let p = c.predict(Some(yesterday), tier, now);
            assert_eq!(p.due, yesterday + Duration::days(2));
            assert_eq!(p.source, PredictionSource::Fallback);
        }
        assert_eq!(c.predict_next_due(None, FeedbackTier::Unsure, now), now + Duration::days(2));
    }

    #[test]
    fn forecast_is_added_to_last_due() {
        let c = ctx(Some(Arc::new(ConstGap(1.5))));
        let now = now();
        let last = now - Duration::days(3);
        let p = c.predict(Some(last), FeedbackTier::Confident, now);
        assert_eq!(p.source, PredictionSource::Forecast);
        assert_eq!(p.due, last + Duration::hours(36));
        assert_eq!(p.recall_point, 4);
    }

    #[test]
    fn recall_point_is_seeded_from_tier_and_elapsed_days() {
        let c = ctx(Some(Arc::new(LinearGap)));
        let now = now();
        let last = now - Duration::days(6) - Duration::hours(5);

        assert_eq!(c.predict(Some(last), FeedbackTier::Confident, now).recall_point, 7);
        assert_eq!(c.predict(Some(last), FeedbackTier::Unsure, now).recall_point, 6);
        assert_eq!(c.predict(Some(last), FeedbackTier::Forgot, now).recall_point, -3);
        assert_eq!(c.predict(None, FeedbackTier::Forgot, now).recall_point, -1);
    }

    #[test]
    fn degenerate_forecasts_are_clamped() {
        let now = now();
        for raw in [f64::NAN, -4.0, 0.0, 0.001] {
            let c = ctx(Some(Arc::new(ConstGap(raw))));
            let p = c.predict(Some(now), FeedbackTier::Forgot, now);
            assert_eq!(p.source, PredictionSource::Clamped, "raw={raw}");
            assert_eq!(p.due, now + Duration::hours(1), "raw={raw}");
        }

        let c = ctx(Some(Arc::new(ConstGap(1e12))));
        let p = c.predict(Some(now), FeedbackTier::Confident, now);
        assert_eq!(p.source, PredictionSource::Clamped);
        assert_eq!(p.due, now + Duration::days(3650));
    }

    #[test]
    fn oversized_offsets_fall_back_to_ceiling() {
        let now = now();
        let policy = SchedulerPolicy {
            fallback_interval: Duration::MAX,
            ..SchedulerPolicy::default()
        };
        let c = SchedulingContext::new(None, policy);
        let p = c.predict(Some(now), FeedbackTier::Unsure, now);
        assert_eq!(p.due, now + Duration::days(3650));
        assert_eq!(p.gap_days, 3650.0);

        let policy = SchedulerPolicy {
            max_gap: Duration::MAX,
            ..SchedulerPolicy::default()
        };
        let c = SchedulingContext::new(Some(Arc::new(ConstGap(1e15))), policy);
        let p = c.predict(Some(now), FeedbackTier::Confident, now);
        assert_eq!(p.due, DateTime::<Utc>::MAX_UTC);
        assert_eq!(p.source, PredictionSource::Clamped);
    }

    #[test]
    fn invalid_tier_never_enters_buffer() {
        let mut c = ctx(None);
        let cards: InMemoryCardStore = [Card::new("a", "猫")].into_iter().collect();
        let err = c.record_feedback(&cards, "a", 2, now()).unwrap_err();
        assert_eq!(err, SchedulingError::InvalidFeedbackTier(2));
        assert!(c.pending().is_empty());
    }

    #[test]
    fn unknown_card_is_scheduled_from_now() {
        let mut c = ctx(None);
        let cards = InMemoryCardStore::new();
        let entry = c.record_feedback(&cards, "ghost", 0, now()).unwrap();
        assert_eq!(entry.predicted_due, now() + Duration::days(2));
        assert_eq!(c.pending().len(), 1);
    }

    #[test]
    fn flush_writes_due_times_and_tally() {
        let now = now();
        let mut c = ctx(None);
        let mut cards: InMemoryCardStore = [
            Card::new("a", "犬").with_due(now - Duration::days(1)),
            Card::new("b", "鳥"),
        ]
        .into_iter()
        .collect();
        let mut progress = InMemoryProgressStore::new();

        c.record_feedback(&cards, "a", -1, now).unwrap();
        c.record_feedback(&cards, "b", 1, now).unwrap();

        let day = now.date_naive();
        let report = c.flush_pending(&mut cards, &mut progress, day);
        assert!(report.is_complete());
        assert_eq!(report.persisted(), 2);
        assert!(c.pending().is_empty());

        assert_eq!(cards.get("a").unwrap().last_due, Some(now + Duration::days(1)));
        assert_eq!(cards.get("b").unwrap().last_due, Some(now + Duration::days(2)));
        assert_eq!(progress.get(day), Some(&DailyTally { good_count: 1, normal_count: 0, bad_count: 1 }));
    }

    #[test]
    fn empty_flush_leaves_tally_untouched() {
        let mut c = ctx(None);
        let mut cards = InMemoryCardStore::new();
        let mut progress = InMemoryProgressStore::new();
        let report = c.flush_pending(&mut cards, &mut progress, now().date_naive());
        assert!(report.items.is_empty());
        assert_eq!(report.tally_outcome, None);
        assert!(progress.rows().is_empty());
    }
}
