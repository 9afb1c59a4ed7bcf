//! Learner feedback tiers and the recall-point covariate derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Three-valued recall signal emitted when a card is reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum FeedbackTier {
    /// -1: the learner forgot the card.
    Forgot,
    /// 0: the learner was unsure.
    Unsure,
    /// +1: the learner recalled the card confidently.
    Confident,
}

impl FeedbackTier {
    pub const ALL: [FeedbackTier; 3] = [FeedbackTier::Forgot, FeedbackTier::Unsure, FeedbackTier::Confident];

    pub fn value(self) -> i64 {
        match self {
            FeedbackTier::Forgot => -1,
            FeedbackTier::Unsure => 0,
            FeedbackTier::Confident => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedbackTier::Forgot => "forgot",
            FeedbackTier::Unsure => "unsure",
            FeedbackTier::Confident => "confident",
        }
    }
}

impl TryFrom<i64> for FeedbackTier {
    type Error = SchedulingError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(FeedbackTier::Forgot),
            0 => Ok(FeedbackTier::Unsure),
            1 => Ok(FeedbackTier::Confident),
            other => Err(SchedulingError::InvalidFeedbackTier(other)),
        }
    }
}

impl From<FeedbackTier> for i64 {
    fn from(t: FeedbackTier) -> i64 {
        t.value()
    }
}

impl std::fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+}", self.value())
    }
}

/// Whole days elapsed from `since` to `now`, floored and never negative.
///
/// A missing `since` means the card is due now, so nothing has elapsed.
pub fn elapsed_whole_days(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match since {
        Some(t) => (now - t).num_seconds().div_euclid(SECONDS_PER_DAY).max(0),
        None => 0,
    }
}

/// Recall point for a tier after `elapsed_days` whole days.
///
/// Unsure and confident grow by one point per elapsed day; forgot shrinks by
/// a third of the elapsed days, rounded.
pub fn recall_point(tier: FeedbackTier, elapsed_days: i64) -> i64 {
    let base = tier.value();
    match tier {
        FeedbackTier::Unsure | FeedbackTier::Confident => base + elapsed_days,
        FeedbackTier::Forgot => base - (elapsed_days as f64 / 3.0).round() as i64,
    }
}

/// Per-day review counts, keyed by tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTally {
    pub good_count: u32,
    pub normal_count: u32,
    pub bad_count: u32,
}

impl DailyTally {
    pub fn record(&mut self, tier: FeedbackTier) {
        match tier {
            FeedbackTier::Confident => self.good_count += 1,
            FeedbackTier::Unsure => self.normal_count += 1,
            FeedbackTier::Forgot => self.bad_count += 1,
        }
    }

    pub fn merge(&mut self, other: &DailyTally) {
        self.good_count += other.good_count;
        self.normal_count += other.normal_count;
        self.bad_count += other.bad_count;
    }

    pub fn total(&self) -> u32 {
        self.good_count + self.normal_count + self.bad_count
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn tier_rejects_out_of_range_values() {
        assert_eq!(FeedbackTier::try_from(1), Ok(FeedbackTier::Confident));
        assert_eq!(FeedbackTier::try_from(-1), Ok(FeedbackTier::Forgot));
        assert_eq!(FeedbackTier::try_from(2), Err(SchedulingError::InvalidFeedbackTier(2)));
        assert_eq!(FeedbackTier::try_from(-5), Err(SchedulingError::InvalidFeedbackTier(-5)));
    }

    #[test]
    fn tier_serializes_as_signed_integer() {
        let json = serde_json::to_string(&FeedbackTier::Forgot).unwrap();
        assert_eq!(json, "-1");
        let back: FeedbackTier = serde_json::from_str("1").unwrap();
        assert_eq!(back, FeedbackTier::Confident);
        assert!(serde_json::from_str::<FeedbackTier>("3").is_err());
    }

    #[test]
    fn elapsed_days_floor_and_clamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(elapsed_whole_days(None, now), 0);
        assert_eq!(elapsed_whole_days(Some(now - Duration::hours(47)), now), 1);
        assert_eq!(elapsed_whole_days(Some(now - Duration::days(5)), now), 5);
        assert_eq!(elapsed_whole_days(Some(now + Duration::days(3)), now), 0);
    }

    #[test]
    fn recall_point_rules() {
        assert_eq!(recall_point(FeedbackTier::Confident, 4), 5);
        assert_eq!(recall_point(FeedbackTier::Unsure, 4), 4);
        assert_eq!(recall_point(FeedbackTier::Forgot, 0), -1);
        assert_eq!(recall_point(FeedbackTier::Forgot, 1), -1);
        assert_eq!(recall_point(FeedbackTier::Forgot, 2), -2);
        assert_eq!(recall_point(FeedbackTier::Forgot, 5), -3);
        assert_eq!(recall_point(FeedbackTier::Forgot, 9), -4);
    }

    #[test]
    fn tally_counts_each_tier() {
        let mut t = DailyTally::default();
        t.record(FeedbackTier::Confident);
        t.record(FeedbackTier::Confident);
        t.record(FeedbackTier::Forgot);
        assert_eq!(t.good_count, 2);
        assert_eq!(t.bad_count, 1);
        assert_eq!(t.total(), 3);

        let mut day = DailyTally { normal_count: 4, ..Default::default() };
        day.merge(&t);
        assert_eq!(day, DailyTally { good_count: 2, normal_count: 4, bad_count: 1 });
    }
}
