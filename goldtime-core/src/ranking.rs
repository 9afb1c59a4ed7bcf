//! Due-time ranker: orders cards by urgency and buckets a due time into a
//! display priority tier.
//!
//! Ordering is a lexicographic sort on a three-slot key per card:
//! - A: signed whole days overdue (floored), or +inf when not overdue
//! - B: the due time itself when due now or later, or +inf
//! - C: negative ordinal day number of the due time, or 0 when absent
//!
//! Overdue cards come first (most overdue first), then upcoming cards
//! (soonest first), then cards without a due time. The card id is the final
//! tie-break so the order is total.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::card::Card;

const SECONDS_PER_DAY: i64 = 86_400;

/// A key slot that is either a finite value or +infinity.
///
/// Variant order gives `Finite(_) < Infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot<T> {
    Finite(T),
    Infinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UrgencyKey {
    pub overdue_days: Slot<i64>,
    pub upcoming: Slot<DateTime<Utc>>,
    pub tiebreak: i64,
}

pub fn urgency_key(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> UrgencyKey {
    let overdue_days = match due {
        Some(d) if d < now => Slot::Finite((d - now).num_seconds().div_euclid(SECONDS_PER_DAY)),
        _ => Slot::Infinite,
    };
    let upcoming = match due {
        Some(d) if d >= now => Slot::Finite(d),
        _ => Slot::Infinite,
    };
    let tiebreak = due.map(|d| -(d.date_naive().num_days_from_ce() as i64)).unwrap_or(0);

    UrgencyKey {
        overdue_days,
        upcoming,
        tiebreak,
    }
}

fn compare(a: &Card, b: &Card, now: DateTime<Utc>) -> Ordering {
    urgency_key(a.last_due, now)
        .cmp(&urgency_key(b.last_due, now))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort cards in place by urgency. Recomputed from scratch on every call.
pub fn rank_cards(cards: &mut [Card], now: DateTime<Utc>) {
    cards.sort_by(|a, b| compare(a, b, now));
}

/// Display urgency bucket for a single due time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Overdue,
    DueSoon,
    DueNear,
    PlentyOfTime,
}

impl PriorityTier {
    pub fn icon(self) -> &'static str {
        match self {
            PriorityTier::Overdue => "🔴",
            PriorityTier::DueSoon => "🟠",
            PriorityTier::DueNear => "🔵",
            PriorityTier::PlentyOfTime => "🟢",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityTier::Overdue => "overdue",
            PriorityTier::DueSoon => "due_soon",
            PriorityTier::DueNear => "due_near",
            PriorityTier::PlentyOfTime => "plenty_of_time",
        }
    }
}

/// Bucket a due time. Boundaries are inclusive on the lower tier: exactly one
/// day out is `DueSoon`, exactly two days out is `DueNear`.
pub fn classify(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> PriorityTier {
    let Some(due) = due else {
        return PriorityTier::PlentyOfTime;
    };

    let left = due - now;
    if left < Duration::zero() {
        PriorityTier::Overdue
    } else if left <= Duration::days(1) {
        PriorityTier::DueSoon
    } else if left <= Duration::days(2) {
        PriorityTier::DueNear
    } else {
        PriorityTier::PlentyOfTime
    }
}

/// Human label for the time left until `due`: "N/A", "now", or "{h}h {m}m".
pub fn time_until_label(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(due) = due else {
        return "N/A".to_string();
    };
    let secs = (due - now).num_seconds();
    if secs <= 0 {
        return "now".to_string();
    }
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}
