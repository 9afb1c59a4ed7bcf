//! Storage collaborator contracts consumed by the scheduler, plus in-memory
//! implementations.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::card::Card;
use crate::error::StoreError;
use crate::feedback::DailyTally;

/// Durable home of each card's gold time.
pub trait CardStore {
    fn get_last_due(&self, card_id: &str) -> Result<Option<DateTime<Utc>>, StoreError>;
    fn set_due(&mut self, card_id: &str, due: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Per-day review counters.
pub trait ProgressStore {
    /// Add `tally` to the row for `date`, creating the row if absent.
    fn increment_daily_tally(&mut self, date: NaiveDate, tally: &DailyTally) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryCardStore {
    cards: BTreeMap<String, Card>,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, card: Card) {
        self.cards.insert(card.id.clone(), card);
    }

    pub fn remove(&mut self, id: &str) -> Option<Card> {
        self.cards.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.values().cloned().collect()
    }
}

impl FromIterator<Card> for InMemoryCardStore {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut store = Self::new();
        for c in iter {
            store.insert(c);
        }
        store
    }
}

impl CardStore for InMemoryCardStore {
    fn get_last_due(&self, card_id: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.cards
            .get(card_id)
            .map(|c| c.last_due)
            .ok_or_else(|| StoreError::CardNotFound(card_id.to_string()))
    }

    fn set_due(&mut self, card_id: &str, due: DateTime<Utc>) -> Result<(), StoreError> {
        let card = self
            .cards
            .get_mut(card_id)
            .ok_or_else(|| StoreError::CardNotFound(card_id.to_string()))?;
        card.last_due = Some(due);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryProgressStore {
    days: BTreeMap<NaiveDate, DailyTally>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyTally> {
        self.days.get(&date)
    }

    /// Rows ordered by date.
    pub fn rows(&self) -> Vec<(NaiveDate, DailyTally)> {
        self.days.iter().map(|(d, t)| (*d, *t)).collect()
    }
}

impl FromIterator<(NaiveDate, DailyTally)> for InMemoryProgressStore {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, DailyTally)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn increment_daily_tally(&mut self, date: NaiveDate, tally: &DailyTally) -> Result<(), StoreError> {
        self.days.entry(date).or_default().merge(tally);
        Ok(())
    }
}
