//! Card model: only the fields scheduling needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flashcard as seen by the scheduler.
///
/// `last_due` is the authoritative gold time. `None` means due now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    /// Display text (the word or prompt on the front of the card).
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub last_due: Option<DateTime<Utc>>,
}

impl Card {
    pub fn new(id: impl Into<String>, front: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            front: front.into(),
            last_due: None,
        }
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.last_due = Some(due);
        self
    }
}
