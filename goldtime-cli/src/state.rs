use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use goldtime_core::{
    Card, CardStore, DailyTally, InMemoryCardStore, InMemoryProgressStore, ProgressStore, StoreError,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub fn goldtime_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("GOLDTIME_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".goldtime"))
}

pub fn ensure_goldtime_home() -> Result<PathBuf> {
    let dir = goldtime_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn cards_path() -> Result<PathBuf> {
    Ok(ensure_goldtime_home()?.join("cards.json"))
}

pub fn progress_path() -> Result<PathBuf> {
    Ok(ensure_goldtime_home()?.join("progress.json"))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Card collection kept in a JSON file. Every due-time write is flushed to
/// disk before it is reported as persisted.
pub struct FileCardStore {
    path: PathBuf,
    cards: InMemoryCardStore,
}

impl FileCardStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let list: Vec<Card> = read_json(&path)?;
        Ok(Self {
            path,
            cards: list.into_iter().collect(),
        })
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.cards()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cards.get(id).is_some()
    }

    pub fn insert(&mut self, card: Card) -> Result<()> {
        self.cards.insert(card);
        self.save()
    }

    pub fn remove(&mut self, id: &str) -> Result<Option<Card>> {
        let removed = self.cards.remove(id);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.cards.cards()).with_context(|| format!("write {}", self.path.display()))
    }
}

impl CardStore for FileCardStore {
    fn get_last_due(&self, card_id: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.cards.get_last_due(card_id)
    }

    fn set_due(&mut self, card_id: &str, due: DateTime<Utc>) -> Result<(), StoreError> {
        let mut next = self.cards.clone();
        next.set_due(card_id, due)?;
        write_json(&self.path, &next.cards())
            .map_err(|e| StoreError::Backend(format!("write {}: {e}", self.path.display())))?;
        self.cards = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProgressRow {
    date: NaiveDate,
    #[serde(flatten)]
    tally: DailyTally,
}

/// Daily tallies kept in a JSON file, one row per calendar date.
pub struct FileProgressStore {
    path: PathBuf,
    days: InMemoryProgressStore,
}

impl FileProgressStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rows: Vec<ProgressRow> = read_json(&path)?;
        Ok(Self {
            path,
            days: rows.into_iter().map(|r| (r.date, r.tally)).collect(),
        })
    }

    pub fn rows(&self) -> Vec<(NaiveDate, DailyTally)> {
        self.days.rows()
    }
}

impl ProgressStore for FileProgressStore {
    fn increment_daily_tally(&mut self, date: NaiveDate, tally: &DailyTally) -> Result<(), StoreError> {
        let mut next = self.days.clone();
        next.increment_daily_tally(date, tally)?;

        let rows: Vec<ProgressRow> = next
            .rows()
            .into_iter()
            .map(|(date, tally)| ProgressRow { date, tally })
            .collect();
        write_json(&self.path, &rows)
            .map_err(|e| StoreError::Backend(format!("write {}: {e}", self.path.display())))?;

        self.days = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 7, 30, 0).unwrap()
    }

    #[test]
    fn card_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");

        let mut store = FileCardStore::open(&path).unwrap();
        assert!(store.cards().is_empty());
        store.insert(Card::new("a", "鳥")).unwrap();
        store.insert(Card::new("b", "魚").with_due(now())).unwrap();
        store.set_due("a", now() + Duration::days(2)).unwrap();

        let reopened = FileCardStore::open(&path).unwrap();
        assert_eq!(reopened.get_last_due("a").unwrap(), Some(now() + Duration::days(2)));
        assert_eq!(reopened.get_last_due("b").unwrap(), Some(now()));
        assert!(matches!(reopened.get_last_due("zzz"), Err(StoreError::CardNotFound(_))));
    }

    #[test]
    fn failed_write_leaves_card_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("cards.json");

        let mut store = FileCardStore {
            path,
            cards: [Card::new("a", "鳥").with_due(now())].into_iter().collect(),
        };
        let err = store.set_due("a", now() + Duration::days(1)).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.get_last_due("a").unwrap(), Some(now()));
    }

    #[test]
    fn remove_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileCardStore::open(dir.path().join("cards.json")).unwrap();
        store.insert(Card::new("a", "鳥")).unwrap();
        assert!(store.remove("a").unwrap().is_some());
        assert!(store.remove("a").unwrap().is_none());
        assert!(!store.contains("a"));
    }

    #[test]
    fn progress_accumulates_per_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();

        let mut store = FileProgressStore::open(&path).unwrap();
        let tally = DailyTally { good_count: 2, normal_count: 1, bad_count: 0 };
        store.increment_daily_tally(day, &tally).unwrap();
        store.increment_daily_tally(day, &tally).unwrap();

        let reopened = FileProgressStore::open(&path).unwrap();
        assert_eq!(
            reopened.rows(),
            vec![(day, DailyTally { good_count: 4, normal_count: 2, bad_count: 0 })]
        );
    }
}
