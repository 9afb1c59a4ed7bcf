use anyhow::{bail, Result};
use chrono::Utc;
use clap::Subcommand;
use goldtime_core::{classify, rank_cards, time_until_label, Card};
use goldtime_ingest::parse_timestamp;

use crate::config::load_config;
use crate::state::{cards_path, FileCardStore};

#[derive(Subcommand, Debug)]
pub enum CardsCommand {
    /// Add a card to the collection
    Add {
        id: String,

        /// Text on the front of the card
        #[arg(default_value = "")]
        front: String,

        /// Initial due time (RFC 3339, "YYYY-MM-DD HH:MM" in [training] timezone, or -2d/+3h; default: now)
        #[arg(long, allow_hyphen_values = true)]
        due: Option<String>,
    },

    /// List cards, most urgent first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Remove a card
    Remove { id: String },
}

pub fn run(cmd: CardsCommand) -> Result<()> {
    match cmd {
        CardsCommand::Add { id, front, due } => add(id, front, due),
        CardsCommand::List { limit } => list(limit),
        CardsCommand::Remove { id } => remove(&id),
    }
}

fn add(id: String, front: String, due: Option<String>) -> Result<()> {
    let cfg = load_config()?;
    let mut store = FileCardStore::open(cards_path()?)?;
    if store.contains(&id) {
        bail!("card '{id}' already exists");
    }

    let now = Utc::now();
    let due = match due {
        Some(raw) => parse_timestamp(&raw, cfg.input_timezone(), now)?,
        None => now,
    };

    store.insert(Card::new(id.clone(), front).with_due(due))?;
    println!("Added {id} (due {})", due.to_rfc3339());
    Ok(())
}

fn list(limit: Option<usize>) -> Result<()> {
    let store = FileCardStore::open(cards_path()?)?;
    let mut cards = store.cards();
    if cards.is_empty() {
        println!("No cards. Add one with: goldtime cards add <id> <front>");
        return Ok(());
    }

    let now = Utc::now();
    rank_cards(&mut cards, now);

    for card in cards.iter().take(limit.unwrap_or(usize::MAX)) {
        let tier = classify(card.last_due, now);
        println!(
            "{} {:<16} {:<14} {:>10}  {}",
            tier.icon(),
            card.id,
            tier.label(),
            time_until_label(card.last_due, now),
            card.front
        );
    }
    Ok(())
}

fn remove(id: &str) -> Result<()> {
    let mut store = FileCardStore::open(cards_path()?)?;
    match store.remove(id)? {
        Some(_) => println!("Removed {id}"),
        None => bail!("no card with id '{id}'"),
    }
    Ok(())
}
