use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use goldtime_core::time::local_date;
use goldtime_core::{load_forecaster, FeedbackTier, SchedulingContext, SyncReport};

use crate::config::load_config;
use crate::state::{cards_path, progress_path, FileCardStore, FileProgressStore};

/// Parse `card:tier`, e.g. `kanji-12:+1` or `kanji-12:-1`.
pub fn parse_feedback_arg(arg: &str) -> Result<(String, i64)> {
    let (id, tier) = arg
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected <card>:<tier>, got '{arg}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("empty card id in '{arg}'"));
    }
    let tier: i64 = tier
        .trim()
        .trim_start_matches('+')
        .parse()
        .with_context(|| format!("tier in '{arg}' is not an integer"))?;
    Ok((id.to_string(), tier))
}

/// Record every feedback, then flush the session in one batch.
pub fn review(feedback: &[String]) -> Result<()> {
    let parsed = feedback
        .iter()
        .map(|f| parse_feedback_arg(f))
        .collect::<Result<Vec<_>>>()?;
    // Reject the whole session before anything is buffered.
    for (id, tier) in &parsed {
        FeedbackTier::try_from(*tier).with_context(|| format!("feedback for {id}"))?;
    }

    let cfg = load_config()?;
    let mut cards = FileCardStore::open(cards_path()?)?;
    let mut progress = FileProgressStore::open(progress_path()?)?;
    let mut ctx = SchedulingContext::new(load_forecaster(cfg.model_path()?), cfg.policy()?);

    let now = Utc::now();
    for (id, tier) in &parsed {
        let entry = ctx.record_feedback(&cards, id, *tier, now)?;
        log::debug!("buffered {} -> {}", entry.card_id, entry.predicted_due.to_rfc3339());
    }

    let date = local_date(now, &cfg.progress.timezone)?;
    let report = ctx.flush_pending(&mut cards, &mut progress, date);
    print_report(&report);

    if !report.is_complete() {
        anyhow::bail!("{} of {} updates were not saved", report.failed(), report.items.len());
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    for item in &report.items {
        match &item.outcome {
            Ok(()) => println!(
                "ok    {:<16} {:>2} next due {}",
                item.entry.card_id,
                item.entry.feedback_tier,
                item.entry.predicted_due.to_rfc3339()
            ),
            Err(e) => println!("fail  {:<16} {}", item.entry.card_id, e),
        }
    }

    let t = &report.tally;
    println!(
        "\n{}: good={} normal={} bad={}",
        report.date, t.good_count, t.normal_count, t.bad_count
    );
    if let Some(Err(e)) = &report.tally_outcome {
        println!("progress not saved: {e}");
    }
}

pub fn progress() -> Result<()> {
    let store = FileProgressStore::open(progress_path()?)?;
    let rows = store.rows();
    if rows.is_empty() {
        println!("No reviews recorded yet.");
        return Ok(());
    }
    println!("{:<12} {:>5} {:>7} {:>4} {:>6}", "date", "good", "normal", "bad", "total");
    for (date, t) in rows {
        println!(
            "{:<12} {:>5} {:>7} {:>4} {:>6}",
            date.to_string(),
            t.good_count,
            t.normal_count,
            t.bad_count,
            t.total()
        );
    }
    Ok(())
}
