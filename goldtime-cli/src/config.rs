use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use goldtime_core::SchedulerPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_goldtime_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub training: TrainingSection,
    #[serde(default)]
    pub progress: ProgressSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Artifact location (default: ~/.goldtime/model.json)
    pub path: Option<PathBuf>,
    /// Offset applied when no forecaster is loaded
    pub fallback_days: f64,
    /// Floor for any predicted gap
    pub min_gap_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    pub samples: usize,
    /// First synthetic review, read in `timezone`
    pub start: String,
    /// Zone for every naive timestamp the user supplies: CSV rows,
    /// `--due`, `--last-due` and `start`
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSection {
    /// Zone whose calendar date keys the daily tally
    pub timezone: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            path: None,
            fallback_days: 2.0,
            min_gap_hours: 1.0,
        }
    }
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            samples: goldtime_ingest::DEFAULT_SAMPLES,
            start: "2023-01-01 08:00".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    pub fn model_path(&self) -> Result<PathBuf> {
        match &self.model.path {
            Some(p) => Ok(p.clone()),
            None => Ok(ensure_goldtime_home()?.join("model.json")),
        }
    }

    /// Scheduling knobs, rejected when they are not finite, not positive, or
    /// beyond the policy ceiling.
    pub fn policy(&self) -> Result<SchedulerPolicy> {
        let defaults = SchedulerPolicy::default();
        let ceiling_days = defaults.max_gap.num_days() as f64;

        let fallback_days = self.model.fallback_days;
        if !(fallback_days.is_finite() && fallback_days > 0.0 && fallback_days <= ceiling_days) {
            bail!("[model] fallback_days must be in (0, {ceiling_days}], got {fallback_days}");
        }
        let min_gap_hours = self.model.min_gap_hours;
        if !(min_gap_hours.is_finite() && min_gap_hours > 0.0 && min_gap_hours <= ceiling_days * 24.0) {
            bail!("[model] min_gap_hours must be in (0, {}], got {min_gap_hours}", ceiling_days * 24.0);
        }

        Ok(SchedulerPolicy {
            fallback_interval: days_to_duration(fallback_days),
            min_gap: days_to_duration(min_gap_hours / 24.0),
            ..defaults
        })
    }

    pub fn input_timezone(&self) -> &str {
        &self.training.timezone
    }

    pub fn training_start(&self) -> Result<DateTime<Utc>> {
        goldtime_core::time::parse_local_to_utc(&self.training.start, self.input_timezone())
            .context("invalid [training] start")
    }
}

fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days.max(0.0) * 86_400_000.0).round() as i64)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_goldtime_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
