use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use goldtime_core::{
    classify, derive_gap_samples, load_forecaster, save_artifact, time_until_label, train, FeedbackTier,
    SchedulingContext,
};
use goldtime_ingest::{parse_review_csv, parse_timestamp, synthetic_history};
use std::path::PathBuf;

mod cards_cmd;
mod config;
mod review_cmd;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "goldtime",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GOLDTIME_BUILD_SHA"), ")"),
    about = "Spaced-repetition scheduler: interval forecasting and due-time ranking"
)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the interval forecaster and write the model artifact
    Train {
        /// Review history CSV (card_id,timestamp,feedback); synthetic history if omitted
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Artifact path (default from config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Synthetic sample count (default from config)
        #[arg(long)]
        samples: Option<usize>,
    },

    /// Predict the next due time for one review
    Predict {
        /// Feedback tier: -1 forgot, 0 unsure, 1 confident
        #[arg(long, allow_hyphen_values = true)]
        tier: i64,

        /// Card's current gold time (default: due now)
        #[arg(long, allow_hyphen_values = true)]
        last_due: Option<String>,
    },

    /// Manage the card collection
    Cards {
        #[command(subcommand)]
        command: cards_cmd::CardsCommand,
    },

    /// Record a review session and sync it
    Review {
        /// One or more <card>:<tier> pairs, e.g. --feedback kanji-3:+1
        #[arg(long = "feedback", required = true, num_args = 1.., allow_hyphen_values = true)]
        feedback: Vec<String>,
    },

    /// Show the daily review tally
    Progress,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.goldtime/config.toml with defaults (if missing)
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Train { csv, out, samples } => run_train(csv, out, samples)?,
        Command::Predict { tier, last_due } => run_predict(tier, last_due)?,
        Command::Cards { command } => cards_cmd::run(command)?,
        Command::Review { feedback } => review_cmd::review(&feedback)?,
        Command::Progress => review_cmd::progress()?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_train(csv: Option<PathBuf>, out: Option<PathBuf>, samples: Option<usize>) -> Result<()> {
    let cfg = config::load_config()?;
    let now = Utc::now();

    let events = match &csv {
        Some(path) => parse_review_csv(path, cfg.input_timezone(), now)?,
        None => synthetic_history(samples.unwrap_or(cfg.training.samples), cfg.training_start()?),
    };
    let gaps = derive_gap_samples(&events);

    let (artifact, report) = train(&gaps, now).context("fitting forecaster")?;
    let out = match out {
        Some(p) => p,
        None => cfg.model_path()?,
    };
    save_artifact(&out, &artifact).with_context(|| format!("write {}", out.display()))?;

    let source = csv
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "synthetic history".to_string());
    println!("Trained on {} gap samples from {}", report.samples, source);
    println!(
        "beta={:.4} phi={:.4} theta={:.4} sigma2={:.4}",
        report.coefficients.beta, report.coefficients.phi, report.coefficients.theta, report.coefficients.sigma2
    );
    println!("css={:.4} mae={:.4} days ({} iterations)", report.css, report.mae, report.iterations);
    println!("Wrote {}", out.display());
    Ok(())
}

fn run_predict(tier: i64, last_due: Option<String>) -> Result<()> {
    let tier = FeedbackTier::try_from(tier)?;
    let cfg = config::load_config()?;
    let now = Utc::now();
    let last_due = last_due
        .map(|raw| parse_timestamp(&raw, cfg.input_timezone(), now))
        .transpose()?;

    let ctx = SchedulingContext::new(load_forecaster(cfg.model_path()?), cfg.policy()?);
    let p = ctx.predict(last_due, tier, now);
    let priority = classify(Some(p.due), now);

    if !ctx.has_forecaster() {
        println!("model         none, using the fixed {}-day fallback", cfg.model.fallback_days);
    }
    println!("tier          {} ({})", tier, tier.label());
    println!("recall point  {}", p.recall_point);
    println!("gap           {:.3} days ({:?})", p.gap_days, p.source);
    println!("next due      {}", p.due.to_rfc3339());
    println!(
        "priority      {} {} (in {})",
        priority.icon(),
        priority.label(),
        time_until_label(Some(p.due), now)
    );
    Ok(())
}
