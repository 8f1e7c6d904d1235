//! Replog CLI - inspect matching verdicts over JSON fixtures

use anyhow::Context;
use clap::{Parser, Subcommand};
use replog::matching::{ExerciseEntry, ExerciseSet, FoodEntry, FoodItem, SavedRoutine};
use replog::{Config, Engine};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "replog")]
#[command(author = "Replog Team")]
#[command(version)]
#[command(about = "Replog - history-reference and repeated-entry detection", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.replog/config.toml", env = "REPLOG_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized signature of a text
    Normalize { text: String },
    /// Detect a history reference in a text
    Detect { text: String },
    /// Check a new food entry against recent history
    Food {
        /// JSON array of food items
        #[arg(long)]
        items: PathBuf,
        /// JSON array of recent food entries
        #[arg(long)]
        history: PathBuf,
    },
    /// Check a new workout against recent history
    Weight {
        /// JSON array of exercise sets
        #[arg(long)]
        exercises: PathBuf,
        /// JSON array of recent exercise entries
        #[arg(long)]
        history: PathBuf,
    },
    /// Match a new workout against saved routines
    Routine {
        /// JSON array of exercise sets
        #[arg(long)]
        exercises: PathBuf,
        /// JSON array of saved routines
        #[arg(long)]
        routines: PathBuf,
    },
    /// Record a dismissed suggestion hash
    Dismiss { hash: String },
    /// Show dismissal state
    Status,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("replog={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = replog::config::expand_path(&args.config);

    // Handle --init flag
    if args.init {
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        tracing::debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };
    config.apply_env_overrides();

    let Some(command) = args.command else {
        tracing::warn!("No command given, see --help");
        return Ok(());
    };

    match command {
        Command::Normalize { text } => {
            println!("{}", replog::normalize(&text));
        }
        Command::Detect { text } => {
            print_json(&replog::detect_history_reference(&text))?;
        }
        Command::Food { items, history } => {
            let engine = Engine::new(config)?;
            let items: Vec<FoodItem> = read_json(&items)?;
            let history: Vec<FoodEntry> = read_json(&history)?;
            print_json(&engine.suggest_meal(&items, &history))?;
        }
        Command::Weight { exercises, history } => {
            let engine = Engine::new(config)?;
            let exercises: Vec<ExerciseSet> = read_json(&exercises)?;
            let history: Vec<ExerciseEntry> = read_json(&history)?;
            print_json(&engine.suggest_routine(&exercises, &history))?;
        }
        Command::Routine {
            exercises,
            routines,
        } => {
            let engine = Engine::new(config)?;
            let exercises: Vec<ExerciseSet> = read_json(&exercises)?;
            let routines: Vec<SavedRoutine> = read_json(&routines)?;
            let matched = engine.match_saved_routine(&exercises, &routines);
            if let Some(m) = &matched {
                for delta in &m.deltas {
                    tracing::info!("{}: {}", delta.name, delta.summary());
                }
            }
            print_json(&matched)?;
        }
        Command::Dismiss { hash } => {
            let engine = Engine::new(config)?;
            if engine.is_dismissed(&hash) {
                tracing::info!("{} was already dismissed", hash);
            } else if engine.dismiss(&hash) {
                tracing::info!("Dismissed {}", hash);
            } else {
                anyhow::bail!("Failed to record dismissal of {}", hash);
            }
        }
        Command::Status => {
            let engine = Engine::new(config)?;
            print_json(&serde_json::json!({
                "dismissal_count": engine.dismissal_count(),
                "show_opt_out_link": engine.should_show_opt_out_link(),
                "suggestions_enabled": engine.config.suggestions.enabled,
            }))?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
