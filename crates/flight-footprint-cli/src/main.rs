// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use flight_footprint_core::config::AppConfig;
use flight_footprint_core::emissions::{CabinClass, EmissionsCalculator, TripType};
use flight_footprint_core::export::DirectoryExportSink;
use flight_footprint_core::history::FlightSubmission;
use flight_footprint_core::service::FootprintService;
use flight_footprint_core::source::source_for;
use flight_footprint_core::store::JsonHistoryStore;
use flight_footprint_core::telemetry::{
    LogTelemetry, NoopTelemetry, TelemetrySink, WebhookTelemetry,
};
use log::debug;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const TELEMETRY_FLUSH_SECS: u64 = 10;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.json
    #[arg(short, long, env = "FOOTPRINT_CONFIG")]
    config: Option<PathBuf>,

    /// Airport dataset: local CSV (optionally .gz) or http(s) URL
    #[arg(short, long, env = "FOOTPRINT_DATASET")]
    dataset: Option<String>,

    /// History file
    #[arg(long, env = "FOOTPRINT_HISTORY")]
    history: Option<PathBuf>,

    /// Telemetry webhook URL
    #[arg(long, env = "FOOTPRINT_TELEMETRY_URL")]
    telemetry_url: Option<String>,

    /// Do not report submissions anywhere
    #[arg(long)]
    no_telemetry: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the airport dataset and report its status
    Status,
    /// Suggest airports for a partial code, name, city or country
    Suggest { query: String },
    /// Calculate a flight's emissions and add it to the history
    Calc {
        /// Employee name
        #[arg(short, long, env = "FOOTPRINT_EMPLOYEE")]
        employee: String,
        /// Origin airport (code, or a suggestion label)
        #[arg(short, long)]
        from: String,
        /// Destination airport (code, or a suggestion label)
        #[arg(short, long)]
        to: String,
        /// Flight date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long, default_value_t = 1)]
        passengers: u32,
        /// one-way or round-trip
        #[arg(long, default_value = "one-way")]
        trip: String,
        /// economy, premium, business or first
        #[arg(long, default_value = "economy")]
        cabin: String,
    },
    /// List recorded flights, newest first
    History,
    /// Delete all recorded flights
    Clear,
    /// Write the history to a CSV file
    Export {
        /// Output directory
        #[arg(long, env = "FOOTPRINT_EXPORT_DIR")]
        dir: Option<PathBuf>,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("flight_footprint")
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialise logging")
}

fn telemetry_sink(cli: &Cli, config: &AppConfig) -> Box<dyn TelemetrySink> {
    if cli.no_telemetry {
        return Box::new(NoopTelemetry);
    }
    match &config.telemetry.endpoint {
        Some(url) if !url.trim().is_empty() => Box::new(WebhookTelemetry::new(url.trim())),
        _ => Box::new(LogTelemetry),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;
    if let Some(dataset) = &cli.dataset {
        config.dataset = dataset.clone();
    }
    if let Some(history) = &cli.history {
        config.history_path = history.clone();
    }
    if let Some(url) = &cli.telemetry_url {
        config.telemetry.endpoint = Some(url.clone());
    }
    debug!("Effective config — path={} dataset={}", config_path.display(), config.dataset);

    let service = FootprintService::new(
        EmissionsCalculator::new(config.emissions_config()),
        Box::new(JsonHistoryStore::new(&config.history_path)),
        telemetry_sink(&cli, &config),
        &config.telemetry.secret,
    );

    match &cli.command {
        Commands::Status => {
            let loaded = service.load_airports(source_for(&config.dataset).as_ref());
            println!("{}", service.status());
            loaded?;
        }
        Commands::Suggest { query } => {
            service.load_airports(source_for(&config.dataset).as_ref())?;
            let suggestions = service.suggest(query);
            if suggestions.is_empty() {
                println!("No airports match '{}'", query);
            }
            for s in suggestions {
                println!("{}", s.label);
            }
        }
        Commands::Calc {
            employee,
            from,
            to,
            date,
            passengers,
            trip,
            cabin,
        } => {
            service.load_airports(source_for(&config.dataset).as_ref())?;

            let submission = FlightSubmission {
                employee_name: employee.clone(),
                flight_date: date.unwrap_or_else(|| Local::now().date_naive()),
                origin: from.clone(),
                destination: to.clone(),
                passengers: *passengers,
                trip_type: TripType::from_selection(trip),
                cabin_class: CabinClass::from_selection(cabin),
            };

            let outcome = service.submit(&submission, Utc::now())?;
            println!("{}", outcome.headline);
            println!("{}", outcome.detail);
            println!(
                "{} · {} · {}",
                outcome.entry.route_name, outcome.entry.trip_label, outcome.entry.cabin_label
            );

            service.flush_telemetry(Duration::from_secs(TELEMETRY_FLUSH_SECS));
        }
        Commands::History => {
            let entries = service.history();
            if entries.is_empty() {
                println!("No entries yet.");
            }
            for entry in entries {
                println!("{}", entry.summary_line());
            }
        }
        Commands::Clear => {
            service.clear_history()?;
            println!("History cleared.");
        }
        Commands::Export { dir } => {
            let dir = dir.clone().unwrap_or_else(|| config.export_dir.clone());
            let sink = DirectoryExportSink::new(&dir);
            let path = service.export(&sink, SystemTime::now())?;
            println!("Exported to {}", path.display());
        }
        Commands::Config { action } => run_config(action, &config, &config_path)?,
    }

    Ok(())
}

fn run_config(action: &ConfigAction, config: &AppConfig, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# {}", path.display());
            println!(
                "{}",
                serde_json::to_string_pretty(config).context("Failed to serialize config")?
            );
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            AppConfig::default().save(path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
