//! Rendezvous - meeting scheduling and booking engine
//!
//! Command-line entry point. Every subcommand prints its result as JSON on
//! stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rendezvous_app::utils::logging::init_tracing;
use rendezvous_app::{
    add_blacklist_entry, add_blackout, book_meeting, cancel_reservation, confirm_reservation,
    get_availability, health_check, list_notifications, lookup_reservation, AppContext,
};
use rendezvous_domain::{AvailabilityQuery, BookingRequest, Config};
use rendezvous_infra::{config, DbManager};
use serde::Serialize;
use tracing::{error, info, warn};

/// Rendezvous - book meetings against a shared calendar.
#[derive(Parser, Debug)]
#[command(name = "rendezvous", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or upgrade the database schema.
    Migrate,
    /// List free meeting slots.
    Availability {
        /// First day to show (YYYY-MM-DD, owner timezone)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Number of days to show
        #[arg(long)]
        days: Option<u32>,
    },
    /// Book a meeting.
    Book {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Start instant, RFC 3339
        #[arg(long)]
        start: DateTime<Utc>,
        /// Length in minutes; the configured slot length if omitted
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, default_value = "")]
        topic: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Show a reservation.
    Lookup { lookup_hash: String },
    /// Confirm a pending reservation.
    Confirm { lookup_hash: String },
    /// Cancel a reservation and notify the visitor.
    Cancel {
        lookup_hash: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Block a period for everyone.
    Blackout {
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Refuse bookings from an address.
    Blacklist {
        email: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// List mail attempts for a reservation.
    Notifications { lookup_hash: String },
    /// Check the database and integration breakers.
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "could not load .env file"),
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            eprintln!("rendezvous: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config).context("failed to load configuration")?;

    if let Commands::Migrate = cli.command {
        let db = DbManager::new(&config.database.path, config.database.pool_size)?;
        db.run_migrations()?;
        info!(db_path = %db.path().display(), "database migrated");
        return Ok(());
    }

    let ctx = Arc::new(AppContext::new_with_config(config)?);
    let signal_ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_ctx.shutdown();
        }
    });

    match cli.command {
        Commands::Migrate => Ok(()),
        Commands::Availability { start_date, days } => {
            let query = AvailabilityQuery { start_date, horizon_days: days };
            print_json(&get_availability(&ctx, query).await?)
        }
        Commands::Book { name, email, start, duration, topic, message } => {
            let request = BookingRequest {
                name,
                email,
                topic,
                message,
                start_time: Some(start),
                duration_minutes: duration
                    .unwrap_or(ctx.config.scheduling.slot_duration_minutes),
            };
            print_json(&book_meeting(&ctx, request).await?)
        }
        Commands::Lookup { lookup_hash } => {
            print_json(&lookup_reservation(&ctx, &lookup_hash).await?)
        }
        Commands::Confirm { lookup_hash } => {
            print_json(&confirm_reservation(&ctx, &lookup_hash).await?)
        }
        Commands::Cancel { lookup_hash, reason } => {
            print_json(&cancel_reservation(&ctx, &lookup_hash, reason).await?)
        }
        Commands::Blackout { start, end, reason } => {
            print_json(&add_blackout(&ctx, start, end, reason).await?)
        }
        Commands::Blacklist { email, reason } => {
            print_json(&add_blacklist_entry(&ctx, &email, &reason).await?)
        }
        Commands::Notifications { lookup_hash } => {
            print_json(&list_notifications(&ctx, &lookup_hash).await?)
        }
        Commands::Health => print_json(&health_check(&ctx).await?),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => config::load_from_file(Some(path))?,
        None => config::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
