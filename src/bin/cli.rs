// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::unreachable, clippy::indexing_slicing)]

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use park_pulse::error::AppError;
use park_pulse::fetch;
use park_pulse::model::park;
use park_pulse::model::ride::Area;
use park_pulse::pipeline;
use park_pulse::refresh::{self, RefreshEvent};
use park_pulse::settings::{self, Settings};
use park_pulse::state::{AppState, DisplaySnapshot, Phase};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "parkpulse-cli", about = "ParkPulse headless CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<String>,

    /// Relay prefix override (empty string disables the relay)
    #[arg(long, global = true)]
    relay: Option<String>,

    /// Refresh interval override, in seconds
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported parks
    Parks,
    /// Fetch a park's wait times once and print the board
    Fetch {
        /// Park id (see `parks`)
        park: u32,
    },
    /// Fetch on a timer and print each update
    Watch {
        /// Park id (see `parks`)
        park: u32,
        /// Stop after this many updates (0 = run until interrupted)
        #[arg(long, default_value = "0")]
        updates: u64,
    },
    /// Print the effective settings
    Settings,
    /// Print the feed URL for a park without fetching it
    Url { park: u32 },
}

// ── State initialization ─────────────────────────────────────────

fn dirs_config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA")
            .map_or_else(|_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        dirs_home().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME")
            .map_or_else(|_| dirs_home().join(".config"), PathBuf::from)
    };
    base.join(park_pulse::paths::APP_ID)
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

fn load_effective_settings(cli: &Cli) -> Result<(Settings, PathBuf), AppError> {
    let config_dir = cli
        .config_dir
        .as_deref()
        .map_or_else(dirs_config_dir, PathBuf::from);

    let mut effective = settings::load_settings(&config_dir)?.unwrap_or_default();
    if let Some(relay) = &cli.relay {
        effective.relay_prefix = relay.clone();
    }
    if let Some(interval) = cli.interval {
        effective.refresh_interval_secs = interval;
    }
    effective.validate()?;
    Ok((effective, config_dir))
}

// ── Output formatting ────────────────────────────────────────────

fn print_board(areas: &[Area], effective: &Settings, raw_json: bool) {
    if raw_json {
        println!("{}", serde_json::to_string_pretty(areas).unwrap_or_default());
        return;
    }
    if areas.is_empty() {
        println!("No ride data available.");
        return;
    }
    for area in areas {
        println!("{}", area.name);
        for ride in &area.rides {
            let status = pipeline::resolve(ride.is_open, ride.wait_minutes, &effective.thresholds);
            let tag = if ride.single_rider { "  [single rider]" } else { "" };
            println!("  {:<45} {:>8}  ({}){tag}", ride.name, status.label, status.bucket.slug());
        }
    }
}

fn print_snapshot(snapshot: &DisplaySnapshot, effective: &Settings, raw_json: bool) {
    if raw_json {
        println!("{}", serde_json::to_string_pretty(snapshot).unwrap_or_default());
        return;
    }
    match snapshot.phase {
        Phase::Idle => println!("(idle)"),
        Phase::Loading => println!("Loading..."),
        Phase::Failed => {
            println!(
                "Error: {}",
                snapshot.error_detail.as_deref().unwrap_or("unknown failure")
            );
        }
        Phase::Success => {
            if let Some(stamp) = snapshot.last_success {
                println!("── Updated {} ──", stamp.format("%H:%M:%S"));
            }
            print_board(&snapshot.areas, effective, false);
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────

fn run_parks(raw_json: bool) {
    let parks = park::supported_parks();
    if raw_json {
        println!("{}", serde_json::to_string_pretty(&parks).unwrap_or_default());
        return;
    }
    for p in parks {
        println!("{:>4}  {:<28} ({}, {})", p.id, p.name, p.short_name, p.location);
    }
}

async fn run_fetch(effective: &Settings, park_id: u32, raw_json: bool) -> Result<(), AppError> {
    if park::park_by_id(park_id).is_none() {
        return Err(AppError::UnknownPark { id: park_id });
    }
    let client = reqwest::Client::new();
    let payload = fetch::fetch_payload(&client, effective, park_id).await?;
    let areas = pipeline::run(&payload, &effective.overrides_for(park_id));
    print_board(&areas, effective, raw_json);
    Ok(())
}

async fn run_watch(
    effective: Settings,
    config_dir: PathBuf,
    park_id: u32,
    updates: u64,
    raw_json: bool,
) -> Result<(), AppError> {
    if park::park_by_id(park_id).is_none() {
        return Err(AppError::UnknownPark { id: park_id });
    }
    let mut effective = effective;
    effective.default_park_id = park_id;
    let interval = effective.refresh_interval_secs;
    let state = AppState::new(effective.clone(), config_dir);

    let (event_tx, event_rx) = mpsc::channel(16);
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel(16);
    let driver = tokio::spawn(refresh::run_driver(Arc::clone(&state), event_rx, snapshot_tx));

    eprintln!("[ParkPulse] Watching park {park_id}, refreshing every {interval}s");
    event_tx
        .send(RefreshEvent::Startup)
        .await
        .map_err(|e| AppError::Io { message: e.to_string() })?;

    let mut delivered = 0u64;
    while let Some(snapshot) = snapshot_rx.recv().await {
        print_snapshot(&snapshot, &effective, raw_json);
        if snapshot.phase == Phase::Success || snapshot.phase == Phase::Failed {
            delivered += 1;
            if updates > 0 && delivered >= updates {
                break;
            }
        }
    }

    drop(event_tx);
    driver.abort();
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let raw = cli.json;

    if let Commands::Parks = cli.command {
        run_parks(raw);
        return;
    }

    let (effective, config_dir) = match load_effective_settings(&cli) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Fetch { park } => run_fetch(&effective, park, raw).await,
        Commands::Watch { park, updates } => {
            run_watch(effective, config_dir, park, updates, raw).await
        }
        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(&effective).unwrap_or_default());
            Ok(())
        }
        Commands::Url { park } => match park::park_by_id(park) {
            Some(_) => {
                println!("{}", fetch::queue_times_url(&effective, park));
                Ok(())
            }
            None => Err(AppError::UnknownPark { id: park }),
        },
        Commands::Parks => unreachable!(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
