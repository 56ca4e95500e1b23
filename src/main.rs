//! # Cadence - Heart-Rate-Adaptive Music Recommender
//!
//! Cadence recommends workout music that follows the member's heart rate:
//! a fuzzy controller turns each minute's BPM reading into a target song
//! energy, and a hybrid recommender serves the closest unplayed candidate
//! from a personalized pool.
//!
//! ## Usage
//!
//! ```bash
//! # Import the reference CSV data
//! cadence init-db ./data
//!
//! # Inspect the imported data
//! cadence members
//! cadence tracks
//! cadence history --user user_42
//!
//! # Run a session for the first model user
//! cadence session --user 0
//! ```

use anyhow::{bail, Context, Result};
use cadence::session::{SessionDriver, TickOutcome};
use cadence::{cli, completion, config, dataset, db};
use clap::{CommandFactory, Parser};
use log::info;
use std::fs;

/// Main entry point for the Cadence application.
///
/// Initializes logging, parses command-line arguments, and routes commands
/// to the appropriate module functions. All operations return Results for
/// consistent error handling throughout the application.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug cadence session --user 0` - Enable debug logging
/// - `RUST_LOG=cadence::recommender=debug cadence session --user 0` - Module-specific logging
fn main() -> Result<()> {
    // Initialize environment logger for debugging and monitoring
    env_logger::init();

    // Parse command-line arguments using Clap derive macros
    let args = cli::Args::parse();

    // Resolve data locations: explicit flags win over platform defaults
    let mut cfg = config::RuntimeConfig::new()?;
    if let Some(db_path) = args.db_path {
        cfg.db_path = db_path;
    }
    if let Some(model_path) = args.model_path {
        cfg.model_path = model_path;
    }

    // Route commands to appropriate module functions
    match args.command {
        cli::Command::InitDb { path, force } => {
            if cfg.db_path.exists() {
                if force {
                    info!("removing existing database at {}", cfg.db_path.display());
                    fs::remove_file(&cfg.db_path).with_context(|| {
                        format!("Failed to remove database at {}", cfg.db_path.display())
                    })?;
                } else {
                    bail!(
                        "Database already exists at {}. Use --force to overwrite.",
                        cfg.db_path.display()
                    );
                }
            }
            if let Some(parent) = cfg.db_path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }

            info!("importing reference data from: {}", path.display());
            let mut conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let summary = db::import_data_dir(&mut conn, &path)?;
            println!(
                "Imported {} members, {} tracks, {} heart-rate readings, {} history entries.",
                summary.members,
                summary.tracks,
                summary.heart_rate_readings,
                summary.history_entries
            );
        }
        cli::Command::Members => {
            let conn = db::connect(&cfg.db_path)?;
            let members = db::load_members(&conn)?;
            if members.is_empty() {
                println!("No members found. Run init-db first.");
                return Ok(());
            }

            println!(
                "{:<16} {:>5} {:<8} {:>7} {:>7} {:<12} Session-ready",
                "Member", "Age", "Gender", "Weight", "Height", "Workout"
            );
            for member in &members {
                let ready = if db::load_heart_rates(&conn, &member.user_id)?.is_empty() {
                    "no"
                } else {
                    "yes"
                };
                let weight = member
                    .weight_kg
                    .map_or_else(|| "-".to_string(), |w| format!("{w:.0}kg"));
                let height = member
                    .height_m
                    .map_or_else(|| "-".to_string(), |h| format!("{h:.2}m"));
                println!(
                    "{:<16} {:>5.0} {:<8} {:>7} {:>7} {:<12} {ready}",
                    member.user_id,
                    member.age,
                    member.gender.as_deref().unwrap_or("-"),
                    weight,
                    height,
                    member.workout_type.as_deref().unwrap_or("-"),
                );
            }
            println!("\n{} members total.", members.len());
        }
        cli::Command::Tracks => {
            let conn = db::connect(&cfg.db_path)?;
            let mut tracks = db::load_tracks(&conn)?;
            if tracks.is_empty() {
                println!("No tracks found. Run init-db first.");
                return Ok(());
            }
            tracks.sort_by(|a, b| a.name.cmp(&b.name));

            println!("{:<32} {:<24} {:>7} {:>8}", "Track", "Artist", "Energy", "Length");
            for track in &tracks {
                println!(
                    "{:<32} {:<24} {:>7.2} {:>8}",
                    track.name,
                    track.artist,
                    track.energy,
                    track.duration_display(),
                );
            }
            println!("\n{} tracks total.", tracks.len());
        }
        cli::Command::History { user } => {
            let conn = db::connect(&cfg.db_path)?;
            let history = db::load_history(&conn)?;
            let Some(entries) = history.get(&user) else {
                println!("No listening history for member {user}.");
                return Ok(());
            };

            let catalog = cadence::track::Catalog::new(db::load_tracks(&conn)?);
            println!("Listening history for {user}:");
            for (i, track_id) in entries.iter().enumerate() {
                match catalog.get(track_id) {
                    Some(track) => println!(
                        "{:>4}. {} - {} ({})",
                        i + 1,
                        track.artist,
                        track.name,
                        track.duration_display()
                    ),
                    None => println!("{:>4}. {track_id} (not in catalog)", i + 1),
                }
            }
            println!("\n{} entries.", entries.len());
        }
        cli::Command::Session {
            user,
            ticks,
            pool_size,
            margin,
            alpha,
            verbose,
        } => {
            let data = dataset::shared(&cfg.db_path, &cfg.model_path)?;
            let mut driver = SessionDriver::new(&data, user)?
                .with_alpha(alpha.unwrap_or(cfg.alpha))
                .with_margin(margin.unwrap_or(cfg.energy_margin));
            driver.start(pool_size.unwrap_or(cfg.pool_size))?;

            if verbose {
                let ids = driver.candidate_ids().unwrap_or_default();
                println!("Candidate pool ({} tracks): {}", ids.len(), ids.join(", "));
                println!();
            }

            let mut served = 0usize;
            while served < ticks {
                match driver.tick()? {
                    TickOutcome::Song(tick) => {
                        served += 1;
                        println!(
                            "minute {:>3}  {:<32} {:<20} energy {:.2} (target {:.2})  {}",
                            tick.minute,
                            tick.track.name,
                            tick.track.artist,
                            tick.track.energy,
                            tick.target_energy,
                            tick.advice.label(),
                        );
                        if verbose {
                            if let (Some(current), Some(previous)) =
                                (tick.bpm_current, tick.bpm_previous)
                            {
                                println!(
                                    "            heart rate {current} bpm (previous {previous})"
                                );
                            }
                        }
                    }
                    TickOutcome::Ended => break,
                }
            }
            driver.end();
            println!("\nSession complete: {served} songs served.");
        }
        cli::Command::SeedHeartRates { user, minutes } => {
            let mut conn = db::connect(&cfg.db_path)?;
            let known = db::load_members(&conn)?
                .iter()
                .any(|member| member.user_id == user);
            if !known {
                bail!("Unknown member {user}. Run `cadence members` to list members.");
            }

            let series = db::seed_synthetic_heart_rates(&mut conn, &user, minutes)?;
            println!(
                "Seeded {} synthetic readings for {user} (range {}-{} bpm).",
                series.len(),
                series.iter().min().copied().unwrap_or_default(),
                series.iter().max().copied().unwrap_or_default(),
            );
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(
                completion::shell_to_completion_shell(&shell),
                &mut cmd,
            );
        }
        cli::Command::CompleteMembers => {
            // This is used by shell completion scripts to get member ids
            completion::print_member_completions()?;
        }
    }

    Ok(())
}
