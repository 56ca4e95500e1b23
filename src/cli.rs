//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Cadence using Clap
//! derive macros. It provides a type-safe way to parse command-line arguments
//! and route them to appropriate functionality.
//!
//! ## Commands
//!
//! - `init-db`: Import reference CSV data into the database
//! - `members`: Display all gym members with their profiles
//! - `tracks`: Display the track catalog with energy and duration
//! - `history`: Display a member's listening history
//! - `session`: Run a heart-rate-driven recommendation session
//! - `seed-heart-rates`: Generate a synthetic heart-rate series for testing
//!
//! ## Examples
//!
//! ```bash
//! cadence init-db ./data
//! cadence session --user 0
//! cadence history --user user_42
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Uses Clap derive macros to automatically generate argument parsing,
/// help text, and validation. The main structure contains only a subcommand
/// plus the shared data-location overrides.
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - Heart-rate-adaptive workout music recommendations")]
#[command(version)]
pub struct Args {
    /// Override the database file location
    ///
    /// Defaults to the platform data directory (e.g.
    /// `~/.local/share/cadence/fitness.db` on Linux).
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Override the model artifact location
    ///
    /// Defaults to `model.json` next to the database.
    #[arg(long, global = true)]
    pub model_path: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
///
/// Each variant corresponds to a major piece of functionality in Cadence.
/// Command arguments are embedded directly in the enum variants for
/// type safety and automatic validation.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize database from a directory of reference CSV files
    ///
    /// Imports `members.csv`, `tracks.csv`, `heart_rates.csv` and
    /// `listening_history.csv` from the given directory into the database in
    /// a single transaction. A missing or malformed file aborts the import.
    InitDb {
        /// Path to the directory holding the reference CSV files
        path: PathBuf,

        /// Force overwrite existing database
        ///
        /// If specified, will delete and recreate the database even if it
        /// already exists. Without this flag, init-db will fail if the
        /// database exists.
        #[arg(long)]
        force: bool,
    },

    /// List all gym members in the database
    ///
    /// Displays every imported member profile with age and workout type.
    /// Members with a stored heart-rate series are marked as session-ready.
    Members,

    /// List the track catalog
    ///
    /// Displays every catalogued track with its artist, energy value and
    /// duration in m:ss format, sorted alphabetically by name.
    Tracks,

    /// Show a member's listening history
    ///
    /// Displays the tracks a member has listened to, in recorded order,
    /// resolved against the catalog where possible.
    History {
        /// Member to show history for (external user id)
        #[arg(long)]
        user: String,
    },

    /// Run a heart-rate-driven recommendation session
    ///
    /// Generates the hybrid candidate pool for the member, then replays
    /// their stored heart-rate series minute by minute: each tick derives a
    /// target energy from the fuzzy controller and serves the closest
    /// unplayed candidate. The session ends when the heart-rate data or the
    /// candidate pool runs out.
    Session {
        /// Model user index of the member to run the session for
        #[arg(long)]
        user: usize,

        /// Maximum number of songs to serve before stopping
        #[arg(long, default_value = "50")]
        ticks: usize,

        /// Candidate pool size for the collaborative stage
        #[arg(long)]
        pool_size: Option<usize>,

        /// Energy window for the first-pass candidate scan
        #[arg(long)]
        margin: Option<f64>,

        /// Cluster re-weighting factor for the hybrid stage
        #[arg(long)]
        alpha: Option<f64>,

        /// Enable verbose output showing the candidate pool and raw readings
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a synthetic heart-rate series for a member
    ///
    /// Produces a plausible workout curve (ramp-up then plateau with noise)
    /// and stores it as the member's series. Useful for trying sessions
    /// without wearable data.
    SeedHeartRates {
        /// Member to seed (external user id)
        #[arg(long)]
        user: String,

        /// Length of the generated series in minutes
        #[arg(long, default_value = "45")]
        minutes: usize,
    },

    /// Generate shell completions
    ///
    /// Generates completion scripts for various shells to enable tab
    /// completion of commands and options.
    ///
    /// Usage: cadence completion bash > ~/.local/share/bash-completion/completions/cadence
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List member ids for shell completion (hidden command)
    #[command(hide = true)]
    CompleteMembers,
}
