//! Heart-rate-adaptive workout music recommendations.
//!
//! Cadence combines a fuzzy-logic energy controller with a hybrid music
//! recommender: each minute of a workout, the member's heart rate is turned
//! into a target song energy, and the closest unplayed candidate from a
//! personalized pool is served.
//!
//! Core modules:
//! - [`fuzzy`] - Mamdani fuzzy controller mapping heart rate to song energy
//! - [`energy`] - Per-session energy calculator over a heart-rate series
//! - [`model`] - Pre-trained latent-factor model artifact
//! - [`recommender`] - Collaborative, cluster and hybrid recommenders
//! - [`session`] - Two-stage session driver state machine
//!
//! ### Supporting Modules
//!
//! - [`config`] - Configuration and data directory management
//! - [`db`] - SQLite storage and CSV import of the reference tables
//! - [`dataset`] - Shared in-memory view of the reference data
//! - [`track`] - Track metadata and the catalog
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use cadence::{dataset, session::SessionDriver, session::TickOutcome};
//! use anyhow::Result;
//!
//! fn run() -> Result<()> {
//!     let db_path = cadence::config::get_db_path()?;
//!     let model_path = cadence::config::get_model_path()?;
//!     let data = dataset::shared(&db_path, &model_path)?;
//!
//!     let mut driver = SessionDriver::new(&data, 0)?;
//!     driver.start(100)?;
//!     while let TickOutcome::Song(tick) = driver.tick()? {
//!         println!(
//!             "minute {:>3}  {} ({})  target energy {:.2}",
//!             tick.minute,
//!             tick.track.name,
//!             tick.track.duration_display(),
//!             tick.target_energy
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Recommendation Pipeline
//!
//! ### Stage 1: Fuzzy energy controller
//! - Normalizes heart rate against the age-predicted maximum (208 - 0.7 * age)
//! - Three Mamdani rules over BPM zones and minute-to-minute variation
//! - Centroid defuzzification yields a target energy in roughly [0, 1]
//! - Minute zero always serves a fixed warm-up energy of 0.6
//!
//! ### Stage 2: Hybrid recommender
//! - Collaborative filtering ranks unheard tracks by latent-factor affinity
//! - Cluster preferences from listening history re-weight the ranking
//! - Candidates are served closest-to-target-energy first, never repeated
//!
//! ## Error Handling
//!
//! All public functions return `Result<T, anyhow::Error>` (or typed
//! [`recommender::RecommendError`] values at the recommender seam). Common
//! error scenarios include:
//!
//! - Database connection failures or missing reference data
//! - Malformed or absent model artifacts
//! - Sessions started for members without a heart-rate series

pub mod cli;
pub mod completion;
pub mod config;
pub mod dataset;
pub mod db;
pub mod energy;
pub mod fuzzy;
pub mod model;
pub mod recommender;
pub mod session;
pub mod track;
