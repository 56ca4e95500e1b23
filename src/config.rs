//! # Configuration Module
//!
//! This module handles configuration management and data directory setup for
//! Cadence. It provides platform-appropriate data storage locations and
//! ensures necessary directories exist.
//!
//! ## Data Storage
//!
//! Cadence stores its database and model artifact in the platform-standard
//! data directory:
//! - Linux: `~/.local/share/cadence/`
//! - macOS: `~/Library/Application Support/cadence/`
//! - Windows: `%APPDATA%\cadence\`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::recommender::{DEFAULT_ALPHA, DEFAULT_ENERGY_MARGIN, DEFAULT_POOL_SIZE};

/// Returns the platform-appropriate data directory for Cadence.
///
/// Locates the standard data directory for the current platform and creates
/// the `cadence` subdirectory if it doesn't exist.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The cadence subdirectory cannot be created due to permissions
/// - The filesystem is read-only
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let cadence_dir = data_dir.join("cadence");
    fs::create_dir_all(&cadence_dir).with_context(|| {
        format!(
            "Failed to create Cadence data directory at {}. Please check file permissions.",
            cadence_dir.display()
        )
    })?;

    Ok(cadence_dir)
}

/// Returns the platform-appropriate database file path.
///
/// The database file is named `fitness.db` and stores the imported reference
/// tables (members, tracks, heart rates, listening history).
///
/// # Platform Behavior
///
/// - **Linux**: `~/.local/share/cadence/fitness.db`
/// - **macOS**: `~/Library/Application Support/cadence/fitness.db`
/// - **Windows**: `%APPDATA%\cadence\fitness.db`
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("fitness.db"))
}

/// Returns the default location of the pre-trained model artifact.
pub fn get_model_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("model.json"))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// Path to the pre-trained latent-factor model artifact
    pub model_path: PathBuf,
    /// Candidate pool size generated per session
    pub pool_size: usize,
    /// Energy window for the first-pass candidate scan
    pub energy_margin: f64,
    /// Cluster re-weighting exponent for the hybrid stage
    pub alpha: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: get_db_path().unwrap_or_else(|_| PathBuf::from("fitness.db")),
            model_path: get_model_path().unwrap_or_else(|_| PathBuf::from("model.json")),
            pool_size: DEFAULT_POOL_SIZE,
            energy_margin: DEFAULT_ENERGY_MARGIN,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl RuntimeConfig {
    /// Create a new runtime configuration with platform defaults
    pub fn new() -> Result<Self> {
        Ok(Self {
            db_path: get_db_path()?,
            model_path: get_model_path()?,
            pool_size: DEFAULT_POOL_SIZE,
            energy_margin: DEFAULT_ENERGY_MARGIN,
            alpha: DEFAULT_ALPHA,
        })
    }

    /// Create configuration with explicit database and model paths
    pub fn with_paths(db_path: PathBuf, model_path: PathBuf) -> Self {
        Self {
            db_path,
            model_path,
            ..Self::default()
        }
    }
}
