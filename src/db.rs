//! SQLite reference store.
//!
//! Holds the read-only tables the recommender consumes: track catalog (with
//! cluster assignments), member profiles, per-member heart-rate series, and
//! listening history. Populated once from CSV exports via `init-db`; after
//! import every access is a plain read.

use crate::track::TrackInfo;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use rand::Rng;
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// A gym member's exercise profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberProfile {
    pub user_id: String,
    /// Age in years, used to derive the maximum heart rate.
    pub age: f64,
    pub gender: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_m: Option<f64>,
    pub workout_type: Option<String>,
}

/// Row counts produced by a CSV import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub members: usize,
    pub tracks: usize,
    pub heart_rate_readings: usize,
    pub history_entries: usize,
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    user_id: String,
    age: f64,
    gender: Option<String>,
    weight_kg: Option<f64>,
    height_m: Option<f64>,
    workout_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackRow {
    track_id: String,
    name: String,
    artist: String,
    energy: f64,
    duration_ms: u64,
    cluster: Option<u32>,
}

/// One BPM reading; minute position is the row order within the user's
/// series, matching the one-reading-per-minute export format.
#[derive(Debug, Deserialize)]
struct HeartRateRow {
    user_id: String,
    bpm: u32,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    user_id: String,
    track_id: String,
}

/// Open (or create) the reference database at the given path.
pub fn connect(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path)
        .with_context(|| format!("Failed to open reference database at {}", db_path.display()))
}

/// Create the reference tables if they do not exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS members (
            user_id      TEXT PRIMARY KEY,
            age          REAL NOT NULL,
            gender       TEXT,
            weight_kg    REAL,
            height_m     REAL,
            workout_type TEXT
        );
        CREATE TABLE IF NOT EXISTS tracks (
            track_id    TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            artist      TEXT NOT NULL,
            energy      REAL NOT NULL,
            duration_ms INTEGER NOT NULL,
            cluster     INTEGER
        );
        CREATE TABLE IF NOT EXISTS heart_rates (
            user_id TEXT NOT NULL,
            minute  INTEGER NOT NULL,
            bpm     INTEGER NOT NULL,
            PRIMARY KEY (user_id, minute)
        );
        CREATE TABLE IF NOT EXISTS history (
            user_id  TEXT NOT NULL,
            track_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_history_user ON history(user_id);",
    )
    .context("Failed to create reference schema")
}

/// Import the four reference CSVs from `data_dir` in one transaction.
///
/// Expects `members.csv`, `tracks.csv`, `heart_rates.csv` and
/// `listening_history.csv` with headers matching the row structs above.
/// Missing or malformed files abort the whole import.
pub fn import_data_dir(conn: &mut Connection, data_dir: &Path) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO members (user_id, age, gender, weight_kg, height_m, workout_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in read_csv::<MemberRow>(&data_dir.join("members.csv"))? {
            let row = row?;
            stmt.execute((
                &row.user_id,
                row.age,
                &row.gender,
                row.weight_kg,
                row.height_m,
                &row.workout_type,
            ))
            .with_context(|| format!("Failed to insert member {}", row.user_id))?;
            summary.members += 1;
        }
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO tracks (track_id, name, artist, energy, duration_ms, cluster)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in read_csv::<TrackRow>(&data_dir.join("tracks.csv"))? {
            let row = row?;
            stmt.execute((
                &row.track_id,
                &row.name,
                &row.artist,
                row.energy,
                row.duration_ms,
                row.cluster,
            ))
            .with_context(|| format!("Failed to insert track {}", row.track_id))?;
            summary.tracks += 1;
        }
    }

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO heart_rates (user_id, minute, bpm) VALUES (?1, ?2, ?3)",
        )?;
        let mut minutes: HashMap<String, usize> = HashMap::new();
        for row in read_csv::<HeartRateRow>(&data_dir.join("heart_rates.csv"))? {
            let row = row?;
            let minute = minutes.entry(row.user_id.clone()).or_insert(0);
            stmt.execute((&row.user_id, *minute, row.bpm))
                .with_context(|| format!("Failed to insert heart rate for {}", row.user_id))?;
            *minute += 1;
            summary.heart_rate_readings += 1;
        }
    }

    {
        let mut stmt = tx.prepare("INSERT INTO history (user_id, track_id) VALUES (?1, ?2)")?;
        for row in read_csv::<HistoryRow>(&data_dir.join("listening_history.csv"))? {
            let row = row?;
            stmt.execute((&row.user_id, &row.track_id))
                .context("Failed to insert history entry")?;
            summary.history_entries += 1;
        }
    }

    tx.commit().context("Failed to commit reference import")?;
    info!(
        "imported {} members, {} tracks, {} heart-rate readings, {} history entries",
        summary.members, summary.tracks, summary.heart_rate_readings, summary.history_entries
    );
    Ok(summary)
}

fn read_csv<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<impl Iterator<Item = Result<T>>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    let display = path.display().to_string();
    Ok(reader
        .into_deserialize()
        .map(move |row| row.with_context(|| format!("Malformed row in {display}"))))
}

/// All member profiles in insertion order.
pub fn load_members(conn: &Connection) -> Result<Vec<MemberProfile>> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, age, gender, weight_kg, height_m, workout_type
             FROM members ORDER BY rowid",
        )
        .context("Failed to prepare member query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MemberProfile {
                user_id: row.get(0)?,
                age: row.get(1)?,
                gender: row.get(2)?,
                weight_kg: row.get(3)?,
                height_m: row.get(4)?,
                workout_type: row.get(5)?,
            })
        })
        .context("Failed to query members")?;

    let mut members = Vec::new();
    for member in rows {
        members.push(member.context("Failed to read member row")?);
    }
    Ok(members)
}

/// The full track catalog.
pub fn load_tracks(conn: &Connection) -> Result<Vec<TrackInfo>> {
    let mut stmt = conn
        .prepare("SELECT track_id, name, artist, energy, duration_ms FROM tracks")
        .context("Failed to prepare track query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TrackInfo {
                track_id: row.get(0)?,
                name: row.get(1)?,
                artist: row.get(2)?,
                energy: row.get(3)?,
                duration_ms: row.get(4)?,
            })
        })
        .context("Failed to query tracks")?;

    let mut tracks = Vec::new();
    for track in rows {
        tracks.push(track.context("Failed to read track row")?);
    }
    Ok(tracks)
}

/// Track-to-cluster assignments, for tracks that have one.
pub fn load_clusters(conn: &Connection) -> Result<HashMap<String, u32>> {
    let mut stmt = conn
        .prepare("SELECT track_id, cluster FROM tracks WHERE cluster IS NOT NULL")
        .context("Failed to prepare cluster query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })
        .context("Failed to query clusters")?;

    let mut clusters = HashMap::new();
    for row in rows {
        let (track_id, cluster) = row.context("Failed to read cluster row")?;
        clusters.insert(track_id, cluster);
    }
    Ok(clusters)
}

/// One member's heart-rate series, ordered by minute.
pub fn load_heart_rates(conn: &Connection, user_id: &str) -> Result<Vec<u32>> {
    let mut stmt = conn
        .prepare("SELECT bpm FROM heart_rates WHERE user_id = ?1 ORDER BY minute")
        .context("Failed to prepare heart-rate query")?;

    let rows = stmt
        .query_map([user_id], |row| row.get::<_, u32>(0))
        .context("Failed to query heart rates")?;

    let mut series = Vec::new();
    for bpm in rows {
        series.push(bpm.context("Failed to read heart-rate row")?);
    }
    debug!("loaded {} heart-rate readings for {user_id}", series.len());
    Ok(series)
}

/// Listening history grouped by user id, in insertion order.
pub fn load_history(conn: &Connection) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn
        .prepare("SELECT user_id, track_id FROM history ORDER BY rowid")
        .context("Failed to prepare history query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .context("Failed to query history")?;

    let mut history: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        let (user_id, track_id) = row.context("Failed to read history row")?;
        history.entry(user_id).or_default().push(track_id);
    }
    Ok(history)
}

/// Generate and store a plausible heart-rate series for a member without one.
///
/// Random walk: warm-up climb from a resting rate, then bounded drift. The
/// original data set ships recorded series; this keeps demo members usable.
pub fn seed_synthetic_heart_rates(
    conn: &mut Connection,
    user_id: &str,
    minutes: usize,
) -> Result<Vec<u32>> {
    if minutes == 0 {
        bail!("Synthetic heart-rate series must cover at least one minute");
    }

    let mut rng = rand::thread_rng();
    let mut bpm: i32 = rng.gen_range(75..=95);
    let mut series = Vec::with_capacity(minutes);
    for minute in 0..minutes {
        // Steeper climb during the first minutes, noise after.
        let drift = if minute < 5 {
            rng.gen_range(2..=8)
        } else {
            rng.gen_range(-4..=5)
        };
        bpm = (bpm + drift).clamp(60, 200);
        series.push(bpm as u32);
    }

    let tx = conn.transaction()?;
    {
        tx.execute("DELETE FROM heart_rates WHERE user_id = ?1", [user_id])?;
        let mut stmt =
            tx.prepare("INSERT INTO heart_rates (user_id, minute, bpm) VALUES (?1, ?2, ?3)")?;
        for (minute, bpm) in series.iter().enumerate() {
            stmt.execute((user_id, minute, bpm))
                .with_context(|| format!("Failed to store synthetic reading for {user_id}"))?;
        }
    }
    tx.commit().context("Failed to commit synthetic series")?;
    info!("seeded {} synthetic readings for {user_id}", series.len());
    Ok(series)
}
