//! In-memory view of the reference data, shared process-wide.
//!
//! Reference tables and the model artifact are expensive to load and never
//! change after import, so they are read once per process into an immutable
//! [`Dataset`] and handed out as `Arc` clones from a global registry. Reads
//! after the initial load take no lock beyond the registry lookup.

use crate::db::{self, MemberProfile};
use crate::model::LatentFactorModel;
use crate::track::Catalog;
use anyhow::{anyhow, bail, Context, Result};
use lazy_static::lazy_static;
use log::info;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

lazy_static! {
    /// Process-scoped registry of loaded datasets, keyed by database path.
    static ref REGISTRY: Mutex<HashMap<PathBuf, Arc<Dataset>>> = Mutex::new(HashMap::new());
}

/// Immutable reference data for recommendation sessions.
#[derive(Debug)]
pub struct Dataset {
    pub catalog: Arc<Catalog>,
    pub members: Vec<MemberProfile>,
    /// Track id to content-based cluster id.
    pub clusters: Arc<HashMap<String, u32>>,
    /// Listening history keyed by external user id.
    pub history: Arc<HashMap<String, Vec<String>>>,
    /// Heart-rate series keyed by external user id.
    pub heart_rates: HashMap<String, Vec<u32>>,
    /// Pre-trained collaborative model, when the artifact exists.
    pub model: Option<Arc<LatentFactorModel>>,
}

impl Dataset {
    /// Load the full reference view from the database and model artifact.
    ///
    /// An absent model artifact is tolerated here (sessions will fail later
    /// with a model-not-ready error); an empty catalog or member table is a
    /// fatal precondition failure.
    pub fn load(db_path: &Path, model_path: &Path) -> Result<Self> {
        let conn = db::connect(db_path)?;
        db::init_schema(&conn)?;

        let catalog = Catalog::new(db::load_tracks(&conn)?);
        if catalog.is_empty() {
            bail!(
                "Reference database at {} has no tracks; run init-db first",
                db_path.display()
            );
        }
        let members = db::load_members(&conn)?;
        if members.is_empty() {
            bail!(
                "Reference database at {} has no members; run init-db first",
                db_path.display()
            );
        }

        let clusters = db::load_clusters(&conn)?;
        let history = db::load_history(&conn)?;

        let mut heart_rates = HashMap::new();
        for member in &members {
            let series = db::load_heart_rates(&conn, &member.user_id)?;
            if !series.is_empty() {
                heart_rates.insert(member.user_id.clone(), series);
            }
        }

        let model = if model_path.exists() {
            Some(Arc::new(LatentFactorModel::load(model_path)?))
        } else {
            info!("no model artifact at {}", model_path.display());
            None
        };

        info!(
            "loaded dataset: {} tracks, {} members, {} clustered tracks",
            catalog.len(),
            members.len(),
            clusters.len()
        );
        Ok(Self {
            catalog: Arc::new(catalog),
            members,
            clusters: Arc::new(clusters),
            history: Arc::new(history),
            heart_rates,
            model,
        })
    }

    /// Member profile for a model row index.
    ///
    /// The model's user index mapping is authoritative; a model row without
    /// a matching member profile is a data inconsistency.
    pub fn member_for_user_index(&self, user_index: usize) -> Result<&MemberProfile> {
        let model = self
            .model
            .as_ref()
            .context("No model artifact loaded; cannot resolve user indices")?;
        let user_id = model
            .user_ids
            .get(user_index)
            .with_context(|| format!("User index {user_index} is outside the model"))?;
        self.members
            .iter()
            .find(|m| &m.user_id == user_id)
            .with_context(|| format!("No member profile for model user {user_id}"))
    }

    /// Item-index interaction sets per model user row, derived from the
    /// listening history. Equivalent to the rows of the sparse user-item
    /// matrix the model was fitted on.
    #[must_use]
    pub fn interactions(&self) -> HashMap<usize, HashSet<usize>> {
        let Some(model) = self.model.as_ref() else {
            return HashMap::new();
        };
        let track_index: HashMap<&str, usize> = model
            .track_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        model
            .user_ids
            .iter()
            .enumerate()
            .map(|(user_index, user_id)| {
                let items = self
                    .history
                    .get(user_id)
                    .map(|tracks| {
                        tracks
                            .iter()
                            .filter_map(|t| track_index.get(t.as_str()).copied())
                            .collect()
                    })
                    .unwrap_or_default();
                (user_index, items)
            })
            .collect()
    }
}

/// Shared dataset for the given paths, loading it on first use.
pub fn shared(db_path: &Path, model_path: &Path) -> Result<Arc<Dataset>> {
    let mut registry = REGISTRY
        .lock()
        .map_err(|_| anyhow!("Dataset registry lock poisoned"))?;
    if let Some(dataset) = registry.get(db_path) {
        return Ok(Arc::clone(dataset));
    }
    let dataset = Arc::new(Dataset::load(db_path, model_path)?);
    registry.insert(db_path.to_path_buf(), Arc::clone(&dataset));
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dataset() -> Dataset {
        let model = LatentFactorModel {
            factors: 1,
            user_ids: vec!["alice".to_string(), "bob".to_string()],
            track_ids: vec!["t0".to_string(), "t1".to_string()],
            user_factors: vec![vec![1.0], vec![0.5]],
            item_factors: vec![vec![0.3], vec![0.7]],
        };
        let history: HashMap<String, Vec<String>> = [(
            "alice".to_string(),
            vec!["t1".to_string(), "unknown".to_string()],
        )]
        .into_iter()
        .collect();

        Dataset {
            catalog: Arc::new(Catalog::default()),
            members: vec![MemberProfile {
                user_id: "alice".to_string(),
                age: 30.0,
                gender: None,
                weight_kg: None,
                height_m: None,
                workout_type: None,
            }],
            clusters: Arc::new(HashMap::new()),
            history: Arc::new(history),
            heart_rates: HashMap::new(),
            model: Some(Arc::new(model)),
        }
    }

    #[test]
    fn interactions_map_history_through_track_indices() {
        let dataset = fixture_dataset();
        let interactions = dataset.interactions();
        // Alice listened to t1 (index 1); the unknown track is dropped.
        assert_eq!(interactions[&0], [1usize].into_iter().collect());
        assert!(interactions[&1].is_empty());
    }

    #[test]
    fn member_lookup_follows_model_index() {
        let dataset = fixture_dataset();
        assert_eq!(dataset.member_for_user_index(0).unwrap().user_id, "alice");
        // Bob is in the model but has no profile row.
        assert!(dataset.member_for_user_index(1).is_err());
        assert!(dataset.member_for_user_index(9).is_err());
    }

    #[test]
    fn interactions_without_model_are_empty() {
        let mut dataset = fixture_dataset();
        dataset.model = None;
        assert!(dataset.interactions().is_empty());
    }
}
