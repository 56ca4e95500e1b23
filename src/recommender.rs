//! Candidate generation and energy-matched serving.
//!
//! Three recommenders share one call contract: the collaborative stage ranks
//! tracks by latent-factor affinity, the content-based stage summarizes a
//! member's cluster preferences, and the hybrid stage composes both by
//! re-weighting collaborative affinities with cluster preference weights.
//!
//! A candidate list is generated once per session and then only mutated by
//! flipping served flags, so the scored ordering stays intact for display.

use crate::model::LatentFactorModel;
use crate::track::Catalog;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Default half-width of the acceptable energy window around the target.
pub const DEFAULT_ENERGY_MARGIN: f64 = 0.05;
/// Preference weight for clusters absent from the member's history. Keeps
/// novel clusters rankable instead of locking them out at zero affinity.
pub const CLUSTER_FLOOR_WEIGHT: f64 = 0.01;
/// Default blend coefficient for the hybrid re-weighting.
pub const DEFAULT_ALPHA: f64 = 1.0;
/// Default candidate pool size per session.
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Failures of candidate generation and serving.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    /// Every candidate in the session's list has already been served.
    #[error("all candidates have already been served")]
    Exhausted,
    /// Collaborative generation was requested without a fitted model.
    #[error("no latent-factor model available and no fitting data provided")]
    ModelNotReady,
    /// The user index is outside the model's factor matrix.
    #[error("user index {0} is unknown to the model")]
    UnknownUser(usize),
    /// `select_for_energy` was called before `generate`.
    #[error("no candidate list generated yet")]
    NotGenerated,
}

/// One scored track in a session's candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCandidate {
    pub track_id: String,
    /// Track energy in [0, 1], from the catalog.
    pub energy: f64,
    /// Collaborative affinity, hybrid-adjusted when generated by the hybrid
    /// recommender. Never re-scored after list creation.
    pub affinity: f64,
    pub served: bool,
}

/// Fixed-order candidate list with mark-and-skip serving.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    candidates: Vec<TrackCandidate>,
}

impl CandidateList {
    #[must_use]
    pub fn new(candidates: Vec<TrackCandidate>) -> Self {
        Self { candidates }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TrackCandidate] {
        &self.candidates
    }

    /// Serve the best energy match among unserved candidates.
    ///
    /// Scans the fixed list order: the first unserved candidate within
    /// `margin` of the target wins outright; otherwise the unserved
    /// candidate with the globally smallest energy distance is served, with
    /// ties broken by list position. Marks the winner served.
    pub fn select_for_energy(
        &mut self,
        target_energy: f64,
        margin: f64,
    ) -> Result<TrackCandidate, RecommendError> {
        let mut closest: Option<usize> = None;
        let mut closest_distance = f64::INFINITY;

        for (i, candidate) in self.candidates.iter().enumerate() {
            if candidate.served {
                continue;
            }
            let distance = (candidate.energy - target_energy).abs();
            if distance <= margin {
                self.candidates[i].served = true;
                return Ok(self.candidates[i].clone());
            }
            if distance < closest_distance {
                closest = Some(i);
                closest_distance = distance;
            }
        }

        match closest {
            Some(i) => {
                self.candidates[i].served = true;
                Ok(self.candidates[i].clone())
            }
            None => Err(RecommendError::Exhausted),
        }
    }
}

/// Common call contract shared by the collaborative and hybrid recommenders.
pub trait Recommender {
    /// Build the session's candidate list for a user, ranked by descending
    /// affinity, at most `n` entries, excluding already-interacted tracks.
    fn generate(&mut self, user_index: usize, n: usize)
        -> Result<&[TrackCandidate], RecommendError>;

    /// Serve one unserved candidate matching the target energy. Each call
    /// serves exactly one previously-unserved track or fails.
    fn select_for_energy(&mut self, target_energy: f64) -> Result<TrackCandidate, RecommendError>;

    /// The full candidate list in serving order, if generated.
    fn candidates(&self) -> Option<&[TrackCandidate]>;

    /// Track-id projection of the candidate list, if generated.
    fn candidate_ids(&self) -> Option<Vec<String>> {
        self.candidates()
            .map(|list| list.iter().map(|c| c.track_id.clone()).collect())
    }
}

/// Collaborative-filtering stage over a pre-trained latent-factor model.
pub struct CollaborativeRecommender {
    model: Option<Arc<LatentFactorModel>>,
    catalog: Arc<Catalog>,
    /// Item indices each user has already interacted with.
    interactions: HashMap<usize, HashSet<usize>>,
    margin: f64,
    list: Option<CandidateList>,
}

impl CollaborativeRecommender {
    #[must_use]
    pub fn new(
        model: Option<Arc<LatentFactorModel>>,
        catalog: Arc<Catalog>,
        interactions: HashMap<usize, HashSet<usize>>,
    ) -> Self {
        Self {
            model,
            catalog,
            interactions,
            margin: DEFAULT_ENERGY_MARGIN,
            list: None,
        }
    }

    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// External user id for a model row, if a model is loaded.
    #[must_use]
    pub fn user_id(&self, user_index: usize) -> Option<&str> {
        self.model
            .as_ref()
            .and_then(|m| m.user_ids.get(user_index))
            .map(String::as_str)
    }
}

impl Recommender for CollaborativeRecommender {
    fn generate(
        &mut self,
        user_index: usize,
        n: usize,
    ) -> Result<&[TrackCandidate], RecommendError> {
        let model = self.model.as_ref().ok_or(RecommendError::ModelNotReady)?;
        let interacted = self
            .interactions
            .get(&user_index)
            .cloned()
            .unwrap_or_default();

        let ranked = model
            .rank_items(user_index, &interacted, n)
            .ok_or(RecommendError::UnknownUser(user_index))?;

        let candidates: Vec<TrackCandidate> = ranked
            .into_iter()
            .filter_map(|(item, score)| {
                let track_id = &model.track_ids[item];
                match self.catalog.get(track_id) {
                    Some(track) => Some(TrackCandidate {
                        track_id: track_id.clone(),
                        energy: track.energy,
                        affinity: f64::from(score),
                        served: false,
                    }),
                    None => {
                        warn!("model track {track_id} missing from catalog, skipping");
                        None
                    }
                }
            })
            .collect();

        debug!(
            "collaborative stage ranked {} candidates for user index {user_index}",
            candidates.len()
        );
        self.list = Some(CandidateList::new(candidates));
        Ok(self.list.as_ref().map(CandidateList::as_slice).unwrap())
    }

    fn select_for_energy(&mut self, target_energy: f64) -> Result<TrackCandidate, RecommendError> {
        let margin = self.margin;
        self.list
            .as_mut()
            .ok_or(RecommendError::NotGenerated)?
            .select_for_energy(target_energy, margin)
    }

    fn candidates(&self) -> Option<&[TrackCandidate]> {
        self.list.as_ref().map(CandidateList::as_slice)
    }
}

/// Normalized cluster-preference distribution for one member's history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterPreferences {
    weights: HashMap<u32, f64>,
}

impl ClusterPreferences {
    /// Preference weight for a cluster, if the member's history touches it.
    #[must_use]
    pub fn weight(&self, cluster: u32) -> Option<f64> {
        self.weights.get(&cluster).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }
}

/// Content-based stage: summarizes listening history into cluster weights.
pub struct ClusterRecommender {
    clusters: Arc<HashMap<String, u32>>,
}

impl ClusterRecommender {
    #[must_use]
    pub fn new(clusters: Arc<HashMap<String, u32>>) -> Self {
        Self { clusters }
    }

    #[must_use]
    pub fn cluster_of(&self, track_id: &str) -> Option<u32> {
        self.clusters.get(track_id).copied()
    }

    /// Count historical tracks per cluster and normalize by history length.
    /// An empty history yields an empty preference map; callers fall back to
    /// the floor weight.
    #[must_use]
    pub fn cluster_preferences(&self, history: &[String]) -> ClusterPreferences {
        if history.is_empty() {
            return ClusterPreferences::default();
        }

        let mut counts: HashMap<u32, usize> = HashMap::new();
        for track_id in history {
            if let Some(cluster) = self.clusters.get(track_id) {
                *counts.entry(*cluster).or_insert(0) += 1;
            }
        }

        let total = history.len() as f64;
        ClusterPreferences {
            weights: counts
                .into_iter()
                .map(|(cluster, count)| (cluster, count as f64 / total))
                .collect(),
        }
    }
}

/// Hybrid stage: collaborative affinities re-weighted by cluster preference.
///
/// Composes a collaborative and a content-based recommender rather than
/// specializing either. The re-weighted, re-sorted list becomes the
/// session's fixed serving order.
pub struct HybridRecommender {
    collaborative: CollaborativeRecommender,
    content: ClusterRecommender,
    /// Listening history keyed by external user id.
    history: Arc<HashMap<String, Vec<String>>>,
    alpha: f64,
    margin: f64,
    list: Option<CandidateList>,
}

impl HybridRecommender {
    #[must_use]
    pub fn new(
        collaborative: CollaborativeRecommender,
        content: ClusterRecommender,
        history: Arc<HashMap<String, Vec<String>>>,
    ) -> Self {
        Self {
            collaborative,
            content,
            history,
            alpha: DEFAULT_ALPHA,
            margin: DEFAULT_ENERGY_MARGIN,
            list: None,
        }
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }
}

impl Recommender for HybridRecommender {
    fn generate(
        &mut self,
        user_index: usize,
        n: usize,
    ) -> Result<&[TrackCandidate], RecommendError> {
        let collaborative = self.collaborative.generate(user_index, n)?.to_vec();

        let user_history = self
            .collaborative
            .user_id(user_index)
            .and_then(|user_id| self.history.get(user_id))
            .cloned()
            .unwrap_or_default();
        let preferences = self.content.cluster_preferences(&user_history);
        debug!(
            "user index {user_index}: {} history entries over {} clusters",
            user_history.len(),
            preferences.len()
        );

        let mut candidates: Vec<TrackCandidate> = collaborative
            .into_iter()
            .map(|candidate| {
                let weight = self
                    .content
                    .cluster_of(&candidate.track_id)
                    .and_then(|cluster| preferences.weight(cluster))
                    .unwrap_or(CLUSTER_FLOOR_WEIGHT);
                TrackCandidate {
                    affinity: candidate.affinity * weight * self.alpha,
                    ..candidate
                }
            })
            .collect();

        // Stable sort: ties keep the collaborative ordering.
        candidates.sort_by(|a, b| {
            b.affinity
                .partial_cmp(&a.affinity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.list = Some(CandidateList::new(candidates));
        Ok(self.list.as_ref().map(CandidateList::as_slice).unwrap())
    }

    fn select_for_energy(&mut self, target_energy: f64) -> Result<TrackCandidate, RecommendError> {
        let margin = self.margin;
        self.list
            .as_mut()
            .ok_or(RecommendError::NotGenerated)?
            .select_for_energy(target_energy, margin)
    }

    fn candidates(&self) -> Option<&[TrackCandidate]> {
        self.list.as_ref().map(CandidateList::as_slice)
    }
}
