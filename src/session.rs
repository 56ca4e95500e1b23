//! Two-stage session driver.
//!
//! Orchestrates one workout session: each tick asks the energy calculator
//! for the fuzzy target (stage 1), asks the hybrid recommender for the
//! closest unserved energy match (stage 2), and advances session time by the
//! served track's duration. Sessions move NOT_STARTED to ACTIVE to ENDED and
//! never back; ENDED is terminal.
//!
//! One driver per member per session. Drivers hold mutable per-member state
//! (current minute, served flags) and must not be shared across members.

use crate::dataset::Dataset;
use crate::energy::{EnergyCalculator, EnergyDecision};
use crate::fuzzy::max_heart_rate;
use crate::recommender::{
    ClusterRecommender, CollaborativeRecommender, HybridRecommender, RecommendError, Recommender,
    TrackCandidate, DEFAULT_POOL_SIZE,
};
use crate::track::{Catalog, TrackInfo};
use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::sync::Arc;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Active,
    Ended,
}

/// Coaching hint derived from the target energy bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityAdvice {
    WarmUp,
    DecreaseSignificantly,
    DecreaseSlightly,
    Maintain,
    IncreaseSlightly,
    IncreaseSignificantly,
}

impl IntensityAdvice {
    /// Band thresholds: 0.2 / 0.4 / 0.6 / 0.8.
    #[must_use]
    pub fn for_energy(energy: f64) -> Self {
        if energy < 0.2 {
            Self::DecreaseSignificantly
        } else if energy < 0.4 {
            Self::DecreaseSlightly
        } else if energy < 0.6 {
            Self::Maintain
        } else if energy < 0.8 {
            Self::IncreaseSlightly
        } else {
            Self::IncreaseSignificantly
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WarmUp => "Warm-up song",
            Self::DecreaseSignificantly => "Decrease training intensity significantly",
            Self::DecreaseSlightly => "Decrease training intensity slightly",
            Self::Maintain => "Maintain training intensity",
            Self::IncreaseSlightly => "Increase training intensity slightly",
            Self::IncreaseSignificantly => "Increase training intensity significantly",
        }
    }
}

/// One served recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct SongTick {
    /// Session minute at which the decision was made.
    pub minute: usize,
    pub track: TrackInfo,
    pub target_energy: f64,
    /// Raw readings behind the target; absent for the warm-up tick.
    pub bpm_current: Option<u32>,
    pub bpm_previous: Option<u32>,
    pub advice: IntensityAdvice,
}

/// Result of advancing the session by one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Song(SongTick),
    /// The session has ended: heart-rate data ran out, the candidate pool
    /// was exhausted, or the member stopped it.
    Ended,
}

/// Per-member session state machine over the two recommendation stages.
pub struct SessionDriver {
    state: SessionState,
    user_index: usize,
    calculator: EnergyCalculator,
    recommender: HybridRecommender,
    catalog: Arc<Catalog>,
}

impl SessionDriver {
    /// Build a driver for one member. Fails if the member's profile,
    /// heart-rate series, or a plausible age is missing; a session cannot
    /// start without its reference data.
    pub fn new(dataset: &Dataset, user_index: usize) -> Result<Self> {
        let member = dataset.member_for_user_index(user_index)?;
        if max_heart_rate(member.age) <= 0.0 {
            bail!(
                "Member {} has implausible age {}; cannot derive maximum heart rate",
                member.user_id,
                member.age
            );
        }
        let series = dataset
            .heart_rates
            .get(&member.user_id)
            .with_context(|| {
                format!(
                    "No heart-rate series for member {}; cannot start session",
                    member.user_id
                )
            })?
            .clone();

        let collaborative = CollaborativeRecommender::new(
            dataset.model.clone(),
            Arc::clone(&dataset.catalog),
            dataset.interactions(),
        );
        let content = ClusterRecommender::new(Arc::clone(&dataset.clusters));
        let recommender =
            HybridRecommender::new(collaborative, content, Arc::clone(&dataset.history));

        Ok(Self {
            state: SessionState::NotStarted,
            user_index,
            calculator: EnergyCalculator::new(member.age, series),
            recommender,
            catalog: Arc::clone(&dataset.catalog),
        })
    }

    /// Tune the hybrid re-weighting factor. Only meaningful before `start`.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.recommender = self.recommender.with_alpha(alpha);
        self
    }

    /// Tune the energy serving window. Only meaningful before `start`.
    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.recommender = self.recommender.with_margin(margin);
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn session_minute(&self) -> usize {
        self.calculator.session_minute()
    }

    /// The session's candidate list in serving order, once started.
    #[must_use]
    pub fn candidates(&self) -> Option<&[TrackCandidate]> {
        self.recommender.candidates()
    }

    /// Track-id projection of the candidate list, once started.
    #[must_use]
    pub fn candidate_ids(&self) -> Option<Vec<String>> {
        self.recommender.candidate_ids()
    }

    /// Start the session: generate the hybrid candidate pool and activate.
    pub fn start(&mut self, pool_size: usize) -> Result<()> {
        if self.state != SessionState::NotStarted {
            bail!("Session already started");
        }
        let n = if pool_size == 0 {
            DEFAULT_POOL_SIZE
        } else {
            pool_size
        };
        let generated = self.recommender.generate(self.user_index, n)?.len();
        info!(
            "session started for user index {} with {generated} candidates",
            self.user_index
        );
        self.state = SessionState::Active;
        Ok(())
    }

    /// Advance one tick: target energy, track selection, time advance.
    ///
    /// Running out of heart-rate data or of candidates ends the session
    /// gracefully; both surface as `TickOutcome::Ended`, not errors. Ticks
    /// on an ended session are no-ops.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        match self.state {
            SessionState::NotStarted => bail!("Session not started"),
            SessionState::Ended => return Ok(TickOutcome::Ended),
            SessionState::Active => {}
        }

        let minute = self.calculator.session_minute();
        let (target_energy, bpm_current, bpm_previous, advice) =
            match self.calculator.compute_for_current_minute() {
                EnergyDecision::SessionOver => {
                    info!("heart-rate series exhausted at minute {minute}; session over");
                    self.state = SessionState::Ended;
                    return Ok(TickOutcome::Ended);
                }
                EnergyDecision::WarmUp { energy } => (energy, None, None, IntensityAdvice::WarmUp),
                EnergyDecision::Target {
                    energy,
                    bpm_current,
                    bpm_previous,
                } => (
                    energy,
                    Some(bpm_current),
                    Some(bpm_previous),
                    IntensityAdvice::for_energy(energy),
                ),
            };

        let candidate = match self.recommender.select_for_energy(target_energy) {
            Ok(candidate) => candidate,
            Err(RecommendError::Exhausted) => {
                warn!("candidate pool exhausted at minute {minute}; ending session");
                self.state = SessionState::Ended;
                return Ok(TickOutcome::Ended);
            }
            Err(err) => return Err(err.into()),
        };

        let track = self
            .catalog
            .get(&candidate.track_id)
            .with_context(|| format!("Served track {} missing from catalog", candidate.track_id))?
            .clone();

        self.calculator.advance(track.duration_minutes());
        Ok(TickOutcome::Song(SongTick {
            minute,
            track,
            target_energy,
            bpm_current,
            bpm_previous,
            advice,
        }))
    }

    /// Explicit member termination. Terminal.
    pub fn end(&mut self) {
        if self.state != SessionState::Ended {
            info!("session ended at minute {}", self.calculator.session_minute());
        }
        self.state = SessionState::Ended;
    }
}
