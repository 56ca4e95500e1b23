//! Per-session energy calculation from a member's heart-rate series.
//!
//! Wraps the fuzzy controller with session state: the current minute, the
//! member's age, and the ordered BPM readings (one per elapsed minute).
//! Minute 0 is the warm-up and gets a fixed default energy without invoking
//! the controller, since no predecessor reading exists yet.

use crate::fuzzy::FuzzyController;
use log::debug;

/// Fixed target energy for the session-opening (warm-up) song.
pub const WARM_UP_ENERGY: f64 = 0.6;

/// Outcome of an energy computation for the current session minute.
///
/// Running out of heart-rate data is a normal terminal condition, not an
/// error, so it gets its own variant rather than a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyDecision {
    /// Minute 0: fixed default, no BPM delta available.
    WarmUp { energy: f64 },
    /// Fuzzy-inferred target plus the raw readings it was derived from.
    Target {
        energy: f64,
        bpm_current: u32,
        bpm_previous: u32,
    },
    /// The session minute has passed the end of the heart-rate series.
    SessionOver,
}

impl EnergyDecision {
    /// Target energy, if the session is still running.
    #[must_use]
    pub fn energy(&self) -> Option<f64> {
        match self {
            Self::WarmUp { energy } | Self::Target { energy, .. } => Some(*energy),
            Self::SessionOver => None,
        }
    }
}

/// Result of advancing session time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The session continues at this minute.
    Continuing(usize),
    /// Elapsed time has reached the end of the heart-rate series.
    Ended,
}

/// Session-scoped calculator producing the target energy minute by minute.
///
/// Owned by exactly one active session; not shareable across members because
/// the current minute mutates as songs play.
#[derive(Debug, Clone)]
pub struct EnergyCalculator {
    age: f64,
    heart_rates: Vec<u32>,
    session_minute: usize,
    controller: FuzzyController,
}

impl EnergyCalculator {
    #[must_use]
    pub fn new(age: f64, heart_rates: Vec<u32>) -> Self {
        Self {
            age,
            heart_rates,
            session_minute: 0,
            controller: FuzzyController::new(),
        }
    }

    /// Resume a session at a specific minute, e.g. after a restart of the
    /// surrounding request cycle.
    #[must_use]
    pub fn at_minute(age: f64, heart_rates: Vec<u32>, session_minute: usize) -> Self {
        Self {
            age,
            heart_rates,
            session_minute,
            controller: FuzzyController::new(),
        }
    }

    #[must_use]
    pub fn session_minute(&self) -> usize {
        self.session_minute
    }

    #[must_use]
    pub fn series_len(&self) -> usize {
        self.heart_rates.len()
    }

    /// Compute the target energy for the current session minute.
    #[must_use]
    pub fn compute_for_current_minute(&self) -> EnergyDecision {
        if self.session_minute == 0 {
            return EnergyDecision::WarmUp {
                energy: WARM_UP_ENERGY,
            };
        }
        if self.session_minute >= self.heart_rates.len() {
            return EnergyDecision::SessionOver;
        }

        let bpm_current = self.heart_rates[self.session_minute];
        let bpm_previous = self.heart_rates[self.session_minute - 1];
        let delta = f64::from(bpm_current) - f64::from(bpm_previous);
        debug!(
            "minute {}: bpm {} -> {} (delta {delta})",
            self.session_minute, bpm_previous, bpm_current
        );

        let energy = self
            .controller
            .infer(f64::from(bpm_current), delta, self.age);
        EnergyDecision::Target {
            energy,
            bpm_current,
            bpm_previous,
        }
    }

    /// Advance session time by a song's duration in whole minutes.
    ///
    /// Durations of zero are tolerated; the minute is advanced even when the
    /// result lands past the series so callers can observe the overshoot.
    pub fn advance(&mut self, song_duration_minutes: usize) -> Advance {
        self.session_minute += song_duration_minutes;
        if self.session_minute >= self.heart_rates.len() {
            Advance::Ended
        } else {
            Advance::Continuing(self.session_minute)
        }
    }
}
