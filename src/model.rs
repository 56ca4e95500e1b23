//! Pre-trained latent-factor model artifact.
//!
//! The collaborative stage consumes a matrix-factorization model fitted
//! offline (training is out of scope here). The artifact is a JSON file
//! holding the user and item factor matrices together with the stable index
//! mappings from matrix positions to external user and track identifiers.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Factorized user-item model plus its index mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentFactorModel {
    /// Latent dimensionality shared by both factor matrices.
    pub factors: usize,
    /// External user ids, indexed by matrix row.
    pub user_ids: Vec<String>,
    /// External track ids, indexed by matrix column.
    pub track_ids: Vec<String>,
    pub user_factors: Vec<Vec<f32>>,
    pub item_factors: Vec<Vec<f32>>,
}

impl LatentFactorModel {
    /// Load and validate a model artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact at {}", path.display()))?;
        let model: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed model artifact at {}", path.display()))?;
        model.validate()?;
        Ok(model)
    }

    /// Persist the artifact. Used by test fixtures and offline tooling.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string(self).context("Failed to serialize model artifact")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write model artifact to {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.user_factors.len() != self.user_ids.len() {
            bail!(
                "Model artifact inconsistent: {} user factor rows for {} user ids",
                self.user_factors.len(),
                self.user_ids.len()
            );
        }
        if self.item_factors.len() != self.track_ids.len() {
            bail!(
                "Model artifact inconsistent: {} item factor rows for {} track ids",
                self.item_factors.len(),
                self.track_ids.len()
            );
        }
        for row in self.user_factors.iter().chain(self.item_factors.iter()) {
            if row.len() != self.factors {
                bail!(
                    "Model artifact inconsistent: factor row of length {} (expected {})",
                    row.len(),
                    self.factors
                );
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_ids.len()
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.track_ids.len()
    }

    /// Matrix column for an external track id, if the model knows it.
    #[must_use]
    pub fn track_index(&self, track_id: &str) -> Option<usize> {
        self.track_ids.iter().position(|id| id == track_id)
    }

    /// Score every item for `user_index`, excluding `interacted` columns,
    /// ranked by descending affinity. Ties break toward the lower item
    /// index so rankings stay deterministic for a fixed model.
    ///
    /// Returns `None` if the user index is outside the factor matrix.
    #[must_use]
    pub fn rank_items(
        &self,
        user_index: usize,
        interacted: &HashSet<usize>,
        n: usize,
    ) -> Option<Vec<(usize, f32)>> {
        let user_vector = self.user_factors.get(user_index)?;

        let mut scored: Vec<(usize, f32)> = self
            .item_factors
            .par_iter()
            .enumerate()
            .filter(|(item, _)| !interacted.contains(item))
            .map(|(item, item_vector)| (item, dot(user_vector, item_vector)))
            .collect();

        scored.sort_unstable_by(|(ia, sa), (ib, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });
        scored.truncate(n);
        Some(scored)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
