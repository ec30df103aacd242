//! Scan configuration.
//!
//! Defaults match what the dashboard has always used. Environment overrides
//! are read once through [`ScanConfig::from_env`].

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::{DedupError, Result};
use crate::similarity::{BigramDice, Similarity};

/// Both title and artist scores must be strictly above this to match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Enough room for every distinct progress tick plus the final snapshot.
pub const DEFAULT_PROGRESS_CAPACITY: usize = 128;

#[derive(Clone)]
pub struct ScanConfig {
    similarity_threshold: f64,
    progress_capacity: usize,
    similarity: Arc<dyn Similarity>,
}

impl ScanConfig {
    /// Load overrides from `DEDUP_SIMILARITY_THRESHOLD` and
    /// `DEDUP_PROGRESS_CAPACITY`. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("DEDUP_SIMILARITY_THRESHOLD") {
            let parsed = raw
                .parse::<f64>()
                .ok()
                .and_then(|t| config.clone().with_threshold(t).ok());
            match parsed {
                Some(updated) => config = updated,
                None => warn!(
                    "Ignoring DEDUP_SIMILARITY_THRESHOLD={}, using {}",
                    raw, DEFAULT_SIMILARITY_THRESHOLD
                ),
            }
        }

        if let Ok(raw) = std::env::var("DEDUP_PROGRESS_CAPACITY") {
            match raw.parse::<usize>() {
                Ok(capacity) => config = config.with_progress_capacity(capacity),
                Err(_) => warn!(
                    "Ignoring DEDUP_PROGRESS_CAPACITY={}, using {}",
                    raw, DEFAULT_PROGRESS_CAPACITY
                ),
            }
        }

        config
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(DedupError::InvalidThreshold(threshold));
        }
        self.similarity_threshold = threshold;
        Ok(self)
    }

    pub fn with_similarity(mut self, similarity: impl Similarity + 'static) -> Self {
        self.similarity = Arc::new(similarity);
        self
    }

    /// Capacity of the progress broadcast channel, at least 1.
    pub fn with_progress_capacity(mut self, capacity: usize) -> Self {
        self.progress_capacity = capacity.max(1);
        self
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn progress_capacity(&self) -> usize {
        self.progress_capacity
    }

    pub fn similarity(&self) -> &dyn Similarity {
        self.similarity.as_ref()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            similarity: Arc::new(BigramDice),
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("similarity_threshold", &self.similarity_threshold)
            .field("progress_capacity", &self.progress_capacity)
            .finish_non_exhaustive()
    }
}
