//! Detector configuration.
//!
//! Every component can be built from explicit constructor arguments; `Config`
//! bundles the recognized options for callers that prefer to load them from
//! JSON.
//!
//! ```rust
//! use anomaly::{Config, SourceKind};
//!
//! let config = Config::from_json(r#"{"dimensions": 512, "source": "prng"}"#).unwrap();
//! assert_eq!(config.dimensions, 512);
//! assert_eq!(config.source, SourceKind::Prng);
//! assert_eq!(config.context_depth, 1); // default
//! ```

use crate::error::{AnomalyError, Result};
use crate::kernel::SourceKind;
use serde::{Deserialize, Serialize};

/// Default embedding dimensionality.
pub const DEFAULT_DIMENSIONS: usize = 1024;
/// Default similarity window capacity.
pub const DEFAULT_WINDOW_CAPACITY: usize = 1024;
/// Default number of warm-up samples discarded by calibration.
pub const DEFAULT_CUTOFF: usize = 100;
/// Default number of samples per calibration trial.
pub const DEFAULT_SAMPLES: usize = 1000;

/// Recognized configuration options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embedding dimension N.
    pub dimensions: usize,
    /// Cache projection columns across vectorize calls.
    pub cache: bool,
    /// Projection source kind.
    pub source: SourceKind,
    /// Context depth D of the complexity model.
    pub context_depth: usize,
    /// Decay rate R of the complexity model (update step is 2^-R).
    pub decay_rate: u32,
    /// Similarity window capacity K.
    pub window_capacity: usize,
    /// Calibration warm-up cutoff.
    pub cutoff: usize,
    /// Samples per calibration trial, warm-up included.
    pub samples: usize,
    /// Number of models in the complexity ensemble.
    pub ensemble_size: usize,
    /// Seed for the ensemble's training coin flips.
    pub ensemble_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
            cache: true,
            source: SourceKind::Lfsr,
            context_depth: crate::memory::cdf16::DEFAULT_DEPTH,
            decay_rate: crate::memory::cdf16::DEFAULT_RATE,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            cutoff: DEFAULT_CUTOFF,
            samples: DEFAULT_SAMPLES,
            ensemble_size: 8,
            ensemble_seed: 1,
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check construction-time invariants.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(invalid("dimensions must be at least 1"));
        }
        if self.context_depth == 0 {
            return Err(invalid("context_depth must be at least 1"));
        }
        if !(1..=crate::memory::cdf16::FIXED).contains(&self.decay_rate) {
            return Err(invalid(format!(
                "decay_rate must be in 1..={}, got {}",
                crate::memory::cdf16::FIXED,
                self.decay_rate
            )));
        }
        if self.window_capacity == 0 {
            return Err(invalid("window_capacity must be at least 1"));
        }
        if self.ensemble_size == 0 {
            return Err(invalid("ensemble_size must be at least 1"));
        }
        if self.cutoff >= self.samples {
            return Err(invalid(format!(
                "cutoff ({}) must be smaller than samples ({})",
                self.cutoff, self.samples
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AnomalyError {
    AnomalyError::InvalidConfig(message.into())
}
