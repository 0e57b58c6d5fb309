//! Complexity scorers: surprise as bits per byte under an adaptive model.
//!
//! [`Complexity`] wraps a single [`Cdf16`]: each input is scored by its
//! average code length while the model learns it. Inputs that resemble what
//! the model has seen compress well and score low.
//!
//! [`ComplexityEnsemble`] runs several models that each learn only a random
//! half of the inputs. Every model scores every input without learning; the
//! mean is the surprise and the spread between members is the uncertainty.

use super::cdf16::Cdf16;
use super::{ByteScorer, Surprise};
use crate::config::Config;
use crate::error::{AnomalyError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Single-model complexity scorer.
#[derive(Debug, Default)]
pub struct Complexity {
    model: Cdf16,
}

impl Complexity {
    /// Create a scorer with context depth `depth` and update rate `rate`.
    pub fn new(depth: usize, rate: u32) -> Result<Self> {
        Ok(Self {
            model: Cdf16::new(depth, rate)?,
        })
    }

    /// Create a scorer from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.context_depth, config.decay_rate)
    }

    /// The underlying model.
    pub fn model(&self) -> &Cdf16 {
        &self.model
    }
}

impl ByteScorer for Complexity {
    fn train(&mut self, input: &[u8]) -> Surprise {
        Surprise::certain(self.model.train(input))
    }
}

/// Ensemble of complexity models with a disagreement-based uncertainty.
#[derive(Debug)]
pub struct ComplexityEnsemble {
    models: Vec<Cdf16>,
    rng: ChaCha8Rng,
}

impl ComplexityEnsemble {
    /// Create an ensemble of `size` models.
    ///
    /// # Errors
    /// `InvalidConfig` if `size` is zero or the model parameters are invalid.
    pub fn new(size: usize, depth: usize, rate: u32, seed: u64) -> Result<Self> {
        if size == 0 {
            return Err(AnomalyError::InvalidConfig(
                "ensemble needs at least one model".to_string(),
            ));
        }
        let models = (0..size)
            .map(|_| Cdf16::new(depth, rate))
            .collect::<Result<Vec<_>>>()?;
        debug!(size, depth, rate, seed, "creating complexity ensemble");
        Ok(Self {
            models,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Create an ensemble from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.ensemble_size,
            config.context_depth,
            config.decay_rate,
            config.ensemble_seed,
        )
    }

    /// Number of member models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ComplexityEnsemble {
    fn default() -> Self {
        Self {
            models: (0..8).map(|_| Cdf16::default()).collect(),
            rng: ChaCha8Rng::seed_from_u64(1),
        }
    }
}

impl ByteScorer for ComplexityEnsemble {
    fn train(&mut self, input: &[u8]) -> Surprise {
        let (mut sum, mut sum_squared) = (0.0f64, 0.0f64);
        for model in &mut self.models {
            let sample = model.score(input) as f64;
            sum += sample;
            sum_squared += sample * sample;

            if self.rng.gen_bool(0.5) {
                model.train(input);
            }
        }

        let n = self.models.len() as f64;
        let mean = sum / n;
        let variance = (sum_squared / n - mean * mean).max(0.0);
        Surprise {
            surprise: mean as f32,
            uncertainty: variance.sqrt() as f32,
        }
    }
}
