//! Windowed average-similarity scorer.
//!
//! Keeps the last K unit-normalized embeddings and scores each new one by its
//! mean absolute cosine similarity to the window. Anti-correlated structure
//! counts as similar, hence the absolute value.
//!
//! The score is a *similarity*: familiar documents score high, novel ones
//! low. Calibration only looks at the distance from the running mean, so the
//! direction does not matter there.

use super::{Surprise, VectorScorer};
use crate::error::{AnomalyError, Result};
use crate::kernel::Similarity;
use std::collections::VecDeque;

/// Bounded circular buffer of unit vectors with average-similarity scoring.
#[derive(Clone, Debug)]
pub struct SimilarityWindow {
    dimensions: usize,
    capacity: usize,
    vectors: VecDeque<Vec<f32>>,
}

impl SimilarityWindow {
    /// Create an empty window.
    ///
    /// # Errors
    /// `InvalidConfig` if `dimensions` or `capacity` is zero.
    pub fn new(dimensions: usize, capacity: usize) -> Result<Self> {
        if dimensions == 0 || capacity == 0 {
            return Err(AnomalyError::InvalidConfig(format!(
                "similarity window needs dimensions and capacity >= 1, got {} and {}",
                dimensions, capacity
            )));
        }
        Ok(Self {
            dimensions,
            capacity,
            vectors: VecDeque::with_capacity(capacity),
        })
    }

    /// Maximum number of buffered vectors.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Mean |cosine| of `unit` against the window, 0 when empty.
    pub fn score(&self, unit: &[f32]) -> f32 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .vectors
            .iter()
            .map(|v| Similarity::cosine(unit, v).abs())
            .sum();
        (sum / self.vectors.len() as f64) as f32
    }

    /// Append `unit`, evicting the oldest entry when full.
    pub fn insert(&mut self, unit: Vec<f32>) {
        if self.vectors.len() == self.capacity {
            self.vectors.pop_front();
        }
        self.vectors.push_back(unit);
    }

    /// Drop all buffered vectors.
    pub fn clear(&mut self) {
        self.vectors.clear();
    }
}

impl VectorScorer for SimilarityWindow {
    fn train(&mut self, unit: &[f32]) -> Result<Surprise> {
        if unit.len() != self.dimensions {
            return Err(AnomalyError::DimensionMismatch {
                expected: self.dimensions,
                got: unit.len(),
            });
        }
        let score = self.score(unit);
        self.insert(unit.to_vec());
        Ok(Surprise::certain(score))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
