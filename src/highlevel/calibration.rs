//! Calibration: turn raw surprise into a z-score against a training stream.
//!
//! A trial feeds a detector a stream of sample documents. The first
//! `cutoff` scores are a warm-up and are discarded; the rest feed running
//! statistics. Each fixture is then scored (the detector keeps learning) and
//! reported as `|raw - mean| / stddev`.
//!
//! The statistics are kept as running sums, so a trial
//! never has to keep its scores around.

use super::detector::Detector;
use crate::config::Config;
use crate::error::{AnomalyError, Result};
use crate::kernel::Walkable;
use serde::Serialize;
use tracing::{debug, warn};

/// A fixture built from tokens that random training documents rarely use.
pub const FIXTURE_DIVERGENT: &str =
    r#"{"alfa":[{"alfa":"1"},{"bravo":"2"}],"bravo":[{"alfa":"3"},{"bravo":"4"}]}"#;

/// A fixture in the same shape and alphabet as random training documents.
pub const FIXTURE_SELF_SIMILAR: &str =
    r#"{"a":[{"a":"aa"},{"b":"bb"}],"b":[{"a":"aa"},{"b":"bb"}]}"#;

/// Running mean and standard deviation of post-warm-up scores.
#[derive(Clone, Debug, Default)]
pub struct CalibrationState {
    cutoff: usize,
    seen: usize,
    count: usize,
    sum: f64,
    sum_squared: f64,
}

impl CalibrationState {
    /// Create a state that ignores the first `cutoff` observations.
    pub fn new(cutoff: usize) -> Self {
        Self {
            cutoff,
            ..Self::default()
        }
    }

    /// Record one raw score.
    pub fn observe(&mut self, score: f64) {
        self.seen += 1;
        if self.seen <= self.cutoff {
            return;
        }
        self.count += 1;
        self.sum += score;
        self.sum_squared += score * score;
    }

    /// Observations seen, including the warm-up.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Observations that contributed to the statistics.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Population standard deviation.
    pub fn stddev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_squared / self.count as f64 - mean * mean)
            .max(0.0)
            .sqrt()
    }

    /// `|raw - mean| / stddev`.
    ///
    /// # Errors
    /// `DegenerateStatistics` with fewer than two observations or a
    /// standard deviation that is zero up to rounding. The sum-of-squares
    /// form leaves a residue near `1e-8 * |mean|` on a constant stream, so
    /// anything under `1e-6 * |mean|` counts as zero.
    pub fn z_score(&self, raw: f64) -> Result<f64> {
        let stddev = self.stddev();
        let mean = self.mean();
        let floor = 1e-6 * mean.abs();
        if self.count < 2 || !stddev.is_finite() || stddev <= floor {
            return Err(AnomalyError::DegenerateStatistics {
                count: self.count,
                stddev,
            });
        }
        Ok((raw - mean).abs() / stddev)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cutoff);
    }
}

/// Score of one fixture at the end of a trial.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FixtureResult {
    /// Raw detector surprise.
    pub raw: f64,
    /// Raw detector uncertainty.
    pub uncertainty: f64,
    /// Calibrated score; `None` when the statistics were degenerate.
    pub z: Option<f64>,
}

/// Outcome of one calibration trial.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialReport {
    pub mean: f64,
    pub stddev: f64,
    /// Post-warm-up samples behind `mean` and `stddev`.
    pub count: usize,
    /// One entry per fixture, in the order given.
    pub results: Vec<FixtureResult>,
}

impl TrialReport {
    /// Whether fixture `a` scored a strictly larger z than fixture `b`.
    /// False when either index is out of range or either z is missing.
    pub fn ranks_higher(&self, a: usize, b: usize) -> bool {
        match (self.results.get(a), self.results.get(b)) {
            (Some(x), Some(y)) => match (x.z, y.z) {
                (Some(za), Some(zb)) => za > zb,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Fraction of trials in which fixture `a` outranks fixture `b`.
pub fn accuracy(reports: &[TrialReport], a: usize, b: usize) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    let hits = reports.iter().filter(|r| r.ranks_higher(a, b)).count();
    hits as f64 / reports.len() as f64
}

/// Trial runner.
#[derive(Clone, Copy, Debug)]
pub struct Calibration {
    cutoff: usize,
}

impl Calibration {
    pub fn new(cutoff: usize) -> Self {
        Self { cutoff }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cutoff)
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Run one trial: train `detector` on every sample, then score each
    /// fixture against the post-warm-up statistics. Samples are consumed as
    /// they are produced, so a generator can stream them.
    ///
    /// Fixtures are trained too, but do not feed the statistics.
    ///
    /// # Errors
    /// Propagates detector errors (malformed documents, dimension
    /// mismatches). Degenerate statistics are not an error here; the
    /// affected fixtures get `z: None`.
    pub fn run<S, F, I>(&self, detector: &mut Detector, samples: I, fixtures: &[F]) -> Result<TrialReport>
    where
        I: IntoIterator<Item = S>,
        S: Walkable + Serialize,
        F: Walkable + Serialize,
    {
        let mut state = CalibrationState::new(self.cutoff);
        for sample in samples {
            let scored = detector.train(&sample)?;
            state.observe(scored.surprise as f64);
        }
        debug!(
            seen = state.seen(),
            count = state.count(),
            mean = state.mean(),
            stddev = state.stddev(),
            "calibration stream complete"
        );

        let mut results = Vec::with_capacity(fixtures.len());
        for (index, fixture) in fixtures.iter().enumerate() {
            let scored = detector.train(fixture)?;
            let raw = scored.surprise as f64;
            let z = match state.z_score(raw) {
                Ok(z) => Some(z),
                Err(err) => {
                    warn!(fixture = index, error = %err, "fixture left uncalibrated");
                    None
                }
            };
            results.push(FixtureResult {
                raw,
                uncertainty: scored.uncertainty as f64,
                z,
            });
        }

        Ok(TrialReport {
            mean: state.mean(),
            stddev: state.stddev(),
            count: state.count(),
            results,
        })
    }
}
