//! Memory layer: stateful surprise scorers.
//!
//! Every scorer here learns as it scores: each call to `train` is one
//! scoring step followed by one learning step, and the learned state
//! persists across calls. Scorers are not shared between threads; each
//! detection session owns its scorer, and parallelism comes from running
//! independent sessions.
//!
//! Two capability interfaces cover the two input shapes:
//!
//! - [`VectorScorer`] consumes unit-normalized embeddings
//!   ([`SimilarityWindow`]).
//! - [`ByteScorer`] consumes raw byte sequences ([`Complexity`],
//!   [`ComplexityEnsemble`]).
//!
//! Neural scorers (autoencoders, recurrent networks) live outside this crate
//! and plug in by implementing one of these traits.
//!
//! # Usage
//!
//! ```rust
//! use anomaly::memory::{ByteScorer, Complexity};
//!
//! let mut complexity = Complexity::default();
//! let first = complexity.train(b"aaaaaaaaaaaaaaaa");
//! let second = complexity.train(b"aaaaaaaaaaaaaaaa");
//! assert!(second.surprise <= first.surprise);
//! ```

pub mod cdf16;
pub mod complexity;
pub mod window;

pub use cdf16::{Cdf16, CumulativeTable};
pub use complexity::{Complexity, ComplexityEnsemble};
pub use window::SimilarityWindow;

use crate::error::Result;

/// One scoring step's output.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surprise {
    /// Raw surprise score. Its scale is scorer specific; calibrate before
    /// comparing across scorers.
    pub surprise: f32,
    /// Spread of the estimate, 0 for scorers without an uncertainty model.
    pub uncertainty: f32,
}

impl Surprise {
    /// A score without an uncertainty estimate.
    pub fn certain(surprise: f32) -> Self {
        Self {
            surprise,
            uncertainty: 0.0,
        }
    }
}

/// A scorer over unit-normalized embeddings.
pub trait VectorScorer {
    /// Score `unit` against learned state, then learn from it.
    fn train(&mut self, unit: &[f32]) -> Result<Surprise>;

    /// Expected input width.
    fn dimensions(&self) -> usize;
}

/// A scorer over raw byte sequences.
pub trait ByteScorer {
    /// Score `input` against learned state, then learn from it.
    fn train(&mut self, input: &[u8]) -> Surprise;
}
