//! Detector: a document-in, surprise-out pipeline.
//!
//! A detector composes one of the two scorer capabilities with the input
//! preparation it needs:
//!
//! - geometry scorers get `normalize(vectorize(document))`;
//! - sequence scorers get the document's compact JSON bytes.

use crate::config::Config;
use crate::error::{AnomalyError, Result};
use crate::kernel::{validate, Vectorizer, Walkable};
use crate::memory::{
    ByteScorer, Complexity, ComplexityEnsemble, SimilarityWindow, Surprise, VectorScorer,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Built-in detector kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Windowed average similarity over embeddings.
    Similarity,
    /// Single CDF16 model over JSON bytes.
    Complexity,
    /// Ensemble of CDF16 models over JSON bytes.
    Ensemble,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 3] = [
        DetectorKind::Similarity,
        DetectorKind::Complexity,
        DetectorKind::Ensemble,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DetectorKind::Similarity => "similarity",
            DetectorKind::Complexity => "complexity",
            DetectorKind::Ensemble => "ensemble",
        }
    }
}

enum Pipeline {
    Vector {
        vectorizer: Vectorizer,
        scorer: Box<dyn VectorScorer + Send>,
    },
    Bytes {
        scorer: Box<dyn ByteScorer + Send>,
    },
}

/// A scorer plus its input preparation.
///
/// Owns its scorer exclusively; run one detector per session or thread.
pub struct Detector {
    pipeline: Pipeline,
}

impl Detector {
    /// Detector over embeddings.
    ///
    /// # Errors
    /// `DimensionMismatch` if the scorer expects a different width than the
    /// vectorizer produces.
    pub fn vector(vectorizer: Vectorizer, scorer: Box<dyn VectorScorer + Send>) -> Result<Self> {
        if vectorizer.dimensions() != scorer.dimensions() {
            return Err(AnomalyError::DimensionMismatch {
                expected: vectorizer.dimensions(),
                got: scorer.dimensions(),
            });
        }
        Ok(Self {
            pipeline: Pipeline::Vector { vectorizer, scorer },
        })
    }

    /// Detector over raw JSON bytes.
    pub fn bytes(scorer: Box<dyn ByteScorer + Send>) -> Self {
        Self {
            pipeline: Pipeline::Bytes { scorer },
        }
    }

    /// Build a built-in detector with a fresh vectorizer.
    pub fn from_config(config: &Config, kind: DetectorKind) -> Result<Self> {
        config.validate()?;
        let vectorizer = Vectorizer::from_config(config)?;
        Self::with_vectorizer(config, kind, vectorizer)
    }

    /// Build a built-in detector around an existing (possibly shared)
    /// vectorizer. Byte detectors ignore it.
    pub fn with_vectorizer(config: &Config, kind: DetectorKind, vectorizer: Vectorizer) -> Result<Self> {
        debug!(kind = kind.name(), "creating detector");
        match kind {
            DetectorKind::Similarity => {
                let window = SimilarityWindow::new(vectorizer.dimensions(), config.window_capacity)?;
                Self::vector(vectorizer, Box::new(window))
            }
            DetectorKind::Complexity => Ok(Self::bytes(Box::new(Complexity::from_config(config)?))),
            DetectorKind::Ensemble => Ok(Self::bytes(Box::new(ComplexityEnsemble::from_config(
                config,
            )?))),
        }
    }

    /// Whether this detector scores embeddings (as opposed to bytes).
    pub fn is_vector(&self) -> bool {
        matches!(self.pipeline, Pipeline::Vector { .. })
    }

    /// Score one document and learn from it.
    ///
    /// # Errors
    /// `MalformedDocument` for any node outside the document model, whatever
    /// the detector kind. The scorer's state is left untouched.
    pub fn train<W: Walkable + Serialize + ?Sized>(&mut self, document: &W) -> Result<Surprise> {
        match &mut self.pipeline {
            Pipeline::Vector { vectorizer, scorer } => {
                let unit = vectorizer.vectorize(document)?.normalized();
                scorer.train(&unit)
            }
            Pipeline::Bytes { scorer } => {
                // Serialization alone would accept null and bool.
                validate(document)?;
                let bytes = serde_json::to_vec(document)?;
                Ok(scorer.train(&bytes))
            }
        }
    }
}
