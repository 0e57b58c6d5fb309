//! # Anomaly: surprise scores for JSON documents
//!
//! Anomaly scores how surprising each JSON document in a stream is, relative
//! to the documents seen before it. Documents are either embedded into a
//! fixed-width vector (random projection of every path suffix) or fed as raw
//! bytes to an adaptive context model. Raw scores are calibrated into
//! z-scores against a training stream.
//!
//! ## Quick Start
//!
//! ```rust
//! use anomaly::{Detector, DetectorKind, Config, Document};
//!
//! let config = Config { dimensions: 512, ..Config::default() };
//! let mut detector = Detector::from_config(&config, DetectorKind::Similarity)?;
//!
//! let doc = Document::from_json(r#"{"user": {"name": "ada", "tags": ["x", "y"]}}"#)?;
//! let first = detector.train(&doc)?;
//! let again = detector.train(&doc)?;
//! assert_eq!(first.surprise, 0.0);
//! assert!(again.surprise > 0.99);
//! # Ok::<(), anomaly::AnomalyError>(())
//! ```
//!
//! ## Layers
//!
//! - [`kernel`]: documents, projection sources, the vectorizer, embeddings.
//! - [`memory`]: stateful scorers (similarity window, complexity models).
//! - [`highlevel`]: detectors and calibration trials.

pub mod config;
pub mod error;
pub mod highlevel;
pub mod kernel;
pub mod memory;

// Re-exports for convenience
pub use config::Config;
pub use error::{AnomalyError, Result};
pub use highlevel::{
    accuracy, Calibration, CalibrationState, Detector, DetectorKind, TrialReport,
    FIXTURE_DIVERGENT, FIXTURE_SELF_SIMILAR,
};
pub use kernel::{Document, Embedding, Similarity, SourceKind, Vectorizer, Walkable};
pub use memory::{ByteScorer, Surprise, VectorScorer};
