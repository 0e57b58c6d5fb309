//! High-level API: detectors and calibration.
//!
//! [`Detector`] wires a scorer from the [`memory`](crate::memory) layer to
//! the input preparation it needs from the [`kernel`](crate::kernel) layer.
//! [`Calibration`] runs a detector over a stream of training documents and
//! reports how far each fixture lands from the stream's typical score.
//!
//! ```rust
//! use anomaly::highlevel::{Calibration, Detector, DetectorKind};
//! use anomaly::{Config, Document};
//!
//! let config = Config { dimensions: 256, ..Config::default() };
//! let mut detector = Detector::from_config(&config, DetectorKind::Complexity)?;
//! let samples = (0..50).map(|i| Document::object([(format!("k{}", i % 5), Document::from("v"))]));
//! let fixtures = [Document::from_json(r#"{"zzz": "qqq"}"#)?];
//! let report = Calibration::new(10).run(&mut detector, samples, &fixtures)?;
//! assert_eq!(report.count, 40);
//! # Ok::<(), anomaly::AnomalyError>(())
//! ```

pub mod calibration;
pub mod detector;

pub use calibration::{
    accuracy, Calibration, CalibrationState, FixtureResult, TrialReport, FIXTURE_DIVERGENT,
    FIXTURE_SELF_SIMILAR,
};
pub use detector::{Detector, DetectorKind};
