//! End-to-end calibration trials over generated document streams.

mod common;

use anomaly::{
    accuracy, Calibration, Config, Detector, DetectorKind, Document, TrialReport, Vectorizer,
    FIXTURE_DIVERGENT, FIXTURE_SELF_SIMILAR,
};
use common::DocumentGenerator;

const SAMPLES: usize = 1000;
const CUTOFF: usize = 100;

fn fixtures() -> [Document; 2] {
    [
        Document::from_json(FIXTURE_DIVERGENT).unwrap(),
        Document::from_json(FIXTURE_SELF_SIMILAR).unwrap(),
    ]
}

fn config() -> Config {
    Config {
        dimensions: 512,
        samples: SAMPLES,
        cutoff: CUTOFF,
        ..Config::default()
    }
}

fn trial(config: &Config, kind: DetectorKind, vectorizer: Vectorizer, seed: u64) -> TrialReport {
    let mut detector = Detector::with_vectorizer(config, kind, vectorizer).unwrap();
    Calibration::from_config(config)
        .run(
            &mut detector,
            DocumentGenerator::new(seed).take(config.samples),
            &fixtures(),
        )
        .unwrap()
}

#[test]
fn test_generator_is_deterministic() {
    let a: Vec<Document> = DocumentGenerator::new(7).take(20).collect();
    let b: Vec<Document> = DocumentGenerator::new(7).take(20).collect();
    assert_eq!(a, b);
    for doc in &a {
        assert!(doc.leaf_count() >= 1);
    }
}

/// Run one trial per seed concurrently, every trial sharing one vectorizer.
fn trials(config: &Config, kind: DetectorKind, seeds: std::ops::RangeInclusive<u64>) -> Vec<TrialReport> {
    let vectorizer = Vectorizer::from_config(config).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = seeds
            .map(|seed| {
                let vectorizer = vectorizer.clone();
                scope.spawn(move || trial(config, kind, vectorizer, seed))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn test_every_kind_ranks_divergent_fixture_higher() {
    let config = config();
    for kind in DetectorKind::ALL {
        let reports = trials(&config, kind, 1..=4);
        for report in &reports {
            assert_eq!(report.count, SAMPLES - CUTOFF);
            assert!(report.stddev > 0.0, "{:?}", kind);
            for result in &report.results {
                assert!(result.raw.is_finite(), "{:?}", kind);
                assert!(result.uncertainty >= 0.0, "{:?}", kind);
                assert!(result.z.map_or(false, f64::is_finite), "{:?}", kind);
            }
        }
        let hit_rate = accuracy(&reports, 0, 1);
        assert!(hit_rate > 0.5, "{:?}: accuracy {}", kind, hit_rate);
    }
}

#[test]
fn test_similarity_divergent_fixture_scores_below_mean() {
    let config = config();
    let reports = trials(&config, DetectorKind::Similarity, 5..=6);
    for report in &reports {
        let divergent = report.results[0];
        // Unseen tokens leave only projection noise in common with the window.
        assert!(
            divergent.raw < report.mean,
            "divergent raw {} vs mean {}",
            divergent.raw,
            report.mean
        );
    }
}

#[test]
fn test_complexity_divergent_fixture_costs_more_bits() {
    let config = config();
    for kind in [DetectorKind::Complexity, DetectorKind::Ensemble] {
        let report = &trials(&config, kind, 3..=3)[0];
        assert!(report.mean > 0.0 && report.mean < 8.5, "{:?} mean {}", kind, report.mean);
        assert!(
            report.results[0].raw > report.mean,
            "{:?}: divergent raw {} vs mean {}",
            kind,
            report.results[0].raw,
            report.mean
        );
    }
}

#[test]
fn test_trials_are_reproducible() {
    let config = Config {
        samples: 200,
        cutoff: 20,
        ..config()
    };
    let a = trial(&config, DetectorKind::Similarity, Vectorizer::from_config(&config).unwrap(), 11);
    let b = trial(&config, DetectorKind::Similarity, Vectorizer::from_config(&config).unwrap(), 11);
    assert_eq!(a, b);
}
