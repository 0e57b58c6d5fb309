//! Random training documents shared by the integration tests and benches.
//!
//! Documents are small trees of single-letter keys. Letters near `a` are
//! far more likely than letters near `z`, object widths and array lengths
//! are usually 1 or 2, and nesting depth is usually shallow.

#![allow(dead_code)]

use anomaly::Document;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Seeded stream of random documents.
pub struct DocumentGenerator {
    rng: ChaCha8Rng,
}

impl DocumentGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// `floor(|N(0, 1)| * stddev)`.
    fn sample(&mut self, stddev: f64) -> usize {
        let n: f64 = self.rng.sample(StandardNormal);
        (n.abs() * stddev) as usize
    }

    fn sample_count(&mut self) -> usize {
        self.sample(1.0) + 1
    }

    fn sample_name(&mut self) -> String {
        let offset = self.sample(8.0).min(25) as u8;
        char::from(b'a' + offset).to_string()
    }

    fn sample_value(&mut self) -> String {
        self.sample_name().repeat(2)
    }

    fn sample_depth(&mut self) -> usize {
        self.sample(3.0)
    }

    /// Generate one document.
    pub fn generate(&mut self) -> Document {
        let mut pairs = Vec::new();
        self.fill(&mut pairs, 0);
        Document::Object(pairs)
    }

    fn fill(&mut self, pairs: &mut Vec<(String, Document)>, depth: usize) {
        let count = self.sample_count();
        if depth > self.sample_depth() {
            for _ in 0..count {
                let key = self.sample_name();
                let value = Document::String(self.sample_value());
                insert(pairs, key, value);
            }
            return;
        }
        for _ in 0..count {
            let len = self.sample_count();
            let items = (0..len)
                .map(|_| {
                    let mut sub = Vec::new();
                    self.fill(&mut sub, depth + 1);
                    Document::Object(sub)
                })
                .collect();
            let key = self.sample_name();
            insert(pairs, key, Document::Array(items));
        }
    }
}

impl Iterator for DocumentGenerator {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        Some(self.generate())
    }
}

/// Later writes to a key replace earlier ones, as in a JSON object.
fn insert(pairs: &mut Vec<(String, Document)>, key: String, value: Document) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => pairs.push((key, value)),
    }
}
