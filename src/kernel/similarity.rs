//! Similarity metrics for normalized embeddings.
//!
//! When compiled with the `simd` feature, dot products use SIMD-accelerated
//! implementations from `simsimd`.

/// Similarity computation over f32 vectors.
pub struct Similarity;

impl Similarity {
    /// Cosine similarity: dot(a, b) / sqrt(sum(a_i^2) * sum(b_i^2))
    ///
    /// Returns a value in [-1, 1]. Inputs need not be normalized. If either
    /// vector has zero length the similarity is 0.
    pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
        let dot_ab = Self::dot(a, b);
        let dot_aa = Self::dot(a, a);
        let dot_bb = Self::dot(b, b);

        let norm_product = (dot_aa * dot_bb).sqrt();
        if norm_product < 1e-10 {
            return 0.0;
        }

        dot_ab / norm_product
    }

    /// Raw dot product, accumulated in f64.
    #[cfg(feature = "simd")]
    pub fn dot(a: &[f32], b: &[f32]) -> f64 {
        use simsimd::SpatialSimilarity;
        assert_eq!(a.len(), b.len(), "Dimension mismatch in dot product");
        f32::dot(a, b).unwrap_or(0.0)
    }

    #[cfg(not(feature = "simd"))]
    pub fn dot(a: &[f32], b: &[f32]) -> f64 {
        assert_eq!(a.len(), b.len(), "Dimension mismatch in dot product");
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x as f64) * (y as f64))
            .sum()
    }
}
