//! Embedding type.
//!
//! An embedding is the elementwise sum of every projection column a document
//! contributes, so its entries are unbounded integers stored as i64.

/// An N-dimensional integer document embedding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embedding {
    data: Vec<i64>,
}

impl Embedding {
    /// Create a zero embedding of given dimensionality.
    pub fn zeros(dimensions: usize) -> Self {
        Self {
            data: vec![0; dimensions],
        }
    }

    /// Create an embedding from raw data.
    pub fn from_data(data: Vec<i64>) -> Self {
        Self { data }
    }

    /// Get the dimensionality.
    pub fn dimensions(&self) -> usize {
        self.data.len()
    }

    /// Get the raw data as a slice.
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [i64] {
        &mut self.data
    }

    /// Add a ternary projection column elementwise.
    pub fn add_column(&mut self, column: &[i8]) {
        debug_assert_eq!(column.len(), self.data.len());
        for (acc, &v) in self.data.iter_mut().zip(column) {
            *acc += v as i64;
        }
    }

    /// Compute the L2 norm.
    pub fn norm(&self) -> f64 {
        self.data
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Return a unit-normalized copy as f32.
    ///
    /// The zero embedding normalizes to the zero vector rather than NaNs.
    pub fn normalized(&self) -> Vec<f32> {
        let norm = self.norm();
        if norm < 1e-10 {
            return vec![0.0; self.dimensions()];
        }
        self.data.iter().map(|&v| (v as f64 / norm) as f32).collect()
    }

    /// Count non-zero elements.
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
