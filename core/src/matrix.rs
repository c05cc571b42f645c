//! Sparse document × term weight matrix.
//!
//! Cells are collected in triplet form while indexing and compressed to CSR
//! once, so queries multiply against a row-major layout.

use crate::document::{RowId, TermId};
use sprs::{CsMat, CsVec, TriMat};

/// Triplet accumulator for a matrix of fixed shape.
pub struct MatrixBuilder {
    triplets: TriMat<f64>,
}

impl MatrixBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { triplets: TriMat::new((rows, cols)) }
    }

    pub fn with_capacity(rows: usize, cols: usize, nnz: usize) -> Self {
        Self { triplets: TriMat::with_capacity((rows, cols), nnz) }
    }

    /// Adds a cell. Callers never add the same cell twice.
    pub fn set(&mut self, row: RowId, col: TermId, value: f64) {
        self.triplets.add_triplet(row, col, value);
    }

    pub fn build(self) -> WeightMatrix {
        WeightMatrix { csr: self.triplets.to_csr() }
    }
}

/// Immutable once built; safe to share between reader threads.
#[derive(Debug, Clone)]
pub struct WeightMatrix {
    csr: CsMat<f64>,
}

impl WeightMatrix {
    pub fn rows(&self) -> usize { self.csr.rows() }

    pub fn cols(&self) -> usize { self.csr.cols() }

    pub fn shape(&self) -> (usize, usize) { (self.rows(), self.cols()) }

    pub fn nnz(&self) -> usize { self.csr.nnz() }

    /// Cell value; absent cells are 0.
    pub fn get(&self, row: RowId, col: TermId) -> f64 {
        self.csr.get(row, col).copied().unwrap_or(0.0)
    }

    /// Stored cells in row-major order as (row, col, value).
    pub fn triplets(&self) -> impl Iterator<Item = (RowId, TermId, f64)> + '_ {
        self.csr.iter().map(|(&v, (r, c))| (r, c, v))
    }

    /// Sparse product `self × query`; one entry per row with a nonzero dot product.
    pub fn mul_vec(&self, query: &CsVec<f64>) -> CsVec<f64> {
        &self.csr * query
    }
}
