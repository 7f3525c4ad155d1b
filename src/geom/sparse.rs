//! Compressed sparse column matrix for connectivity graphs.
//!
//! Built from coordinate triplets through `nalgebra_sparse`. Duplicate
//! coordinates are summed and entries that cancel to zero are dropped, so
//! `nnz` only counts stored non-zero values.

use nalgebra_sparse::{CooMatrix, CscMatrix, SparseEntry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SparseError {
    #[error("entry ({row}, {col}) is outside a {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("triplet arrays differ in length (rows {rows}, cols {cols}, data {data})")]
    LengthMismatch { rows: usize, cols: usize, data: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseMatrix {
    inner: CscMatrix<i32>,
}

impl SparseMatrix {
    /// An all-zero matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            inner: CscMatrix::zeros(rows, cols),
        }
    }

    /// Assembles a matrix from parallel `(row, col, data)` arrays.
    pub fn from_coo(
        shape: (usize, usize),
        row: &[usize],
        col: &[usize],
        data: &[i32],
    ) -> Result<Self, SparseError> {
        if row.len() != col.len() || row.len() != data.len() {
            return Err(SparseError::LengthMismatch {
                rows: row.len(),
                cols: col.len(),
                data: data.len(),
            });
        }
        let triplets: Vec<(usize, usize, i32)> = row
            .iter()
            .zip(col)
            .zip(data)
            .map(|((&r, &c), &d)| (r, c, d))
            .collect();
        Self::from_triplets(shape, triplets)
    }

    /// Assembles a matrix from `(row, col, value)` triplets.
    pub fn from_triplets(
        (rows, cols): (usize, usize),
        triplets: Vec<(usize, usize, i32)>,
    ) -> Result<Self, SparseError> {
        // `CooMatrix::push` panics on out-of-range entries.
        if let Some(&(row, col, _)) = triplets.iter().find(|(r, c, _)| *r >= rows || *c >= cols) {
            return Err(SparseError::IndexOutOfBounds { row, col, rows, cols });
        }

        let mut coo = CooMatrix::new(rows, cols);
        for (r, c, v) in triplets {
            coo.push(r, c, v);
        }
        let summed = CscMatrix::from(&coo);
        Ok(Self {
            inner: summed.filter(|_, _, &v| v != 0),
        })
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.inner.nrows(), self.inner.ncols())
    }

    /// Number of stored non-zero entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    /// Value at `(row, col)`; zero when nothing is stored or out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        match self.inner.get_entry(row, col) {
            Some(SparseEntry::NonZero(&value)) => value,
            _ => 0,
        }
    }

    /// Stored `(row, value)` pairs of one column, rows ascending.
    pub fn column(&self, col: usize) -> impl Iterator<Item = (usize, i32)> + '_ {
        let offsets = self.inner.col_offsets();
        let range = if col < self.inner.ncols() {
            offsets[col]..offsets[col + 1]
        } else {
            0..0
        };
        self.inner.row_indices()[range.clone()]
            .iter()
            .copied()
            .zip(self.inner.values()[range].iter().copied())
    }

    /// All stored entries as `(row, col, value)`, column-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        self.inner.triplet_iter().map(|(r, c, &v)| (r, c, v))
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose(),
        }
    }

    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let (rows, cols) = self.shape();
        rows == cols && *self == self.transpose()
    }

    /// Expands into a dense row-major table.
    #[must_use]
    pub fn to_dense(&self) -> Vec<Vec<i32>> {
        let (rows, cols) = self.shape();
        let mut dense = vec![vec![0; cols]; rows];
        for (r, c, v) in self.iter() {
            dense[r][c] = v;
        }
        dense
    }

    /// The underlying `nalgebra_sparse` matrix.
    #[must_use]
    pub const fn as_csc(&self) -> &CscMatrix<i32> {
        &self.inner
    }
}
