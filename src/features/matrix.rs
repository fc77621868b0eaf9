// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Feature matrices
//!
//! Vectorizers produce [`SparseMatrix`] values in compressed-row form. Models
//! that need every value materialized receive a [`DenseMatrix`] instead; both
//! are handed to models through the borrowed [`Features`] view.

use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};

/// Compressed sparse row matrix of `f64` values
///
/// Rows hold only non-zero entries, with column indices ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Empty matrix with no rows
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from rows of `(column, value)` pairs in any order
    ///
    /// Duplicate columns within a row are summed and zeros are dropped.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f64)>>) -> Result<Self> {
        let mut matrix = Self::new(n_cols);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Append one row of `(column, value)` pairs
    pub fn push_row(&mut self, mut entries: Vec<(usize, f64)>) -> Result<()> {
        entries.sort_by_key(|(col, _)| *col);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (col, value) in entries {
            if col >= self.n_cols {
                return Err(ClassifierError::DimensionMismatch {
                    expected: self.n_cols,
                    found: col + 1,
                });
            }
            match merged.last_mut() {
                Some((last, acc)) if *last == col => *acc += value,
                _ => merged.push((col, value)),
            }
        }
        for (col, value) in merged {
            if value != 0.0 {
                self.indices.push(col);
                self.data.push(value);
            }
        }
        self.indptr.push(self.indices.len());
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and values of one row
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        (&self.indices[start..end], &self.data[start..end])
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (indices, data) = self.row(i);
        match indices.binary_search(&j) {
            Ok(pos) => data[pos],
            Err(_) => 0.0,
        }
    }

    /// Whether any stored value is negative
    pub fn has_negative(&self) -> bool {
        self.data.iter().any(|v| *v < 0.0)
    }

    /// Sum of each column
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_cols];
        for (col, value) in self.indices.iter().zip(self.data.iter()) {
            sums[*col] += value;
        }
        sums
    }

    /// Number of rows with a stored entry in each column
    pub fn document_frequencies(&self) -> Vec<usize> {
        let mut df = vec![0; self.n_cols];
        for col in &self.indices {
            df[*col] += 1;
        }
        df
    }

    /// Multiply every column by its weight
    pub fn scale_columns(&mut self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.n_cols {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.n_cols,
                found: weights.len(),
            });
        }
        for (col, value) in self.indices.iter().zip(self.data.iter_mut()) {
            *value *= weights[*col];
        }
        Ok(())
    }

    /// Scale each row to unit Euclidean length; all-zero rows are left alone
    pub fn normalize_rows_l2(&mut self) {
        for i in 0..self.n_rows() {
            let (start, end) = (self.indptr[i], self.indptr[i + 1]);
            let norm = self.data[start..end].iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for value in &mut self.data[start..end] {
                    *value /= norm;
                }
            }
        }
    }

    /// New matrix whose column `k` is column `columns[k]` of this one
    ///
    /// Column order follows `columns`, not ascending index order.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Self> {
        let mut mapping: Vec<Option<usize>> = vec![None; self.n_cols];
        for (new_col, &old_col) in columns.iter().enumerate() {
            if old_col >= self.n_cols {
                return Err(ClassifierError::DimensionMismatch {
                    expected: self.n_cols,
                    found: old_col + 1,
                });
            }
            mapping[old_col] = Some(new_col);
        }

        let mut selected = Self::new(columns.len());
        for i in 0..self.n_rows() {
            let (indices, data) = self.row(i);
            let entries = indices
                .iter()
                .zip(data.iter())
                .filter_map(|(col, value)| mapping[*col].map(|new_col| (new_col, *value)))
                .collect();
            selected.push_row(entries)?;
        }
        Ok(selected)
    }

    /// Materialize every value
    pub fn to_dense(&self) -> DenseMatrix {
        let mut data = vec![0.0; self.n_rows() * self.n_cols];
        for i in 0..self.n_rows() {
            let (indices, values) = self.row(i);
            for (col, value) in indices.iter().zip(values.iter()) {
                data[i * self.n_cols + col] = *value;
            }
        }
        DenseMatrix {
            n_rows: self.n_rows(),
            n_cols: self.n_cols,
            data,
        }
    }
}

/// Row-major dense matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn from_vec(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(ClassifierError::DimensionMismatch {
                expected: n_rows * n_cols,
                found: data.len(),
            });
        }
        Ok(Self { n_rows, n_cols, data })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n_cols + j]
    }
}

/// Borrowed feature matrix handed to a model
#[derive(Debug, Clone, Copy)]
pub enum Features<'a> {
    Sparse(&'a SparseMatrix),
    Dense(&'a DenseMatrix),
}

impl<'a> Features<'a> {
    pub fn n_rows(&self) -> usize {
        match self {
            Features::Sparse(m) => m.n_rows(),
            Features::Dense(m) => m.n_rows(),
        }
    }

    pub fn n_cols(&self) -> usize {
        match self {
            Features::Sparse(m) => m.n_cols(),
            Features::Dense(m) => m.n_cols(),
        }
    }

    /// Non-zero `(column, value)` pairs of one row
    pub fn row_entries(&self, i: usize) -> Vec<(usize, f64)> {
        match self {
            Features::Sparse(m) => {
                let (indices, data) = m.row(i);
                indices.iter().copied().zip(data.iter().copied()).collect()
            }
            Features::Dense(m) => m
                .row(i)
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(j, v)| (j, *v))
                .collect(),
        }
    }

    pub fn has_negative(&self) -> bool {
        match self {
            Features::Sparse(m) => m.has_negative(),
            Features::Dense(m) => m.data.iter().any(|v| *v < 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseMatrix {
        SparseMatrix::from_rows(
            3,
            vec![vec![(2, 1.0), (0, 2.0)], vec![], vec![(1, 3.0), (1, 1.0), (2, 0.0)]],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_sorts_and_merges() {
        let m = sample();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row(0), (&[0usize, 2][..], &[2.0, 1.0][..]));
        assert_eq!(m.get(2, 1), 4.0);
        assert_eq!(m.get(2, 2), 0.0);
        assert_eq!(m.get(1, 0), 0.0);
    }

    #[test]
    fn test_out_of_range_column() {
        let err = SparseMatrix::from_rows(2, vec![vec![(5, 1.0)]]).unwrap_err();
        assert!(matches!(err, ClassifierError::DimensionMismatch { expected: 2, found: 6 }));
    }

    #[test]
    fn test_select_columns_keeps_given_order() {
        let m = sample();
        let selected = m.select_columns(&[2, 0]).unwrap();
        assert_eq!(selected.n_cols(), 2);
        assert_eq!(selected.get(0, 0), 1.0);
        assert_eq!(selected.get(0, 1), 2.0);
        assert_eq!(selected.get(2, 0), 0.0);
        assert_eq!(selected.nnz(), 2);
    }

    #[test]
    fn test_normalize_rows() {
        let mut m = SparseMatrix::from_rows(2, vec![vec![(0, 3.0), (1, 4.0)], vec![]]).unwrap();
        m.normalize_rows_l2();
        assert!((m.get(0, 0) - 0.6).abs() < 1e-12);
        assert!((m.get(0, 1) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_column_statistics() {
        let m = sample();
        assert_eq!(m.column_sums(), vec![2.0, 4.0, 1.0]);
        assert_eq!(m.document_frequencies(), vec![1, 1, 1]);
    }

    #[test]
    fn test_to_dense() {
        let dense = sample().to_dense();
        assert_eq!(dense.row(0), &[2.0, 0.0, 1.0]);
        assert_eq!(dense.row(1), &[0.0, 0.0, 0.0]);
        assert_eq!(dense.row(2), &[0.0, 4.0, 0.0]);

        let view = Features::Dense(&dense);
        assert_eq!(view.row_entries(2), vec![(1, 4.0)]);
    }

    #[test]
    fn test_dense_from_vec() {
        let built = DenseMatrix::from_vec(3, 3, vec![2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 4.0, 0.0]).unwrap();
        assert_eq!(built, sample().to_dense());
        assert_eq!(built.get(2, 1), 4.0);

        assert!(matches!(
            DenseMatrix::from_vec(2, 2, vec![1.0; 3]),
            Err(ClassifierError::DimensionMismatch { expected: 4, found: 3 })
        ));
    }
}
