// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Supervised feature selection by chi-squared dependency
//!
//! The ranked column list is computed once from the training matrix and then
//! applied unchanged to every other matrix: test set, single documents and
//! directory batches all go through [`FeatureSelection::apply`].

use super::matrix::SparseMatrix;
use crate::datasets::Label;
use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Chi-squared statistic between each feature column and the labels
///
/// Observed values are per-class column sums; expected values are the column
/// total split by class frequency. Columns with a zero total score 0.
pub fn chi2(features: &SparseMatrix, labels: &[Label]) -> Result<Vec<f64>> {
    if labels.len() != features.n_rows() {
        return Err(ClassifierError::DimensionMismatch {
            expected: features.n_rows(),
            found: labels.len(),
        });
    }
    if features.has_negative() {
        return Err(ClassifierError::configuration(
            "chi-squared feature selection requires non-negative features",
        ));
    }

    let classes: Vec<Label> = labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let n_rows = labels.len() as f64;
    let totals = features.column_sums();
    let mut scores = vec![0.0; features.n_cols()];

    for class in &classes {
        let class_rows: Vec<usize> = (0..labels.len()).filter(|i| labels[*i] == *class).collect();
        let class_prob = class_rows.len() as f64 / n_rows;

        let mut observed = vec![0.0; features.n_cols()];
        for &i in &class_rows {
            let (indices, values) = features.row(i);
            for (col, value) in indices.iter().zip(values.iter()) {
                observed[*col] += value;
            }
        }

        for (j, score) in scores.iter_mut().enumerate() {
            let expected = class_prob * totals[j];
            if expected > 0.0 {
                let diff = observed[j] - expected;
                *score += diff * diff / expected;
            }
        }
    }

    Ok(scores)
}

/// Ranked subset of feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// Score of every original column
    scores: Vec<f64>,
    /// Requested number of columns
    top_n: usize,
    /// Selected columns, best first
    selected: Vec<usize>,
}

impl FeatureSelection {
    /// Score the training matrix and keep the `top_n` best columns
    pub fn fit(features: &SparseMatrix, labels: &[Label], top_n: usize) -> Result<Self> {
        let scores = chi2(features, labels)?;
        Ok(Self::from_scores(scores, top_n))
    }

    /// Rank columns by descending score; equal scores keep ascending column order
    ///
    /// NaN scores rank last.
    pub fn from_scores(scores: Vec<f64>, top_n: usize) -> Self {
        let key = |i: usize| if scores[i].is_nan() { f64::NEG_INFINITY } else { scores[i] };
        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|a, b| key(*b).total_cmp(&key(*a)));
        ranked.truncate(top_n);
        Self {
            scores,
            top_n,
            selected: ranked,
        }
    }

    /// Restrict a matrix to the selected columns, in ranked order
    pub fn apply(&self, features: &SparseMatrix) -> Result<SparseMatrix> {
        if features.n_cols() != self.scores.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.scores.len(),
                found: features.n_cols(),
            });
        }
        features.select_columns(&self.selected)
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }
}
