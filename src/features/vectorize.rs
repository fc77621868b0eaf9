// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Vectorizers turning analyzed text into sparse feature rows
//!
//! - [`CountVectorizer`]: learned vocabulary, raw term counts
//! - [`TfidfTransformer`]: smooth inverse-document-frequency reweighting
//! - [`HashingVectorizer`]: stateless signed feature hashing

use super::matrix::SparseMatrix;
use crate::error::{ClassifierError, Result};
use crate::text::Analyzer;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Bag-of-words vectorizer with a vocabulary learned at fit time
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    analyzer: Analyzer,
    max_df: f64,
    max_features: Option<usize>,
    /// Term to column index; columns follow alphabetical term order
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    pub fn new(analyzer: Analyzer, max_df: f64, max_features: Option<usize>) -> Self {
        Self {
            analyzer,
            max_df,
            max_features,
            vocabulary: BTreeMap::new(),
        }
    }

    /// Learn the vocabulary and return the training count matrix
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<SparseMatrix> {
        if documents.is_empty() {
            return Err(ClassifierError::empty_dataset("cannot fit a vocabulary on zero documents"));
        }

        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| self.analyzer.analyze(d.as_ref())).collect();

        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in terms {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        if term_freq.is_empty() {
            return Err(ClassifierError::empty_vocabulary(
                "documents contain only stop words or no tokens",
            ));
        }

        let max_doc_count = self.max_df * documents.len() as f64;
        let mut kept: Vec<(&str, usize)> = term_freq
            .into_iter()
            .filter(|(term, _)| doc_freq[term] as f64 <= max_doc_count)
            .collect();

        if kept.is_empty() {
            return Err(ClassifierError::empty_vocabulary(format!(
                "no terms remain after pruning with max_df={}",
                self.max_df
            )));
        }

        if let Some(limit) = self.max_features {
            // Most frequent terms first, ties broken alphabetically
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(limit);
        }

        let terms: Vec<String> = kept.into_iter().map(|(term, _)| term.to_string()).collect();
        let sorted: std::collections::BTreeSet<String> = terms.into_iter().collect();
        self.vocabulary = sorted.into_iter().enumerate().map(|(idx, term)| (term, idx)).collect();

        tracing::debug!("Learned vocabulary of {} terms from {} documents", self.vocabulary.len(), documents.len());

        let rows = analyzed.iter().map(|terms| self.count_row(terms)).collect();
        SparseMatrix::from_rows(self.vocabulary.len(), rows)
    }

    /// Count matrix over the learned vocabulary; unseen terms are ignored
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<SparseMatrix> {
        let rows = documents
            .iter()
            .map(|d| self.count_row(&self.analyzer.analyze(d.as_ref())))
            .collect();
        SparseMatrix::from_rows(self.vocabulary.len(), rows)
    }

    fn count_row(&self, terms: &[String]) -> Vec<(usize, f64)> {
        terms
            .iter()
            .filter_map(|t| self.vocabulary.get(t).map(|idx| (*idx, 1.0)))
            .collect()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Terms in column order
    pub fn feature_names(&self) -> Vec<&str> {
        // BTreeMap iteration order is the column order
        self.vocabulary.keys().map(|k| k.as_str()).collect()
    }
}

/// Inverse-document-frequency reweighting fitted on training counts
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, followed by L2 row normalization.
#[derive(Debug, Clone, Default)]
pub struct TfidfTransformer {
    idf: Vec<f64>,
}

impl TfidfTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, counts: &SparseMatrix) {
        let n = counts.n_rows() as f64;
        self.idf = counts
            .document_frequencies()
            .into_iter()
            .map(|df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
    }

    pub fn transform(&self, counts: &SparseMatrix) -> Result<SparseMatrix> {
        let mut weighted = counts.clone();
        weighted.scale_columns(&self.idf)?;
        weighted.normalize_rows_l2();
        Ok(weighted)
    }

    pub fn fit_transform(&mut self, counts: &SparseMatrix) -> Result<SparseMatrix> {
        self.fit(counts);
        self.transform(counts)
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

/// Stateless feature hashing into a fixed number of columns
///
/// Each term is hashed with CRC32; the low bits pick the column and the high
/// bit picks the sign, so colliding terms tend to cancel rather than pile up.
/// Rows are L2-normalized.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    analyzer: Analyzer,
    n_features: usize,
}

impl HashingVectorizer {
    pub fn new(analyzer: Analyzer, n_features: usize) -> Self {
        Self { analyzer, n_features }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn hash_term(&self, term: &str) -> (usize, f64) {
        let h = crc32fast::hash(term.as_bytes());
        let sign = if h & 0x8000_0000 == 0 { 1.0 } else { -1.0 };
        ((h & 0x7fff_ffff) as usize % self.n_features, sign)
    }

    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<SparseMatrix> {
        let rows = documents
            .iter()
            .map(|d| {
                self.analyzer
                    .analyze(d.as_ref())
                    .iter()
                    .map(|t| self.hash_term(t))
                    .collect()
            })
            .collect();
        let mut matrix = SparseMatrix::from_rows(self.n_features, rows)?;
        matrix.normalize_rows_l2();
        Ok(matrix)
    }
}
