// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Labeled document collections and train/test partitioning

use crate::error::{ClassifierError, Result};
use crate::extraction::{scan_files, SourceFormat, TextExtractor};
use crate::features::SparseMatrix;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Integer class id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub i64);

impl Label {
    /// Class treated as positive by binary metrics
    pub const POSITIVE: Label = Label(1);
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label(value)
    }
}

impl FromStr for Label {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Label)
            .map_err(|_| ClassifierError::configuration(format!("invalid label '{}'", s)))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A single labeled document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Extracted text
    pub text: String,
    /// Path relative to the directory it was ingested from
    pub filename: String,
    pub label: Label,
}

/// Ordered documents plus the feature matrix computed for them
#[derive(Debug, Clone, Default)]
pub struct DatasetCollection {
    documents: Vec<DocumentRecord>,
    features: Option<SparseMatrix>,
}

impl DatasetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<DocumentRecord>) -> Self {
        Self {
            documents,
            features: None,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn push(&mut self, record: DocumentRecord) {
        self.documents.push(record);
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.filename.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.documents.iter().map(|d| d.label).collect()
    }

    /// Feature matrix, one row per document, once extraction has run
    pub fn features(&self) -> Option<&SparseMatrix> {
        self.features.as_ref()
    }

    /// Replace the feature matrix; its row count must match the documents
    pub fn set_features(&mut self, features: Option<SparseMatrix>) -> Result<()> {
        if let Some(ref m) = features {
            if m.n_rows() != self.documents.len() {
                return Err(ClassifierError::DimensionMismatch {
                    expected: self.documents.len(),
                    found: m.n_rows(),
                });
            }
        }
        self.features = features;
        Ok(())
    }

    /// Number of documents per label
    pub fn label_distribution(&self) -> BTreeMap<Label, usize> {
        let mut dist = BTreeMap::new();
        for doc in &self.documents {
            *dist.entry(doc.label).or_insert(0) += 1;
        }
        dist
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self::from_documents(indices.iter().map(|&i| self.documents[i].clone()).collect())
    }
}

/// Full dataset and the training/test subsets derived from it
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dataset: DatasetCollection,
    training: DatasetCollection,
    test: DatasetCollection,
    rng: ChaCha8Rng,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStore {
    /// Store whose splits are seeded from system entropy
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Store whose splits are reproducible for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            dataset: DatasetCollection::new(),
            training: DatasetCollection::new(),
            test: DatasetCollection::new(),
            rng,
        }
    }

    pub fn dataset(&self) -> &DatasetCollection {
        &self.dataset
    }

    pub fn training(&self) -> &DatasetCollection {
        &self.training
    }

    pub fn test(&self) -> &DatasetCollection {
        &self.test
    }

    pub(crate) fn training_mut(&mut self) -> &mut DatasetCollection {
        &mut self.training
    }

    pub(crate) fn test_mut(&mut self) -> &mut DatasetCollection {
        &mut self.test
    }

    /// Append one document to the full dataset
    pub fn add_document(&mut self, record: DocumentRecord) {
        self.dataset.push(record);
    }

    /// Extract every document under `root` and add it with `label`
    ///
    /// Files that yield no text are skipped. Entries are visited in file-name
    /// order, which callers should not rely on. Returns the number added.
    pub fn add_labeled_documents(
        &mut self,
        extractor: &dyn TextExtractor,
        root: &Path,
        recursive: bool,
        format: SourceFormat,
        label: Label,
    ) -> Result<usize> {
        let before = self.dataset.len();
        for path in scan_files(root, recursive)? {
            match extractor.extract(&path, format) {
                Some(text) => {
                    let filename = path
                        .strip_prefix(root)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    self.dataset.push(DocumentRecord { text, filename, label });
                }
                None => tracing::debug!("No text extracted from {}", path.display()),
            }
        }

        let added = self.dataset.len() - before;
        tracing::info!(
            "Added {} documents with label {} from {} ({} total)",
            added,
            label,
            root.display(),
            self.dataset.len()
        );
        Ok(added)
    }

    /// Randomly partition the full dataset into training and test subsets
    ///
    /// The first `floor(n * percentage_training)` shuffled documents go to
    /// training. 0 and 1 are accepted and leave one subset empty. An empty
    /// dataset leaves both subsets untouched.
    pub fn split(&mut self, percentage_training: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&percentage_training) {
            return Err(ClassifierError::configuration(format!(
                "percentage_training must be within [0, 1], got {}",
                percentage_training
            )));
        }
        if self.dataset.is_empty() {
            tracing::warn!("Dataset is empty, nothing to split");
            return Ok(());
        }

        let n = self.dataset.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut self.rng);

        let n_training = ((n as f64 * percentage_training).floor() as usize).min(n);
        self.training = self.dataset.select(&order[..n_training]);
        self.test = self.dataset.select(&order[n_training..]);

        tracing::info!(
            "Split {} documents into {} training and {} test",
            n,
            self.training.len(),
            self.test.len()
        );
        Ok(())
    }
}
