// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Document classification pipeline
//!
//! Orchestrates:
//! - Labeled document ingestion and train/test partitioning
//! - Feature extraction fitted on the training subset only
//! - Classifier training and evaluation
//! - Inference on single files and whole directories
//!
//! The pipeline moves through [`PipelineStage::Empty`], then
//! [`PipelineStage::Extracted`] once features exist, then
//! [`PipelineStage::Trained`]. Re-running extraction drops the classifier,
//! whose feature space no longer exists.

use crate::datasets::{DatasetStore, Label};
use crate::error::{ClassifierError, Result};
use crate::extraction::{scan_files, FileTextExtractor, SourceFormat, TextExtractor};
use crate::features::{FeatureConfig, FeatureSelection, Features, FittedVectorizer, SparseMatrix};
use crate::metrics::TestResults;
use crate::models::Classifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Where the pipeline is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// No fitted feature space yet
    Empty,
    /// Vectorizer fitted and feature matrices computed
    Extracted,
    /// A classifier is trained on the current feature space
    Trained,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Empty => f.write_str("empty"),
            PipelineStage::Extracted => f.write_str("extracted"),
            PipelineStage::Trained => f.write_str("trained"),
        }
    }
}

/// Label assigned to one file of a classified directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePrediction {
    pub filename: String,
    pub label: Label,
}

/// Labeled corpus, fitted feature space and trained classifier
pub struct DocumentClassifier {
    store: DatasetStore,
    extractor: Box<dyn TextExtractor>,
    feature_config: Option<FeatureConfig>,
    vectorizer: Option<FittedVectorizer>,
    selection: Option<FeatureSelection>,
    classifier: Option<Box<dyn Classifier>>,
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentClassifier {
    /// Pipeline reading files from disk, with an entropy-seeded split
    pub fn new() -> Self {
        Self::from_store(DatasetStore::new())
    }

    /// Pipeline whose split is reproducible for `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self::from_store(DatasetStore::with_seed(seed))
    }

    fn from_store(store: DatasetStore) -> Self {
        Self {
            store,
            extractor: Box::new(FileTextExtractor::new()),
            feature_config: None,
            vectorizer: None,
            selection: None,
            classifier: None,
        }
    }

    /// Replace the text extractor used for ingestion and inference
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn stage(&self) -> PipelineStage {
        match (&self.vectorizer, &self.classifier) {
            (None, _) => PipelineStage::Empty,
            (Some(_), None) => PipelineStage::Extracted,
            (Some(_), Some(_)) => PipelineStage::Trained,
        }
    }

    /// Settings of the last successful extraction
    pub fn feature_config(&self) -> Option<&FeatureConfig> {
        self.feature_config.as_ref()
    }

    pub fn vectorizer(&self) -> Option<&FittedVectorizer> {
        self.vectorizer.as_ref()
    }

    pub fn selection(&self) -> Option<&FeatureSelection> {
        self.selection.as_ref()
    }

    /// Name of the trained classifier, if any
    pub fn classifier_name(&self) -> Option<&str> {
        self.classifier.as_ref().map(|c| c.name())
    }

    /// Number of columns classifiers see, after selection
    pub fn n_features(&self) -> Option<usize> {
        match (&self.selection, &self.vectorizer) {
            (Some(selection), _) => Some(selection.selected().len()),
            (None, Some(vectorizer)) => Some(vectorizer.n_features()),
            (None, None) => None,
        }
    }

    /// Ingest every document under `root` with the given label
    pub fn add_labeled_documents(
        &mut self,
        root: &Path,
        recursive: bool,
        format: SourceFormat,
        label: Label,
    ) -> Result<usize> {
        self.store
            .add_labeled_documents(self.extractor.as_ref(), root, recursive, format, label)
    }

    /// Partition the dataset; any fitted feature space is discarded
    pub fn split(&mut self, percentage_training: f64) -> Result<()> {
        self.store.split(percentage_training)?;
        if !self.store.dataset().is_empty() {
            self.reset_features();
        }
        Ok(())
    }

    fn reset_features(&mut self) {
        self.feature_config = None;
        self.vectorizer = None;
        self.selection = None;
        self.classifier = None;
    }

    /// Fit the vectorizer (and optional selection) on the training subset
    /// and compute training and test feature matrices
    ///
    /// On error the previous feature space is left untouched.
    pub fn extract_features(&mut self, config: &FeatureConfig) -> Result<()> {
        let training = self.store.training();
        if training.is_empty() {
            return Err(ClassifierError::empty_dataset(
                "training subset is empty; ingest documents and split first",
            ));
        }

        let (vectorizer, training_matrix) = FittedVectorizer::fit(config, &training.texts())?;
        let selection = match config.top_n_features {
            Some(top_n) => Some(FeatureSelection::fit(&training_matrix, &training.labels(), top_n)?),
            None => None,
        };

        let training_matrix = Self::select(selection.as_ref(), training_matrix)?;
        let test = self.store.test();
        let test_matrix = if test.is_empty() {
            None
        } else {
            Some(Self::select(selection.as_ref(), vectorizer.transform(&test.texts())?)?)
        };

        tracing::info!(
            "Extracted {} features ({}) from {} training documents",
            training_matrix.n_cols(),
            config.strategy,
            training_matrix.n_rows()
        );

        self.store.training_mut().set_features(Some(training_matrix))?;
        self.store.test_mut().set_features(test_matrix)?;
        self.feature_config = Some(config.clone());
        self.vectorizer = Some(vectorizer);
        self.selection = selection;
        self.classifier = None;
        Ok(())
    }

    fn select(selection: Option<&FeatureSelection>, matrix: SparseMatrix) -> Result<SparseMatrix> {
        match selection {
            Some(selection) => selection.apply(&matrix),
            None => Ok(matrix),
        }
    }

    /// Apply the stored selection, the single path used for every matrix
    /// built after extraction
    fn apply_selection(&self, matrix: SparseMatrix) -> Result<SparseMatrix> {
        Self::select(self.selection.as_ref(), matrix)
    }

    fn predict_matrix(classifier: &dyn Classifier, matrix: &SparseMatrix, dense: bool) -> Result<Vec<Label>> {
        if dense {
            classifier.predict(Features::Dense(&matrix.to_dense()))
        } else {
            classifier.predict(Features::Sparse(matrix))
        }
    }

    /// Fit `model` on the training features and keep it
    pub fn train(&mut self, mut model: Box<dyn Classifier>, use_dense_features: bool) -> Result<()> {
        let training = self.store.training();
        let features = training.features().ok_or(ClassifierError::NotVectorized)?;
        if training.is_empty() {
            return Err(ClassifierError::empty_dataset("training subset is empty"));
        }

        let labels = training.labels();
        if use_dense_features {
            model.fit(Features::Dense(&features.to_dense()), &labels)?;
        } else {
            model.fit(Features::Sparse(features), &labels)?;
        }

        tracing::info!("Trained {} on {} documents", model.name(), labels.len());
        self.classifier = Some(model);
        Ok(())
    }

    /// Score the trained classifier on the test subset, or on the training subset
    pub fn evaluate(&self, use_training_set: bool, use_dense_features: bool) -> Result<TestResults> {
        let classifier = self.classifier.as_deref().ok_or(ClassifierError::NotTrained)?;
        let (name, subset) = if use_training_set {
            ("training", self.store.training())
        } else {
            ("test", self.store.test())
        };
        if subset.is_empty() {
            return Err(ClassifierError::empty_dataset(format!("{} subset is empty", name)));
        }
        let features = subset.features().ok_or(ClassifierError::NotVectorized)?;

        let predictions = Self::predict_matrix(classifier, features, use_dense_features)?;
        let results = TestResults::from_predictions(&predictions, &subset.labels())?;
        tracing::info!(
            "Evaluated {} on {} {} documents: accuracy={:.4} precision={:.4} recall={:.4}",
            classifier.name(),
            subset.len(),
            name,
            results.accuracy,
            results.precision,
            results.recall
        );
        Ok(results)
    }

    fn fitted(&self) -> Result<(&FittedVectorizer, &dyn Classifier)> {
        let vectorizer = self.vectorizer.as_ref().ok_or(ClassifierError::NotVectorized)?;
        let classifier = self.classifier.as_deref().ok_or(ClassifierError::NotTrained)?;
        Ok((vectorizer, classifier))
    }

    /// Classify one file; `None` when it yields no text
    pub fn predict_file(&self, path: &Path, format: SourceFormat, use_dense_features: bool) -> Result<Option<Label>> {
        let (vectorizer, classifier) = self.fitted()?;
        let text = match self.extractor.extract(path, format) {
            Some(text) => text,
            None => {
                tracing::debug!("No text extracted from {}", path.display());
                return Ok(None);
            }
        };

        let matrix = self.apply_selection(vectorizer.transform(&[text])?)?;
        let predictions = Self::predict_matrix(classifier, &matrix, use_dense_features)?;
        Ok(predictions.first().copied())
    }

    /// Classify every file directly inside `root`, skipping those without text
    pub fn predict_directory(
        &self,
        root: &Path,
        format: SourceFormat,
        use_dense_features: bool,
    ) -> Result<Vec<FilePrediction>> {
        let (vectorizer, classifier) = self.fitted()?;

        let mut filenames = Vec::new();
        let mut texts = Vec::new();
        for path in scan_files(root, false)? {
            if let Some(text) = self.extractor.extract(&path, format) {
                filenames.push(path.file_name().map_or_else(
                    || path.to_string_lossy().into_owned(),
                    |name| name.to_string_lossy().into_owned(),
                ));
                texts.push(text);
            }
        }
        if texts.is_empty() {
            tracing::warn!("No documents with text found in {}", root.display());
            return Ok(Vec::new());
        }

        let matrix = self.apply_selection(vectorizer.transform(&texts)?)?;
        let labels = Self::predict_matrix(classifier, &matrix, use_dense_features)?;
        tracing::info!("Classified {} documents from {}", labels.len(), root.display());

        Ok(filenames
            .into_iter()
            .zip(labels)
            .map(|(filename, label)| FilePrediction { filename, label })
            .collect())
    }
}
