// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Document classification for scientific literature corpora
//!
//! This crate provides:
//! - Text extraction from PDF, compressed CAS and plain text files
//! - Labeled dataset ingestion with seeded train/test partitioning
//! - Bag-of-words, tf-idf and hashed features with chi-squared selection
//! - A pluggable classifier seam with reference models
//! - Evaluation metrics (precision, recall, accuracy, ROC curve)
//! - Experiment runners with JSON and Markdown reports

pub mod cli;
pub mod config;
pub mod datasets;
pub mod error;
pub mod extraction;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod text;

pub use config::{CorpusSource, ExperimentConfig};
pub use datasets::{DatasetCollection, DatasetStore, DocumentRecord, Label};
pub use error::{ClassifierError, Result};
pub use extraction::{FileTextExtractor, SourceFormat, TextExtractor};
pub use features::{FeatureConfig, FeatureSelection, FittedVectorizer, VectorizerStrategy};
pub use metrics::{ClassificationReport, ConfusionMatrix, RocCurve, TestResults};
pub use models::{all_models, model_by_name, Classifier};
pub use pipeline::{DocumentClassifier, FilePrediction, PipelineStage};
pub use report::{compare_models, run_experiment, RunReport};
