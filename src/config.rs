// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Experiment configuration, loadable from a JSON file

use crate::datasets::Label;
use crate::error::{ClassifierError, Result};
use crate::extraction::SourceFormat;
use crate::features::FeatureConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A directory of documents sharing one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSource {
    pub path: PathBuf,
    pub label: Label,
    #[serde(default)]
    pub recursive: bool,
}

impl FromStr for CorpusSource {
    type Err = ClassifierError;

    /// Parse `PATH=LABEL`
    fn from_str(s: &str) -> Result<Self> {
        let (path, label) = s
            .rsplit_once('=')
            .ok_or_else(|| ClassifierError::configuration(format!("expected PATH=LABEL, got '{}'", s)))?;
        if path.is_empty() {
            return Err(ClassifierError::configuration(format!("missing corpus path in '{}'", s)));
        }
        Ok(Self {
            path: PathBuf::from(path),
            label: label.parse()?,
            recursive: false,
        })
    }
}

/// Configuration for one train/evaluate run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Labeled corpora to ingest
    pub corpora: Vec<CorpusSource>,
    /// Document format of every corpus
    pub format: SourceFormat,
    /// Fraction of documents assigned to training
    pub training_fraction: f64,
    pub features: FeatureConfig,
    /// Model used by single-model runs
    pub model: String,
    /// Materialize feature matrices before fitting and predicting
    pub dense: bool,
    /// Directory to classify after training
    pub classify_dir: Option<PathBuf>,
    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            corpora: Vec::new(),
            format: SourceFormat::Txt,
            training_fraction: 0.8,
            features: FeatureConfig::default(),
            model: "nb".to_string(),
            dense: false,
            classify_dir: None,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl ExperimentConfig {
    /// Read and validate a JSON experiment file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::info!("Loaded experiment configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.corpora.is_empty() {
            return Err(ClassifierError::configuration("at least one labeled corpus is required"));
        }
        if !(0.0..=1.0).contains(&self.training_fraction) {
            return Err(ClassifierError::configuration(format!(
                "training_fraction must be within [0, 1], got {}",
                self.training_fraction
            )));
        }
        self.features.validate()
    }
}
