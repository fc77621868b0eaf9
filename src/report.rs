// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Experiment runners and their JSON / Markdown reports

use crate::config::ExperimentConfig;
use crate::datasets::{DatasetCollection, Label};
use crate::error::Result;
use crate::metrics::TestResults;
use crate::models::{all_models, model_by_name, Classifier};
use crate::pipeline::{DocumentClassifier, FilePrediction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub total_documents: usize,
    pub training_documents: usize,
    pub test_documents: usize,
    pub label_distribution: BTreeMap<Label, usize>,
}

impl DatasetInfo {
    fn from_classifier(classifier: &DocumentClassifier) -> Self {
        let store = classifier.store();
        Self {
            total_documents: store.dataset().len(),
            training_documents: store.training().len(),
            test_documents: store.test().len(),
            label_distribution: store.dataset().label_distribution(),
        }
    }
}

/// Results from a single model evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub model_name: String,
    pub model_description: String,
    pub training: TestResults,
    /// Absent when every document went to training
    pub test: Option<TestResults>,
}

/// Complete results of one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub config: ExperimentConfig,
    pub dataset_info: DatasetInfo,
    pub n_features: usize,
    pub model_results: Vec<ModelResult>,
    pub predictions: Vec<FilePrediction>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Ingest, split and extract features as configured
pub fn prepare(config: &ExperimentConfig) -> Result<DocumentClassifier> {
    config.validate()?;
    let mut classifier = DocumentClassifier::with_seed(config.seed);
    for corpus in &config.corpora {
        classifier.add_labeled_documents(&corpus.path, corpus.recursive, config.format, corpus.label)?;
    }
    classifier.split(config.training_fraction)?;
    classifier.extract_features(&config.features)?;
    Ok(classifier)
}

fn train_and_score(
    classifier: &mut DocumentClassifier,
    model: Box<dyn Classifier>,
    dense: bool,
) -> Result<ModelResult> {
    let model_name = model.name().to_string();
    let model_description = model.description().to_string();
    classifier.train(model, dense)?;

    let training = classifier.evaluate(true, dense)?;
    let test = if classifier.store().test().is_empty() {
        tracing::warn!("Test subset is empty, {} is only scored on training data", model_name);
        None
    } else {
        Some(classifier.evaluate(false, dense)?)
    };

    Ok(ModelResult {
        model_name,
        model_description,
        training,
        test,
    })
}

fn build_report(
    config: &ExperimentConfig,
    classifier: &DocumentClassifier,
    model_results: Vec<ModelResult>,
    predictions: Vec<FilePrediction>,
) -> RunReport {
    RunReport {
        config: config.clone(),
        dataset_info: DatasetInfo::from_classifier(classifier),
        n_features: classifier.n_features().unwrap_or(0),
        model_results,
        predictions,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Train the configured model, evaluate it and classify `classify_dir` if set
pub fn run_experiment(config: &ExperimentConfig) -> Result<RunReport> {
    let mut classifier = prepare(config)?;
    let model = model_by_name(&config.model, config.seed)?;
    let result = train_and_score(&mut classifier, model, config.dense)?;

    let predictions = match &config.classify_dir {
        Some(dir) => classifier.predict_directory(dir, config.format, config.dense)?,
        None => Vec::new(),
    };

    Ok(build_report(config, &classifier, vec![result], predictions))
}

/// Evaluate every reference model on the same feature space
pub fn compare_models(config: &ExperimentConfig) -> Result<RunReport> {
    let mut classifier = prepare(config)?;
    let mut results = Vec::new();
    for model in all_models(config.seed) {
        let name = model.name().to_string();
        match train_and_score(&mut classifier, model, config.dense) {
            Ok(result) => results.push(result),
            Err(e) => tracing::warn!("Skipping {}: {}", name, e),
        }
    }
    Ok(build_report(config, &classifier, results, Vec::new()))
}

impl RunReport {
    /// Save results to JSON file
    pub fn save_json(&self, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_path, json)?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Model with the best test accuracy, falling back to training accuracy
    pub fn best_model(&self) -> Option<&ModelResult> {
        let score = |r: &ModelResult| r.test.as_ref().unwrap_or(&r.training).accuracy;
        self.model_results
            .iter()
            .max_by(|a, b| score(*a).total_cmp(&score(*b)))
    }

    /// Generate a markdown report
    pub fn to_markdown(&self) -> String {
        let mut report = String::new();

        report.push_str("# Document Classification Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", self.version));

        report.push_str("## Dataset\n\n");
        report.push_str(&format!("- **Total Documents:** {}\n", self.dataset_info.total_documents));
        report.push_str(&format!(
            "- **Split Sizes:** Train={}, Test={}\n",
            self.dataset_info.training_documents, self.dataset_info.test_documents
        ));
        for (label, count) in &self.dataset_info.label_distribution {
            report.push_str(&format!("- **Label {}:** {} documents\n", label, count));
        }
        report.push_str(&format!(
            "- **Features:** {} ({})\n\n",
            self.n_features, self.config.features.strategy
        ));

        report.push_str("## Summary\n\n");
        if let Some(best) = self.best_model() {
            report.push_str(&format!("**Best Model:** {}\n\n", best.model_name));
        }
        report.push_str("| Model | Accuracy | Precision | Recall | F1 Score | ROC AUC |\n");
        report.push_str("|-------|----------|-----------|--------|----------|---------|\n");
        for result in &self.model_results {
            let scored = result.test.as_ref().unwrap_or(&result.training);
            report.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |\n",
                result.model_name,
                scored.accuracy,
                scored.precision,
                scored.recall,
                scored.report.f1_score,
                scored.roc.auc()
            ));
        }

        report.push_str("\n## Detailed Results\n\n");
        for result in &self.model_results {
            report.push_str(&format!("### {}\n\n", result.model_name));
            report.push_str(&format!("*{}*\n\n", result.model_description));
            if let Some(ref test) = result.test {
                report.push_str("#### Test Set\n\n");
                report.push_str(&format!("```\n{}\n```\n\n", test.format()));
            }
            report.push_str("#### Training Set\n\n");
            report.push_str(&format!("```\n{}\n```\n\n", result.training.format()));
        }

        if !self.predictions.is_empty() {
            report.push_str("## Predictions\n\n");
            report.push_str("| File | Label |\n");
            report.push_str("|------|-------|\n");
            for prediction in &self.predictions {
                report.push_str(&format!("| {} | {} |\n", prediction.filename, prediction.label));
            }
            report.push('\n');
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&self.config).unwrap_or_default()
        ));

        report
    }
}

/// Label distribution of a subset, as printed by the command-line tools
pub fn describe_distribution(collection: &DatasetCollection) -> String {
    collection
        .label_distribution()
        .iter()
        .map(|(label, count)| {
            format!(
                "{}: {} ({:.1}%)",
                label,
                count,
                *count as f64 / collection.len() as f64 * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
