// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Document classifier CLI
//!
//! Usage:
//!   tpclassifier --corpus data/positive=1 --corpus data/negative=0 --vectorizer tfidf
//!   tpclassifier --config experiment.json --classify data/unlabeled

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tpclassifier::cli::ExperimentArgs;
use tpclassifier::report::run_experiment;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Json,
    Markdown,
    Both,
}

impl ReportFormat {
    fn writes_json(self) -> bool {
        matches!(self, ReportFormat::Json | ReportFormat::Both)
    }

    fn writes_markdown(self) -> bool {
        matches!(self, ReportFormat::Markdown | ReportFormat::Both)
    }
}

#[derive(Parser, Debug)]
#[command(name = "tpclassifier")]
#[command(about = "Train, evaluate and apply a document classifier")]
#[command(version)]
struct Args {
    #[command(flatten)]
    experiment: ExperimentArgs,

    /// Model to train (constant, majority, stratified, nb, centroid)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory of unlabeled documents to classify after training
    #[arg(long)]
    classify: Option<PathBuf>,

    /// Report files to write
    #[arg(long, value_enum, default_value_t = ReportFormat::Both)]
    report_format: ReportFormat,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = args
        .experiment
        .into_config()
        .context("Invalid experiment configuration")?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if args.classify.is_some() {
        config.classify_dir = args.classify;
    }

    tracing::info!("Document Classifier");
    tracing::info!("===================");
    tracing::info!("Corpora: {}", config.corpora.len());
    tracing::info!("Format: {}", config.format);
    tracing::info!("Features: {}", config.features.strategy);
    tracing::info!("Model: {}", config.model);
    tracing::info!("Seed: {}", config.seed);

    let report = run_experiment(&config).context("Experiment failed")?;

    println!("\n{}", "=".repeat(70));
    println!("RESULTS");
    println!("{}", "=".repeat(70));
    println!(
        "\nDocuments: {} (train={}, test={}), features: {}",
        report.dataset_info.total_documents,
        report.dataset_info.training_documents,
        report.dataset_info.test_documents,
        report.n_features
    );

    for result in &report.model_results {
        println!("\n## {} ##", result.model_name);
        println!("{}", result.model_description);
        println!("{}", "-".repeat(50));
        match result.test {
            Some(ref test) => println!("{}", test.format()),
            None => println!("(no test documents)\n\nTraining set:\n{}", result.training.format()),
        }
    }

    if !report.predictions.is_empty() {
        println!("\nPredictions:");
        println!("{:-<70}", "");
        for prediction in &report.predictions {
            println!("{:<60} {:>9}", prediction.filename, prediction.label);
        }
        println!("{:-<70}", "");
    }

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Cannot create {}", config.output_dir.display()))?;
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");

    if args.report_format.writes_json() {
        let json_path = config.output_dir.join(format!("run_{}.json", timestamp));
        report.save_json(&json_path)?;
        println!("\nJSON results saved to: {}", json_path.display());
    }

    if args.report_format.writes_markdown() {
        let md_path = config.output_dir.join(format!("run_{}.md", timestamp));
        std::fs::write(&md_path, report.to_markdown())?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_flag() {
        let args = Args::try_parse_from(["tpclassifier", "--corpus", "pos=1"]).unwrap();
        assert_eq!(args.report_format, ReportFormat::Both);
        assert!(args.report_format.writes_json() && args.report_format.writes_markdown());

        let args = Args::try_parse_from(["tpclassifier", "--report-format", "markdown"]).unwrap();
        assert!(!args.report_format.writes_json());
        assert!(args.report_format.writes_markdown());

        assert!(Args::try_parse_from(["tpclassifier", "--report-format", "jsn"]).is_err());
    }
}
