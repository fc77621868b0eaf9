// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reference model comparison
//!
//! Trains every reference model on the same feature space for quick testing

use anyhow::{Context, Result};
use clap::Parser;
use tpclassifier::cli::ExperimentArgs;
use tpclassifier::models::all_models;
use tpclassifier::report::{compare_models, describe_distribution, prepare};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "compare-models")]
#[command(about = "Evaluate every reference model on one corpus")]
#[command(version)]
struct Args {
    #[command(flatten)]
    experiment: ExperimentArgs,

    /// List available models
    #[arg(long)]
    list: bool,

    /// Show label distributions before comparing
    #[arg(long)]
    describe: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // List available models
    if args.list {
        println!("Available models:");
        println!("-----------------");
        for model in all_models(42) {
            println!("  {}: {}", model.name(), model.description());
        }
        return Ok(());
    }

    let config = args
        .experiment
        .into_config()
        .context("Invalid experiment configuration")?;

    if args.describe {
        let classifier = prepare(&config).context("Cannot prepare features")?;
        let store = classifier.store();
        println!("\nTrain distribution: {}", describe_distribution(store.training()));
        println!("Test distribution:  {}", describe_distribution(store.test()));
    }

    let report = compare_models(&config).context("Comparison failed")?;

    println!("\n{}", "=".repeat(70));
    println!("MODEL COMPARISON ({} features)", report.n_features);
    println!("{}", "=".repeat(70));
    println!(
        "{:<18} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "Model", "Accuracy", "Precision", "Recall", "F1", "AUC"
    );
    println!("{:-<70}", "");
    for result in &report.model_results {
        let scored = result.test.as_ref().unwrap_or(&result.training);
        println!(
            "{:<18} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8.4}",
            result.model_name,
            scored.accuracy,
            scored.precision,
            scored.recall,
            scored.report.f1_score,
            scored.roc.auc()
        );
    }
    println!("{:-<70}", "");
    if let Some(best) = report.best_model() {
        println!("\nBest Model: {}", best.model_name);
    }

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Cannot create {}", config.output_dir.display()))?;
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let json_path = config.output_dir.join(format!("compare_{}.json", timestamp));
    report.save_json(&json_path)?;
    std::fs::write(json_path.with_extension("md"), report.to_markdown())?;
    println!("\nResults saved to: {}", json_path.display());

    Ok(())
}
