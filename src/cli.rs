// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Command-line arguments shared by the binaries

use crate::config::{CorpusSource, ExperimentConfig};
use crate::error::Result;
use crate::extraction::SourceFormat;
use crate::features::{FeatureConfig, VectorizerStrategy};
use crate::text::StopWords;
use clap::Args;
use std::path::PathBuf;

/// Flags describing one experiment
#[derive(Args, Debug, Clone)]
pub struct ExperimentArgs {
    /// JSON experiment file; when given, the other experiment flags are ignored
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Labeled corpus directory as PATH=LABEL (repeatable)
    #[arg(long = "corpus", value_name = "PATH=LABEL")]
    pub corpora: Vec<CorpusSource>,

    /// Recurse into corpus subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Document format (pdf, cas_pdf, cas_xml, txt)
    #[arg(short, long, default_value = "txt")]
    pub format: SourceFormat,

    /// Fraction of documents used for training
    #[arg(long, default_value_t = 0.8)]
    pub training_fraction: f64,

    /// Vectorization strategy (bow, tfidf, hash)
    #[arg(long, default_value = "bow")]
    pub vectorizer: VectorizerStrategy,

    /// Number of hashed columns for the hash strategy
    #[arg(long)]
    pub hash_features: Option<usize>,

    #[arg(long, default_value_t = 1)]
    pub ngram_min: usize,

    #[arg(long, default_value_t = 1)]
    pub ngram_max: usize,

    /// Lemmatize word tokens
    #[arg(long)]
    pub lemmatize: bool,

    /// Keep only the best N features by chi-squared score
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Stop words: english, none, or a comma-separated list
    #[arg(long, default_value = "english")]
    pub stop_words: String,

    /// Ignore terms found in more than this fraction of training documents
    #[arg(long, default_value_t = 1.0)]
    pub max_df: f64,

    /// Keep only the most frequent terms
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Use dense feature matrices
    #[arg(long)]
    pub dense: bool,

    /// Random seed for reproducibility
    #[arg(short, long, default_value_t = 42)]
    pub seed: u64,

    /// Output directory for results
    #[arg(short, long, default_value = "results")]
    pub output: PathBuf,
}

impl ExperimentArgs {
    /// Load the experiment file, or build the configuration from flags
    pub fn into_config(self) -> Result<ExperimentConfig> {
        if let Some(path) = self.config {
            return ExperimentConfig::load(&path);
        }

        let strategy = match (self.vectorizer, self.hash_features) {
            (VectorizerStrategy::Hashing { .. }, Some(n_features)) => VectorizerStrategy::Hashing { n_features },
            (strategy, _) => strategy,
        };
        let recursive = self.recursive;
        let config = ExperimentConfig {
            seed: self.seed,
            corpora: self
                .corpora
                .into_iter()
                .map(|corpus| CorpusSource { recursive, ..corpus })
                .collect(),
            format: self.format,
            training_fraction: self.training_fraction,
            features: FeatureConfig {
                strategy,
                ngram_range: (self.ngram_min, self.ngram_max),
                lemmatize: self.lemmatize,
                top_n_features: self.top_n,
                stop_words: StopWords::parse(&self.stop_words),
                max_df: self.max_df,
                max_features: self.max_features,
            },
            dense: self.dense,
            output_dir: self.output,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        experiment: ExperimentArgs,
    }

    #[test]
    fn test_flags_build_config() {
        let cli = TestCli::try_parse_from([
            "test",
            "--corpus",
            "pos=1",
            "--corpus",
            "neg=0",
            "-r",
            "--format",
            "cas_xml",
            "--vectorizer",
            "hash",
            "--hash-features",
            "4096",
            "--ngram-max",
            "2",
            "--stop-words",
            "none",
        ])
        .unwrap();

        let config = cli.experiment.into_config().unwrap();
        assert_eq!(config.corpora.len(), 2);
        assert!(config.corpora.iter().all(|c| c.recursive));
        assert_eq!(config.format, SourceFormat::CasXml);
        assert_eq!(config.features.strategy, VectorizerStrategy::Hashing { n_features: 4096 });
        assert_eq!(config.features.ngram_range, (1, 2));
        assert_eq!(config.features.stop_words, StopWords::None);
    }

    #[test]
    fn test_invalid_flag_values() {
        assert!(TestCli::try_parse_from(["test", "--format", "docx"]).is_err());
        assert!(TestCli::try_parse_from(["test", "--vectorizer", "lda"]).is_err());

        let cli = TestCli::try_parse_from(["test", "--corpus", "pos=1", "--training-fraction", "1.5"]).unwrap();
        assert!(cli.experiment.into_config().is_err());
    }

    #[test]
    fn test_config_file_replaces_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"corpora": [{"path": "docs", "label": 2}], "seed": 5}"#).unwrap();

        let cli = TestCli::try_parse_from(["test", "--config", path.to_str().unwrap(), "--seed", "9"]).unwrap();
        let config = cli.experiment.into_config().unwrap();
        assert_eq!(config.seed, 5);
        assert_eq!(config.corpora[0].label, crate::datasets::Label(2));
    }
}
