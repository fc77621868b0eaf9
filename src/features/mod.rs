// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Feature extraction: vectorization strategies and feature selection
//!
//! A [`FittedVectorizer`] is built once from training text and afterwards only
//! transforms; it never refits on test or inference text.

pub mod matrix;
pub mod selection;
pub mod vectorize;

pub use matrix::{DenseMatrix, Features, SparseMatrix};
pub use selection::{chi2, FeatureSelection};
pub use vectorize::{CountVectorizer, HashingVectorizer, TfidfTransformer};

use crate::error::{ClassifierError, Result};
use crate::text::{Analyzer, StopWords, Tokenization};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default width of the hashed feature space
pub const DEFAULT_HASH_FEATURES: usize = 1 << 20;

/// Vectorization strategy with its own settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VectorizerStrategy {
    /// Raw term counts over a learned vocabulary
    #[default]
    BagOfWords,
    /// Term counts reweighted by inverse document frequency
    Tfidf,
    /// Hashed term counts reweighted by inverse document frequency
    Hashing { n_features: usize },
}

impl FromStr for VectorizerStrategy {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bow" | "count" => Ok(VectorizerStrategy::BagOfWords),
            "tfidf" => Ok(VectorizerStrategy::Tfidf),
            "hash" | "hashing" => Ok(VectorizerStrategy::Hashing {
                n_features: DEFAULT_HASH_FEATURES,
            }),
            other => Err(ClassifierError::configuration(format!(
                "unknown vectorization strategy '{}' (expected bow, tfidf or hash)",
                other
            ))),
        }
    }
}

impl fmt::Display for VectorizerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorizerStrategy::BagOfWords => f.write_str("bow"),
            VectorizerStrategy::Tfidf => f.write_str("tfidf"),
            VectorizerStrategy::Hashing { n_features } => write!(f, "hash({})", n_features),
        }
    }
}

/// Settings for one feature extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub strategy: VectorizerStrategy,
    /// Smallest and largest n-gram length
    pub ngram_range: (usize, usize),
    /// Lemmatize word tokens before counting
    pub lemmatize: bool,
    /// Keep only the best columns by chi-squared score
    pub top_n_features: Option<usize>,
    pub stop_words: StopWords,
    /// Drop terms found in more than this fraction of training documents
    pub max_df: f64,
    /// Keep only the most frequent terms (vocabulary strategies only)
    pub max_features: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            strategy: VectorizerStrategy::BagOfWords,
            ngram_range: (1, 1),
            lemmatize: false,
            top_n_features: None,
            stop_words: StopWords::English,
            max_df: 1.0,
            max_features: None,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::configuration(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(ClassifierError::configuration(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.max_features == Some(0) {
            return Err(ClassifierError::configuration("max_features must be positive"));
        }
        if self.top_n_features == Some(0) {
            return Err(ClassifierError::configuration("top_n_features must be positive"));
        }
        if let VectorizerStrategy::Hashing { n_features } = self.strategy {
            if n_features == 0 {
                return Err(ClassifierError::configuration("hashing needs at least one feature"));
            }
            if self.top_n_features.is_some() {
                return Err(ClassifierError::configuration(
                    "feature selection cannot be combined with signed hashed features",
                ));
            }
        }
        Ok(())
    }

    fn analyzer(&self) -> Analyzer {
        let tokenization = if self.lemmatize {
            Tokenization::Lemmatized
        } else {
            Tokenization::Pattern
        };
        Analyzer::new(tokenization, &self.stop_words, self.ngram_range)
    }
}

/// Vectorizer state learned from training text
#[derive(Debug, Clone)]
pub enum FittedVectorizer {
    BagOfWords(CountVectorizer),
    Tfidf {
        counts: CountVectorizer,
        weights: TfidfTransformer,
    },
    Hashing {
        hasher: HashingVectorizer,
        weights: TfidfTransformer,
    },
}

impl FittedVectorizer {
    /// Fit on training text, returning the vectorizer and the training matrix
    pub fn fit<S: AsRef<str>>(config: &FeatureConfig, documents: &[S]) -> Result<(Self, SparseMatrix)> {
        config.validate()?;
        if documents.is_empty() {
            return Err(ClassifierError::empty_dataset("no training documents to fit on"));
        }

        let analyzer = config.analyzer();
        match config.strategy {
            VectorizerStrategy::BagOfWords => {
                let mut counts = CountVectorizer::new(analyzer, config.max_df, config.max_features);
                let matrix = counts.fit_transform(documents)?;
                Ok((FittedVectorizer::BagOfWords(counts), matrix))
            }
            VectorizerStrategy::Tfidf => {
                let mut counts = CountVectorizer::new(analyzer, config.max_df, config.max_features);
                let mut weights = TfidfTransformer::new();
                let matrix = weights.fit_transform(&counts.fit_transform(documents)?)?;
                Ok((FittedVectorizer::Tfidf { counts, weights }, matrix))
            }
            VectorizerStrategy::Hashing { n_features } => {
                if config.max_features.is_some() || config.max_df < 1.0 {
                    tracing::debug!("max_features and max_df do not apply to hashed features");
                }
                let hasher = HashingVectorizer::new(analyzer, n_features);
                let mut weights = TfidfTransformer::new();
                let matrix = weights.fit_transform(&hasher.transform(documents)?)?;
                Ok((FittedVectorizer::Hashing { hasher, weights }, matrix))
            }
        }
    }

    /// Apply the learned state to new text
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<SparseMatrix> {
        match self {
            FittedVectorizer::BagOfWords(counts) => counts.transform(documents),
            FittedVectorizer::Tfidf { counts, weights } => weights.transform(&counts.transform(documents)?),
            FittedVectorizer::Hashing { hasher, weights } => weights.transform(&hasher.transform(documents)?),
        }
    }

    /// Width of the matrices this vectorizer produces
    pub fn n_features(&self) -> usize {
        match self {
            FittedVectorizer::BagOfWords(counts) | FittedVectorizer::Tfidf { counts, .. } => {
                counts.vocabulary().len()
            }
            FittedVectorizer::Hashing { hasher, .. } => hasher.n_features(),
        }
    }

    /// Learned terms in column order, when the strategy has a vocabulary
    pub fn feature_names(&self) -> Option<Vec<&str>> {
        match self {
            FittedVectorizer::BagOfWords(counts) | FittedVectorizer::Tfidf { counts, .. } => {
                Some(counts.feature_names())
            }
            FittedVectorizer::Hashing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy() {
        assert_eq!("bow".parse::<VectorizerStrategy>().unwrap(), VectorizerStrategy::BagOfWords);
        assert_eq!("TFIDF".parse::<VectorizerStrategy>().unwrap(), VectorizerStrategy::Tfidf);
        assert_eq!(
            "hash".parse::<VectorizerStrategy>().unwrap(),
            VectorizerStrategy::Hashing { n_features: DEFAULT_HASH_FEATURES }
        );
        assert!(matches!(
            "word2vec".parse::<VectorizerStrategy>(),
            Err(ClassifierError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let bad_ngrams = FeatureConfig { ngram_range: (2, 1), ..Default::default() };
        assert!(bad_ngrams.validate().is_err());

        let bad_df = FeatureConfig { max_df: 0.0, ..Default::default() };
        assert!(bad_df.validate().is_err());

        let hashed_selection = FeatureConfig {
            strategy: VectorizerStrategy::Hashing { n_features: 16 },
            top_n_features: Some(4),
            ..Default::default()
        };
        assert!(matches!(hashed_selection.validate(), Err(ClassifierError::Configuration(_))));

        assert!(FeatureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bag_of_words_scenario() {
        let config = FeatureConfig { stop_words: StopWords::None, ..Default::default() };
        let (vectorizer, matrix) = FittedVectorizer::fit(&config, &["cat dog", "dog dog"]).unwrap();

        assert_eq!(vectorizer.feature_names().unwrap(), vec!["cat", "dog"]);
        let dense = matrix.to_dense();
        assert_eq!(dense.row(0), &[1.0, 1.0]);
        assert_eq!(dense.row(1), &[0.0, 2.0]);
    }

    #[test]
    fn test_transform_reproduces_training_rows() {
        let docs = ["worm lifespan daf", "yeast growth medium", "worm neuron"];
        for strategy in [
            VectorizerStrategy::BagOfWords,
            VectorizerStrategy::Tfidf,
            VectorizerStrategy::Hashing { n_features: 256 },
        ] {
            let config = FeatureConfig { strategy, ..Default::default() };
            let (vectorizer, train) = FittedVectorizer::fit(&config, &docs).unwrap();
            let again = vectorizer.transform(&docs[1..2]).unwrap();

            assert_eq!(again.n_cols(), train.n_cols());
            assert_eq!(again.row(0), train.row(1), "strategy {}", strategy);
        }
    }

    #[test]
    fn test_strategy_serde_roundtrip() {
        let json = serde_json::to_string(&VectorizerStrategy::Hashing { n_features: 8 }).unwrap();
        assert_eq!(json, r#"{"type":"hashing","n_features":8}"#);
    }

    #[test]
    fn test_fit_without_documents() {
        let docs: [&str; 0] = [];
        let err = FittedVectorizer::fit(&FeatureConfig::default(), &docs).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyDataset(_)));
    }
}
