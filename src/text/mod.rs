// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Text analysis shared by every vectorization strategy
//!
//! A document goes through the same chain at fit and transform time:
//! lowercase → tokenize → drop stop words → expand n-grams.

pub mod lemmatize;
pub mod stopwords;

pub use lemmatize::{Lemmatizer, NounLemmatizer};
pub use stopwords::StopWords;

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// Tokens of two or more word characters
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").unwrap();

    /// Words, allowing inner hyphens and apostrophes; punctuation is dropped
    static ref WORD_PATTERN: Regex = Regex::new(r"\w+(?:[-']\w+)*").unwrap();
}

/// How raw text is split into tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tokenization {
    /// Regex token pattern, no normalization beyond lowercasing
    Pattern,
    /// Word tokenization followed by noun lemmatization
    Lemmatized,
}

/// Converts a document into the terms counted by a vectorizer
#[derive(Debug, Clone)]
pub struct Analyzer {
    tokenization: Tokenization,
    stop_words: HashSet<String>,
    ngram_range: (usize, usize),
    lemmatizer: NounLemmatizer,
}

impl Analyzer {
    pub fn new(tokenization: Tokenization, stop_words: &StopWords, ngram_range: (usize, usize)) -> Self {
        Self {
            tokenization,
            stop_words: stop_words.to_set(),
            ngram_range,
            lemmatizer: NounLemmatizer::new(),
        }
    }

    /// Split lowercased text into tokens, before stop word removal
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        match self.tokenization {
            Tokenization::Pattern => TOKEN_PATTERN
                .find_iter(&lowered)
                .map(|m| m.as_str().to_string())
                .collect(),
            Tokenization::Lemmatized => WORD_PATTERN
                .find_iter(&lowered)
                .map(|m| self.lemmatizer.lemmatize(m.as_str()))
                .collect(),
        }
    }

    /// Full analysis: tokens without stop words, expanded to every n-gram in range
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = self
            .tokenize(text)
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        if min_n == 1 && max_n == 1 {
            return tokens;
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_tokenization_drops_single_chars() {
        let analyzer = Analyzer::new(Tokenization::Pattern, &StopWords::None, (1, 1));
        assert_eq!(analyzer.analyze("A Cat, a DOG!"), vec!["cat", "dog"]);
    }

    #[test]
    fn test_stop_words_removed_before_ngrams() {
        let analyzer = Analyzer::new(Tokenization::Pattern, &StopWords::English, (1, 2));
        let terms = analyzer.analyze("the worm and the gene");
        assert_eq!(terms, vec!["worm", "gene", "worm gene"]);
    }

    #[test]
    fn test_bigrams_only() {
        let analyzer = Analyzer::new(Tokenization::Pattern, &StopWords::None, (2, 2));
        assert_eq!(analyzer.analyze("cat dog bird"), vec!["cat dog", "dog bird"]);
    }

    #[test]
    fn test_lemmatized_tokenization() {
        let analyzer = Analyzer::new(Tokenization::Lemmatized, &StopWords::None, (1, 1));
        assert_eq!(
            analyzer.analyze("Mutant worms carry daf-2 alleles."),
            vec!["mutant", "worm", "carry", "daf-2", "allele"]
        );
    }

    #[test]
    fn test_ngram_window_longer_than_document() {
        let analyzer = Analyzer::new(Tokenization::Pattern, &StopWords::None, (3, 3));
        assert!(analyzer.analyze("cat dog").is_empty());
    }
}
