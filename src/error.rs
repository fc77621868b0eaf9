// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error types for the classification pipeline
//!
//! Every fallible library operation returns [`Result`], whose error side is
//! [`ClassifierError`]. Documents that yield no text are not errors: they are
//! skipped where they are found.

use std::io;

use thiserror::Error;

/// Errors raised by the classification pipeline
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Unrecognized strategy or format name, or an invalid parameter combination
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation needed documents but the relevant subset is empty
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Stop words or document-frequency pruning removed every term
    #[error("Empty vocabulary: {0}")]
    EmptyVocabulary(String),

    /// Evaluation or prediction before a classifier was trained
    #[error("No classifier has been trained yet")]
    NotTrained,

    /// Training or prediction before features were extracted
    #[error("Features have not been extracted yet")]
    NotVectorized,

    /// A matrix or label sequence does not have the expected shape
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifierError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        ClassifierError::Configuration(msg.into())
    }

    pub fn empty_dataset<S: Into<String>>(msg: S) -> Self {
        ClassifierError::EmptyDataset(msg.into())
    }

    pub fn empty_vocabulary<S: Into<String>>(msg: S) -> Self {
        ClassifierError::EmptyVocabulary(msg.into())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ClassifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClassifierError::configuration("unknown strategy 'foo'");
        assert_eq!(err.to_string(), "Configuration error: unknown strategy 'foo'");

        let err = ClassifierError::DimensionMismatch { expected: 3, found: 2 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, found 2");

        assert_eq!(ClassifierError::NotTrained.to_string(), "No classifier has been trained yet");
    }

    #[test]
    fn test_io_conversion() {
        fn open_missing() -> Result<()> {
            std::fs::read_dir("/definitely/not/a/real/dir")?;
            Ok(())
        }

        assert!(matches!(open_missing(), Err(ClassifierError::Io(_))));
    }
}
