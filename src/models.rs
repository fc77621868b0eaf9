// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Classifier plug-in seam and reference models
//!
//! Implements:
//! - Constant classifier (always predicts one label)
//! - Majority class classifier (always predict most common class)
//! - Stratified classifier (sample labels from the class distribution)
//! - Multinomial naive Bayes over count or tf-idf features
//! - Nearest centroid (Euclidean distance to per-class mean)

use crate::datasets::Label;
use crate::error::{ClassifierError, Result};
use crate::features::Features;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A trainable model over feature matrices
///
/// Implementations must accept both sparse and dense views.
pub trait Classifier: Send {
    /// Learn from one feature row per label
    fn fit(&mut self, features: Features<'_>, labels: &[Label]) -> Result<()>;

    /// Predict one label per feature row
    fn predict(&self, features: Features<'_>) -> Result<Vec<Label>>;

    /// Get model name
    fn name(&self) -> &str;

    /// Get model description
    fn description(&self) -> &str;
}

fn check_training_input(features: &Features<'_>, labels: &[Label]) -> Result<()> {
    if labels.is_empty() {
        return Err(ClassifierError::empty_dataset("cannot fit a model on zero documents"));
    }
    if features.n_rows() != labels.len() {
        return Err(ClassifierError::DimensionMismatch {
            expected: labels.len(),
            found: features.n_rows(),
        });
    }
    Ok(())
}

fn check_width(expected: usize, features: &Features<'_>) -> Result<()> {
    if features.n_cols() != expected {
        return Err(ClassifierError::DimensionMismatch {
            expected,
            found: features.n_cols(),
        });
    }
    Ok(())
}

fn class_counts(labels: &[Label]) -> BTreeMap<Label, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }
    counts
}

/// Always predicts the same label
#[derive(Debug, Clone)]
pub struct ConstantClassifier {
    label: Label,
}

impl ConstantClassifier {
    pub fn new(label: Label) -> Self {
        Self { label }
    }
}

impl Default for ConstantClassifier {
    fn default() -> Self {
        Self::new(Label::POSITIVE)
    }
}

impl Classifier for ConstantClassifier {
    fn fit(&mut self, features: Features<'_>, labels: &[Label]) -> Result<()> {
        check_training_input(&features, labels)
    }

    fn predict(&self, features: Features<'_>) -> Result<Vec<Label>> {
        Ok(vec![self.label; features.n_rows()])
    }

    fn name(&self) -> &str {
        "Constant"
    }

    fn description(&self) -> &str {
        "Always predicts a fixed label (the positive class by default)"
    }
}

/// Majority class classifier: always predicts the most common class
///
/// Ties go to the smallest label.
#[derive(Debug, Clone, Default)]
pub struct MajorityClassifier {
    majority_label: Option<Label>,
}

impl MajorityClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for MajorityClassifier {
    fn fit(&mut self, features: Features<'_>, labels: &[Label]) -> Result<()> {
        check_training_input(&features, labels)?;
        let counts = class_counts(labels);
        let best = counts.values().copied().max().unwrap_or(0);
        self.majority_label = counts.into_iter().find(|(_, c)| *c == best).map(|(l, _)| l);
        Ok(())
    }

    fn predict(&self, features: Features<'_>) -> Result<Vec<Label>> {
        let label = self.majority_label.ok_or(ClassifierError::NotTrained)?;
        Ok(vec![label; features.n_rows()])
    }

    fn name(&self) -> &str {
        "Majority"
    }

    fn description(&self) -> &str {
        "Always predicts the majority class from training data"
    }
}

/// Stratified classifier: predicts proportionally to class distribution
#[derive(Debug, Clone)]
pub struct StratifiedClassifier {
    seed: u64,
    rng: ChaCha8Rng,
    /// Labels with cumulative probability, ascending by label
    cumulative: Vec<(Label, f64)>,
}

impl StratifiedClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            cumulative: Vec::new(),
        }
    }
}

impl Classifier for StratifiedClassifier {
    fn fit(&mut self, features: Features<'_>, labels: &[Label]) -> Result<()> {
        check_training_input(&features, labels)?;
        let total = labels.len() as f64;
        let mut acc = 0.0;
        self.cumulative = class_counts(labels)
            .into_iter()
            .map(|(label, count)| {
                acc += count as f64 / total;
                (label, acc)
            })
            .collect();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        Ok(())
    }

    fn predict(&self, features: Features<'_>) -> Result<Vec<Label>> {
        let last = self.cumulative.last().ok_or(ClassifierError::NotTrained)?.0;
        // Same sequence on every call for a given training run
        let mut rng = self.rng.clone();
        Ok((0..features.n_rows())
            .map(|_| {
                let draw: f64 = rng.gen();
                self.cumulative
                    .iter()
                    .find(|(_, p)| draw < *p)
                    .map(|(l, _)| *l)
                    .unwrap_or(last)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Stratified"
    }

    fn description(&self) -> &str {
        "Predicts proportionally to training class distribution"
    }
}

/// Multinomial naive Bayes with additive smoothing
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    alpha: f64,
    classes: Vec<Label>,
    class_log_prior: Vec<f64>,
    /// `feature_log_prob[c][j]`: log P(feature j | class c)
    feature_log_prob: Vec<Vec<f64>>,
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MultinomialNb {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            classes: Vec::new(),
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
        }
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    fn reject_negative(features: &Features<'_>) -> Result<()> {
        if features.has_negative() {
            return Err(ClassifierError::configuration(
                "multinomial naive Bayes requires non-negative features",
            ));
        }
        Ok(())
    }
}

impl Classifier for MultinomialNb {
    fn fit(&mut self, features: Features<'_>, labels: &[Label]) -> Result<()> {
        check_training_input(&features, labels)?;
        Self::reject_negative(&features)?;

        let counts = class_counts(labels);
        self.classes = counts.keys().copied().collect();
        let n_features = features.n_cols();
        let total = labels.len() as f64;
        self.class_log_prior = counts.values().map(|c| (*c as f64 / total).ln()).collect();

        let mut feature_count = vec![vec![0.0; n_features]; self.classes.len()];
        for (i, label) in labels.iter().enumerate() {
            // classes is sorted, so the binary search always hits
            let c = self.classes.binary_search(label).unwrap_or(0);
            for (j, value) in features.row_entries(i) {
                feature_count[c][j] += value;
            }
        }

        self.feature_log_prob = feature_count
            .into_iter()
            .map(|row| {
                let denom = (row.iter().sum::<f64>() + self.alpha * n_features as f64).ln();
                row.into_iter().map(|v| (v + self.alpha).ln() - denom).collect()
            })
            .collect();

        tracing::debug!("Fitted naive Bayes over {} classes and {} features", self.classes.len(), n_features);
        Ok(())
    }

    fn predict(&self, features: Features<'_>) -> Result<Vec<Label>> {
        let width = self.feature_log_prob.first().ok_or(ClassifierError::NotTrained)?.len();
        check_width(width, &features)?;
        Self::reject_negative(&features)?;

        Ok((0..features.n_rows())
            .map(|i| {
                let entries = features.row_entries(i);
                let mut best = (f64::NEG_INFINITY, self.classes[0]);
                for (c, label) in self.classes.iter().enumerate() {
                    let score = self.class_log_prior[c]
                        + entries
                            .iter()
                            .map(|(j, v)| v * self.feature_log_prob[c][*j])
                            .sum::<f64>();
                    if score > best.0 {
                        best = (score, *label);
                    }
                }
                best.1
            })
            .collect())
    }

    fn name(&self) -> &str {
        "MultinomialNB"
    }

    fn description(&self) -> &str {
        "Multinomial naive Bayes with Laplace smoothing"
    }
}

/// Assigns each row to the class with the closest mean vector
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    classes: Vec<Label>,
    centroids: Vec<Vec<f64>>,
    /// Squared Euclidean norm of each centroid
    norms: Vec<f64>,
}

impl NearestCentroid {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for NearestCentroid {
    fn fit(&mut self, features: Features<'_>, labels: &[Label]) -> Result<()> {
        check_training_input(&features, labels)?;

        let counts = class_counts(labels);
        self.classes = counts.keys().copied().collect();
        let mut sums = vec![vec![0.0; features.n_cols()]; self.classes.len()];
        for (i, label) in labels.iter().enumerate() {
            let c = self.classes.binary_search(label).unwrap_or(0);
            for (j, value) in features.row_entries(i) {
                sums[c][j] += value;
            }
        }

        self.centroids = sums
            .into_iter()
            .zip(counts.values())
            .map(|(row, count)| row.into_iter().map(|v| v / *count as f64).collect())
            .collect();
        self.norms = self
            .centroids
            .iter()
            .map(|c| c.iter().map(|v| v * v).sum())
            .collect();
        Ok(())
    }

    fn predict(&self, features: Features<'_>) -> Result<Vec<Label>> {
        let width = self.centroids.first().ok_or(ClassifierError::NotTrained)?.len();
        check_width(width, &features)?;

        Ok((0..features.n_rows())
            .map(|i| {
                let entries = features.row_entries(i);
                // ||x - c||^2 without the ||x||^2 term, which is equal for every class
                let mut best = (f64::INFINITY, self.classes[0]);
                for (c, label) in self.classes.iter().enumerate() {
                    let dot: f64 = entries.iter().map(|(j, v)| v * self.centroids[c][*j]).sum();
                    let distance = self.norms[c] - 2.0 * dot;
                    if distance < best.0 {
                        best = (distance, *label);
                    }
                }
                best.1
            })
            .collect())
    }

    fn name(&self) -> &str {
        "NearestCentroid"
    }

    fn description(&self) -> &str {
        "Closest per-class mean vector by Euclidean distance"
    }
}

/// Factory function to create all reference models
pub fn all_models(seed: u64) -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(ConstantClassifier::default()),
        Box::new(MajorityClassifier::new()),
        Box::new(StratifiedClassifier::new(seed)),
        Box::new(MultinomialNb::default()),
        Box::new(NearestCentroid::new()),
    ]
}

/// Build a model from its command-line name
pub fn model_by_name(name: &str, seed: u64) -> Result<Box<dyn Classifier>> {
    let model: Box<dyn Classifier> = match name.to_lowercase().as_str() {
        "constant" => Box::new(ConstantClassifier::default()),
        "majority" => Box::new(MajorityClassifier::new()),
        "stratified" => Box::new(StratifiedClassifier::new(seed)),
        "nb" | "naive_bayes" | "multinomialnb" => Box::new(MultinomialNb::default()),
        "centroid" | "nearest_centroid" | "nearestcentroid" => Box::new(NearestCentroid::new()),
        other => {
            return Err(ClassifierError::configuration(format!(
                "unknown model '{}' (expected constant, majority, stratified, nb or centroid)",
                other
            )))
        }
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SparseMatrix;

    // Columns: worm, yeast, cell
    fn training() -> (SparseMatrix, Vec<Label>) {
        let m = SparseMatrix::from_rows(
            3,
            vec![
                vec![(0, 3.0), (2, 1.0)],
                vec![(0, 2.0)],
                vec![(0, 4.0), (2, 1.0)],
                vec![(1, 3.0), (2, 1.0)],
                vec![(1, 2.0)],
            ],
        )
        .unwrap();
        (m, vec![Label(1), Label(1), Label(1), Label(0), Label(0)])
    }

    fn queries() -> SparseMatrix {
        SparseMatrix::from_rows(3, vec![vec![(0, 5.0)], vec![(1, 4.0), (2, 1.0)]]).unwrap()
    }

    #[test]
    fn test_constant_classifier() {
        let (m, labels) = training();
        let mut model = ConstantClassifier::default();
        model.fit(Features::Sparse(&m), &labels).unwrap();
        assert_eq!(model.predict(Features::Sparse(&m)).unwrap(), vec![Label(1); 5]);
    }

    #[test]
    fn test_majority_classifier() {
        let (m, labels) = training();
        let mut model = MajorityClassifier::new();
        assert!(matches!(model.predict(Features::Sparse(&m)), Err(ClassifierError::NotTrained)));

        model.fit(Features::Sparse(&m), &labels).unwrap();
        let predictions = model.predict(Features::Sparse(&queries())).unwrap();
        assert_eq!(predictions, vec![Label(1), Label(1)]);
    }

    #[test]
    fn test_majority_tie_takes_smallest_label() {
        let m = SparseMatrix::from_rows(1, vec![vec![], vec![]]).unwrap();
        let mut model = MajorityClassifier::new();
        model.fit(Features::Sparse(&m), &[Label(3), Label(2)]).unwrap();
        assert_eq!(model.predict(Features::Sparse(&m)).unwrap(), vec![Label(2), Label(2)]);
    }

    #[test]
    fn test_stratified_is_reproducible() {
        let (m, labels) = training();
        let mut model = StratifiedClassifier::new(42);
        model.fit(Features::Sparse(&m), &labels).unwrap();

        let first = model.predict(Features::Sparse(&m)).unwrap();
        let second = model.predict(Features::Sparse(&m)).unwrap();
        assert_eq!(first, second);
        assert!(first.iter().all(|l| *l == Label(0) || *l == Label(1)));
    }

    #[test]
    fn test_naive_bayes_separates_classes() {
        let (m, labels) = training();
        let mut model = MultinomialNb::default();
        model.fit(Features::Sparse(&m), &labels).unwrap();

        assert_eq!(model.classes(), &[Label(0), Label(1)]);
        let predictions = model.predict(Features::Sparse(&queries())).unwrap();
        assert_eq!(predictions, vec![Label(1), Label(0)]);
    }

    #[test]
    fn test_naive_bayes_sparse_and_dense_agree() {
        let (m, labels) = training();
        let dense = m.to_dense();
        let mut sparse_model = MultinomialNb::default();
        let mut dense_model = MultinomialNb::default();
        sparse_model.fit(Features::Sparse(&m), &labels).unwrap();
        dense_model.fit(Features::Dense(&dense), &labels).unwrap();

        let q = queries();
        assert_eq!(
            sparse_model.predict(Features::Sparse(&q)).unwrap(),
            dense_model.predict(Features::Dense(&q.to_dense())).unwrap()
        );
    }

    #[test]
    fn test_naive_bayes_rejects_negative_features() {
        let m = SparseMatrix::from_rows(2, vec![vec![(0, -0.5)], vec![(1, 1.0)]]).unwrap();
        let mut model = MultinomialNb::default();
        let err = model.fit(Features::Sparse(&m), &[Label(0), Label(1)]).unwrap_err();
        assert!(matches!(err, ClassifierError::Configuration(_)));
    }

    #[test]
    fn test_nearest_centroid() {
        let (m, labels) = training();
        let mut model = NearestCentroid::new();
        model.fit(Features::Sparse(&m), &labels).unwrap();
        let predictions = model.predict(Features::Sparse(&queries())).unwrap();
        assert_eq!(predictions, vec![Label(1), Label(0)]);
    }

    #[test]
    fn test_width_mismatch() {
        let (m, labels) = training();
        let mut model = NearestCentroid::new();
        model.fit(Features::Sparse(&m), &labels).unwrap();
        let wide = SparseMatrix::new(7);
        assert!(matches!(
            model.predict(Features::Sparse(&wide)),
            Err(ClassifierError::DimensionMismatch { expected: 3, found: 7 })
        ));
    }

    #[test]
    fn test_fit_rejects_empty_and_misaligned_input() {
        let empty = SparseMatrix::new(3);
        let mut model = MultinomialNb::default();
        assert!(matches!(
            model.fit(Features::Sparse(&empty), &[]),
            Err(ClassifierError::EmptyDataset(_))
        ));

        let (m, _) = training();
        assert!(matches!(
            model.fit(Features::Sparse(&m), &[Label(1)]),
            Err(ClassifierError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_all_models() {
        let models = all_models(42);
        assert_eq!(models.len(), 5);

        let names: Vec<_> = models.iter().map(|m| m.name()).collect();
        assert!(names.contains(&"Constant"));
        assert!(names.contains(&"Majority"));
        assert!(names.contains(&"Stratified"));
        assert!(names.contains(&"MultinomialNB"));
        assert!(names.contains(&"NearestCentroid"));
    }

    #[test]
    fn test_model_by_name() {
        assert_eq!(model_by_name("nb", 0).unwrap().name(), "MultinomialNB");
        assert_eq!(model_by_name("Centroid", 0).unwrap().name(), "NearestCentroid");
        assert!(matches!(model_by_name("svm", 0), Err(ClassifierError::Configuration(_))));
    }
}
