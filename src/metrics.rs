// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for binary and multi-class classification
//!
//! Multi-class policy: accuracy is exact-match over every label, while
//! precision, recall and the ROC curve treat [`Label::POSITIVE`] as the
//! positive class and every other label as negative. Per-class precision,
//! recall and F1 are reported for each label seen in truth or predictions.
//!
//! Implements:
//! - Confusion Matrix (one-vs-rest)
//! - Accuracy, Precision, Recall, F1-Score
//! - ROC curve and its area
//! - Matthews Correlation Coefficient (MCC)

use crate::datasets::Label;
use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

fn check_lengths(predictions: &[Label], ground_truth: &[Label]) -> Result<()> {
    if predictions.len() != ground_truth.len() {
        return Err(ClassifierError::DimensionMismatch {
            expected: ground_truth.len(),
            found: predictions.len(),
        });
    }
    Ok(())
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        return 0.0;
    }
    2.0 * a * b / (a + b)
}

/// Confusion matrix for one positive label against the rest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// True Positives (positive predicted as positive)
    pub tp: usize,
    /// True Negatives (other predicted as other)
    pub tn: usize,
    /// False Positives (other predicted as positive)
    pub fp: usize,
    /// False Negatives (positive predicted as other)
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Create from predictions and ground truth labels
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label], positive: Label) -> Result<Self> {
        check_lengths(predictions, ground_truth)?;

        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth.iter()) {
            match (*pred == positive, *truth == positive) {
                (true, true) => matrix.tp += 1,
                (false, false) => matrix.tn += 1,
                (true, false) => matrix.fp += 1,
                (false, true) => matrix.fn_ += 1,
            }
        }
        Ok(matrix)
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Precision: TP / (TP + FP), 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Recall (Sensitivity): TP / (TP + FN), 0 when no positives exist
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn f1_score(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }

    /// Matthews Correlation Coefficient, from -1 to 1
    pub fn mcc(&self) -> f64 {
        let tp = self.tp as f64;
        let tn = self.tn as f64;
        let fp = self.fp as f64;
        let fn_ = self.fn_ as f64;

        let numerator = tp * tn - fp * fn_;
        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();

        if denominator == 0.0 {
            return 0.0;
        }
        numerator / denominator
    }
}

/// Fraction of predictions equal to the true label
pub fn accuracy_score(predictions: &[Label], ground_truth: &[Label]) -> Result<f64> {
    check_lengths(predictions, ground_truth)?;
    let correct = predictions.iter().zip(ground_truth).filter(|(p, t)| p == t).count();
    Ok(ratio(correct, ground_truth.len()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Full classification report with all metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub positive_label: Label,
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub mcc: f64,
    pub specificity: f64,
    pub support: usize,
    /// One-vs-rest metrics for every label seen in truth or predictions
    pub per_class: BTreeMap<Label, ClassMetrics>,
}

impl ClassificationReport {
    /// Generate report from predictions and ground truth
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label], positive: Label) -> Result<Self> {
        let cm = ConfusionMatrix::from_predictions(predictions, ground_truth, positive)?;
        let accuracy = accuracy_score(predictions, ground_truth)?;

        let labels: BTreeSet<Label> = predictions.iter().chain(ground_truth).copied().collect();
        let mut per_class = BTreeMap::new();
        for label in labels {
            let class_cm = ConfusionMatrix::from_predictions(predictions, ground_truth, label)?;
            per_class.insert(
                label,
                ClassMetrics {
                    precision: class_cm.precision(),
                    recall: class_cm.recall(),
                    f1_score: class_cm.f1_score(),
                    support: class_cm.tp + class_cm.fn_,
                },
            );
        }

        Ok(Self {
            positive_label: positive,
            accuracy,
            precision: cm.precision(),
            recall: cm.recall(),
            f1_score: cm.f1_score(),
            mcc: cm.mcc(),
            specificity: cm.specificity(),
            support: cm.total(),
            confusion_matrix: cm,
            per_class,
        })
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut output = format!(
            r#"Classification Report (positive label {})
=====================
Accuracy:          {:.4} ({:.2}%)
Precision:         {:.4}
Recall:            {:.4}
F1 Score:          {:.4}
MCC:               {:.4}
Specificity:       {:.4}
Support:           {}

Confusion Matrix:
                  Predicted
                  Positive  Other
Actual Positive  {:>6}    {:>6}
       Other     {:>6}    {:>6}
"#,
            self.positive_label,
            self.accuracy,
            self.accuracy * 100.0,
            self.precision,
            self.recall,
            self.f1_score,
            self.mcc,
            self.specificity,
            self.support,
            self.confusion_matrix.tp,
            self.confusion_matrix.fn_,
            self.confusion_matrix.fp,
            self.confusion_matrix.tn,
        );

        output.push_str("\nPer-Class Metrics:\n");
        for (label, metrics) in &self.per_class {
            output.push_str(&format!(
                "  {}: P={:.4} R={:.4} F1={:.4} (n={})\n",
                label, metrics.precision, metrics.recall, metrics.f1_score, metrics.support
            ));
        }
        output
    }
}

/// Receiver operating characteristic points, one per kept threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decreasing score thresholds; the first is always infinite
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve by the trapezoidal rule; NaN if the curve is undefined
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum()
    }
}

/// ROC curve of `scores` against `ground_truth == positive`
///
/// Thresholds are the distinct scores in decreasing order. Points that lie
/// on a straight segment between their neighbours are dropped, and a
/// starting point `(0, 0)` with an infinite threshold is prepended. If one
/// class is absent its rate is undefined and comes out as NaN.
pub fn roc_curve(ground_truth: &[Label], scores: &[f64], positive: Label) -> Result<RocCurve> {
    if ground_truth.len() != scores.len() {
        return Err(ClassifierError::DimensionMismatch {
            expected: ground_truth.len(),
            found: scores.len(),
        });
    }
    if ground_truth.is_empty() {
        return Err(ClassifierError::empty_dataset("cannot compute a ROC curve without samples"));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    // Cumulative counts at the last index of each distinct score
    let mut tps: Vec<f64> = Vec::new();
    let mut fps: Vec<f64> = Vec::new();
    let mut thresholds: Vec<f64> = Vec::new();
    let mut tp = 0.0;
    let mut fp = 0.0;
    for (k, &i) in order.iter().enumerate() {
        if ground_truth[i] == positive {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_run = order.get(k + 1).map_or(true, |&next| scores[next] != scores[i]);
        if last_of_run {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[i]);
        }
    }

    if tps.len() > 2 {
        let n = tps.len();
        let keep: Vec<usize> = (0..n)
            .filter(|&k| {
                k == 0
                    || k == n - 1
                    || fps[k - 1] - 2.0 * fps[k] + fps[k + 1] != 0.0
                    || tps[k - 1] - 2.0 * tps[k] + tps[k + 1] != 0.0
            })
            .collect();
        tps = keep.iter().map(|&k| tps[k]).collect();
        fps = keep.iter().map(|&k| fps[k]).collect();
        thresholds = keep.iter().map(|&k| thresholds[k]).collect();
    }

    tps.insert(0, 0.0);
    fps.insert(0, 0.0);
    thresholds.insert(0, f64::INFINITY);

    let total_fp = fp;
    let total_tp = tp;
    if total_fp == 0.0 {
        tracing::warn!("No negative samples in ground truth, false positive rate is undefined");
    }
    if total_tp == 0.0 {
        tracing::warn!("No positive samples in ground truth, true positive rate is undefined");
    }

    let rate = |count: f64, total: f64| if total > 0.0 { count / total } else { f64::NAN };
    Ok(RocCurve {
        fpr: fps.iter().map(|v| rate(*v, total_fp)).collect(),
        tpr: tps.iter().map(|v| rate(*v, total_tp)).collect(),
        thresholds,
    })
}

/// Outcome of evaluating a trained classifier on one subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub precision: f64,
    pub recall: f64,
    pub accuracy: f64,
    pub roc: RocCurve,
    pub report: ClassificationReport,
}

impl TestResults {
    /// Score predicted labels, which also serve as the ROC scores
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Result<Self> {
        let report = ClassificationReport::from_predictions(predictions, ground_truth, Label::POSITIVE)?;
        let scores: Vec<f64> = predictions.iter().map(|l| l.0 as f64).collect();
        let roc = roc_curve(ground_truth, &scores, Label::POSITIVE)?;
        Ok(Self {
            precision: report.precision,
            recall: report.recall,
            accuracy: report.accuracy,
            roc,
            report,
        })
    }

    /// Format as human-readable string
    pub fn format(&self) -> String {
        let mut output = self.report.format();
        output.push_str(&format!("\nROC AUC:           {:.4}\n", self.roc.auc()));
        output.push_str("ROC points (fpr, tpr, threshold):\n");
        for ((fpr, tpr), threshold) in self.roc.fpr.iter().zip(&self.roc.tpr).zip(&self.roc.thresholds) {
            output.push_str(&format!("  ({:.4}, {:.4}, {})\n", fpr, tpr, threshold));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[i64]) -> Vec<Label> {
        values.iter().map(|v| Label(*v)).collect()
    }

    #[test]
    fn test_confusion_matrix_perfect() {
        let truth = labels(&[1, 1, 0, 0]);
        let cm = ConfusionMatrix::from_predictions(&truth, &truth, Label::POSITIVE).unwrap();

        assert_eq!(cm.tp, 2);
        assert_eq!(cm.tn, 2);
        assert_eq!(cm.fp, 0);
        assert_eq!(cm.fn_, 0);
        assert!((cm.f1_score() - 1.0).abs() < 1e-6);
        assert!((cm.mcc() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_confusion_matrix_worst() {
        let predictions = labels(&[0, 0, 1, 1]);
        let truth = labels(&[1, 1, 0, 0]);
        let cm = ConfusionMatrix::from_predictions(&predictions, &truth, Label::POSITIVE).unwrap();

        assert_eq!(cm.fp, 2);
        assert_eq!(cm.fn_, 2);
        assert!((cm.mcc() - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_always_positive_predictions() {
        let truth = labels(&[1, 1, 1, 0, 0]);
        let predictions = labels(&[1, 1, 1, 1, 1]);
        let results = TestResults::from_predictions(&predictions, &truth).unwrap();

        assert!((results.accuracy - 0.6).abs() < 1e-6);
        assert!((results.recall - 1.0).abs() < 1e-6);
        assert!((results.precision - 0.6).abs() < 1e-6);

        assert_eq!(results.roc.fpr, vec![0.0, 1.0]);
        assert_eq!(results.roc.tpr, vec![0.0, 1.0]);
        assert!(results.roc.thresholds[0].is_infinite());
        assert_eq!(results.roc.thresholds[1], 1.0);
        assert!((results.roc.auc() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_roc_perfect_scores() {
        let truth = labels(&[1, 1, 0, 0]);
        let roc = roc_curve(&truth, &[0.9, 0.8, 0.2, 0.1], Label::POSITIVE).unwrap();

        // The (0.5, 1) point at 0.2 lies on a straight segment and is dropped
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 0.5, 1.0, 1.0]);
        assert_eq!(&roc.thresholds[1..], &[0.9, 0.8, 0.1]);
        assert!((roc.auc() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_roc_with_nan_score() {
        let truth = labels(&[1, 0, 1, 0]);
        let roc = roc_curve(&truth, &[0.9, f64::NAN, 0.4, 0.1], Label::POSITIVE).unwrap();
        assert_eq!(roc.fpr.len(), roc.tpr.len());
        assert_eq!(roc.fpr.len(), roc.thresholds.len());
        assert_eq!(roc.tpr.last().copied(), Some(1.0));
    }

    #[test]
    fn test_roc_single_class_is_nan() {
        let truth = labels(&[1, 1]);
        let roc = roc_curve(&truth, &[1.0, 0.0], Label::POSITIVE).unwrap();
        assert!(roc.fpr.iter().all(|v| v.is_nan()));
        assert_eq!(roc.tpr, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_roc_rejects_empty_input() {
        assert!(matches!(
            roc_curve(&[], &[], Label::POSITIVE),
            Err(ClassifierError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_multiclass_policy() {
        let truth = labels(&[1, 2, 2, 0]);
        let predictions = labels(&[1, 2, 0, 0]);
        let report = ClassificationReport::from_predictions(&predictions, &truth, Label::POSITIVE).unwrap();

        assert!((report.accuracy - 0.75).abs() < 1e-6);
        assert!((report.precision - 1.0).abs() < 1e-6);
        assert!((report.recall - 1.0).abs() < 1e-6);

        let two = &report.per_class[&Label(2)];
        assert!((two.precision - 1.0).abs() < 1e-6);
        assert!((two.recall - 0.5).abs() < 1e-6);
        assert_eq!(two.support, 2);
        assert!((report.per_class[&Label(0)].precision - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_length_mismatch() {
        let err = accuracy_score(&labels(&[1]), &labels(&[1, 0])).unwrap_err();
        assert!(matches!(err, ClassifierError::DimensionMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_results_format() {
        let truth = labels(&[1, 0, 0, 1]);
        let predictions = labels(&[1, 0, 1, 1]);
        let formatted = TestResults::from_predictions(&predictions, &truth).unwrap().format();

        assert!(formatted.contains("Classification Report"));
        assert!(formatted.contains("Confusion Matrix"));
        assert!(formatted.contains("ROC AUC"));
    }
}
