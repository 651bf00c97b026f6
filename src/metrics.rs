//! Binary classification metrics
//!
//! Predictions are continuous scores in `[0, 1]`; hard calls use
//! `score > DECISION_THRESHOLD`. Zero denominators yield `0.0`, matching
//! the usual "zero division" convention.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scores strictly above this are called positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// 2x2 confusion counts for the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryConfusion {
    /// Predicted positive, actually positive
    pub true_positives: usize,
    /// Predicted positive, actually negative
    pub false_positives: usize,
    /// Predicted negative, actually negative
    pub true_negatives: usize,
    /// Predicted negative, actually positive
    pub false_negatives: usize,
}

impl BinaryConfusion {
    /// Count outcomes of hard predictions against ground truth.
    #[must_use]
    pub fn from_predictions(y_pred: &[bool], y_true: &[bool]) -> Self {
        let mut cm = Self::default();
        for (&p, &t) in y_pred.iter().zip(y_true) {
            match (p, t) {
                (true, true) => cm.true_positives += 1,
                (true, false) => cm.false_positives += 1,
                (false, false) => cm.true_negatives += 1,
                (false, true) => cm.false_negatives += 1,
            }
        }
        cm
    }

    /// Total number of samples.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// Fraction of correct calls.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// TP / (TP + FP).
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN).
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Hard calls from continuous scores.
#[must_use]
pub fn threshold(scores: &[f64]) -> Vec<bool> {
    scores.iter().map(|&s| s > DECISION_THRESHOLD).collect()
}

/// F1 of thresholded scores.
///
/// # Errors
///
/// Returns error if lengths differ.
pub fn f1_score(y_true: &[bool], scores: &[f64]) -> Result<f64> {
    check_lengths(y_true, scores)?;
    Ok(BinaryConfusion::from_predictions(&threshold(scores), y_true).f1())
}

/// Area under the ROC curve via the rank statistic.
///
/// Equivalent to the probability that a random positive scores above a
/// random negative; tied scores receive their average rank.
///
/// # Errors
///
/// Returns error if lengths differ or only one class is present.
#[allow(clippy::cast_precision_loss)]
pub fn roc_auc_score(y_true: &[bool], scores: &[f64]) -> Result<f64> {
    check_lengths(y_true, scores)?;

    let n_pos = y_true.iter().filter(|&&t| t).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(Error::InvalidInput(
            "ROC AUC is undefined when only one class is present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie group i..=j
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = ranks
        .iter()
        .zip(y_true)
        .filter(|(_, &t)| t)
        .map(|(r, _)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

fn check_lengths(y_true: &[bool], scores: &[f64]) -> Result<()> {
    if y_true.len() != scores.len() {
        return Err(Error::InvalidInput(format!(
            "Length mismatch: {} labels, {} predictions",
            y_true.len(),
            scores.len()
        )));
    }
    if y_true.is_empty() {
        return Err(Error::InvalidInput("No samples to score".to_string()));
    }
    Ok(())
}

/// The two metrics the promotion gate compares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// F1 of thresholded predictions
    pub f1: f64,
    /// ROC AUC of continuous predictions
    pub roc_auc: f64,
}

impl ModelMetrics {
    /// Score predictions against labels.
    ///
    /// # Errors
    ///
    /// Returns error if lengths differ or labels hold a single class.
    pub fn evaluate(y_true: &[bool], scores: &[f64]) -> Result<Self> {
        Ok(Self {
            f1: f1_score(y_true, scores)?,
            roc_auc: roc_auc_score(y_true, scores)?,
        })
    }

    /// Both metrics strictly greater than `other`'s.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        self.f1 > other.f1 && self.roc_auc > other.roc_auc
    }
}

/// Full evaluation of one split, logged by the training pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Fraction of correct calls
    pub accuracy: f64,
    /// Positive predictive value
    pub precision: f64,
    /// True positive rate
    pub recall: f64,
    /// F1 score
    pub f1: f64,
    /// ROC AUC
    pub roc_auc: f64,
}

impl ClassificationReport {
    /// Score predictions against labels.
    ///
    /// # Errors
    ///
    /// Returns error if lengths differ or labels hold a single class.
    pub fn evaluate(y_true: &[bool], scores: &[f64]) -> Result<Self> {
        check_lengths(y_true, scores)?;
        let cm = BinaryConfusion::from_predictions(&threshold(scores), y_true);
        Ok(Self {
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1: cm.f1(),
            roc_auc: roc_auc_score(y_true, scores)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_confusion_counts() {
        let cm = BinaryConfusion::from_predictions(
            &[true, true, false, false],
            &[true, false, false, true],
        );
        assert_eq!(cm.true_positives, 1);
        assert_eq!(cm.false_positives, 1);
        assert_eq!(cm.true_negatives, 1);
        assert_eq!(cm.false_negatives, 1);
        assert!(approx(cm.accuracy(), 0.5));
        assert!(approx(cm.f1(), 0.5));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(threshold(&[0.5, 0.500_001, 0.2]), vec![false, true, false]);
    }

    #[test]
    fn test_f1_no_positive_predictions() {
        let f1 = f1_score(&[true, false], &[0.1, 0.2]).unwrap();
        assert!(approx(f1, 0.0));
    }

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        let y = [false, false, true, true];
        assert!(approx(roc_auc_score(&y, &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0));
        assert!(approx(roc_auc_score(&y, &[0.9, 0.8, 0.2, 0.1]).unwrap(), 0.0));
    }

    #[test]
    fn test_roc_auc_known_value() {
        // sklearn: roc_auc_score([0, 0, 1, 1], [0.1, 0.4, 0.35, 0.8]) == 0.75
        let auc = roc_auc_score(&[false, false, true, true], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!(approx(auc, 0.75));
    }

    #[test]
    fn test_roc_auc_ties_average() {
        let auc = roc_auc_score(&[false, true], &[0.5, 0.5]).unwrap();
        assert!(approx(auc, 0.5));
    }

    #[test]
    fn test_roc_auc_single_class_errors() {
        assert!(roc_auc_score(&[true, true], &[0.1, 0.9]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(f1_score(&[true], &[0.1, 0.2]).is_err());
        assert!(ModelMetrics::evaluate(&[], &[]).is_err());
    }

    #[test]
    fn test_dominates_is_strict_on_both() {
        let prod = ModelMetrics { f1: 0.70, roc_auc: 0.80 };
        let better_f1_only = ModelMetrics { f1: 0.75, roc_auc: 0.78 };
        let equal_auc = ModelMetrics { f1: 0.75, roc_auc: 0.80 };
        let both = ModelMetrics { f1: 0.71, roc_auc: 0.81 };

        assert!(!better_f1_only.dominates(&prod));
        assert!(!equal_auc.dominates(&prod));
        assert!(both.dominates(&prod));
    }

    #[test]
    fn test_classification_report() {
        let report = ClassificationReport::evaluate(
            &[true, false, true, false],
            &[0.9, 0.1, 0.4, 0.6],
        )
        .unwrap();
        assert!(approx(report.accuracy, 0.5));
        assert!(approx(report.precision, 0.5));
        assert!(approx(report.recall, 0.5));
        assert!(approx(report.roc_auc, 0.75));
    }
}
