//! One-vs-rest evaluation of predictions against ground truth.
//!
//! Every prediction updates the confusion counts of every label, so for each
//! label `TP + TN + FP + FN` equals the number of predictions. Ratios whose
//! denominator is zero are reported as `None` (`null` once serialized).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::AddAssign;

use crate::classify::Prediction;
use crate::error::{BayesError, Result};

/// Row identity to true label.
pub type GroundTruth = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub actual: u64,
    pub predicted: u64,
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
}

impl ConfusionCounts {
    pub fn sum(&self) -> u64 {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Derives the per-label metrics given the number of predictions tallied.
    pub fn metrics(&self, total: u64) -> LabelStats {
        let tp = self.true_positive as f64;
        let tn = self.true_negative as f64;

        let precision = ratio(tp, self.true_positive + self.false_positive);
        let recall = ratio(tp, self.true_positive + self.false_negative);
        let f_measure = match (precision, recall) {
            (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        };

        LabelStats {
            counts: *self,
            sum: self.sum(),
            accuracy: ratio(tp + tn, total),
            sensitivity: ratio(tp, self.actual),
            specificity: ratio(tn, total.saturating_sub(self.actual)),
            precision,
            recall,
            f_measure,
        }
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, other: Self) {
        self.actual += other.actual;
        self.predicted += other.predicted;
        self.true_positive += other.true_positive;
        self.true_negative += other.true_negative;
        self.false_positive += other.false_positive;
        self.false_negative += other.false_negative;
    }
}

fn ratio(numerator: f64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator / denominator as f64)
    }
}

/// Confusion counts of one label plus everything derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    #[serde(flatten)]
    pub counts: ConfusionCounts,
    pub sum: u64,
    pub accuracy: Option<f64>,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f_measure: Option<f64>,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_tested: u64,
    pub correct: u64,
    pub accuracy: f64,
    pub labels: BTreeMap<String, LabelStats>,
}

/// Running confusion counts over a fixed set of labels.
///
/// The label set is fixed when the tally is created, so every recorded pair
/// updates every label. Tallies over the same label set can be merged, so a
/// batch may be split across workers and combined afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    total: u64,
    correct: u64,
    counts: BTreeMap<String, ConfusionCounts>,
}

impl Tally {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Tally {
            total: 0,
            correct: 0,
            counts: labels
                .into_iter()
                .map(|l| (l.into(), ConfusionCounts::default()))
                .collect(),
        }
    }

    /// Records one (predicted, actual) pair. Both labels must belong to the
    /// tally's label set; nothing is counted otherwise.
    pub fn record(&mut self, predicted: &str, actual: &str) -> Result<()> {
        for label in [predicted, actual] {
            if !self.counts.contains_key(label) {
                return Err(BayesError::UnknownLabel(label.to_string()));
            }
        }
        self.total += 1;

        for (label, counts) in self.counts.iter_mut() {
            let is_predicted = label == predicted;
            let is_actual = label == actual;
            if is_predicted {
                counts.predicted += 1;
            }
            if is_actual {
                counts.actual += 1;
            }
            match (is_predicted, is_actual) {
                (true, true) => counts.true_positive += 1,
                (true, false) => counts.false_positive += 1,
                (false, true) => counts.false_negative += 1,
                (false, false) => counts.true_negative += 1,
            }
        }

        if predicted == actual {
            self.correct += 1;
        }
        Ok(())
    }

    /// Adds the counts of a tally kept over the same label set.
    pub fn merge(&mut self, other: Tally) -> Result<()> {
        if !self.counts.keys().eq(other.counts.keys()) {
            return Err(BayesError::LabelSetMismatch);
        }
        self.total += other.total;
        self.correct += other.correct;
        for (counts, other) in self.counts.values_mut().zip(other.counts.into_values()) {
            *counts += other;
        }
        Ok(())
    }

    pub fn counts(&self, label: &str) -> Option<&ConfusionCounts> {
        self.counts.get(label)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Freezes the tally into metrics.
    pub fn finish(self) -> Result<Stats> {
        if self.total == 0 {
            return Err(BayesError::NoPredictions);
        }

        let total = self.total;
        let labels = self
            .counts
            .into_iter()
            .map(|(label, counts)| (label, counts.metrics(total)))
            .collect();

        Ok(Stats {
            total_tested: total,
            correct: self.correct,
            accuracy: self.correct as f64 / total as f64,
            labels,
        })
    }
}

/// Joins every prediction with its true label and computes the statistics.
///
/// Labels are every value in `ground_truth` plus every predicted label.
pub fn evaluate(predictions: &[Prediction], ground_truth: &GroundTruth) -> Result<Stats> {
    if predictions.is_empty() {
        return Err(BayesError::NoPredictions);
    }

    let pairs = predictions
        .iter()
        .map(|p| {
            ground_truth
                .get(&p.row)
                .map(|actual| (p.label(), actual.as_str()))
                .ok_or_else(|| BayesError::UnknownGroundTruth { row: p.row.clone() })
        })
        .collect::<Result<Vec<_>>>()?;

    let labels: BTreeSet<&str> = ground_truth
        .values()
        .map(String::as_str)
        .chain(predictions.iter().map(Prediction::label))
        .collect();

    let mut tally = Tally::new(labels);
    for (predicted, actual) in pairs {
        tally.record(predicted, actual)?;
    }

    tally.finish()
}
