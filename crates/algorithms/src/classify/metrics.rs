//! Classification evaluation metrics
//!
//! Confusion matrix over all observed label values, with overall accuracy,
//! Cohen's kappa, and per-class recall (producer's accuracy).

use std::collections::BTreeSet;

/// Confusion matrix built from paired observed/predicted labels.
///
/// The label axis is the sorted union of labels seen on either side, so a
/// class the classifier never emits is still a column of zeros.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    labels: Vec<i32>,
    /// counts[observed][predicted]
    counts: Vec<Vec<usize>>,
    total: usize,
}

impl ConfusionMatrix {
    pub fn from_pairs(observed: &[i32], predicted: &[i32]) -> Self {
        let labels: Vec<i32> = observed
            .iter()
            .chain(predicted.iter())
            .copied()
            .collect::<BTreeSet<i32>>()
            .into_iter()
            .collect();

        let index = |label: i32| labels.iter().position(|&l| l == label);

        let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
        for (&obs, &pred) in observed.iter().zip(predicted.iter()) {
            if let (Some(i), Some(j)) = (index(obs), index(pred)) {
                counts[i][j] += 1;
            }
        }

        Self {
            labels,
            counts,
            total: observed.len().min(predicted.len()),
        }
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Overall accuracy: diagonal mass over total
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.labels.len()).map(|i| self.counts[i][i]).sum();
        correct as f64 / self.total as f64
    }

    /// Cohen's kappa. Degenerate chance agreement of 1 yields 0.
    pub fn kappa(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let n = self.total as f64;
        let po = self.accuracy();
        let pe: f64 = (0..self.labels.len())
            .map(|i| {
                let row: usize = self.counts[i].iter().sum();
                let col: usize = self.counts.iter().map(|r| r[i]).sum();
                (row as f64 / n) * (col as f64 / n)
            })
            .sum();

        if (1.0 - pe).abs() < f64::EPSILON {
            return 0.0;
        }
        (po - pe) / (1.0 - pe)
    }

    /// Producer's accuracy for one class. `None` when the class was never
    /// observed in the test pool, which leaves recall undefined.
    pub fn recall(&self, label: i32) -> Option<f64> {
        let i = self.labels.iter().position(|&l| l == label)?;
        let row_total: usize = self.counts[i].iter().sum();
        if row_total == 0 {
            return None;
        }
        Some(self.counts[i][i] as f64 / row_total as f64)
    }
}
