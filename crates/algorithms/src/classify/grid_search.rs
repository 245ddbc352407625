//! Hyperparameter grid search
//!
//! Enumerates the Cartesian product of class-target triples and ensemble
//! configurations, trains one forest per combination on its own
//! deterministic split, and scores it against the held-out pool. The
//! default grid is 9 x 9 = 81 combinations. Combinations are independent
//! and evaluated in parallel; selection among the scored records is left
//! to the caller.

use super::forest::{split_var_count, ForestParams, RandomForest};
use super::metrics::ConfusionMatrix;
use super::sampling::{oversample, split_samples, SPLIT_SEED_OFFSET};
use crate::maybe_rayon::*;
use serde::Serialize;
use taigamap_core::{Error, Result, SamplePoint};

/// One ensemble hyperparameter setting
#[derive(Debug, Clone, Copy)]
pub struct EnsembleConfig {
    pub trees: usize,
    pub min_leaf: usize,
    pub bag_fraction: f64,
    /// Fraction feeding the split-variable count, see [`split_var_count`]
    pub split_fraction: f64,
}

/// The full search space: class-target triples crossed with ensemble
/// configurations.
#[derive(Debug, Clone)]
pub struct HyperGrid {
    pub targets: Vec<[usize; 3]>,
    pub ensembles: Vec<EnsembleConfig>,
}

impl Default for HyperGrid {
    fn default() -> Self {
        let targets = vec![
            [100, 100, 100],
            [150, 150, 150],
            [200, 200, 200],
            [250, 250, 250],
            [300, 300, 300],
            [100, 150, 200],
            [200, 150, 100],
            [150, 200, 250],
            [200, 250, 300],
        ];

        let mut ensembles = Vec::with_capacity(9);
        for trees in [100, 200, 300] {
            for (min_leaf, bag_fraction, split_fraction) in
                [(1, 0.632, 0.5), (3, 0.632, 0.75), (5, 0.75, 1.0)]
            {
                ensembles.push(EnsembleConfig {
                    trees,
                    min_leaf,
                    bag_fraction,
                    split_fraction,
                });
            }
        }

        Self { targets, ensembles }
    }
}

impl HyperGrid {
    /// Enumerate every combination, numbered by grid position
    pub fn combinations(&self) -> Vec<Combination> {
        let mut out = Vec::with_capacity(self.targets.len() * self.ensembles.len());
        for targets in &self.targets {
            for ensemble in &self.ensembles {
                out.push(Combination {
                    iteration: out.len(),
                    targets: *targets,
                    ensemble: *ensemble,
                });
            }
        }
        out
    }
}

/// One point of the grid, identified by its enumeration position
#[derive(Debug, Clone, Copy)]
pub struct Combination {
    pub iteration: usize,
    pub targets: [usize; 3],
    pub ensemble: EnsembleConfig,
}

/// Scored result of one combination, shaped for the CSV report
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    pub region: u8,
    pub iteration: usize,
    pub target_1: usize,
    pub target_2: usize,
    pub target_3: usize,
    pub trees: usize,
    pub min_leaf: usize,
    pub bag_fraction: f64,
    pub split_fraction: f64,
    pub split_vars: usize,
    pub accuracy: f64,
    pub kappa: f64,
    /// Producer's accuracies; absent classes serialize as empty fields
    pub recall_0: Option<f64>,
    pub recall_1: Option<f64>,
    pub recall_2: Option<f64>,
    pub recall_3: Option<f64>,
}

/// Evaluate every combination of `grid` on one region's sample pool.
///
/// Samples must already be filtered and parsed. Returns one record per
/// combination; a failed combination fails the whole region run, carrying
/// its region id and iteration index.
pub fn grid_search(
    samples: &[SamplePoint],
    feature_names: &[String],
    region: u8,
    grid: &HyperGrid,
) -> Result<Vec<EvaluationRecord>> {
    if samples.is_empty() {
        return Err(Error::Training {
            region,
            iteration: 0,
            message: "no usable samples after filtering".to_string(),
        });
    }

    grid.combinations()
        .into_par_iter()
        .map(|combination| evaluate(samples, feature_names, region, &combination))
        .collect()
}

fn evaluate(
    samples: &[SamplePoint],
    feature_names: &[String],
    region: u8,
    combination: &Combination,
) -> Result<EvaluationRecord> {
    let iteration = combination.iteration;
    let (mut train, test) = split_samples(samples, iteration);

    if train.is_empty() || test.is_empty() {
        return Err(Error::Training {
            region,
            iteration,
            message: format!(
                "degenerate split: {} train / {} test samples",
                train.len(),
                test.len()
            ),
        });
    }

    oversample(&mut train, combination.targets, region, iteration)?;

    let (train_features, train_labels) = to_matrix(&train, feature_names);
    let (test_features, test_labels) = to_matrix(&test, feature_names);
    if train_features.is_empty() || test_features.is_empty() {
        return Err(Error::Training {
            region,
            iteration,
            message: "no samples carry the full feature subset".to_string(),
        });
    }

    let ensemble = combination.ensemble;
    let split_vars = split_var_count(feature_names.len(), ensemble.split_fraction);
    let forest = RandomForest::fit(
        &train_features,
        &train_labels,
        &ForestParams {
            trees: ensemble.trees,
            min_leaf: ensemble.min_leaf,
            bag_fraction: ensemble.bag_fraction,
            split_vars,
            seed: iteration as u64 + SPLIT_SEED_OFFSET,
        },
    )?;

    let predicted: Vec<i32> = test_features.iter().map(|f| forest.predict(f)).collect();
    let matrix = ConfusionMatrix::from_pairs(&test_labels, &predicted);

    Ok(EvaluationRecord {
        region,
        iteration,
        target_1: combination.targets[0],
        target_2: combination.targets[1],
        target_3: combination.targets[2],
        trees: ensemble.trees,
        min_leaf: ensemble.min_leaf,
        bag_fraction: ensemble.bag_fraction,
        split_fraction: ensemble.split_fraction,
        split_vars,
        accuracy: matrix.accuracy(),
        kappa: matrix.kappa(),
        recall_0: matrix.recall(0),
        recall_1: matrix.recall(1),
        recall_2: matrix.recall(2),
        recall_3: matrix.recall(3),
    })
}

/// Rows that carry every requested feature, as parallel matrices
fn to_matrix(samples: &[SamplePoint], names: &[String]) -> (Vec<Vec<f64>>, Vec<i32>) {
    let mut features = Vec::with_capacity(samples.len());
    let mut labels = Vec::with_capacity(samples.len());
    for sample in samples {
        if let Some(vector) = sample.to_vector(names) {
            features.push(vector);
            labels.push(sample.label);
        }
    }
    (features, labels)
}
