//! Random forest ensemble
//!
//! Bootstrap-bagged CART trees with majority voting. Training is fully
//! deterministic for a given seed: tree `i` draws its bag and its split
//! candidates from `StdRng::seed_from_u64(seed + i)`.

use super::tree::{DecisionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use taigamap_core::{Error, Result};

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub trees: usize,
    pub min_leaf: usize,
    /// Fraction of the training set drawn (with replacement) per tree
    pub bag_fraction: f64,
    /// Candidate features per split
    pub split_vars: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 200,
            min_leaf: 1,
            bag_fraction: 0.6,
            split_vars: 4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit the ensemble on row-major training data.
    pub fn fit(features: &[Vec<f64>], labels: &[i32], params: &ForestParams) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::Algorithm(
                "Random forest requires at least one training sample".into(),
            ));
        }
        if features.len() != labels.len() {
            return Err(Error::Algorithm(format!(
                "Feature rows ({}) and labels ({}) differ",
                features.len(),
                labels.len()
            )));
        }
        if params.trees == 0 {
            return Err(Error::InvalidParameter {
                name: "trees",
                value: "0".to_string(),
                reason: "ensemble needs at least one tree".to_string(),
            });
        }
        if !(params.bag_fraction > 0.0 && params.bag_fraction <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "bag_fraction",
                value: params.bag_fraction.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }

        let n_features = features[0].len();
        let tree_params = TreeParams {
            min_leaf: params.min_leaf.max(1),
            split_vars: params.split_vars,
        };
        let bag_size = ((features.len() as f64 * params.bag_fraction).round() as usize).max(1);

        let trees = (0..params.trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let bag: Vec<usize> = (0..bag_size)
                    .map(|_| rng.gen_range(0..features.len()))
                    .collect();
                DecisionTree::fit(features, labels, &bag, &tree_params, &mut rng)
            })
            .collect();

        Ok(Self { trees, n_features })
    }

    /// Majority vote over the trees; ties go to the smallest label
    pub fn predict(&self, sample: &[f64]) -> i32 {
        let mut votes: BTreeMap<i32, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(sample)).or_insert(0) += 1;
        }
        votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map_or(0, |(label, _)| label)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Persist the model as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)
            .map_err(|e| Error::Other(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Other(e.to_string()))
    }
}

/// Split-variable count from a feature count and split fraction:
/// `floor(sqrt(n_features * fraction))`, at least 1.
pub fn split_var_count(n_features: usize, split_fraction: f64) -> usize {
    ((n_features as f64 * split_fraction).sqrt().floor() as usize).max(1)
}
