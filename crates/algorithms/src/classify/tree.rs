//! CART decision tree
//!
//! Binary classification tree grown with Gini impurity, used as the base
//! learner of the random forest. At every node only a random subset of
//! `split_vars` features is considered, which is what decorrelates the
//! ensemble's trees.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        label: i32,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// Minimum sample count allowed in a leaf
    pub min_leaf: usize,
    /// Candidate features considered per split
    pub split_vars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Grow a tree over the rows named by `indices`.
    ///
    /// `features` is row-major, one inner slice per sample. Indices may
    /// repeat (bootstrap bags do).
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[i32],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = features.first().map_or(0, |f| f.len());
        let root = grow(features, labels, indices, n_features, params, rng);
        Self { root }
    }

    pub fn predict(&self, sample: &[f64]) -> i32 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { label } => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn grow(
    features: &[Vec<f64>],
    labels: &[i32],
    indices: &[usize],
    n_features: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Node {
    let counts = label_counts(labels, indices);
    if counts.len() <= 1 || indices.len() < 2 * params.min_leaf {
        return Node::Leaf {
            label: majority(&counts),
        };
    }

    // Random feature subset for this node
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(params.split_vars.max(1).min(n_features));

    match best_split(features, labels, indices, &candidates, params.min_leaf) {
        Some((feature, threshold)) => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| features[i][feature] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(grow(features, labels, &left_idx, n_features, params, rng)),
                right: Box::new(grow(features, labels, &right_idx, n_features, params, rng)),
            }
        }
        None => Node::Leaf {
            label: majority(&counts),
        },
    }
}

/// Best (feature, threshold) by Gini gain over the candidate features.
/// Thresholds are midpoints between consecutive distinct sorted values,
/// and a split must leave `min_leaf` samples on each side.
fn best_split(
    features: &[Vec<f64>],
    labels: &[i32],
    indices: &[usize],
    candidates: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len() as f64;
    let mut best: Option<(usize, f64)> = None;
    let mut best_impurity = gini(&label_counts(labels, indices), indices.len());

    for &feature in candidates {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            features[a][feature]
                .partial_cmp(&features[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left: HashMap<i32, usize> = HashMap::new();
        let mut right = label_counts(labels, indices);

        for split_at in 1..sorted.len() {
            let moved = labels[sorted[split_at - 1]];
            *left.entry(moved).or_insert(0) += 1;
            if let Some(count) = right.get_mut(&moved) {
                *count -= 1;
            }

            if split_at < min_leaf || sorted.len() - split_at < min_leaf {
                continue;
            }

            let lo = features[sorted[split_at - 1]][feature];
            let hi = features[sorted[split_at]][feature];
            if lo == hi {
                continue;
            }

            let weighted = (split_at as f64 / n) * gini(&left, split_at)
                + ((sorted.len() - split_at) as f64 / n)
                    * gini(&right, sorted.len() - split_at);

            if weighted < best_impurity - 1e-12 {
                best_impurity = weighted;
                best = Some((feature, (lo + hi) / 2.0));
            }
        }
    }

    best
}

fn label_counts(labels: &[i32], indices: &[usize]) -> HashMap<i32, usize> {
    let mut counts = HashMap::new();
    for &i in indices {
        *counts.entry(labels[i]).or_insert(0) += 1;
    }
    counts
}

fn gini(counts: &HashMap<i32, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Majority label; ties go to the smallest label for determinism
fn majority(counts: &HashMap<i32, usize>) -> i32 {
    let mut pairs: Vec<(i32, usize)> = counts.iter().map(|(&l, &c)| (l, c)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    pairs.first().map_or(0, |(l, _)| *l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fit_all(features: &[Vec<f64>], labels: &[i32], params: &TreeParams) -> DecisionTree {
        let indices: Vec<usize> = (0..labels.len()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        DecisionTree::fit(features, labels, &indices, params, &mut rng)
    }

    #[test]
    fn test_separable_classes_learned_exactly() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| if i < 10 { vec![0.0 + i as f64 * 0.01] } else { vec![10.0 + i as f64 * 0.01] })
            .collect();
        let labels: Vec<i32> = (0..20).map(|i| if i < 10 { 0 } else { 1 }).collect();

        let tree = fit_all(
            &features,
            &labels,
            &TreeParams {
                min_leaf: 1,
                split_vars: 1,
            },
        );

        assert_eq!(tree.predict(&[0.05]), 0);
        assert_eq!(tree.predict(&[10.05]), 1);
    }

    #[test]
    fn test_pure_node_becomes_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![2, 2, 2];
        let tree = fit_all(
            &features,
            &labels,
            &TreeParams {
                min_leaf: 1,
                split_vars: 1,
            },
        );
        assert_eq!(tree.predict(&[99.0]), 2);
    }

    #[test]
    fn test_min_leaf_blocks_small_splits() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![0, 0, 1, 1];
        // min_leaf of 3 cannot be satisfied by any binary split of 4 samples
        let tree = fit_all(
            &features,
            &labels,
            &TreeParams {
                min_leaf: 3,
                split_vars: 1,
            },
        );
        // Tie between labels breaks to the smaller one
        assert_eq!(tree.predict(&[0.0]), 0);
        assert_eq!(tree.predict(&[3.0]), 0);
    }
}
