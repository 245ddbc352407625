//! Classifier training and model selection
//!
//! Sample preparation, the random forest itself, evaluation metrics, and
//! the per-region hyperparameter grid search with CSV reporting.

pub mod forest;
pub mod grid_search;
pub mod metrics;
pub mod report;
pub mod sampling;
pub mod tree;

pub use forest::{split_var_count, ForestParams, RandomForest};
pub use grid_search::{grid_search, Combination, EnsembleConfig, EvaluationRecord, HyperGrid};
pub use metrics::ConfusionMatrix;
pub use report::{write_records, write_records_to_path};
pub use sampling::{
    filter_and_parse, oversample, split_samples, FilterParams, SPLIT_SEED_OFFSET, TRAIN_FRACTION,
};
pub use tree::{DecisionTree, TreeParams};
