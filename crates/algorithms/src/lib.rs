//! # Taigamap Algorithms
//!
//! Feature engineering and classification for yearly forest-disturbance
//! mapping.
//!
//! ## Categories
//!
//! - **imagery**: spectral index derivation on composites
//! - **texture**: first-order (focal) and second-order (GLCM) texture
//! - **temporal**: per-index trajectory statistics across a year series
//! - **climate**: annual precipitation/temperature feature assembly
//! - **terrain**: elevation, slope and aspect (static per domain)
//! - **assemble**: feature-stack concatenation, subset selection, masking
//! - **classify**: random forest training, oversampling, grid search
//! - **predict**: tiled classification of an assembled stack
//! - **smooth**: categorical majority filtering

pub mod assemble;
pub mod classify;
pub mod climate;
pub mod imagery;
mod maybe_rayon;
pub mod predict;
pub mod smooth;
pub mod temporal;
pub mod terrain;
pub mod texture;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::assemble::{apply_masks, FeatureStack};
    pub use crate::classify::{
        grid_search, ConfusionMatrix, EnsembleConfig, EvaluationRecord, HyperGrid, RandomForest,
    };
    pub use crate::climate::{climate_features, MonthlyClimate};
    pub use crate::imagery::{add_indices, INDEX_BANDS};
    pub use crate::predict::{classify_and_smooth, classify_stack, PredictParams, NODATA_LABEL};
    pub use crate::smooth::majority_filter;
    pub use crate::temporal::{trajectory_features, TrajectoryParams, ZeroDenominator};
    pub use crate::terrain::terrain_features;
    pub use crate::texture::{first_order_texture, glcm_texture, GlcmParams, TEXTURE_BANDS};
    pub use taigamap_core::prelude::*;
}
