//! Imagery analysis algorithms
//!
//! Spectral index derivation on yearly composites:
//! - Normalized differences: NBR, NDVI, NDMI, NDBI
//! - Ratio and difference forms: RVI, DVI
//! - Soil/atmosphere adjusted: SAVI, EVI

mod indices;

pub use indices::{
    add_indices, normalized_difference, ratio_index, INDEX_BANDS, INDEX_SCALE,
    BAND_BLUE, BAND_NIR, BAND_RED, BAND_SWIR1, BAND_SWIR2,
};
