//! Texture extraction
//!
//! - **first_order**: focal mean/stddev over a 3×3 window
//! - **glcm**: gray-level co-occurrence contrast, entropy and correlation
//!
//! Texture is computed once, on the target year's composite only.

mod first_order;
mod glcm;

pub use first_order::{first_order_texture, focal_mean_stddev};
pub use glcm::{glcm, glcm_texture, GlcmBands, GlcmParams};

/// Index bands texture is derived from by default
pub const TEXTURE_BANDS: [&str; 6] = ["nbr", "ndvi", "ndmi", "ndbi", "savi", "evi"];
