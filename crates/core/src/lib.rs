//! # Taigamap Core
//!
//! Core types for the taigamap forest-disturbance mapping pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced raster grid
//! - `Composite` / `CompositeSeries`: yearly multi-band composite imagery
//! - `SamplePoint`: labeled training samples with lenient value coercion
//! - `Region` / `RegionRegistry`: per-ecoregion feature subsets and samples
//! - `RunConfig`: validated pipeline entry configuration

pub mod composite;
pub mod config;
pub mod error;
pub mod raster;
pub mod region;
pub mod sample;

pub use composite::{Composite, CompositeSeries};
pub use config::RunConfig;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use region::{validate_region_id, Region, RegionRegistry};
pub use sample::{RawSample, SamplePoint};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::composite::{Composite, CompositeSeries};
    pub use crate::config::RunConfig;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::region::{Region, RegionRegistry};
    pub use crate::sample::{RawSample, SamplePoint};
}
