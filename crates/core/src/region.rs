//! Ecoregion registry
//!
//! Regions partition the study domain. Each region carries its geometry
//! (as a boolean membership mask), its fixed optimal-feature subset, its
//! sample library and, after training, a reference to its selected model.
//! A single registry keyed by numeric id replaces per-region hardcoded
//! lookups.

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::sample::RawSample;
use std::collections::HashMap;

/// Highest valid region id
pub const MAX_REGION_ID: u8 = 35;

/// One ecoregion's configuration and data
#[derive(Debug, Clone)]
pub struct Region {
    /// Region id, 1..=35
    pub id: u8,
    /// Ordered optimal feature subset, fixed per region
    pub features: Vec<String>,
    /// Membership mask over the domain (nonzero = inside region)
    pub mask: Option<Raster<u8>>,
    /// Curated sample library, consumed read-only by training
    pub samples: Vec<RawSample>,
    /// Reference to the selected trained classifier, if any
    pub model_ref: Option<String>,
}

impl Region {
    /// Create a region with a feature subset and no data attached yet
    pub fn new(id: u8, features: Vec<String>) -> Result<Self> {
        validate_region_id(id)?;
        Ok(Self {
            id,
            features,
            mask: None,
            samples: Vec::new(),
            model_ref: None,
        })
    }
}

/// Registry of all regions, keyed by id
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: HashMap<u8, Region>,
}

impl RegionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region, replacing any previous entry with the same id
    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.id, region);
    }

    /// Look up a region by id
    pub fn get(&self, id: u8) -> Result<&Region> {
        validate_region_id(id)?;
        self.regions
            .get(&id)
            .ok_or_else(|| Error::InvalidParameter {
                name: "region",
                value: id.to_string(),
                reason: "not registered".to_string(),
            })
    }

    /// Number of registered regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Check a region id against the valid range 1..=35
pub fn validate_region_id(id: u8) -> Result<()> {
    if id == 0 || id > MAX_REGION_ID {
        return Err(Error::InvalidParameter {
            name: "region",
            value: id.to_string(),
            reason: format!("must be in 1..={MAX_REGION_ID}"),
        });
    }
    Ok(())
}
