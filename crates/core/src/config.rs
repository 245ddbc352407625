//! Run configuration
//!
//! The pipeline entry point takes an explicit configuration value instead
//! of reading globals; bounds are checked once at the boundary.

use crate::error::{Error, Result};
use crate::region::validate_region_id;

/// Configuration for one pipeline run (training or inference)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Analysis year
    pub year: i32,
    /// Target region id, 1..=35
    pub region: u8,
}

impl RunConfig {
    /// Create a configuration, validating the region id immediately
    pub fn new(year: i32, region: u8) -> Result<Self> {
        validate_region_id(region)?;
        Ok(Self { year, region })
    }

    /// Validate the year against the available composite span
    pub fn validate_year(&self, first_year: i32, last_year: i32) -> Result<()> {
        if self.year < first_year || self.year > last_year {
            return Err(Error::InvalidParameter {
                name: "year",
                value: self.year.to_string(),
                reason: format!("outside composite span {first_year}..={last_year}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_checked_at_construction() {
        assert!(RunConfig::new(2020, 0).is_err());
        assert!(RunConfig::new(2020, 36).is_err());
        assert!(RunConfig::new(2020, 12).is_ok());
    }

    #[test]
    fn test_year_bounds() {
        let cfg = RunConfig::new(2025, 3).unwrap();
        assert!(cfg.validate_year(2000, 2024).is_err());
        assert!(cfg.validate_year(2000, 2025).is_ok());
    }
}
