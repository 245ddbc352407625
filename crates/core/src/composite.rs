//! Yearly multi-band composite imagery
//!
//! A `Composite` is one year's cloud-free aggregate image: a set of named
//! single-band rasters sharing one shape and transform. A `CompositeSeries`
//! orders composites by year; gaps are permitted and propagate as missing
//! data into any statistic that needs the absent year.

use crate::error::{Error, Result};
use crate::raster::Raster;
use std::collections::BTreeMap;

/// One year's multi-band composite image.
#[derive(Debug, Clone)]
pub struct Composite {
    year: i32,
    shape: (usize, usize),
    bands: Vec<(String, Raster<f64>)>,
}

impl Composite {
    /// Create an empty composite for a year with a fixed shape
    pub fn new(year: i32, rows: usize, cols: usize) -> Self {
        Self {
            year,
            shape: (rows, cols),
            bands: Vec::new(),
        }
    }

    /// Acquisition year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Add a named band. Fails on shape mismatch or duplicate name.
    pub fn add_band(&mut self, name: impl Into<String>, raster: Raster<f64>) -> Result<()> {
        let name = name.into();
        if raster.shape() != self.shape {
            return Err(Error::SizeMismatch {
                expected_rows: self.shape.0,
                expected_cols: self.shape.1,
                actual_rows: raster.rows(),
                actual_cols: raster.cols(),
            });
        }
        if self.contains(&name) {
            return Err(Error::DuplicateBand(name));
        }
        self.bands.push((name, raster));
        Ok(())
    }

    /// Look up a band by name
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
            .ok_or_else(|| Error::MissingBand(name.to_string()))
    }

    /// Whether the composite contains a band
    pub fn contains(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    /// Band names in insertion order
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// A year-ordered sequence of composites.
#[derive(Debug, Clone, Default)]
pub struct CompositeSeries {
    composites: BTreeMap<i32, Composite>,
}

impl CompositeSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a composite, keyed by its year. Replaces any existing year.
    pub fn insert(&mut self, composite: Composite) {
        self.composites.insert(composite.year(), composite);
    }

    /// Get the composite for a year, if present
    pub fn get(&self, year: i32) -> Option<&Composite> {
        self.composites.get(&year)
    }

    /// Get the composite for a year, erroring on a gap
    pub fn require(&self, year: i32) -> Result<&Composite> {
        self.get(year).ok_or(Error::MissingYear(year))
    }

    /// Get a band raster for a year, if both year and band are present
    pub fn band(&self, year: i32, name: &str) -> Option<&Raster<f64>> {
        self.get(year).and_then(|c| c.band(name).ok())
    }

    /// Years present, ascending
    pub fn years(&self) -> Vec<i32> {
        self.composites.keys().copied().collect()
    }

    /// First and last year present
    pub fn span(&self) -> Option<(i32, i32)> {
        let first = self.composites.keys().next()?;
        let last = self.composites.keys().next_back()?;
        Some((*first, *last))
    }

    /// Number of composites
    pub fn len(&self) -> usize {
        self.composites.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.composites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup_band() {
        let mut c = Composite::new(2020, 4, 4);
        c.add_band("nir", Raster::filled(4, 4, 0.5)).unwrap();
        assert!(c.contains("nir"));
        assert_eq!(c.band("nir").unwrap().get(0, 0).unwrap(), 0.5);
        assert!(matches!(c.band("red"), Err(Error::MissingBand(_))));
    }

    #[test]
    fn test_duplicate_band_rejected() {
        let mut c = Composite::new(2020, 4, 4);
        c.add_band("nir", Raster::filled(4, 4, 0.5)).unwrap();
        assert!(matches!(
            c.add_band("nir", Raster::filled(4, 4, 0.6)),
            Err(Error::DuplicateBand(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut c = Composite::new(2020, 4, 4);
        assert!(c.add_band("nir", Raster::filled(4, 5, 0.5)).is_err());
    }

    #[test]
    fn test_series_gaps() {
        let mut s = CompositeSeries::new();
        s.insert(Composite::new(2018, 2, 2));
        s.insert(Composite::new(2020, 2, 2));

        assert_eq!(s.years(), vec![2018, 2020]);
        assert_eq!(s.span(), Some((2018, 2020)));
        assert!(s.get(2019).is_none());
        assert!(matches!(s.require(2019), Err(Error::MissingYear(2019))));
    }
}
