//! Feature assembly
//!
//! Collects the index, trajectory, texture, climate and terrain bands into a
//! single named stack, restricts it to a region's optimal band subset, and
//! masks it to the region geometry and baseline forest extent. Pixels
//! outside either mask are excluded as missing values, never zero-filled.

use taigamap_core::{Error, Raster, Result};

/// An ordered collection of named single-band rasters sharing one grid.
#[derive(Debug, Clone)]
pub struct FeatureStack {
    names: Vec<String>,
    bands: Vec<Raster<f64>>,
    shape: (usize, usize),
}

impl FeatureStack {
    /// Build a stack from named bands. All bands must share a shape and
    /// names must be unique.
    pub fn from_bands(bands: Vec<(String, Raster<f64>)>) -> Result<Self> {
        let shape = bands
            .first()
            .map(|(_, r)| r.shape())
            .ok_or_else(|| Error::Algorithm("feature stack needs at least one band".to_string()))?;

        let mut stack = Self {
            names: Vec::with_capacity(bands.len()),
            bands: Vec::with_capacity(bands.len()),
            shape,
        };
        stack.extend(bands)?;
        Ok(stack)
    }

    /// Append more bands, with the same shape and uniqueness checks
    pub fn extend(&mut self, bands: Vec<(String, Raster<f64>)>) -> Result<()> {
        for (name, raster) in bands {
            if raster.shape() != self.shape {
                return Err(Error::SizeMismatch {
                    expected_rows: self.shape.0,
                    expected_cols: self.shape.1,
                    actual_rows: raster.rows(),
                    actual_cols: raster.cols(),
                });
            }
            if self.names.iter().any(|n| n == &name) {
                return Err(Error::DuplicateBand(name));
            }
            self.names.push(name);
            self.bands.push(raster);
        }
        Ok(())
    }

    /// Restrict the stack to `names`, in request order.
    ///
    /// Requesting a band the stack does not hold is a configuration error
    /// and fails before any per-pixel work.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let mut selected = Self {
            names: Vec::with_capacity(names.len()),
            bands: Vec::with_capacity(names.len()),
            shape: self.shape,
        };
        for name in names {
            let idx = self
                .names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| Error::MissingBand(name.clone()))?;
            selected.names.push(name.clone());
            selected.bands.push(self.bands[idx].clone());
        }
        Ok(selected)
    }

    /// Per-pixel feature vector in band order. `None` when any band is
    /// missing at that pixel.
    pub fn pixel(&self, row: usize, col: usize) -> Option<Vec<f64>> {
        let mut values = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            let v = band.get(row, col).ok()?;
            if !v.is_finite() {
                return None;
            }
            values.push(v);
        }
        Some(values)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::MissingBand(name.to_string()))?;
        Ok(&self.bands[idx])
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// Exclude pixels outside the region geometry or the baseline forest
/// extent. A mask raster keeps pixels with a nonzero value; `None` skips
/// that mask entirely.
pub fn apply_masks(
    bands: &mut [(String, Raster<f64>)],
    region_mask: Option<&Raster<u8>>,
    forest_mask: Option<&Raster<u8>>,
) -> Result<()> {
    for mask in [region_mask, forest_mask].into_iter().flatten() {
        for (_, band) in bands.iter_mut() {
            if band.shape() != mask.shape() {
                return Err(Error::SizeMismatch {
                    expected_rows: mask.rows(),
                    expected_cols: mask.cols(),
                    actual_rows: band.rows(),
                    actual_cols: band.cols(),
                });
            }
            let (rows, cols) = band.shape();
            for row in 0..rows {
                for col in 0..cols {
                    if unsafe { mask.get_unchecked(row, col) } == 0 {
                        band.set(row, col, f64::NAN)?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, value: f64) -> (String, Raster<f64>) {
        (name.to_string(), Raster::filled(3, 3, value))
    }

    #[test]
    fn test_select_preserves_request_order() {
        let stack =
            FeatureStack::from_bands(vec![named("a", 1.0), named("b", 2.0), named("c", 3.0)])
                .unwrap();
        let subset = stack
            .select(&["c".to_string(), "a".to_string()])
            .unwrap();
        assert_eq!(subset.names(), &["c".to_string(), "a".to_string()]);
        assert_eq!(subset.pixel(1, 1).unwrap(), vec![3.0, 1.0]);
    }

    #[test]
    fn test_select_unknown_band_is_fatal() {
        let stack = FeatureStack::from_bands(vec![named("a", 1.0)]).unwrap();
        assert!(matches!(
            stack.select(&["missing".to_string()]),
            Err(Error::MissingBand(_))
        ));
    }

    #[test]
    fn test_duplicate_band_rejected() {
        assert!(FeatureStack::from_bands(vec![named("a", 1.0), named("a", 2.0)]).is_err());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut stack = FeatureStack::from_bands(vec![named("a", 1.0)]).unwrap();
        assert!(stack
            .extend(vec![("b".to_string(), Raster::filled(2, 2, 0.0))])
            .is_err());
    }

    #[test]
    fn test_pixel_missing_when_any_band_missing() {
        let mut hole = Raster::filled(3, 3, 5.0);
        hole.set(1, 1, f64::NAN).unwrap();
        let stack =
            FeatureStack::from_bands(vec![named("a", 1.0), ("b".to_string(), hole)]).unwrap();
        assert!(stack.pixel(1, 1).is_none());
        assert_eq!(stack.pixel(0, 0).unwrap(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_masks_exclude_rather_than_zero() {
        let mut bands = vec![named("a", 7.0)];
        let mut forest = Raster::filled(3, 3, 1u8);
        forest.set(0, 0, 0).unwrap();
        apply_masks(&mut bands, None, Some(&forest)).unwrap();
        assert!(bands[0].1.get(0, 0).unwrap().is_nan());
        assert_eq!(bands[0].1.get(2, 2).unwrap(), 7.0);
    }
}
