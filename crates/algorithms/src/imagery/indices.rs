//! Spectral indices on yearly composites
//!
//! Each index derives deterministically from a fixed set of reflectance
//! bands. All indices except DVI are scaled by 1000 to keep an
//! integer-friendly dynamic range. Denominator collapse yields NaN
//! (missing), never a crash.

use crate::maybe_rayon::*;
use ndarray::Array2;
use taigamap_core::{Composite, Error, Raster, Result};

/// Reflectance band names expected on a raw composite
pub const BAND_BLUE: &str = "blue";
pub const BAND_RED: &str = "red";
pub const BAND_NIR: &str = "nir";
pub const BAND_SWIR1: &str = "swir1";
pub const BAND_SWIR2: &str = "swir2";

/// Index bands added by [`add_indices`], in derivation order
pub const INDEX_BANDS: [&str; 8] = [
    "nbr", "ndvi", "ndmi", "ndbi", "rvi", "dvi", "savi", "evi",
];

/// Scale factor applied to all indices except DVI
pub const INDEX_SCALE: f64 = 1000.0;

const SAVI_L: f64 = 0.5;

/// Compute the scaled normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b) * scale`
///
/// Pixels where either band is missing, or the denominator collapses,
/// are set to NaN.
pub fn normalized_difference(
    band_a: &Raster<f64>,
    band_b: &Raster<f64>,
    scale: f64,
) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };
                if !a.is_finite() || !b.is_finite() {
                    continue;
                }
                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = (a - b) / sum * scale;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Compute a scaled band ratio: `band_a / band_b * scale`
pub fn ratio_index(band_a: &Raster<f64>, band_b: &Raster<f64>, scale: f64) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };
                if !a.is_finite() || !b.is_finite() || b.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = a / b * scale;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

fn difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };
                if a.is_finite() && b.is_finite() {
                    row_data[col] = a - b;
                }
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Soil Adjusted Vegetation Index (Huete, 1988), scaled:
///
/// `SAVI = (1 + L) * (NIR - Red) / (NIR + Red + L) * 1000`, L = 0.5
fn savi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;

    let (rows, cols) = nir.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };
                if !n.is_finite() || !r.is_finite() {
                    continue;
                }
                let denom = n + r + SAVI_L;
                if denom.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = (1.0 + SAVI_L) * (n - r) / denom * INDEX_SCALE;
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

/// Enhanced Vegetation Index (Huete et al., 2002), scaled:
///
/// `EVI = 2.5 * (NIR - Red) / (NIR + 6*Red - 7.5*Blue + 1) * 1000`
fn evi(nir: &Raster<f64>, red: &Raster<f64>, blue: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;
    check_dimensions(nir, blue)?;

    let (rows, cols) = nir.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };
                let b = unsafe { blue.get_unchecked(row, col) };
                if !n.is_finite() || !r.is_finite() || !b.is_finite() {
                    continue;
                }
                let denom = n + 6.0 * r - 7.5 * b + 1.0;
                if denom.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = 2.5 * (n - r) / denom * INDEX_SCALE;
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

/// Derive all 8 spectral index bands onto a composite.
///
/// Requires the reflectance bands blue, red, nir, swir1 and swir2;
/// a missing band is reported before any pixel work.
pub fn add_indices(composite: &mut Composite) -> Result<()> {
    let blue = composite.band(BAND_BLUE)?.clone();
    let red = composite.band(BAND_RED)?.clone();
    let nir = composite.band(BAND_NIR)?.clone();
    let swir1 = composite.band(BAND_SWIR1)?.clone();
    let swir2 = composite.band(BAND_SWIR2)?.clone();

    composite.add_band("nbr", normalized_difference(&nir, &swir2, INDEX_SCALE)?)?;
    composite.add_band("ndvi", normalized_difference(&nir, &red, INDEX_SCALE)?)?;
    composite.add_band("ndmi", normalized_difference(&nir, &swir1, INDEX_SCALE)?)?;
    composite.add_band("ndbi", normalized_difference(&swir1, &nir, INDEX_SCALE)?)?;
    composite.add_band("rvi", ratio_index(&nir, &red, INDEX_SCALE)?)?;
    composite.add_band("dvi", difference(&nir, &red)?)?;
    composite.add_band("savi", savi(&nir, &red)?)?;
    composite.add_band("evi", evi(&nir, &red, &blue)?)?;

    Ok(())
}

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            expected_rows: a.rows(),
            expected_cols: a.cols(),
            actual_rows: b.rows(),
            actual_cols: b.cols(),
        });
    }
    Ok(())
}

fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_band(value: f64) -> Raster<f64> {
        Raster::filled(5, 5, value)
    }

    fn make_composite(blue: f64, red: f64, nir: f64, swir1: f64, swir2: f64) -> Composite {
        let mut c = Composite::new(2020, 5, 5);
        c.add_band(BAND_BLUE, make_band(blue)).unwrap();
        c.add_band(BAND_RED, make_band(red)).unwrap();
        c.add_band(BAND_NIR, make_band(nir)).unwrap();
        c.add_band(BAND_SWIR1, make_band(swir1)).unwrap();
        c.add_band(BAND_SWIR2, make_band(swir2)).unwrap();
        c
    }

    #[test]
    fn test_ndvi_zero_when_nir_equals_red() {
        let nir = make_band(0.4);
        let red = make_band(0.4);
        let result = normalized_difference(&nir, &red, INDEX_SCALE).unwrap();
        assert_eq!(result.get(2, 2).unwrap(), 0.0);
    }

    #[test]
    fn test_scaled_normalized_difference() {
        let a = make_band(0.8);
        let b = make_band(0.2);
        let result = normalized_difference(&a, &b, INDEX_SCALE).unwrap();
        // (0.8 - 0.2) / 1.0 * 1000 = 600
        assert!((result.get(0, 0).unwrap() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_denominator_is_missing() {
        let a = make_band(0.0);
        let b = make_band(0.0);
        let nd = normalized_difference(&a, &b, INDEX_SCALE).unwrap();
        assert!(nd.get(1, 1).unwrap().is_nan());

        let rv = ratio_index(&a, &b, INDEX_SCALE).unwrap();
        assert!(rv.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_add_indices_bands_present() {
        let mut c = make_composite(0.05, 0.1, 0.5, 0.3, 0.2);
        add_indices(&mut c).unwrap();
        for name in INDEX_BANDS {
            assert!(c.contains(name), "missing index band {name}");
        }
    }

    #[test]
    fn test_add_indices_values() {
        let mut c = make_composite(0.05, 0.1, 0.5, 0.3, 0.2);
        add_indices(&mut c).unwrap();

        let ndvi = c.band("ndvi").unwrap().get(0, 0).unwrap();
        assert!((ndvi - (0.5 - 0.1) / (0.5 + 0.1) * 1000.0).abs() < 1e-9);

        // DVI is the unscaled difference
        let dvi = c.band("dvi").unwrap().get(0, 0).unwrap();
        assert!((dvi - 0.4).abs() < 1e-12);

        let savi = c.band("savi").unwrap().get(0, 0).unwrap();
        let expect = 1.5 * (0.5 - 0.1) / (0.5 + 0.1 + 0.5) * 1000.0;
        assert!((savi - expect).abs() < 1e-9);

        let evi = c.band("evi").unwrap().get(0, 0).unwrap();
        let expect = 2.5 * (0.5 - 0.1) / (0.5 + 0.6 - 0.375 + 1.0) * 1000.0;
        assert!((evi - expect).abs() < 1e-9);
    }

    #[test]
    fn test_add_indices_missing_band_fatal() {
        let mut c = Composite::new(2020, 5, 5);
        c.add_band(BAND_RED, make_band(0.1)).unwrap();
        c.add_band(BAND_NIR, make_band(0.5)).unwrap();
        assert!(matches!(add_indices(&mut c), Err(Error::MissingBand(_))));
    }
}
