//! Climate feature assembly
//!
//! Derives four scalar-per-pixel bands for a target year from an external
//! monthly climate collaborator: annual and prior-year precipitation
//! totals, the annual temperature anomaly against a fixed 1990–2020
//! baseline, and the June–August mean temperature. Missing months
//! propagate NaN per pixel through the accumulations.

use ndarray::Array2;
use taigamap_core::{Raster, Result};

/// Meters to millimeters, applied to precipitation sums
const PRECIP_TO_MM: f64 = 1000.0;

/// External monthly climate collaborator.
///
/// Supplies monthly precipitation-sum and mean skin-temperature rasters
/// over the fixed domain. Month is 1-based.
pub trait MonthlyClimate {
    /// Total precipitation for (year, month), in meters
    fn precipitation(&self, year: i32, month: u32) -> Result<Raster<f64>>;

    /// Mean skin temperature for (year, month)
    fn temperature(&self, year: i32, month: u32) -> Result<Raster<f64>>;
}

/// The four climate bands for a target year.
///
/// `baseline_temp` is the precomputed 1990–2020 mean temperature raster;
/// `temp_an` is the target year's annual mean minus that baseline.
pub fn climate_features(
    provider: &dyn MonthlyClimate,
    year: i32,
    baseline_temp: &Raster<f64>,
) -> Result<Vec<(String, Raster<f64>)>> {
    let a_precip = annual_precip(provider, year)?;
    let p_precip = annual_precip(provider, year - 1)?;

    let annual_temp = mean_temperature(provider, year, 1..=12)?;
    let temp_an = subtract(&annual_temp, baseline_temp);
    let su_temp = mean_temperature(provider, year, 6..=8)?;

    Ok(vec![
        ("a_precip".to_string(), a_precip),
        ("p_precip".to_string(), p_precip),
        ("temp_an".to_string(), temp_an),
        ("su_temp".to_string(), su_temp),
    ])
}

/// Calendar-year precipitation sum, converted to millimeters
fn annual_precip(provider: &dyn MonthlyClimate, year: i32) -> Result<Raster<f64>> {
    let mut out = provider.precipitation(year, 1)?;
    for month in 2..=12 {
        let monthly = provider.precipitation(year, month)?;
        out = add(&out, &monthly);
    }
    out.data_mut().mapv_inplace(|v| v * PRECIP_TO_MM);
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

fn mean_temperature(
    provider: &dyn MonthlyClimate,
    year: i32,
    months: std::ops::RangeInclusive<u32>,
) -> Result<Raster<f64>> {
    let count = (months.end() - months.start() + 1) as f64;
    let mut out = provider.temperature(year, *months.start())?;
    for month in months.skip(1) {
        let monthly = provider.temperature(year, month)?;
        out = add(&out, &monthly);
    }
    out.data_mut().mapv_inplace(|v| v / count);
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

fn add(a: &Raster<f64>, b: &Raster<f64>) -> Raster<f64> {
    elementwise(a, b, |x, y| x + y)
}

fn subtract(a: &Raster<f64>, b: &Raster<f64>) -> Raster<f64> {
    elementwise(a, b, |x, y| x - y)
}

/// Elementwise combination; a missing operand yields a missing result
fn elementwise(a: &Raster<f64>, b: &Raster<f64>, op: impl Fn(f64, f64) -> f64) -> Raster<f64> {
    let (rows, cols) = a.shape();
    let data: Array2<f64> = Array2::from_shape_fn((rows, cols), |(r, c)| {
        let x = a.get(r, c).unwrap_or(f64::NAN);
        let y = b.get(r, c).unwrap_or(f64::NAN);
        if x.is_finite() && y.is_finite() {
            op(x, y)
        } else {
            f64::NAN
        }
    });
    let mut out = a.with_same_meta::<f64>(rows, cols);
    out.set_nodata(Some(f64::NAN));
    *out.data_mut() = data;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant synthetic climate: precip 0.01 m per month, temperature
    /// varying by month so seasonal means differ from annual means.
    struct FlatClimate;

    impl MonthlyClimate for FlatClimate {
        fn precipitation(&self, _year: i32, _month: u32) -> Result<Raster<f64>> {
            Ok(Raster::filled(3, 3, 0.01))
        }

        fn temperature(&self, _year: i32, month: u32) -> Result<Raster<f64>> {
            Ok(Raster::filled(3, 3, month as f64))
        }
    }

    #[test]
    fn test_annual_precip_in_mm() {
        let bands = climate_features(&FlatClimate, 2020, &Raster::filled(3, 3, 0.0)).unwrap();
        let a_precip = &bands[0].1;
        // 12 months * 0.01 m * 1000 = 120 mm
        assert!((a_precip.get(1, 1).unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_summer_and_anomaly() {
        let baseline = Raster::filled(3, 3, 5.0);
        let bands = climate_features(&FlatClimate, 2020, &baseline).unwrap();

        let temp_an = &bands[2].1;
        // Annual mean of months 1..=12 is 6.5; anomaly = 6.5 - 5.0
        assert!((temp_an.get(0, 0).unwrap() - 1.5).abs() < 1e-9);

        let su_temp = &bands[3].1;
        // Mean of months 6,7,8
        assert!((su_temp.get(0, 0).unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_names_and_order() {
        let bands = climate_features(&FlatClimate, 2020, &Raster::filled(3, 3, 0.0)).unwrap();
        let names: Vec<&str> = bands.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a_precip", "p_precip", "temp_an", "su_temp"]);
    }

    #[test]
    fn test_missing_pixel_propagates() {
        struct HoleyClimate;
        impl MonthlyClimate for HoleyClimate {
            fn precipitation(&self, _year: i32, month: u32) -> Result<Raster<f64>> {
                let mut r = Raster::filled(2, 2, 0.01);
                if month == 6 {
                    r.set(0, 0, f64::NAN).unwrap();
                }
                Ok(r)
            }
            fn temperature(&self, _year: i32, _month: u32) -> Result<Raster<f64>> {
                Ok(Raster::filled(2, 2, 1.0))
            }
        }

        let bands = climate_features(&HoleyClimate, 2020, &Raster::filled(2, 2, 0.0)).unwrap();
        let a_precip = &bands[0].1;
        assert!(a_precip.get(0, 0).unwrap().is_nan());
        assert!(a_precip.get(1, 1).unwrap().is_finite());
    }
}
