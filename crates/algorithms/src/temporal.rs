//! Temporal trajectory statistics
//!
//! Consumes a per-year series of index composites and condenses the history
//! before a target year `T` into per-pixel trajectory bands: relative and
//! absolute annual change, rolling window statistics, and OLS trend slopes.
//! This is where most of the signal for separating abrupt disturbance from
//! slow decline and recovery comes from.
//!
//! Missing years are tolerated. Window statistics are computed over the
//! years actually present in the window; statistics that specifically need
//! year `T-1` (`*_chg_ra`, `*_an_cha`) are missing when that year is absent.

use crate::imagery::INDEX_BANDS;
use crate::maybe_rayon::*;
use ndarray::Array2;
use taigamap_core::{CompositeSeries, Error, Raster, Result};

/// Denominator policy for the relative-change safe divide.
///
/// The original formulation emits 0 when the previous-year value is exactly
/// zero, which hides a qualitatively large change behind a neutral value.
/// `Missing` propagates it as a missing pixel instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDenominator {
    /// Relative change is 0 when the previous-year value is zero
    #[default]
    Zero,
    /// Relative change is missing when the previous-year value is zero
    Missing,
}

/// Parameters for [`trajectory_features`]
#[derive(Debug, Clone)]
pub struct TrajectoryParams {
    pub zero_denominator: ZeroDenominator,
    /// Floor for the relative-change denominator
    pub epsilon: f64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            zero_denominator: ZeroDenominator::default(),
            epsilon: 1e-5,
        }
    }
}

/// Per-band trajectory statistic suffixes, in output order
const STAT_SUFFIXES: [&str; 8] = [
    "chg_ra", "rol_3y", "rol_5y", "vola_5y", "trend", "reco_s", "an_cha", "mean",
];

/// Compute trajectory bands for every index band at `target_year`.
///
/// Output contains, per index band, the raw current-year band followed by
/// the eight `<band>_<stat>` bands. The target year composite must exist
/// and carry all index bands; historical years are whatever the series
/// holds strictly before `target_year`.
pub fn trajectory_features(
    series: &CompositeSeries,
    target_year: i32,
    params: &TrajectoryParams,
) -> Result<Vec<(String, Raster<f64>)>> {
    let current = series.require(target_year)?;
    let shape = current.shape();

    let mut out = Vec::with_capacity(INDEX_BANDS.len() * (STAT_SUFFIXES.len() + 1));

    for name in INDEX_BANDS {
        let current_band = current.band(name)?;

        // Historical rasters for this band, oldest first
        let mut history: Vec<(i32, &Raster<f64>)> = Vec::new();
        for year in series.years() {
            if year >= target_year {
                continue;
            }
            let band = series.require(year)?.band(name)?;
            if band.shape() != shape {
                let (ar, ac) = band.shape();
                return Err(Error::SizeMismatch {
                    expected_rows: shape.0,
                    expected_cols: shape.1,
                    actual_rows: ar,
                    actual_cols: ac,
                });
            }
            history.push((year, band));
        }

        let stats = band_trajectory(current_band, &history, target_year, params)?;

        out.push((name.to_string(), current_band.clone()));
        for (suffix, raster) in STAT_SUFFIXES.iter().zip(stats) {
            out.push((format!("{name}_{suffix}"), raster));
        }
    }

    Ok(out)
}

/// One fused per-pixel pass computing all eight statistics for a band
fn band_trajectory(
    current: &Raster<f64>,
    history: &[(i32, &Raster<f64>)],
    target_year: i32,
    params: &TrajectoryParams,
) -> Result<[Raster<f64>; 8]> {
    let (rows, cols) = current.shape();
    let previous = history
        .iter()
        .find(|(year, _)| *year == target_year - 1)
        .map(|(_, band)| *band);

    let row_stats: Vec<[Vec<f64>; 8]> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut stats: [Vec<f64>; 8] = std::array::from_fn(|_| vec![f64::NAN; cols]);

            for col in 0..cols {
                let cur = unsafe { current.get_unchecked(row, col) };

                // Finite (year, value) pairs strictly before T
                let observed: Vec<(i32, f64)> = history
                    .iter()
                    .filter_map(|(year, band)| {
                        let v = unsafe { band.get_unchecked(row, col) };
                        v.is_finite().then_some((*year, v))
                    })
                    .collect();

                if let Some(prev_band) = previous {
                    let prev = unsafe { prev_band.get_unchecked(row, col) };
                    if cur.is_finite() && prev.is_finite() {
                        let diff = cur - prev;
                        stats[0][col] = relative_change(diff, prev, params);
                        stats[6][col] = diff.abs();
                    }
                }

                let three_year: Vec<f64> = window(&observed, target_year - 3, target_year - 1);
                let five_year: Vec<f64> = window(&observed, target_year - 5, target_year - 1);

                stats[1][col] = mean(&three_year);
                stats[2][col] = five_year
                    .iter()
                    .copied()
                    .fold(f64::NAN, |acc, v| if v < acc || acc.is_nan() { v } else { acc });
                stats[3][col] = std_dev(&five_year);
                stats[4][col] = ols_slope(&observed);
                stats[5][col] = ols_slope(
                    &observed
                        .iter()
                        .copied()
                        .filter(|(y, _)| *y >= target_year - 3 && *y <= target_year - 1)
                        .collect::<Vec<_>>(),
                );
                stats[7][col] = mean(&observed.iter().map(|(_, v)| *v).collect::<Vec<_>>());
            }

            stats
        })
        .collect();

    let mut arrays: [Vec<f64>; 8] = std::array::from_fn(|_| Vec::with_capacity(rows * cols));
    for row in row_stats {
        for (i, values) in row.into_iter().enumerate() {
            arrays[i].extend(values);
        }
    }

    let mut out: Vec<Raster<f64>> = Vec::with_capacity(8);
    for values in arrays {
        let mut raster = current.with_same_meta::<f64>(rows, cols);
        raster.set_nodata(Some(f64::NAN));
        *raster.data_mut() =
            Array2::from_shape_vec((rows, cols), values).map_err(|e| Error::Other(e.to_string()))?;
        out.push(raster);
    }
    out.try_into()
        .map_err(|_| Error::Other("trajectory stat count mismatch".to_string()))
}

fn relative_change(diff: f64, prev: f64, params: &TrajectoryParams) -> f64 {
    if prev == 0.0 {
        return match params.zero_denominator {
            ZeroDenominator::Zero => 0.0,
            ZeroDenominator::Missing => f64::NAN,
        };
    }
    diff / prev.abs().max(params.epsilon)
}

fn window(observed: &[(i32, f64)], first: i32, last: i32) -> Vec<f64> {
    observed
        .iter()
        .filter(|(y, _)| *y >= first && *y <= last)
        .map(|(_, v)| *v)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// OLS slope of value against year. Fewer than 2 distinct years leaves the
/// slope undefined and yields a missing value.
fn ols_slope(observed: &[(i32, f64)]) -> f64 {
    let mut years: Vec<i32> = observed.iter().map(|(y, _)| *y).collect();
    years.sort_unstable();
    years.dedup();
    if years.len() < 2 {
        return f64::NAN;
    }

    let n = observed.len() as f64;
    let x_mean = observed.iter().map(|(y, _)| *y as f64).sum::<f64>() / n;
    let y_mean = observed.iter().map(|(_, v)| *v).sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (year, value) in observed {
        let dx = *year as f64 - x_mean;
        num += dx * (value - y_mean);
        den += dx * dx;
    }
    num / den
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use taigamap_core::Composite;

    const SIZE: usize = 4;

    fn series_from(values: &[(i32, f64)]) -> CompositeSeries {
        let mut series = CompositeSeries::default();
        for (year, value) in values {
            let mut composite = Composite::new(*year, SIZE, SIZE);
            for name in INDEX_BANDS {
                composite
                    .add_band(name, Raster::filled(SIZE, SIZE, *value))
                    .unwrap();
            }
            series.insert(composite);
        }
        series
    }

    fn band<'a>(bands: &'a [(String, Raster<f64>)], name: &str) -> &'a Raster<f64> {
        &bands.iter().find(|(n, _)| n == name).unwrap().1
    }

    #[test]
    fn test_constant_series_statistics() {
        let series = series_from(&[
            (2015, 500.0),
            (2016, 500.0),
            (2017, 500.0),
            (2018, 500.0),
            (2019, 500.0),
            (2020, 500.0),
        ]);
        let bands = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();

        assert_relative_eq!(band(&bands, "ndvi_vola_5y").get(1, 1).unwrap(), 0.0);
        assert_relative_eq!(band(&bands, "ndvi_rol_5y").get(1, 1).unwrap(), 500.0);
        assert_relative_eq!(band(&bands, "ndvi_rol_3y").get(1, 1).unwrap(), 500.0);
        assert_relative_eq!(band(&bands, "ndvi_mean").get(1, 1).unwrap(), 500.0);
        assert_relative_eq!(band(&bands, "ndvi_an_cha").get(1, 1).unwrap(), 0.0);
        assert_relative_eq!(band(&bands, "ndvi_chg_ra").get(1, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_linear_series_trend_slope() {
        // Increases by exactly 10 per year
        let series = series_from(&[
            (2014, 100.0),
            (2015, 110.0),
            (2016, 120.0),
            (2017, 130.0),
            (2018, 140.0),
            (2019, 150.0),
            (2020, 160.0),
        ]);
        let bands = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();

        assert_relative_eq!(band(&bands, "nbr_trend").get(0, 0).unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(band(&bands, "nbr_reco_s").get(0, 0).unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_history_year_trend_missing() {
        let series = series_from(&[(2019, 300.0), (2020, 400.0)]);
        let bands = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();

        assert!(band(&bands, "ndvi_trend").get(0, 0).unwrap().is_nan());
        assert!(band(&bands, "ndvi_reco_s").get(0, 0).unwrap().is_nan());
        // Annual change is still defined
        assert_relative_eq!(band(&bands, "ndvi_an_cha").get(0, 0).unwrap(), 100.0);
    }

    #[test]
    fn test_missing_previous_year_change_missing() {
        let series = series_from(&[(2016, 300.0), (2017, 310.0), (2018, 320.0), (2020, 400.0)]);
        let bands = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();

        assert!(band(&bands, "ndvi_chg_ra").get(0, 0).unwrap().is_nan());
        assert!(band(&bands, "ndvi_an_cha").get(0, 0).unwrap().is_nan());
        // Window statistics use the years that are present
        assert_relative_eq!(band(&bands, "ndvi_rol_5y").get(0, 0).unwrap(), 300.0);
    }

    #[test]
    fn test_relative_change_sign_and_scale() {
        let series = series_from(&[(2019, 200.0), (2020, 150.0)]);
        let bands = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();
        assert_relative_eq!(band(&bands, "nbr_chg_ra").get(2, 2).unwrap(), -0.25);
    }

    #[test]
    fn test_zero_denominator_policies() {
        let series = series_from(&[(2019, 0.0), (2020, 50.0)]);

        let zero = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();
        assert_relative_eq!(band(&zero, "ndvi_chg_ra").get(0, 0).unwrap(), 0.0);

        let params = TrajectoryParams {
            zero_denominator: ZeroDenominator::Missing,
            ..TrajectoryParams::default()
        };
        let missing = trajectory_features(&series, 2020, &params).unwrap();
        assert!(band(&missing, "ndvi_chg_ra").get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_missing_target_year_is_error() {
        let series = series_from(&[(2019, 1.0)]);
        assert!(trajectory_features(&series, 2020, &TrajectoryParams::default()).is_err());
    }

    #[test]
    fn test_band_count_and_raw_band_present() {
        let series = series_from(&[(2019, 1.0), (2020, 2.0)]);
        let bands = trajectory_features(&series, 2020, &TrajectoryParams::default()).unwrap();
        assert_eq!(bands.len(), INDEX_BANDS.len() * 9);
        assert_relative_eq!(band(&bands, "nbr").get(0, 0).unwrap(), 2.0);
    }
}
