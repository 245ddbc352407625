//! Terrain features
//!
//! Elevation, slope and aspect, computed once per fixed domain and reused
//! for every year/region combination. Slope and aspect use Horn's (1981)
//! 3×3 method and are output in radians.

use crate::maybe_rayon::*;
use ndarray::Array2;
use taigamap_core::{Error, Raster, Result};

use std::f64::consts::PI;

/// Calculate slope from a DEM, in radians.
///
/// Horn's method over the 3×3 neighborhood:
/// ```text
/// a b c
/// d e f
/// g h i
/// ```
/// dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * cellsize)
/// dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * cellsize)
/// slope = atan(sqrt(dz/dx² + dz/dy²))
pub fn slope(dem: &Raster<f64>) -> Result<Raster<f64>> {
    horn(dem, |dz_dx, dz_dy| {
        (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan()
    })
}

/// Calculate aspect from a DEM, in radians [0, 2π), 0 = north.
///
/// Flat cells (both gradients ~0) have no defined downslope direction
/// and stay NaN.
pub fn aspect(dem: &Raster<f64>) -> Result<Raster<f64>> {
    horn(dem, |dz_dx, dz_dy| {
        if dz_dx.abs() < 1e-12 && dz_dy.abs() < 1e-12 {
            return f64::NAN;
        }
        // Descent bearing: east component = -dz/dx, north component = dz/dy
        let bearing = (-dz_dx).atan2(dz_dy);
        if bearing < 0.0 {
            bearing + 2.0 * PI
        } else {
            bearing
        }
    })
}

/// The static terrain bands: dem, slope, aspect
pub fn terrain_features(dem: &Raster<f64>) -> Result<Vec<(String, Raster<f64>)>> {
    Ok(vec![
        ("dem".to_string(), dem.clone()),
        ("slope".to_string(), slope(dem)?),
        ("aspect".to_string(), aspect(dem)?),
    ])
}

/// Shared Horn-kernel walk; `f` maps the two gradients to the output value
fn horn(dem: &Raster<f64>, f: impl Fn(f64, f64) -> f64 + Sync) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();
    let eight_cell_size = 8.0 * cell_size;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for col in 0..cols {
                // Edges lack the full 3×3 neighborhood
                if row == 0 || row == rows - 1 || col == 0 || col == cols - 1 {
                    continue;
                }

                let e = unsafe { dem.get_unchecked(row, col) };
                if !e.is_finite() {
                    continue;
                }

                let a = unsafe { dem.get_unchecked(row - 1, col - 1) };
                let b = unsafe { dem.get_unchecked(row - 1, col) };
                let c = unsafe { dem.get_unchecked(row - 1, col + 1) };
                let d = unsafe { dem.get_unchecked(row, col - 1) };
                let fv = unsafe { dem.get_unchecked(row, col + 1) };
                let g = unsafe { dem.get_unchecked(row + 1, col - 1) };
                let h = unsafe { dem.get_unchecked(row + 1, col) };
                let i = unsafe { dem.get_unchecked(row + 1, col + 1) };

                if [a, b, c, d, fv, g, h, i].iter().any(|v| !v.is_finite()) {
                    continue;
                }

                let dz_dx = ((c + 2.0 * fv + i) - (a + 2.0 * d + g)) / eight_cell_size;
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / eight_cell_size;

                row_data[col] = f(dz_dx, dz_dy);
            }

            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tilted_dem(size: usize) -> Raster<f64> {
        // Rises 1 unit per row toward the south
        let mut dem = Raster::new(size, size);
        for row in 0..size {
            for col in 0..size {
                dem.set(row, col, row as f64).unwrap();
            }
        }
        dem
    }

    #[test]
    fn test_flat_dem_zero_slope() {
        let dem = Raster::filled(8, 8, 100.0);
        let s = slope(&dem).unwrap();
        assert_relative_eq!(s.get(4, 4).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_gradient_slope() {
        let dem = tilted_dem(10);
        let s = slope(&dem).unwrap();
        // dz/dy = 1 with cell size 1 → slope = atan(1) = π/4
        assert_relative_eq!(s.get(5, 5).unwrap(), PI / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aspect_faces_north() {
        // Down to the north (low row = low elevation): descent bearing ~0
        let dem = tilted_dem(10);
        let a = aspect(&dem).unwrap();
        let v = a.get(5, 5).unwrap();
        assert!(v < 0.01 || v > 2.0 * PI - 0.01, "expected ~0, got {v}");
    }

    #[test]
    fn test_edges_are_missing() {
        let dem = tilted_dem(6);
        let s = slope(&dem).unwrap();
        assert!(s.get(0, 3).unwrap().is_nan());
        assert!(s.get(3, 0).unwrap().is_nan());
    }

    #[test]
    fn test_terrain_band_names() {
        let dem = tilted_dem(6);
        let bands = terrain_features(&dem).unwrap();
        let names: Vec<&str> = bands.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["dem", "slope", "aspect"]);
    }
}
