//! First-order texture: focal mean and standard deviation
//!
//! Computes both statistics in one pass over a radius-1 (3×3) square
//! window, skipping NaN neighbors.

use crate::maybe_rayon::*;
use ndarray::Array2;
use taigamap_core::{Composite, Error, Raster, Result};

const RADIUS: isize = 1;

/// Focal mean and population standard deviation over a 3×3 window.
///
/// A cell with no valid neighbor stays NaN in both outputs.
pub fn focal_mean_stddev(raster: &Raster<f64>) -> Result<(Raster<f64>, Raster<f64>)> {
    let (rows, cols) = raster.shape();

    let (mean_data, std_data): (Vec<f64>, Vec<f64>) = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut pairs = Vec::with_capacity(cols);
            for col in 0..cols {
                let mut sum = 0.0;
                let mut sum_sq = 0.0;
                let mut count = 0usize;

                for dr in -RADIUS..=RADIUS {
                    for dc in -RADIUS..=RADIUS {
                        let nr = row as isize + dr;
                        let nc = col as isize + dc;
                        if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                            continue;
                        }
                        let v = unsafe { raster.get_unchecked(nr as usize, nc as usize) };
                        if v.is_finite() {
                            sum += v;
                            sum_sq += v * v;
                            count += 1;
                        }
                    }
                }

                if count == 0 {
                    pairs.push((f64::NAN, f64::NAN));
                } else {
                    let n = count as f64;
                    let mean = sum / n;
                    let var = (sum_sq / n - mean * mean).max(0.0);
                    pairs.push((mean, var.sqrt()));
                }
            }
            pairs
        })
        .unzip();

    Ok((
        build_output(raster, rows, cols, mean_data)?,
        build_output(raster, rows, cols, std_data)?,
    ))
}

/// First-order texture bands for the designated composite bands.
///
/// Produces `<band>_mean` and `<band>_stdDev` for each input band name.
pub fn first_order_texture(
    composite: &Composite,
    bands: &[&str],
) -> Result<Vec<(String, Raster<f64>)>> {
    let mut out = Vec::with_capacity(bands.len() * 2);
    for name in bands {
        let raster = composite.band(name)?;
        let (mean, std_dev) = focal_mean_stddev(raster)?;
        out.push((format!("{name}_mean"), mean));
        out.push((format!("{name}_stdDev"), std_dev));
    }
    Ok(out)
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
