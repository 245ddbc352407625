//! Gray-level co-occurrence (GLCM) texture
//!
//! Builds a symmetric GLCM at each pixel's neighborhood over 4 directions
//! (0°, 45°, 90°, 135°) with values quantized to `levels` gray levels,
//! then derives contrast, entropy and correlation from the one matrix.

use crate::maybe_rayon::*;
use ndarray::Array2;
use taigamap_core::{Composite, Error, Raster, Result};

/// Parameters for GLCM computation
#[derive(Debug, Clone)]
pub struct GlcmParams {
    /// Window radius (window size = 2*radius + 1; default 1, i.e. 3×3)
    pub radius: usize,
    /// Number of quantization levels (default 32)
    pub levels: usize,
    /// Co-occurrence distance (default 1)
    pub distance: usize,
}

impl Default for GlcmParams {
    fn default() -> Self {
        Self {
            radius: 1,
            levels: 32,
            distance: 1,
        }
    }
}

/// The three GLCM measures the pipeline consumes
#[derive(Debug, Clone)]
pub struct GlcmBands {
    pub contrast: Raster<f64>,
    pub entropy: Raster<f64>,
    pub correlation: Raster<f64>,
}

/// Compute GLCM contrast, entropy and correlation for one raster.
///
/// All three measures come from a single per-pixel matrix so the
/// neighborhood is walked once, not three times. A raster with no value
/// range (all cells equal) has no texture signal and is rejected.
pub fn glcm(raster: &Raster<f64>, params: &GlcmParams) -> Result<GlcmBands> {
    if params.radius == 0 {
        return Err(Error::Algorithm("GLCM radius must be > 0".into()));
    }
    if params.levels < 2 {
        return Err(Error::Algorithm("GLCM levels must be >= 2".into()));
    }

    let (rows, cols) = raster.shape();

    // Value range for quantization
    let mut vmin = f64::INFINITY;
    let mut vmax = f64::NEG_INFINITY;
    for v in raster.data().iter() {
        if v.is_finite() {
            vmin = vmin.min(*v);
            vmax = vmax.max(*v);
        }
    }
    if vmin >= vmax {
        return Err(Error::Algorithm("raster has no value range for GLCM".into()));
    }

    let range = vmax - vmin;
    let n = params.levels;
    let d = params.distance as isize;
    let r = params.radius as isize;
    let directions: [(isize, isize); 4] = [(0, d), (-d, d), (-d, 0), (-d, -d)];

    let triples: Vec<(f64, f64, f64)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_out = vec![(f64::NAN, f64::NAN, f64::NAN); cols];
            let mut matrix = vec![0.0; n * n];

            for (col, out) in row_out.iter_mut().enumerate() {
                for v in &mut matrix {
                    *v = 0.0;
                }
                let mut total = 0.0;

                for dir in &directions {
                    for dr in -r..=r {
                        for dc in -r..=r {
                            let r1 = row as isize + dr;
                            let c1 = col as isize + dc;
                            let r2 = r1 + dir.0;
                            let c2 = c1 + dir.1;

                            if r1 >= 0
                                && c1 >= 0
                                && (r1 as usize) < rows
                                && (c1 as usize) < cols
                                && r2 >= 0
                                && c2 >= 0
                                && (r2 as usize) < rows
                                && (c2 as usize) < cols
                            {
                                let v1 = unsafe { raster.get_unchecked(r1 as usize, c1 as usize) };
                                let v2 = unsafe { raster.get_unchecked(r2 as usize, c2 as usize) };
                                if v1.is_finite() && v2.is_finite() {
                                    let i = quantize(v1, vmin, range, n);
                                    let j = quantize(v2, vmin, range, n);
                                    matrix[i * n + j] += 1.0;
                                    matrix[j * n + i] += 1.0;
                                    total += 2.0;
                                }
                            }
                        }
                    }
                }

                if total < 1.0 {
                    continue;
                }
                for v in &mut matrix {
                    *v /= total;
                }

                *out = measures(&matrix, n);
            }

            row_out
        })
        .collect();

    let mut con = Vec::with_capacity(rows * cols);
    let mut ent = Vec::with_capacity(rows * cols);
    let mut cor = Vec::with_capacity(rows * cols);
    for (c, e, k) in triples {
        con.push(c);
        ent.push(e);
        cor.push(k);
    }

    Ok(GlcmBands {
        contrast: build_output(raster, rows, cols, con)?,
        entropy: build_output(raster, rows, cols, ent)?,
        correlation: build_output(raster, rows, cols, cor)?,
    })
}

/// GLCM texture bands for the designated composite bands.
///
/// Produces `<band>_con`, `<band>_ent` and `<band>_cor` per input band.
pub fn glcm_texture(
    composite: &Composite,
    bands: &[&str],
    params: &GlcmParams,
) -> Result<Vec<(String, Raster<f64>)>> {
    let mut out = Vec::with_capacity(bands.len() * 3);
    for name in bands {
        let raster = composite.band(name)?;
        let textures = glcm(raster, params)?;
        out.push((format!("{name}_con"), textures.contrast));
        out.push((format!("{name}_ent"), textures.entropy));
        out.push((format!("{name}_cor"), textures.correlation));
    }
    Ok(out)
}

fn quantize(value: f64, vmin: f64, range: f64, levels: usize) -> usize {
    let normalized = (value - vmin) / range;
    let level = (normalized * (levels - 1) as f64).round() as usize;
    level.min(levels - 1)
}

/// Contrast, entropy and correlation from one normalized matrix
fn measures(matrix: &[f64], n: usize) -> (f64, f64, f64) {
    let mut contrast = 0.0;
    let mut entropy = 0.0;
    let mut mu_i = 0.0;
    let mut mu_j = 0.0;

    for i in 0..n {
        for j in 0..n {
            let p = matrix[i * n + j];
            let diff = i as f64 - j as f64;
            contrast += p * diff * diff;
            if p > 0.0 {
                entropy -= p * p.ln();
            }
            mu_i += i as f64 * p;
            mu_j += j as f64 * p;
        }
    }

    let mut sig_i = 0.0;
    let mut sig_j = 0.0;
    let mut cov = 0.0;
    for i in 0..n {
        for j in 0..n {
            let p = matrix[i * n + j];
            sig_i += (i as f64 - mu_i).powi(2) * p;
            sig_j += (j as f64 - mu_j).powi(2) * p;
            cov += (i as f64 - mu_i) * (j as f64 - mu_j) * p;
        }
    }
    sig_i = sig_i.sqrt();
    sig_j = sig_j.sqrt();

    let correlation = if sig_i < 1e-15 || sig_j < 1e-15 {
        0.0
    } else {
        cov / (sig_i * sig_j)
    };

    (contrast, entropy, correlation)
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
