//! Categorical smoothing
//!
//! A single-pass 3x3 majority (mode) filter over a label raster, used to
//! remove isolated misclassified pixels from the prediction output.

use crate::maybe_rayon::*;
use crate::predict::NODATA_LABEL;
use ndarray::Array2;
use taigamap_core::{Error, Raster, Result};

/// Replace each pixel with the most frequent label in its 3x3
/// neighborhood. Nodata neighbors are ignored; a tie keeps the center
/// pixel's own label. Nodata centers stay nodata.
pub fn majority_filter(raster: &Raster<i32>) -> Result<Raster<i32>> {
    let (rows, cols) = raster.shape();

    let data: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![NODATA_LABEL; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let center = unsafe { raster.get_unchecked(row, col) };
                if center == NODATA_LABEL {
                    continue;
                }

                // Label histogram over the valid neighborhood
                let mut counts: Vec<(i32, usize)> = Vec::with_capacity(9);
                for dr in -1i64..=1 {
                    for dc in -1i64..=1 {
                        let rr = row as i64 + dr;
                        let cc = col as i64 + dc;
                        if rr < 0 || rr >= rows as i64 || cc < 0 || cc >= cols as i64 {
                            continue;
                        }
                        let v = unsafe { raster.get_unchecked(rr as usize, cc as usize) };
                        if v == NODATA_LABEL {
                            continue;
                        }
                        match counts.iter_mut().find(|(label, _)| *label == v) {
                            Some((_, count)) => *count += 1,
                            None => counts.push((v, 1)),
                        }
                    }
                }

                let best = counts.iter().map(|&(_, c)| c).max().unwrap_or(0);
                let winners: Vec<i32> = counts
                    .iter()
                    .filter(|&&(_, c)| c == best)
                    .map(|&(label, _)| label)
                    .collect();

                *out = if winners.len() == 1 {
                    winners[0]
                } else {
                    // Tie, including the degenerate all-nodata neighborhood
                    center
                };
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<i32>(rows, cols);
    output.set_nodata(Some(NODATA_LABEL));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_raster_unchanged() {
        let raster = Raster::filled(5, 5, 2i32);
        let smoothed = majority_filter(&raster).unwrap();
        for row in 0..5 {
            for col in 0..5 {
                assert_eq!(smoothed.get(row, col).unwrap(), 2);
            }
        }
    }

    #[test]
    fn test_isolated_pixel_removed() {
        let mut raster = Raster::filled(5, 5, 0i32);
        raster.set(2, 2, 3).unwrap();
        let smoothed = majority_filter(&raster).unwrap();
        assert_eq!(smoothed.get(2, 2).unwrap(), 0);
    }

    #[test]
    fn test_tie_keeps_center() {
        // 2x2 block in a 2x2 raster: every label count ties at 2
        let mut raster = Raster::filled(2, 2, 0i32);
        raster.set(0, 0, 1).unwrap();
        raster.set(0, 1, 1).unwrap();
        let smoothed = majority_filter(&raster).unwrap();
        assert_eq!(smoothed.get(0, 0).unwrap(), 1);
        assert_eq!(smoothed.get(1, 0).unwrap(), 0);
    }

    #[test]
    fn test_nodata_preserved_and_ignored() {
        let mut raster = Raster::filled(3, 3, 1i32);
        raster.set(1, 1, NODATA_LABEL).unwrap();
        let smoothed = majority_filter(&raster).unwrap();
        assert_eq!(smoothed.get(1, 1).unwrap(), NODATA_LABEL);
        assert_eq!(smoothed.get(0, 0).unwrap(), 1);
    }
}
