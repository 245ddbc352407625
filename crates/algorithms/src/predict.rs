//! Prediction over an assembled feature stack
//!
//! Applies a trained forest to every pixel of a feature stack, tile by
//! tile. Classification is pixel-wise so tiles need no overlap; they only
//! bound the working set and parallelize cleanly.

use crate::assemble::FeatureStack;
use crate::classify::RandomForest;
use crate::maybe_rayon::*;
use crate::smooth::majority_filter;
use taigamap_core::{Error, Raster, Result};

/// Label written where a pixel has no complete feature vector
pub const NODATA_LABEL: i32 = -1;

/// A rectangular subset of the raster grid
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub row_offset: usize,
    pub col_offset: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Tiles covering a `rows x cols` grid, row-major
pub fn tiles(rows: usize, cols: usize, tile_size: usize) -> Vec<Tile> {
    let size = tile_size.max(1);
    let mut out = Vec::new();
    let mut row = 0;
    while row < rows {
        let mut col = 0;
        let tile_rows = size.min(rows - row);
        while col < cols {
            out.push(Tile {
                row_offset: row,
                col_offset: col,
                rows: tile_rows,
                cols: size.min(cols - col),
            });
            col += size;
        }
        row += size;
    }
    out
}

#[derive(Debug, Clone)]
pub struct PredictParams {
    pub tile_size: usize,
}

impl Default for PredictParams {
    fn default() -> Self {
        Self { tile_size: 256 }
    }
}

/// Classify every pixel of `stack` with `forest`.
///
/// Pixels with an incomplete feature vector (any band missing) get
/// [`NODATA_LABEL`]. The stack's band count must match what the forest
/// was trained on.
pub fn classify_stack(
    stack: &FeatureStack,
    forest: &RandomForest,
    params: &PredictParams,
) -> Result<Raster<i32>> {
    if stack.band_count() != forest.n_features() {
        return Err(Error::Algorithm(format!(
            "Feature stack has {} bands but the model expects {}",
            stack.band_count(),
            forest.n_features()
        )));
    }

    let (rows, cols) = stack.shape();

    // Each tile classifies independently and carries its own buffer back
    let classified: Vec<(Tile, Vec<i32>)> = tiles(rows, cols, params.tile_size)
        .into_par_iter()
        .map(|tile| {
            let mut labels = vec![NODATA_LABEL; tile.rows * tile.cols];
            for local_row in 0..tile.rows {
                for local_col in 0..tile.cols {
                    let row = tile.row_offset + local_row;
                    let col = tile.col_offset + local_col;
                    if let Some(vector) = stack.pixel(row, col) {
                        labels[local_row * tile.cols + local_col] = forest.predict(&vector);
                    }
                }
            }
            (tile, labels)
        })
        .collect();

    let mut output = Raster::<i32>::new(rows, cols);
    output.set_nodata(Some(NODATA_LABEL));
    for (tile, labels) in classified {
        for local_row in 0..tile.rows {
            for local_col in 0..tile.cols {
                output.set(
                    tile.row_offset + local_row,
                    tile.col_offset + local_col,
                    labels[local_row * tile.cols + local_col],
                )?;
            }
        }
    }
    Ok(output)
}

/// Classification followed by one pass of the 3x3 mode filter
pub fn classify_and_smooth(
    stack: &FeatureStack,
    forest: &RandomForest,
    params: &PredictParams,
) -> Result<Raster<i32>> {
    let labels = classify_stack(stack, forest, params)?;
    majority_filter(&labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ForestParams;

    fn trained_forest() -> RandomForest {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let jitter = (i % 5) as f64 * 0.1;
            features.push(vec![1.0 + jitter]);
            labels.push(0);
            features.push(vec![20.0 + jitter]);
            labels.push(1);
        }
        RandomForest::fit(
            &features,
            &labels,
            &ForestParams {
                trees: 15,
                seed: 11,
                ..ForestParams::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_tiles_cover_grid_exactly() {
        let t = tiles(10, 7, 4);
        assert_eq!(t.len(), 6);
        let area: usize = t.iter().map(|t| t.rows * t.cols).sum();
        assert_eq!(area, 70);
        assert_eq!(t[5].rows, 2);
        assert_eq!(t[5].cols, 3);
    }

    #[test]
    fn test_classify_stack_labels_and_nodata() {
        let mut band = Raster::filled(6, 6, 1.0);
        for col in 0..6 {
            band.set(0, col, 20.5).unwrap();
        }
        band.set(3, 3, f64::NAN).unwrap();

        let stack = FeatureStack::from_bands(vec![("x".to_string(), band)]).unwrap();
        let forest = trained_forest();
        let labels = classify_stack(
            &stack,
            &forest,
            &PredictParams { tile_size: 4 },
        )
        .unwrap();

        assert_eq!(labels.get(0, 2).unwrap(), 1);
        assert_eq!(labels.get(4, 4).unwrap(), 0);
        assert_eq!(labels.get(3, 3).unwrap(), NODATA_LABEL);
    }

    #[test]
    fn test_band_count_mismatch_is_error() {
        let stack = FeatureStack::from_bands(vec![
            ("a".to_string(), Raster::filled(3, 3, 1.0)),
            ("b".to_string(), Raster::filled(3, 3, 2.0)),
        ])
        .unwrap();
        assert!(classify_stack(&stack, &trained_forest(), &PredictParams::default()).is_err());
    }

    #[test]
    fn test_classify_and_smooth_removes_speckle() {
        // One lone high pixel inside a low field
        let mut band = Raster::filled(5, 5, 1.0);
        band.set(2, 2, 20.0).unwrap();
        let stack = FeatureStack::from_bands(vec![("x".to_string(), band)]).unwrap();

        let smoothed =
            classify_and_smooth(&stack, &trained_forest(), &PredictParams::default()).unwrap();
        assert_eq!(smoothed.get(2, 2).unwrap(), 0);
    }
}
