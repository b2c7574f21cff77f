//! Flood extent and duration aggregation
//!
//! Collapses the ordered sequence of composite windows into the final
//! extent and duration rasters.

use crate::composite::CompositeWindow;
use floodmap_core::{Error, Raster, Result};
use rayon::prelude::*;

/// Final flood extent and duration
#[derive(Debug, Clone)]
pub struct FloodExtent {
    /// 1 where the pixel was stable water in any counted window
    pub flooded: Raster<u8>,
    /// Stable-water window count, in day-pair units
    pub duration: Raster<u16>,
}

/// Collapse the window sequence into extent and duration.
///
/// Each calendar day contributes two composite windows (one per sensor
/// anchor), so the raw stable-water count is halved and floored before
/// use; `flooded` is every pixel with a nonzero halved count. A pixel
/// never observed as stable water stays `flooded = 0, duration = 0`, with
/// no interpolation across gaps.
pub fn flood_extent(windows: &[CompositeWindow]) -> Result<FloodExtent> {
    let first = windows.first().ok_or_else(|| {
        Error::InsufficientSample("no composite windows to aggregate".to_string())
    })?;
    for window in &windows[1..] {
        first.stable_water.check_shape(&window.stable_water)?;
    }

    let (rows, cols) = first.stable_water.shape();

    let counts: Vec<u16> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u16; cols];
            for col in 0..cols {
                let raw: u32 = windows
                    .iter()
                    .map(|w| u32::from(unsafe { w.stable_water.get_unchecked(row, col) }))
                    .sum();
                row_data[col] = (raw / 2) as u16;
            }
            row_data
        })
        .collect();

    let mut duration = first.stable_water.with_same_meta::<u16>();
    let mut flooded = first.stable_water.with_same_meta::<u8>();
    for ((dur_cell, flood_cell), count) in duration
        .data_mut()
        .iter_mut()
        .zip(flooded.data_mut().iter_mut())
        .zip(counts)
    {
        *dur_cell = count;
        *flood_cell = u8::from(count >= 1);
    }

    Ok(FloodExtent { flooded, duration })
}
