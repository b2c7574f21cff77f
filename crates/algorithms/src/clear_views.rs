//! Per-pixel observation quality accounting
//!
//! Runs on the preprocessed scene sequence independently of the water
//! classification: how often was each pixel actually seen, and how often
//! was that view clear of cloud and shadow.

use floodmap_core::{Error, Raster, Result, Scene};
use rayon::prelude::*;

/// Observation-quality layers for one event
#[derive(Debug, Clone)]
pub struct ClearViewStats {
    /// Number of scenes in which the pixel had a clear view
    pub clear_views: Raster<u16>,
    /// Number of scenes carrying any defined QA value for the pixel
    pub total_observations: Raster<u16>,
    /// `clear_views / total_observations`, NaN where never observed
    pub clear_perc: Raster<f64>,
}

impl ClearViewStats {
    /// Clear fraction at a pixel, surfacing the degenerate zero-observation
    /// case as an error instead of NaN
    pub fn clear_fraction_at(&self, row: usize, col: usize) -> Result<f64> {
        let total = self.total_observations.get(row, col)?;
        if total == 0 {
            return Err(Error::DegenerateObservation { row, col });
        }
        Ok(f64::from(self.clear_views.get(row, col)?) / f64::from(total))
    }
}

/// Count clear views and total observations across all scenes.
///
/// A pixel counts as a clear view in a scene when the cloud field reads
/// clear or the shadow flag is unset; it counts as observed when it carries
/// any defined QA value at all.
pub fn clear_view_stats(scenes: &[Scene]) -> Result<ClearViewStats> {
    let first = scenes.first().ok_or_else(|| {
        Error::InsufficientSample("no scenes for clear-view accounting".to_string())
    })?;
    for scene in &scenes[1..] {
        first.red.check_shape(&scene.red)?;
    }

    let (rows, cols) = first.shape();

    let pairs: Vec<(u16, u16)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![(0u16, 0u16); cols];
            for col in 0..cols {
                let mut clear = 0u16;
                let mut observed = 0u16;
                for scene in scenes {
                    if scene.qa.is_observed(row, col) {
                        observed += 1;
                        if scene.qa.is_clear_view(row, col) {
                            clear += 1;
                        }
                    }
                }
                row_data[col] = (clear, observed);
            }
            row_data
        })
        .collect();

    let mut clear_views = first.red.with_same_meta::<u16>();
    let mut total_observations = first.red.with_same_meta::<u16>();
    let mut clear_perc = first.red.with_same_meta::<f64>();
    clear_perc.set_nodata(Some(f64::NAN));

    for (((cv, obs), perc), (clear, observed)) in clear_views
        .data_mut()
        .iter_mut()
        .zip(total_observations.data_mut().iter_mut())
        .zip(clear_perc.data_mut().iter_mut())
        .zip(pairs)
    {
        *cv = clear;
        *obs = observed;
        *perc = if observed > 0 {
            f64::from(clear) / f64::from(observed)
        } else {
            f64::NAN
        };
    }

    Ok(ClearViewStats {
        clear_views,
        total_observations,
        clear_perc,
    })
}
