//! Per-scene water classification
//!
//! Applies the event thresholds to every preprocessed scene. A pixel is
//! flagged as water only when all three band tests agree, which keeps
//! bright-soil and haze pixels that pass a single test out of the mask.

use crate::threshold::ThresholdSet;
use chrono::NaiveDateTime;
use floodmap_core::{Raster, Scene, Sensor};
use rayon::prelude::*;

/// A scene reduced to its per-pixel water flag
#[derive(Debug, Clone)]
pub struct ClassifiedScene {
    pub sensor: Sensor,
    pub timestamp: NaiveDateTime,
    /// 1 where the pixel passed all water tests, 0 otherwise
    pub water: Raster<u8>,
}

/// Classify one scene against the event thresholds.
///
/// Three tests are summed per pixel: ratio below the ratio threshold, fine
/// red below the fixed red threshold, SWIR below the SWIR threshold; the
/// pixel is water when all three pass. NaN band values fail their test, so
/// unobserved pixels classify as land. Pure and deterministic: identical
/// inputs yield a bit-identical mask.
pub fn classify_scene(scene: &Scene, thresholds: &ThresholdSet) -> ClassifiedScene {
    let (rows, cols) = scene.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for col in 0..cols {
                let ratio = unsafe { scene.ratio.get_unchecked(row, col) };
                let red = unsafe { scene.red.get_unchecked(row, col) };
                let swir = unsafe { scene.swir.get_unchecked(row, col) };

                let mut passed = 0u8;
                if ratio < thresholds.ratio {
                    passed += 1;
                }
                if red < thresholds.red {
                    passed += 1;
                }
                if swir < thresholds.swir {
                    passed += 1;
                }

                row_data[col] = u8::from(passed >= 3);
            }
            row_data
        })
        .collect();

    let mut water = scene.red.with_same_meta::<u8>();
    for (cell, value) in water.data_mut().iter_mut().zip(data) {
        *cell = value;
    }

    ClassifiedScene {
        sensor: scene.sensor,
        timestamp: scene.timestamp,
        water,
    }
}

/// Classify every scene, preserving timestamp order
pub fn classify_scenes(scenes: &[Scene], thresholds: &ThresholdSet) -> Vec<ClassifiedScene> {
    scenes
        .par_iter()
        .map(|scene| classify_scene(scene, thresholds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use floodmap_core::{QaFlags, Scene};

    fn scene_with(ratio: f64, red: f64, swir: f64) -> Scene {
        let band = |v: f64| {
            let mut r = Raster::filled(2, 2, v);
            r.set_nodata(Some(f64::NAN));
            r
        };
        let mut state = Raster::filled(2, 2, 0u16);
        state.set_nodata(Some(u16::MAX));

        Scene {
            sensor: Sensor::Aqua,
            timestamp: NaiveDate::from_ymd_opt(2010, 5, 1)
                .unwrap()
                .and_hms_opt(13, 30, 0)
                .unwrap(),
            red: band(red),
            nir: band(0.0),
            blue: band(0.0),
            green: band(0.0),
            swir: band(swir),
            ratio: band(ratio),
            qa: QaFlags::decode(&state),
        }
    }

    #[test]
    fn test_all_tests_required() {
        let thresholds = ThresholdSet::standard();

        // All three pass
        let water = classify_scene(&scene_with(0.3, 500.0, 300.0), &thresholds);
        assert_eq!(water.water.get(0, 0).unwrap(), 1);

        // Ratio fails
        let land = classify_scene(&scene_with(0.9, 500.0, 300.0), &thresholds);
        assert_eq!(land.water.get(0, 0).unwrap(), 0);

        // Red fails
        let land = classify_scene(&scene_with(0.3, 2500.0, 300.0), &thresholds);
        assert_eq!(land.water.get(0, 0).unwrap(), 0);

        // SWIR fails
        let land = classify_scene(&scene_with(0.3, 500.0, 700.0), &thresholds);
        assert_eq!(land.water.get(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_red_test_is_mode_independent() {
        // The red constant applies even with otsu-derived thresholds
        let thresholds = ThresholdSet::new(0.5, 900.0, Some(250.0)).unwrap();
        assert_eq!(thresholds.red, crate::threshold::RED_THRESHOLD);

        let land = classify_scene(&scene_with(0.3, 2100.0, 300.0), &thresholds);
        assert_eq!(land.water.get(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_nan_classifies_as_land() {
        let thresholds = ThresholdSet::standard();
        let mut scene = scene_with(0.3, 500.0, 300.0);
        scene.ratio.set(0, 1, f64::NAN).unwrap();

        let classified = classify_scene(&scene, &thresholds);
        assert_eq!(classified.water.get(0, 1).unwrap(), 0);
        assert_eq!(classified.water.get(0, 0).unwrap(), 1);
    }

    #[test]
    fn test_idempotent() {
        let thresholds = ThresholdSet::standard();
        let scene = scene_with(0.3, 500.0, 300.0);

        let first = classify_scene(&scene, &thresholds);
        let second = classify_scene(&scene, &thresholds);

        assert_eq!(first.water.data(), second.water.data());
    }
}
