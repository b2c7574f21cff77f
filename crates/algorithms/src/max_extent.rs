//! Maximal single-scene flood extent
//!
//! Validation workflows compare the mapped flood against the one scene
//! that saw the most water at once.

use crate::classify::ClassifiedScene;
use chrono::{NaiveDate, NaiveDateTime};
use floodmap_core::Raster;

/// The classification raster with the largest flooded area
#[derive(Debug, Clone)]
pub struct MaxExtent {
    pub water: Raster<u8>,
    pub timestamp: NaiveDateTime,
}

impl MaxExtent {
    /// Acquisition date of the selected scene
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Total flooded area of one classified scene, in squared map units
pub fn flooded_area(scene: &ClassifiedScene) -> f64 {
    let count = scene
        .water
        .data()
        .iter()
        .filter(|&&flag| flag == 1)
        .count();
    count as f64 * scene.water.transform().cell_area()
}

/// Select the scene with the maximal flooded area.
///
/// Ties resolve to the earliest scene; input must be timestamp-sorted.
/// Returns `None` for an empty sequence.
pub fn max_extent(scenes: &[ClassifiedScene]) -> Option<MaxExtent> {
    let mut best: Option<(f64, &ClassifiedScene)> = None;
    for scene in scenes {
        let area = flooded_area(scene);
        if best.map_or(true, |(best_area, _)| area > best_area) {
            best = Some((area, scene));
        }
    }

    best.map(|(_, scene)| MaxExtent {
        water: scene.water.clone(),
        timestamp: scene.timestamp,
    })
}
