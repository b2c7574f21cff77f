//! Scene data model: sensors, QA flags, raw and canonical acquisitions

mod qa;
mod raw;
mod sensor;

pub use qa::{extract_qa_bits, CloudState, QaFlags};
pub use raw::{bands, RawScene};
pub use sensor::{dual_sensor_start, Sensor};

use crate::raster::{GeoTransform, Raster};
use chrono::NaiveDateTime;

/// One canonical, preprocessed satellite acquisition.
///
/// All bands share a common pixel grid: the fine-resolution red and NIR
/// reflectance, the pan-sharpened blue/green/SWIR, the derived NIR/red
/// ratio band, and the decoded QA flags. Immutable once built.
#[derive(Debug, Clone)]
pub struct Scene {
    pub sensor: Sensor,
    pub timestamp: NaiveDateTime,
    /// Fine-resolution red reflectance
    pub red: Raster<f64>,
    /// Fine-resolution NIR reflectance
    pub nir: Raster<f64>,
    /// Pan-sharpened blue reflectance
    pub blue: Raster<f64>,
    /// Pan-sharpened green reflectance
    pub green: Raster<f64>,
    /// Pan-sharpened SWIR reflectance
    pub swir: Raster<f64>,
    /// Derived NIR/red ratio band
    pub ratio: Raster<f64>,
    /// Decoded quality flags
    pub qa: QaFlags,
}

impl Scene {
    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.red.shape()
    }

    /// Geotransform of the common pixel grid
    pub fn transform(&self) -> &GeoTransform {
        self.red.transform()
    }
}
