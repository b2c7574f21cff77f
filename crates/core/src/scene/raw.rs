//! Raw acquisitions as delivered by the imagery source

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::scene::Sensor;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Canonical names for the raw reflectance bands.
///
/// The daily product ships two resolutions: red and NIR at the fine 250 m
/// grid, the remaining reflectance bands at 500 m (resampled onto the common
/// grid), plus the packed 1 km state QA band.
pub mod bands {
    pub const RED_250M: &str = "red_250m";
    pub const NIR_250M: &str = "nir_250m";
    pub const RED_500M: &str = "red_500m";
    pub const BLUE: &str = "blue";
    pub const GREEN: &str = "green";
    pub const SWIR: &str = "swir";
    pub const STATE_1KM: &str = "state_1km";

    /// Reflectance bands every raw scene must carry
    pub const REQUIRED: [&str; 6] = [RED_250M, NIR_250M, RED_500M, BLUE, GREEN, SWIR];
}

/// One satellite acquisition as delivered by the imagery source, before
/// preprocessing: named reflectance bands plus the packed state QA band.
#[derive(Debug, Clone)]
pub struct RawScene {
    pub sensor: Sensor,
    pub timestamp: NaiveDateTime,
    reflectance: HashMap<&'static str, Raster<f64>>,
    state: Option<Raster<u16>>,
}

impl RawScene {
    /// Create an empty raw scene for a sensor and acquisition time
    pub fn new(sensor: Sensor, timestamp: NaiveDateTime) -> Self {
        Self {
            sensor,
            timestamp,
            reflectance: HashMap::new(),
            state: None,
        }
    }

    /// Attach a reflectance band (builder style)
    pub fn with_band(mut self, name: &'static str, raster: Raster<f64>) -> Self {
        self.reflectance.insert(name, raster);
        self
    }

    /// Attach the packed state QA band (builder style)
    pub fn with_state(mut self, state: Raster<u16>) -> Self {
        self.state = Some(state);
        self
    }

    /// Look up a required reflectance band
    pub fn band(&self, name: &'static str) -> Result<&Raster<f64>> {
        self.reflectance
            .get(name)
            .ok_or(Error::MissingBand { band: name })
    }

    /// Look up the packed state QA band
    pub fn state(&self) -> Result<&Raster<u16>> {
        self.state.as_ref().ok_or(Error::MissingBand {
            band: bands::STATE_1KM,
        })
    }
}
