//! Collaborator traits for imagery and reference-water catalogs.
//!
//! The core never talks to a catalog or cloud service directly; callers
//! construct a [`Context`] once and pass it by reference into the pipeline.

use crate::error::Result;
use crate::raster::Raster;
use crate::region::{EventWindow, Region};
use crate::scene::RawScene;

/// Source of raw daily-reflectance scenes.
pub trait ImagerySource {
    /// All acquisitions intersecting the region within the buffered event
    /// window, clipped to the region bounds, ordered by timestamp.
    fn scenes(&self, region: &Region, window: &EventWindow) -> Result<Vec<RawScene>>;

    /// Nominal resolution of a named band in map units, used to report the
    /// scale the threshold sample was drawn at.
    fn nominal_resolution(&self, band: &'static str) -> Result<f64>;
}

/// Source of the permanent/seasonal surface-water reference layer.
pub trait ReferenceWaterSource {
    /// Latest year the reference layer is published for
    fn latest_year(&self) -> i32;

    /// Boolean permanent-water raster for a year, aligned to the imagery
    /// grid and clipped to the region bounds. Years past `latest_year`
    /// must be requested as `latest_year`.
    fn permanent_water(&self, year: i32, region: &Region) -> Result<Raster<u8>>;
}

/// Handle bundling the collaborator sources for one event computation.
///
/// Replaces any ambient client/session state: every component that needs a
/// catalog receives this context explicitly.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub imagery: &'a dyn ImagerySource,
    pub reference: &'a dyn ReferenceWaterSource,
}

impl<'a> Context<'a> {
    pub fn new(
        imagery: &'a dyn ImagerySource,
        reference: &'a dyn ReferenceWaterSource,
    ) -> Self {
        Self { imagery, reference }
    }
}
