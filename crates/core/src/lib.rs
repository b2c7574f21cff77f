//! # Floodmap Core
//!
//! Core types for the floodmap flood-detection library.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type backed by `ndarray`
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `RawScene`/`Scene`: Raw and canonical satellite acquisitions
//! - `Sensor`, `CloudState`, `QaFlags`: Sensor and quality-flag model
//! - `Region`/`EventWindow`: Spatial and temporal event extents
//! - `ImagerySource`/`ReferenceWaterSource`: Collaborator traits

pub mod error;
pub mod raster;
pub mod region;
pub mod scene;
pub mod source;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use region::{EventWindow, Region};
pub use scene::{CloudState, QaFlags, RawScene, Scene, Sensor};
pub use source::{Context, ImagerySource, ReferenceWaterSource};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::region::{EventWindow, Region};
    pub use crate::scene::{CloudState, QaFlags, RawScene, Scene, Sensor};
    pub use crate::source::{Context, ImagerySource, ReferenceWaterSource};
}
