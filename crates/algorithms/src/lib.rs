//! # Floodmap Algorithms
//!
//! Flood detection and compositing algorithms for multi-temporal,
//! multi-sensor daily reflectance imagery.
//!
//! ## Pipeline stages
//!
//! - **preprocess**: canonical bands, pan-sharpening, ratio band, QA decode
//! - **threshold**: static or Otsu water/land threshold selection
//! - **classify**: per-scene water flagging
//! - **composite**: multi-day majority-vote windows
//! - **aggregate**: flood extent and duration
//! - **clear_views**: per-pixel observation quality accounting
//! - **max_extent**: maximal single-scene extent, for validation
//! - **event**: the end-to-end event pipeline

pub mod aggregate;
pub mod classify;
pub mod clear_views;
pub mod composite;
pub mod event;
pub mod max_extent;
pub mod preprocess;
pub mod threshold;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregate::{flood_extent, FloodExtent};
    pub use crate::classify::{classify_scene, classify_scenes, ClassifiedScene};
    pub use crate::clear_views::{clear_view_stats, ClearViewStats};
    pub use crate::composite::{build_composites, vote_threshold, CompositeMode, CompositeWindow};
    pub use crate::event::{map_flood_event, EventParams, FloodMap, FloodMapMetadata};
    pub use crate::max_extent::{max_extent, MaxExtent};
    pub use crate::preprocess::preprocess;
    pub use crate::threshold::{select_thresholds, ThresholdMode, ThresholdSet};
    pub use floodmap_core::prelude::*;
}
