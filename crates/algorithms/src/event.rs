//! End-to-end event pipeline
//!
//! Wires the pipeline stages for one flood event: collect and preprocess
//! scenes, select thresholds, classify, composite, aggregate, account for
//! clear views, and assemble the final multi-band flood map.

use crate::aggregate::flood_extent;
use crate::classify::classify_scenes;
use crate::clear_views::clear_view_stats;
use crate::composite::{build_composites, vote_threshold, CompositeMode};
use crate::max_extent::max_extent;
use crate::preprocess::preprocess;
use crate::threshold::{select_thresholds, ThresholdMode};
use chrono::NaiveDate;
use floodmap_core::{Context, Error, EventWindow, Raster, Region, Result, Scene};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

/// Default seed for the stratified threshold sample, so repeated runs of
/// the same event draw the same sample
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Validated inputs for one flood event
#[derive(Debug, Clone)]
pub struct EventParams {
    pub began: NaiveDate,
    pub ended: NaiveDate,
    pub threshold_mode: ThresholdMode,
    pub composite_mode: CompositeMode,
    pub include_max_extent: bool,
    pub sample_seed: u64,
}

impl EventParams {
    /// Create event parameters, validating date ordering up front
    pub fn new(
        began: NaiveDate,
        ended: NaiveDate,
        threshold_mode: ThresholdMode,
        composite_mode: CompositeMode,
    ) -> Result<Self> {
        EventWindow::new(began, ended)?;
        Ok(Self {
            began,
            ended,
            threshold_mode,
            composite_mode,
            include_max_extent: false,
            sample_seed: DEFAULT_SAMPLE_SEED,
        })
    }

    /// Parse parameters from string inputs, rejecting unknown mode values
    /// immediately rather than deep in the pipeline
    pub fn from_args(
        began: &str,
        ended: &str,
        threshold_mode: &str,
        composite_mode: &str,
    ) -> Result<Self> {
        let began = parse_date("began", began)?;
        let ended = parse_date("ended", ended)?;
        Self::new(
            began,
            ended,
            threshold_mode.parse()?,
            composite_mode.parse()?,
        )
    }

    /// Also emit the maximal single-scene extent bands
    pub fn with_max_extent(mut self) -> Self {
        self.include_max_extent = true;
        self
    }

    /// Override the threshold sampling seed
    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = seed;
        self
    }
}

fn parse_date(name: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| Error::InvalidConfiguration {
        name,
        value: value.to_string(),
    })
}

/// Metadata attached to a finished flood map
#[derive(Debug, Clone, Serialize)]
pub struct FloodMapMetadata {
    pub began: NaiveDate,
    pub ended: NaiveDate,
    pub threshold_mode: String,
    pub composite_mode: String,
    pub ratio_threshold: f64,
    pub swir_threshold: f64,
    pub sample_resolution: Option<f64>,
    pub max_extent_date: Option<NaiveDate>,
}

/// The terminal artifact of the pipeline.
///
/// Four mandatory bands, in order: flood extent, duration, clear views and
/// clear percentage; plus the optional max-extent band.
#[derive(Debug, Clone)]
pub struct FloodMap {
    pub flooded: Raster<u8>,
    pub duration: Raster<u16>,
    pub clear_views: Raster<u16>,
    pub clear_perc: Raster<f64>,
    pub max_extent: Option<Raster<u8>>,
    pub metadata: FloodMapMetadata,
}

/// Map one flood event.
///
/// Threshold selection is a barrier: it reduces over the whole event
/// before any scene is classified. Everything after is per-scene and
/// per-pixel parallel. Fatal errors (missing bands, degenerate samples)
/// propagate to the caller; batch drivers log them per event and move on.
pub fn map_flood_event(ctx: &Context, region: &Region, params: &EventParams) -> Result<FloodMap> {
    let window = EventWindow::new(params.began, params.ended)?;

    let raws = ctx.imagery.scenes(region, &window)?;
    let raws: Vec<_> = raws
        .into_iter()
        .filter(|raw| window.contains(raw.timestamp))
        .collect();
    info!(
        scenes = raws.len(),
        began = %params.began,
        ended = %params.ended,
        "collected raw scenes"
    );
    if raws.is_empty() {
        return Err(Error::InsufficientSample(
            "imagery source returned no scenes in the event window".to_string(),
        ));
    }

    let mut scenes: Vec<Scene> = raws.par_iter().map(preprocess).collect::<Result<Vec<_>>>()?;
    scenes.sort_by_key(|s| (s.timestamp, s.sensor.name()));

    let thresholds = select_thresholds(
        ctx,
        region,
        &scenes,
        params.began,
        params.threshold_mode,
        params.sample_seed,
    )?;

    let classified = classify_scenes(&scenes, &thresholds);
    let windows = build_composites(&classified, params.composite_mode, params.began)?;
    info!(
        windows = windows.len(),
        vote_threshold = vote_threshold(params.composite_mode, params.began),
        "built composite windows"
    );

    let extent = flood_extent(&windows)?;
    let clear = clear_view_stats(&scenes)?;
    let max = if params.include_max_extent {
        max_extent(&classified)
    } else {
        None
    };

    let metadata = FloodMapMetadata {
        began: params.began,
        ended: params.ended,
        threshold_mode: params.threshold_mode.as_str().to_string(),
        composite_mode: params.composite_mode.as_str().to_string(),
        ratio_threshold: thresholds.ratio,
        swir_threshold: thresholds.swir,
        sample_resolution: thresholds.sample_resolution,
        max_extent_date: max.as_ref().map(|m| m.date()),
    };

    // Processing ran over the rectangular bounds; the final product is
    // clipped to the exact event polygon.
    Ok(FloodMap {
        flooded: region.clip_with(&extent.flooded, 0),
        duration: region.clip_with(&extent.duration, 0),
        clear_views: region.clip_with(&clear.clear_views, 0),
        clear_perc: region.clip_with(&clear.clear_perc, f64::NAN),
        max_extent: max.map(|m| region.clip_with(&m.water, 0)),
        metadata,
    })
}
