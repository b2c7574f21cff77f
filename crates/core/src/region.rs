//! Spatial and temporal extents of a flood event

use crate::error::{Error, Result};
use crate::raster::{Raster, RasterElement};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use geo::{BoundingRect, Contains, Point, Polygon, Rect};

/// Days of imagery pulled before the event began date, so the first flood
/// day participates in a full backward-looking composite.
pub const QUERY_LEAD_DAYS: i64 = 2;
/// Days of imagery pulled after the event ended date.
pub const QUERY_TRAIL_DAYS: i64 = 3;

/// Region of interest for a flood event.
///
/// Wraps the event polygon and exposes both the bounding rectangle (used
/// while processing, rectangles being cheaper than complex geometries) and
/// exact polygon membership (used for the final clip).
#[derive(Debug, Clone)]
pub struct Region {
    polygon: Polygon<f64>,
}

impl Region {
    /// Create a region from a polygon
    pub fn new(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// Create a rectangular region from corner coordinates
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let rect = Rect::new((min_x, min_y), (max_x, max_y));
        Self {
            polygon: rect.to_polygon(),
        }
    }

    /// The region polygon
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Bounding rectangle as (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> Result<(f64, f64, f64, f64)> {
        let rect = self
            .polygon
            .bounding_rect()
            .ok_or_else(|| Error::Other("region polygon has no bounding rectangle".to_string()))?;
        Ok((rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Whether a geographic point lies inside the region polygon
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.polygon.contains(&Point::new(x, y))
    }

    /// Clip a raster to the region polygon.
    ///
    /// Cells whose center falls outside the polygon are set to `fill`.
    pub fn clip_with<T: RasterElement>(&self, raster: &Raster<T>, fill: T) -> Raster<T> {
        let (rows, cols) = raster.shape();
        let mut out = raster.clone();
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = raster.pixel_to_geo(col, row);
                if !self.contains_point(x, y) {
                    unsafe { out.set_unchecked(row, col, fill) };
                }
            }
        }
        out
    }
}

/// Temporal extent of a flood event.
///
/// Carries the began/ended dates of the event plus the buffered imagery
/// query window around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    began: NaiveDate,
    ended: NaiveDate,
}

impl EventWindow {
    /// Create an event window, validating date ordering
    pub fn new(began: NaiveDate, ended: NaiveDate) -> Result<Self> {
        if ended < began {
            return Err(Error::InvalidConfiguration {
                name: "ended",
                value: format!("{} precedes began date {}", ended, began),
            });
        }
        Ok(Self { began, ended })
    }

    /// The event start date
    pub fn began(&self) -> NaiveDate {
        self.began
    }

    /// The event end date
    pub fn ended(&self) -> NaiveDate {
        self.ended
    }

    /// First instant of the buffered imagery query range
    pub fn query_start(&self) -> NaiveDateTime {
        (self.began - Duration::days(QUERY_LEAD_DAYS)).and_time(NaiveTime::MIN)
    }

    /// Last instant (exclusive) of the buffered imagery query range
    pub fn query_end(&self) -> NaiveDateTime {
        (self.ended + Duration::days(QUERY_TRAIL_DAYS)).and_time(NaiveTime::MIN)
    }

    /// Whether a scene timestamp falls inside the buffered query range
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.query_start() && timestamp < self.query_end()
    }
}
