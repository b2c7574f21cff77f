//! Multi-day composite windows
//!
//! Cloud shadows move between acquisitions while standing water does not,
//! so a water flag that appears in only a minority of nearby observations
//! is rejected. Every classified scene anchors one window containing all
//! scenes (both sensors) within a fixed lag before it; a pixel is stable
//! water when enough members voted water.

use crate::classify::ClassifiedScene;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use floodmap_core::scene::dual_sensor_start;
use floodmap_core::{Error, Raster, Result};
use rayon::prelude::*;
use std::str::FromStr;

/// Length of the composite window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Anchor plus one prior day
    TwoDay,
    /// Anchor plus two prior days
    ThreeDay,
}

impl CompositeMode {
    /// Days of lag before the anchor included in the window
    pub fn lag_days(&self) -> i64 {
        match self {
            CompositeMode::TwoDay => 1,
            CompositeMode::ThreeDay => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeMode::TwoDay => "2Day",
            CompositeMode::ThreeDay => "3Day",
        }
    }
}

impl FromStr for CompositeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "2day" => Ok(CompositeMode::TwoDay),
            "3day" => Ok(CompositeMode::ThreeDay),
            _ => Err(Error::InvalidConfiguration {
                name: "composite_mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Minimum water votes for a stable-water pixel.
///
/// Events beginning on or after the dual-sensor date see two observations
/// per day, so the bar is one vote higher than for single-sensor events.
pub fn vote_threshold(mode: CompositeMode, began: NaiveDate) -> u32 {
    let lag = mode.lag_days() as u32;
    if began >= dual_sensor_start() {
        lag + 1
    } else {
        lag
    }
}

/// One majority-vote window over classified scenes
#[derive(Debug, Clone)]
pub struct CompositeWindow {
    pub anchor_timestamp: NaiveDateTime,
    /// Scenes that fell inside the window, across both sensors
    pub member_count: usize,
    pub vote_threshold: u32,
    /// 1 where at least `vote_threshold` members flagged water
    pub stable_water: Raster<u8>,
}

/// Build one composite window per scene.
///
/// A scene is a member of an anchor's window when its timestamp is not
/// after the anchor and at most the lag behind it. Windows near the event
/// start simply carry fewer members. Input must be timestamp-sorted;
/// output preserves anchor order.
pub fn build_composites(
    scenes: &[ClassifiedScene],
    mode: CompositeMode,
    began: NaiveDate,
) -> Result<Vec<CompositeWindow>> {
    if scenes.is_empty() {
        return Ok(Vec::new());
    }
    for scene in &scenes[1..] {
        scenes[0].water.check_shape(&scene.water)?;
    }

    let threshold = vote_threshold(mode, began);
    let lag = Duration::days(mode.lag_days());
    let (rows, cols) = scenes[0].water.shape();

    let windows = (0..scenes.len())
        .into_par_iter()
        .map(|anchor_idx| {
            let anchor = &scenes[anchor_idx];
            let members: Vec<&ClassifiedScene> = scenes
                .iter()
                .filter(|s| {
                    s.timestamp <= anchor.timestamp && anchor.timestamp - s.timestamp <= lag
                })
                .collect();

            let mut stable = anchor.water.like(0);
            for row in 0..rows {
                for col in 0..cols {
                    let votes: u32 = members
                        .iter()
                        .map(|m| u32::from(unsafe { m.water.get_unchecked(row, col) }))
                        .sum();
                    if votes >= threshold {
                        unsafe { stable.set_unchecked(row, col, 1) };
                    }
                }
            }

            CompositeWindow {
                anchor_timestamp: anchor.timestamp,
                member_count: members.len(),
                vote_threshold: threshold,
                stable_water: stable,
            }
        })
        .collect();

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodmap_core::Sensor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn classified(day: u32, hour: u32, sensor: Sensor, water: &[u8]) -> ClassifiedScene {
        ClassifiedScene {
            sensor,
            timestamp: date(2010, 5, day).and_hms_opt(hour, 30, 0).unwrap(),
            water: Raster::from_vec(water.to_vec(), 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("2day".parse::<CompositeMode>().unwrap(), CompositeMode::TwoDay);
        assert_eq!("3Day".parse::<CompositeMode>().unwrap(), CompositeMode::ThreeDay);
        assert!("4day".parse::<CompositeMode>().is_err());
    }

    #[test]
    fn test_cutover_rule() {
        // Strictly before the dual-sensor date: lower bar
        assert_eq!(vote_threshold(CompositeMode::ThreeDay, date(2002, 7, 3)), 2);
        assert_eq!(vote_threshold(CompositeMode::TwoDay, date(2002, 7, 3)), 1);

        // The boundary date itself takes the dual-sensor branch
        assert_eq!(vote_threshold(CompositeMode::ThreeDay, date(2002, 7, 4)), 3);
        assert_eq!(vote_threshold(CompositeMode::TwoDay, date(2002, 7, 4)), 2);

        assert_eq!(vote_threshold(CompositeMode::ThreeDay, date(2010, 1, 1)), 3);
    }

    #[test]
    fn test_window_membership_backward_only() {
        let scenes = vec![
            classified(1, 10, Sensor::Terra, &[1]),
            classified(1, 13, Sensor::Aqua, &[1]),
            classified(2, 10, Sensor::Terra, &[0]),
            classified(3, 10, Sensor::Terra, &[0]),
        ];

        let windows =
            build_composites(&scenes, CompositeMode::TwoDay, date(2010, 5, 1)).unwrap();
        assert_eq!(windows.len(), 4);

        // First anchor sees only itself
        assert_eq!(windows[0].member_count, 1);
        // Day-2 anchor: both day-1 scenes lie within the 1-day lag
        assert_eq!(windows[2].member_count, 3);
        // Day-3 anchor: day-1 scenes are beyond the lag
        assert_eq!(windows[3].member_count, 2);
    }

    #[test]
    fn test_stable_water_vote() {
        // member_count 5, threshold 3: exactly 0..=5 water votes
        for water_votes in 0..=5u32 {
            let scenes: Vec<ClassifiedScene> = (0..5u32)
                .map(|i| {
                    let flag = u8::from(i < water_votes);
                    classified(2, 10 + i, Sensor::Terra, &[flag])
                })
                .collect();

            let windows =
                build_composites(&scenes, CompositeMode::ThreeDay, date(2010, 1, 1)).unwrap();
            let last = windows.last().unwrap();
            assert_eq!(last.member_count, 5);
            assert_eq!(last.vote_threshold, 3);

            let expected = u8::from(water_votes >= 3);
            assert_eq!(
                last.stable_water.get(0, 0).unwrap(),
                expected,
                "votes = {}",
                water_votes
            );
        }
    }

    #[test]
    fn test_exact_lag_boundary_included() {
        // 24h apart exactly: within a 1-day lag
        let scenes = vec![
            classified(1, 10, Sensor::Terra, &[1]),
            classified(2, 10, Sensor::Terra, &[1]),
        ];

        let windows =
            build_composites(&scenes, CompositeMode::TwoDay, date(2010, 5, 1)).unwrap();
        assert_eq!(windows[1].member_count, 2);
        // Post-cutover 2-day threshold is 2: both scenes voted water
        assert_eq!(windows[1].stable_water.get(0, 0).unwrap(), 1);
    }
}
