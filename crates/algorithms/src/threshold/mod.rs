//! Water/land threshold selection
//!
//! Thresholds are computed once per event and applied uniformly to every
//! scene. The standard mode returns the fixed flood-observatory constants;
//! the adaptive mode optimizes the ratio and SWIR thresholds with Otsu's
//! method over a stratified sample of a cloud-free median composite.

mod otsu;
mod sample;

pub use otsu::{otsu_threshold, Histogram};
pub use sample::stratified_sample;

use chrono::{Datelike, NaiveDate};
use floodmap_core::scene::bands;
use floodmap_core::{Context, Error, Raster, Region, Result, Scene};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::str::FromStr;
use tracing::info;

/// Fixed ratio threshold used by the standard mode
pub const STANDARD_RATIO_THRESHOLD: f64 = 0.70;
/// Fixed SWIR threshold used by the standard mode
pub const STANDARD_SWIR_THRESHOLD: f64 = 675.0;
/// Fixed fine-red threshold, applied in both modes
pub const RED_THRESHOLD: f64 = 2027.0;
/// Points drawn per stratum for the Otsu sample
pub const SAMPLE_POINTS: usize = 2500;
/// Plausible land/water SWIR reflectance range; values outside it (missed
/// clouds, bright soil) would make the sampling histogram multi-modal.
pub const SWIR_SAMPLE_RANGE: (f64, f64) = (-500.0, 3000.0);

/// How the water/land thresholds are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    /// Fixed flood-observatory constants
    Standard,
    /// Otsu optimization over a stratified reflectance sample
    Otsu,
}

impl ThresholdMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdMode::Standard => "standard",
            ThresholdMode::Otsu => "otsu",
        }
    }
}

impl FromStr for ThresholdMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(ThresholdMode::Standard),
            "otsu" => Ok(ThresholdMode::Otsu),
            _ => Err(Error::InvalidConfiguration {
                name: "threshold_mode",
                value: s.to_string(),
            }),
        }
    }
}

/// The thresholds applied by the water classifier.
///
/// Read-only after selection; the red threshold is a fixed constant in
/// both modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    pub ratio: f64,
    pub swir: f64,
    pub red: f64,
    /// Scale the Otsu sample was drawn at, `None` for the standard mode
    pub sample_resolution: Option<f64>,
}

impl ThresholdSet {
    /// Create a threshold set, enforcing the ratio-band invariant
    pub fn new(ratio: f64, swir: f64, sample_resolution: Option<f64>) -> Result<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::InvalidConfiguration {
                name: "ratio_threshold",
                value: format!("{} outside (0, 1]", ratio),
            });
        }
        Ok(Self {
            ratio,
            swir,
            red: RED_THRESHOLD,
            sample_resolution,
        })
    }

    /// The fixed standard thresholds
    pub fn standard() -> Self {
        Self {
            ratio: STANDARD_RATIO_THRESHOLD,
            swir: STANDARD_SWIR_THRESHOLD,
            red: RED_THRESHOLD,
            sample_resolution: None,
        }
    }
}

/// Select the event thresholds.
///
/// The adaptive mode samples a QA-masked median composite of the event's
/// scenes, stratified by the permanent-water reference layer for the event
/// year (capped at the latest published year), and runs Otsu optimization
/// independently on the ratio and SWIR histograms.
pub fn select_thresholds(
    ctx: &Context,
    region: &Region,
    scenes: &[Scene],
    began: NaiveDate,
    mode: ThresholdMode,
    seed: u64,
) -> Result<ThresholdSet> {
    match mode {
        ThresholdMode::Standard => Ok(ThresholdSet::standard()),
        ThresholdMode::Otsu => {
            if scenes.is_empty() {
                return Err(Error::InsufficientSample(
                    "no scenes available for threshold sampling".to_string(),
                ));
            }

            // Median across the whole event widens the sampling space and
            // captures within-event variation; the region clip keeps ocean
            // out of the sample.
            let ratio_frame =
                region.clip_with(&masked_median(scenes, |s| &s.ratio)?, f64::NAN);
            let swir_frame = constrain_swir(&region.clip_with(
                &masked_median(scenes, |s| &s.swir)?,
                f64::NAN,
            ))?;

            let year = began.year().min(ctx.reference.latest_year());
            let strata = ctx.reference.permanent_water(year, region)?;
            ratio_frame.check_shape(&strata)?;

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let positions = stratified_sample(
                &strata,
                |row, col| {
                    let r = unsafe { ratio_frame.get_unchecked(row, col) };
                    let s = unsafe { swir_frame.get_unchecked(row, col) };
                    r.is_finite() && s.is_finite()
                },
                SAMPLE_POINTS,
                &mut rng,
            )?;

            let ratio_values: Vec<f64> = positions
                .iter()
                .map(|&(row, col)| unsafe { ratio_frame.get_unchecked(row, col) })
                .collect();
            let swir_values: Vec<f64> = positions
                .iter()
                .map(|&(row, col)| unsafe { swir_frame.get_unchecked(row, col) })
                .collect();

            let ratio = otsu_threshold(&Histogram::from_values(&ratio_values))?;
            let swir = otsu_threshold(&Histogram::from_values(&swir_values))?;

            let resolution = ctx.imagery.nominal_resolution(bands::RED_250M)?;
            let resolution = (resolution * 100.0).round() / 100.0;

            info!(
                ratio_threshold = ratio,
                swir_threshold = swir,
                sample_resolution = resolution,
                samples = positions.len(),
                "selected otsu thresholds"
            );

            ThresholdSet::new(ratio, swir, Some(resolution))
        }
    }
}

/// Per-pixel median of a band across all scenes, ignoring pixels flagged as
/// cloud, shadow, ice or snow. Pixels with no valid observation are NaN.
fn masked_median<F>(scenes: &[Scene], band: F) -> Result<Raster<f64>>
where
    F: Fn(&Scene) -> &Raster<f64> + Sync,
{
    let first = band(&scenes[0]);
    for scene in &scenes[1..] {
        first.check_shape(band(scene))?;
    }
    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = Vec::with_capacity(scenes.len());
            for col in 0..cols {
                values.clear();
                for scene in scenes {
                    if scene.qa.is_contaminated(row, col) {
                        continue;
                    }
                    let v = unsafe { band(scene).get_unchecked(row, col) };
                    if v.is_finite() {
                        values.push(v);
                    }
                }
                if values.is_empty() {
                    continue;
                }

                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let mid = values.len() / 2;
                row_data[col] = if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                };
            }
            row_data
        })
        .collect();

    let mut output = first.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));
    output.set_data_from_vec(data)?;
    Ok(output)
}

/// NaN out SWIR values outside the plausible land/water range
fn constrain_swir(frame: &Raster<f64>) -> Result<Raster<f64>> {
    let (lo, hi) = SWIR_SAMPLE_RANGE;
    let (rows, cols) = frame.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let v = unsafe { frame.get_unchecked(row, col) };
                if v.is_finite() && v > lo && v < hi {
                    row_data[col] = v;
                }
            }
            row_data
        })
        .collect();

    let mut output = frame.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));
    output.set_data_from_vec(data)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use floodmap_core::{GeoTransform, QaFlags, Sensor};

    #[test]
    fn test_mode_parsing() {
        assert_eq!("standard".parse::<ThresholdMode>().unwrap(), ThresholdMode::Standard);
        assert_eq!("Otsu".parse::<ThresholdMode>().unwrap(), ThresholdMode::Otsu);
        assert!(matches!(
            "adaptive".parse::<ThresholdMode>(),
            Err(Error::InvalidConfiguration { name: "threshold_mode", .. })
        ));
    }

    #[test]
    fn test_standard_thresholds() {
        let set = ThresholdSet::standard();
        assert_relative_eq!(set.ratio, 0.70);
        assert_relative_eq!(set.swir, 675.0);
        assert_relative_eq!(set.red, 2027.0);
        assert!(set.sample_resolution.is_none());
    }

    #[test]
    fn test_ratio_invariant() {
        assert!(ThresholdSet::new(0.5, 600.0, None).is_ok());
        assert!(ThresholdSet::new(1.0, 600.0, None).is_ok());
        assert!(ThresholdSet::new(0.0, 600.0, None).is_err());
        assert!(ThresholdSet::new(1.2, 600.0, None).is_err());
    }

    fn uniform_scene(value: f64, state: u16, day: u32) -> Scene {
        let mut band = Raster::filled(4, 4, value);
        band.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        band.set_nodata(Some(f64::NAN));
        let mut state_raster = Raster::filled(4, 4, state);
        state_raster.set_nodata(Some(u16::MAX));

        Scene {
            sensor: Sensor::Terra,
            timestamp: NaiveDate::from_ymd_opt(2010, 5, day)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            red: band.clone(),
            nir: band.clone(),
            blue: band.clone(),
            green: band.clone(),
            swir: band.clone(),
            ratio: band.clone(),
            qa: QaFlags::decode(&state_raster),
        }
    }

    #[test]
    fn test_masked_median_skips_contaminated() {
        // Three scenes: values 10, 20, 30; the middle one fully cloudy
        let scenes = vec![
            uniform_scene(10.0, 0, 1),
            uniform_scene(20.0, 1, 2),
            uniform_scene(30.0, 0, 3),
        ];

        let median = masked_median(&scenes, |s| &s.ratio).unwrap();
        // Only 10 and 30 survive the QA mask
        assert_relative_eq!(median.get(2, 2).unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_masked_median_odd_count() {
        let scenes = vec![
            uniform_scene(10.0, 0, 1),
            uniform_scene(20.0, 0, 2),
            uniform_scene(30.0, 0, 3),
        ];

        let median = masked_median(&scenes, |s| &s.ratio).unwrap();
        assert_relative_eq!(median.get(0, 0).unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_swir_constraint() {
        let mut frame = Raster::filled(1, 4, 500.0);
        frame.set(0, 1, -600.0).unwrap();
        frame.set(0, 2, 3500.0).unwrap();
        frame.set(0, 3, 2999.0).unwrap();

        let constrained = constrain_swir(&frame).unwrap();
        assert!(constrained.get(0, 0).unwrap().is_finite());
        assert!(constrained.get(0, 1).unwrap().is_nan());
        assert!(constrained.get(0, 2).unwrap().is_nan());
        assert!(constrained.get(0, 3).unwrap().is_finite());
    }
}
