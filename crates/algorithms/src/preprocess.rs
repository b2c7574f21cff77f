//! Scene preprocessing
//!
//! Normalizes raw per-sensor band sets into canonical [`Scene`]s: the
//! coarse-resolution bands are pan-sharpened against the fine red band, the
//! NIR/red ratio band is derived, and the packed state band is unpacked
//! into per-pixel QA flags.

use floodmap_core::scene::bands;
use floodmap_core::{QaFlags, Raster, RawScene, Result, Scene};
use rayon::prelude::*;

/// Offsets applied to the NIR/red ratio, calibrated against the sensor's
/// radiometric response.
const RATIO_NIR_OFFSET: f64 = 13.5;
const RATIO_RED_OFFSET: f64 = 1081.1;

/// Preprocess a raw acquisition into a canonical scene.
///
/// Pure transform: fails with `MissingBand` if any required reflectance or
/// QA band is absent, otherwise never touches external state.
pub fn preprocess(raw: &RawScene) -> Result<Scene> {
    let red = raw.band(bands::RED_250M)?;
    let nir = raw.band(bands::NIR_250M)?;
    let red_coarse = raw.band(bands::RED_500M)?;
    let blue = raw.band(bands::BLUE)?;
    let green = raw.band(bands::GREEN)?;
    let swir = raw.band(bands::SWIR)?;
    let state = raw.state()?;

    for band in [nir, red_coarse, blue, green, swir] {
        red.check_shape(band)?;
    }
    red.check_shape(state)?;

    // Resolution-correction scale: the ratio of the matching coarse/fine
    // red bands, applied to every coarse band.
    let scale = resolution_scale(red_coarse, red)?;

    Ok(Scene {
        sensor: raw.sensor,
        timestamp: raw.timestamp,
        red: red.clone(),
        nir: nir.clone(),
        blue: pan_sharpen(blue, &scale)?,
        green: pan_sharpen(green, &scale)?,
        swir: pan_sharpen(swir, &scale)?,
        ratio: band_ratio(nir, red)?,
        qa: QaFlags::decode(state),
    })
}

/// Per-pixel `red_coarse / red_fine` scale used for pan-sharpening
fn resolution_scale(red_coarse: &Raster<f64>, red_fine: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = red_fine.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let coarse = unsafe { red_coarse.get_unchecked(row, col) };
                let fine = unsafe { red_fine.get_unchecked(row, col) };

                if coarse.is_nan() || fine.is_nan() || fine.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = coarse / fine;
            }
            row_data
        })
        .collect();

    build_output(red_fine, data)
}

/// Sharpen a coarse band by dividing out the resolution scale
fn pan_sharpen(coarse: &Raster<f64>, scale: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = coarse.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let c = unsafe { coarse.get_unchecked(row, col) };
                let s = unsafe { scale.get_unchecked(row, col) };

                if c.is_nan() || s.is_nan() || s.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = c / s;
            }
            row_data
        })
        .collect();

    build_output(coarse, data)
}

/// Derived discrimination band: `(nir + 13.5) / (red + 1081.1)`.
///
/// Water suppresses NIR reflectance, pulling the ratio toward zero.
pub fn band_ratio(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = nir.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };

                if n.is_nan() || r.is_nan() {
                    continue;
                }
                row_data[col] = (n + RATIO_NIR_OFFSET) / (r + RATIO_RED_OFFSET);
            }
            row_data
        })
        .collect();

    build_output(nir, data)
}

fn build_output(reference: &Raster<f64>, data: Vec<f64>) -> Result<Raster<f64>> {
    let mut output = reference.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));
    output.set_data_from_vec(data)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use floodmap_core::{Error, Sensor};

    fn timestamp() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn full_raw() -> RawScene {
        RawScene::new(Sensor::Terra, timestamp())
            .with_band(bands::RED_250M, Raster::filled(2, 2, 1000.0))
            .with_band(bands::NIR_250M, Raster::filled(2, 2, 500.0))
            .with_band(bands::RED_500M, Raster::filled(2, 2, 2000.0))
            .with_band(bands::BLUE, Raster::filled(2, 2, 400.0))
            .with_band(bands::GREEN, Raster::filled(2, 2, 600.0))
            .with_band(bands::SWIR, Raster::filled(2, 2, 800.0))
            .with_state(Raster::filled(2, 2, 0u16))
    }

    #[test]
    fn test_missing_band_aborts() {
        let raw = RawScene::new(Sensor::Terra, timestamp())
            .with_band(bands::RED_250M, Raster::filled(2, 2, 1000.0));
        assert!(matches!(
            preprocess(&raw),
            Err(Error::MissingBand { .. })
        ));
    }

    #[test]
    fn test_pan_sharpen_scale() {
        let scene = preprocess(&full_raw()).unwrap();

        // scale = 2000 / 1000 = 2, so each coarse band is halved
        assert_relative_eq!(scene.blue.get(0, 0).unwrap(), 200.0, epsilon = 1e-10);
        assert_relative_eq!(scene.green.get(0, 0).unwrap(), 300.0, epsilon = 1e-10);
        assert_relative_eq!(scene.swir.get(0, 0).unwrap(), 400.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ratio_band() {
        let scene = preprocess(&full_raw()).unwrap();

        let expected = (500.0 + 13.5) / (1000.0 + 1081.1);
        assert_relative_eq!(scene.ratio.get(0, 0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        let mut nir = Raster::filled(2, 2, 500.0);
        nir.set(0, 1, f64::NAN).unwrap();
        let raw = full_raw().with_band(bands::NIR_250M, nir);

        let scene = preprocess(&raw).unwrap();
        assert!(scene.ratio.get(0, 1).unwrap().is_nan());
        assert!(!scene.ratio.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let raw = full_raw().with_band(bands::SWIR, Raster::filled(3, 2, 800.0));
        assert!(matches!(preprocess(&raw), Err(Error::SizeMismatch { .. })));
    }
}
