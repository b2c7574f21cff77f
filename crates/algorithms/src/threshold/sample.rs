//! Stratified random sampling of the threshold optimization frame

use floodmap_core::{Error, Raster, Result};
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Draw a stratified random pixel sample.
///
/// Candidate pixels are grouped by their stratum value (permanent-water
/// class); pixels rejected by `valid` or carrying the stratum no-data
/// marker are excluded. Up to `per_stratum` pixels are drawn from each
/// stratum without replacement. Fails with `InsufficientSample` when fewer
/// than two strata hold any candidates, since a one-sided sample cannot
/// produce a bimodal histogram.
pub fn stratified_sample(
    strata: &Raster<u8>,
    valid: impl Fn(usize, usize) -> bool,
    per_stratum: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<(usize, usize)>> {
    let (rows, cols) = strata.shape();

    let mut candidates: BTreeMap<u8, Vec<(usize, usize)>> = BTreeMap::new();
    for row in 0..rows {
        for col in 0..cols {
            let class = unsafe { strata.get_unchecked(row, col) };
            if strata.is_nodata(class) || !valid(row, col) {
                continue;
            }
            candidates.entry(class).or_default().push((row, col));
        }
    }

    if candidates.len() < 2 {
        return Err(Error::InsufficientSample(format!(
            "stratified sample found {} populated strata, need 2",
            candidates.len()
        )));
    }

    let mut sample = Vec::new();
    for positions in candidates.values() {
        if positions.len() <= per_stratum {
            sample.extend_from_slice(positions);
        } else {
            for idx in index::sample(rng, positions.len(), per_stratum) {
                sample.push(positions[idx]);
            }
        }
    }

    Ok(sample)
}
