//! Otsu threshold optimization over sampled reflectance histograms

use floodmap_core::{Error, Result};

/// Histogram of sampled band values as parallel arrays of bucket means and
/// bucket counts. Empty buckets are dropped, so `means` is strictly
/// increasing and every count is positive.
#[derive(Debug, Clone)]
pub struct Histogram {
    means: Vec<f64>,
    counts: Vec<f64>,
}

impl Histogram {
    /// Build a histogram from raw sample values.
    ///
    /// Non-finite values are skipped. The bucket count follows the square
    /// root rule on the sample size; each kept bucket reports the true mean
    /// of the values that fell into it.
    pub fn from_values(values: &[f64]) -> Histogram {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Histogram {
                means: Vec::new(),
                counts: Vec::new(),
            };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &finite {
            min = min.min(v);
            max = max.max(v);
        }

        if max <= min {
            return Histogram {
                means: vec![min],
                counts: vec![finite.len() as f64],
            };
        }

        let buckets = (finite.len() as f64).sqrt().ceil() as usize;
        let width = (max - min) / buckets as f64;

        let mut sums = vec![0.0; buckets];
        let mut counts = vec![0usize; buckets];
        for &v in &finite {
            let idx = (((v - min) / width) as usize).min(buckets - 1);
            sums[idx] += v;
            counts[idx] += 1;
        }

        let mut out_means = Vec::with_capacity(buckets);
        let mut out_counts = Vec::with_capacity(buckets);
        for (sum, count) in sums.into_iter().zip(counts) {
            if count > 0 {
                out_means.push(sum / count as f64);
                out_counts.push(count as f64);
            }
        }

        Histogram {
            means: out_means,
            counts: out_counts,
        }
    }

    /// Build a histogram directly from bucket means and counts
    pub fn new(means: Vec<f64>, counts: Vec<f64>) -> Histogram {
        Histogram { means, counts }
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Whether the histogram holds no buckets
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Bucket means
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Bucket counts
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }
}

/// Select the threshold maximizing between-class variance.
///
/// For each split point `k`, the buckets are partitioned into a low group
/// `[0, k)` and a high group `[k, n)`; the between-class sum of squares is
///
/// ```text
/// BSS(k) = count_lo * (mean_lo - mean)^2 + count_hi * (mean_hi - mean)^2
/// ```
///
/// The returned threshold is the mean of the last bucket in the low group
/// of the winning split. Ties resolve to the highest split point.
pub fn otsu_threshold(histogram: &Histogram) -> Result<f64> {
    if histogram.is_empty() {
        return Err(Error::InsufficientSample(
            "empty histogram for threshold optimization".to_string(),
        ));
    }

    let n = histogram.len();
    let total: f64 = histogram.counts.iter().sum();
    let summed: f64 = histogram
        .means
        .iter()
        .zip(&histogram.counts)
        .map(|(m, c)| m * c)
        .sum();
    let mean = summed / total;

    let mut lo_count = 0.0;
    let mut lo_sum = 0.0;
    let mut best_bss = f64::NEG_INFINITY;
    let mut best_split = 1;

    for k in 1..=n {
        lo_count += histogram.counts[k - 1];
        lo_sum += histogram.means[k - 1] * histogram.counts[k - 1];

        let lo_mean = lo_sum / lo_count;
        let hi_count = total - lo_count;

        let bss = if hi_count > 0.0 {
            let hi_mean = (summed - lo_sum) / hi_count;
            lo_count * (lo_mean - mean).powi(2) + hi_count * (hi_mean - mean).powi(2)
        } else {
            // Degenerate split with everything in the low group
            0.0
        };

        if bss >= best_bss {
            best_bss = bss;
            best_split = k;
        }
    }

    Ok(histogram.means[best_split - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Brute-force BSS enumeration used to pin the implementation
    fn brute_force(hist: &Histogram) -> f64 {
        let n = hist.len();
        let total: f64 = hist.counts().iter().sum();
        let summed: f64 = hist
            .means()
            .iter()
            .zip(hist.counts())
            .map(|(m, c)| m * c)
            .sum();
        let mean = summed / total;

        let mut best = (f64::NEG_INFINITY, 0);
        for k in 1..=n {
            let lo_count: f64 = hist.counts()[..k].iter().sum();
            let lo_sum: f64 = hist.means()[..k]
                .iter()
                .zip(&hist.counts()[..k])
                .map(|(m, c)| m * c)
                .sum();
            let lo_mean = lo_sum / lo_count;
            let hi_count = total - lo_count;
            let bss = if hi_count > 0.0 {
                let hi_mean = (summed - lo_sum) / hi_count;
                lo_count * (lo_mean - mean).powi(2) + hi_count * (hi_mean - mean).powi(2)
            } else {
                0.0
            };
            if bss >= best.0 {
                best = (bss, k);
            }
        }
        hist.means()[best.1 - 1]
    }

    #[test]
    fn test_matches_brute_force() {
        let hist = Histogram::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![10.0, 10.0, 1.0, 10.0, 10.0],
        );

        let got = otsu_threshold(&hist).unwrap();
        assert_relative_eq!(got, brute_force(&hist), epsilon = 1e-12);
        // Symmetric histogram: splits after bucket 2 and bucket 3 tie on
        // BSS; the highest split wins, landing on the valley bucket.
        assert_relative_eq!(got, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bimodal_split() {
        // Two well-separated modes; the threshold must fall in the low mode's
        // last bucket before the gap.
        let values: Vec<f64> = (0..100)
            .map(|i| if i < 50 { 10.0 + (i % 5) as f64 } else { 100.0 + (i % 5) as f64 })
            .collect();
        let hist = Histogram::from_values(&values);
        let threshold = otsu_threshold(&hist).unwrap();

        assert!(threshold > 10.0 && threshold < 100.0, "got {}", threshold);
    }

    #[test]
    fn test_empty_histogram_rejected() {
        let hist = Histogram::from_values(&[f64::NAN, f64::INFINITY]);
        assert!(otsu_threshold(&hist).is_err());
    }

    #[test]
    fn test_constant_values_single_bucket() {
        let hist = Histogram::from_values(&[5.0; 20]);
        assert_eq!(hist.len(), 1);
        // Single bucket: the only split puts everything in the low group
        assert_relative_eq!(otsu_threshold(&hist).unwrap(), 5.0, epsilon = 1e-12);
    }
}
