//! Histograms, cumulative distributions, and their support.
//!
//! ```text
//! CDF[0] = hist[0] / n
//! CDF[i] = CDF[i−1] + hist[i] / n
//! ```
//!
//! The CDF is non-decreasing by construction and reaches ≈1.0 at the top
//! bin whenever `n` equals the histogram total.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

/// Gaussian-like kernel for smoothing sparse sampled histograms.
pub const SMOOTHING_KERNEL: [f32; 7] = [0.06, 0.1, 0.2, 0.3, 0.2, 0.1, 0.06];

/// A monotonically non-decreasing cumulative distribution over bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cdf(Vec<f32>);

impl Cdf {
    /// Accumulate a histogram of weights into a CDF normalized by `total`.
    pub fn from_weights(weights: &[f32], total: f32) -> Self {
        let mut acc = 0.0_f64;
        let inv = 1.0 / f64::from(total);
        Self(
            weights
                .iter()
                .map(|&w| {
                    acc += f64::from(w) * inv;
                    acc as f32
                })
                .collect(),
        )
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the CDF has no bins, i.e. carries no distribution data.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cumulative probability at `bin`.
    ///
    /// # Panics
    /// Panics if `bin >= len()`.
    pub fn at(&self, bin: usize) -> f32 {
        self.0[bin]
    }

    /// All bins.
    pub fn values(&self) -> &[f32] {
        &self.0
    }
}

/// Histogram, CDF, and occupied-bin range of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Raw (unsmoothed) bin counts.
    pub histogram: Vec<u32>,
    /// Cumulative distribution, possibly built from a smoothed histogram.
    pub cdf: Cdf,
    /// First and last occupied bin of the raw histogram.
    pub support: (usize, usize),
}

impl Distribution {
    /// Build from raw bin counts. Fails if the histogram is empty.
    pub fn from_histogram(histogram: Vec<u32>) -> Result<Self> {
        let weights: Vec<f32> = histogram.iter().map(|&c| c as f32).collect();
        Self::from_weighted(histogram, &weights)
    }

    /// Build from raw bin counts, accumulating the CDF over the smoothed
    /// histogram. The support still follows the raw counts.
    pub fn from_histogram_smoothed(histogram: Vec<u32>) -> Result<Self> {
        let weights = smooth(&histogram);
        Self::from_weighted(histogram, &weights)
    }

    fn from_weighted(histogram: Vec<u32>, weights: &[f32]) -> Result<Self> {
        let total: f64 = weights.iter().map(|&w| f64::from(w)).sum();
        let first = histogram.iter().position(|&c| c > 0);
        let last = histogram.iter().rposition(|&c| c > 0);
        let (Some(lo), Some(hi)) = (first, last) else {
            return Err(TransferError::InvalidInput(
                "distribution needs at least one sample".into(),
            ));
        };
        Ok(Self {
            cdf: Cdf::from_weights(weights, total as f32),
            histogram,
            support: (lo, hi),
        })
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.cdf.len()
    }

    /// Number of samples counted.
    pub fn total(&self) -> u64 {
        self.histogram.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Convolve a histogram with [`SMOOTHING_KERNEL`], clamping at the edges.
pub fn smooth(histogram: &[u32]) -> Vec<f32> {
    let half = SMOOTHING_KERNEL.len() as isize / 2;
    let last = histogram.len() as isize - 1;
    let weight_sum: f32 = SMOOTHING_KERNEL.iter().sum();

    (0..histogram.len() as isize)
        .map(|i| {
            let sum: f32 = SMOOTHING_KERNEL
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let idx = (i + k as isize - half).clamp(0, last) as usize;
                    histogram[idx] as f32 * w
                })
                .sum();
            sum / weight_sum
        })
        .collect()
}
