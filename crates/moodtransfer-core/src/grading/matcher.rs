//! One-dimensional distribution matching.
//!
//! A value at bin position `x` in the source distribution is mapped to the
//! bin of the target distribution whose cumulative probability is closest
//! to `CDF_src[x]`:
//!
//! ```text
//! p       = CDF_src[round(x)]
//! m       = argmin_i |CDF_tgt[i] − p|       (lowest i on ties)
//! m       = clamp(m, support_tgt)
//! out     = (1 − bias) × m + bias × x       (bias = identity_bias, 0.3)
//! ```
//!
//! Values are expressed in bin units of the distribution, so the same
//! matcher serves 256-bin RGB, 101-bin percent, 360-bin hue, and the
//! L\*a\*b\* layouts.
//!
//! Matching never leaves the target's occupied range: a flat CDF region
//! below the first sample would otherwise send every dark value to bin 0.
//! When the two distributions are identical the map is the identity.

use crate::analysis::histogram::Distribution;
use crate::error::{Result, TransferError};
use crate::transform::params::{MAX_SMOOTHING_WINDOW, TuningConstants};

/// A source/target distribution pair checked for compatibility.
#[derive(Debug, Clone, Copy)]
pub struct CdfPair<'a> {
    source: &'a Distribution,
    target: &'a Distribution,
    identical: bool,
}

impl<'a> CdfPair<'a> {
    /// Pair two distributions. Fails with `ContractViolation` when either
    /// carries no CDF data, when the bin counts differ, or when a support
    /// range does not fit its CDF.
    pub fn new(source: &'a Distribution, target: &'a Distribution) -> Result<Self> {
        check_distribution("source", source)?;
        check_distribution("target", target)?;
        if source.bins() != target.bins() {
            return Err(TransferError::ContractViolation(format!(
                "cannot match {} source bins against {} target bins",
                source.bins(),
                target.bins()
            )));
        }
        let identical = source.cdf == target.cdf && source.support == target.support;
        Ok(Self {
            source,
            target,
            identical,
        })
    }

    /// `true` when matching is the identity map.
    pub fn is_identical(&self) -> bool {
        self.identical
    }

    /// Number of bins on either side.
    pub fn bins(&self) -> usize {
        self.source.bins()
    }
}

fn check_distribution(side: &str, dist: &Distribution) -> Result<()> {
    if dist.cdf.is_empty() {
        return Err(TransferError::ContractViolation(format!(
            "{side} distribution has no CDF"
        )));
    }
    let (lo, hi) = dist.support;
    if lo > hi || hi >= dist.bins() {
        return Err(TransferError::ContractViolation(format!(
            "{side} support {lo}..={hi} outside {} bins",
            dist.bins()
        )));
    }
    Ok(())
}

/// CDF-based value matcher with identity-blend damping and optional
/// steep-slope smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionMatcher {
    /// Share of the input value kept in the output.
    pub identity_bias: f32,
    /// CDF rise across the two neighbors of a bin that counts as steep.
    pub steep_slope_threshold: f32,
    /// Neighbor window half-width used on steep slopes.
    pub smoothing_window: usize,
}

impl Default for DistributionMatcher {
    fn default() -> Self {
        Self::new(&TuningConstants::default())
    }
}

impl DistributionMatcher {
    pub fn new(tuning: &TuningConstants) -> Self {
        Self {
            identity_bias: tuning.identity_bias,
            steep_slope_threshold: tuning.steep_slope_threshold,
            smoothing_window: tuning.smoothing_window,
        }
    }

    /// Match `value` (bin units) from `source` into `target`.
    pub fn match_scalar(
        &self,
        value: f32,
        source: &Distribution,
        target: &Distribution,
    ) -> Result<f32> {
        let pair = CdfPair::new(source, target)?;
        Ok(self.match_value(&pair, value))
    }

    /// Match a value through a pre-checked pair.
    pub fn match_value(&self, pair: &CdfPair<'_>, value: f32) -> f32 {
        if pair.identical {
            return value;
        }
        let bin = clamp_bin(value, pair.bins());
        let matched = nearest_bin(pair, pair.source.cdf.at(bin)) as f32;
        self.damp(matched, value)
    }

    /// Match a value, replacing the single nearest match with a weighted
    /// neighbor average where the source CDF is locally steep.
    ///
    /// ```text
    /// steep ⇔ CDF[i+1] − CDF[i−1] > steep_slope_threshold
    /// m     = Σ_o w_o × match(i + o) / Σ_o w_o,   w_o = 1 / (1 + |o|),  |o| ≤ window
    /// ```
    pub fn match_refined(&self, pair: &CdfPair<'_>, value: f32) -> f32 {
        if pair.identical {
            return value;
        }
        let bins = pair.bins();
        let bin = clamp_bin(value, bins);
        let cdf = &pair.source.cdf;
        let slope = cdf.at((bin + 1).min(bins - 1)) - cdf.at(bin.saturating_sub(1));

        let matched = if slope > self.steep_slope_threshold {
            let window = self.smoothing_window.min(MAX_SMOOTHING_WINDOW) as isize;
            let mut sum = 0.0_f32;
            let mut weight_sum = 0.0_f32;
            for offset in -window..=window {
                let neighbor = (bin as isize + offset).clamp(0, bins as isize - 1) as usize;
                let weight = 1.0 / (1.0 + offset.unsigned_abs() as f32);
                sum += weight * nearest_bin(pair, cdf.at(neighbor)) as f32;
                weight_sum += weight;
            }
            sum / weight_sum
        } else {
            nearest_bin(pair, cdf.at(bin)) as f32
        };
        self.damp(matched, value)
    }

    /// Match a circular value. The damping blend runs along the shorter
    /// arc, and the result is wrapped into `[0, bins)`.
    pub fn match_circular(&self, pair: &CdfPair<'_>, value: f32) -> f32 {
        if pair.identical {
            return value;
        }
        let bins = pair.bins();
        let period = bins as f32;
        let bin = (value.round() as isize).rem_euclid(bins as isize) as usize;
        let matched = nearest_bin(pair, pair.source.cdf.at(bin)) as f32;

        let mut delta = (matched - value).rem_euclid(period);
        if delta > period * 0.5 {
            delta -= period;
        }
        (value + (1.0 - self.identity_bias) * delta).rem_euclid(period)
    }

    fn damp(&self, matched: f32, value: f32) -> f32 {
        (1.0 - self.identity_bias) * matched + self.identity_bias * value
    }
}

fn clamp_bin(value: f32, bins: usize) -> usize {
    (value.round().max(0.0) as usize).min(bins - 1)
}

/// Target bin whose CDF is closest to `p`, lowest index on ties, clamped
/// into the target support.
fn nearest_bin(pair: &CdfPair<'_>, p: f32) -> usize {
    let cdf = pair.target.cdf.values();
    let mut best = 0usize;
    let mut best_diff = f32::INFINITY;
    for (i, &c) in cdf.iter().enumerate() {
        let diff = (c - p).abs();
        if diff < best_diff {
            best_diff = diff;
            best = i;
        } else if c > p {
            // Monotone CDF: the distance only grows from here.
            break;
        }
    }
    let (lo, hi) = pair.target.support;
    best.clamp(lo, hi)
}
