//! Per-channel statistics of a pixel buffer in RGB, HSL, and L\*a\*b\*.
//!
//! RGB statistics come from one full pass over every pixel. HSL and
//! L\*a\*b\* statistics are built from a uniform stride sample of roughly
//! [`StatsOptions::sample_target`] pixels: both need a per-pixel color
//! conversion and their histograms only feed distribution matching, where a
//! few thousand samples are enough.
//!
//! # Bin layouts
//! | Space | Channel | Bins | Bin of value |
//! |-------|---------|------|--------------|
//! | RGB   | R, G, B | 256  | 8-bit sample |
//! | HSL   | H       | 360  | ⌊h·360⌋ mod 360 |
//! | HSL   | S, L    | 101  | round(v·100) |
//! | LAB   | L\*     | 101  | round(L\*) |
//! | LAB   | a\*, b\*| 256  | round(v + 128) |

use serde::{Deserialize, Serialize};

use crate::analysis::histogram::Distribution;
use crate::color_management::{rgb_to_hsl, rgb_to_lab};
use crate::error::{Result, TransferError};
use crate::image::PixelBuffer;
use crate::transform::params::StatsOptions;

/// Bins per RGB channel.
pub const RGB_BINS: usize = 256;
/// Hue bins (one per degree).
pub const HUE_BINS: usize = 360;
/// Saturation / lightness bins (one per percent).
pub const PERCENT_BINS: usize = 101;
/// L\* bins.
pub const L_BINS: usize = 101;
/// a\* / b\* bins.
pub const AB_BINS: usize = 256;
/// Offset added to a\*/b\* before binning.
pub const AB_OFFSET: f32 = 128.0;

/// Mean, spread, range, and distribution of one 8-bit RGB channel.
/// All scalars are normalized to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub distribution: Distribution,
}

impl ChannelStats {
    /// Map `value` (normalized, in the *other* image's channel described by
    /// `source`) to the value with the same z-score in this channel.
    ///
    /// ```text
    /// z   = (value − source.mean) / max(source.std_dev, 0.01)
    /// out = clamp(self.mean + z × self.std_dev, 0, 1)
    /// ```
    pub fn contrast_matched(&self, value: f32, source: &ChannelStats) -> f32 {
        let z = (value - source.mean) / source.std_dev.max(0.01);
        (self.mean + z * self.std_dev).clamp(0.0, 1.0)
    }
}

/// Full-pass RGB statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbStats {
    pub red: ChannelStats,
    pub green: ChannelStats,
    pub blue: ChannelStats,
    pub pixel_count: usize,
}

impl RgbStats {
    /// Channels in R, G, B order.
    pub fn channels(&self) -> [&ChannelStats; 3] {
        [&self.red, &self.green, &self.blue]
    }

    /// Channel means in R, G, B order.
    pub fn means(&self) -> [f32; 3] {
        [self.red.mean, self.green.mean, self.blue.mean]
    }
}

/// Sampled HSL distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HslStats {
    pub hue: Distribution,
    pub saturation: Distribution,
    pub lightness: Distribution,
}

/// Sampled L\*a\*b\* distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabStats {
    pub l: Distribution,
    pub a: Distribution,
    pub b: Distribution,
}

/// Everything distribution matching needs from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub rgb: RgbStats,
    pub hsl: HslStats,
    pub lab: LabStats,
    /// Number of pixels that fed the HSL and L\*a\*b\* statistics.
    pub sample_count: usize,
}

impl ImageStats {
    /// Compute statistics with default options.
    pub fn compute(buffer: &PixelBuffer) -> Result<Self> {
        Self::compute_with(buffer, &StatsOptions::default())
    }

    /// Compute statistics. Fails with `InvalidInput` on an empty buffer.
    pub fn compute_with(buffer: &PixelBuffer, options: &StatsOptions) -> Result<Self> {
        ensure_not_empty(buffer)?;
        let rgb = rgb_stats(buffer)?;
        let stride = sample_stride(buffer.pixel_count(), options.sample_target);
        let (hsl, lab, sample_count) = sampled_stats(buffer, stride, options.smooth_sampled)?;
        Ok(Self {
            rgb,
            hsl,
            lab,
            sample_count,
        })
    }
}

/// Stride that visits roughly `target` of `pixel_count` pixels.
pub fn sample_stride(pixel_count: usize, target: usize) -> usize {
    (pixel_count / target.max(1)).max(1)
}

pub(crate) fn ensure_not_empty(buffer: &PixelBuffer) -> Result<()> {
    if buffer.is_empty() {
        return Err(TransferError::InvalidInput(format!(
            "pixel buffer {}x{} has no pixels",
            buffer.width(),
            buffer.height()
        )));
    }
    Ok(())
}

/// Single full pass: sums, sums of squares, min/max, 256-bin histograms.
pub fn rgb_stats(buffer: &PixelBuffer) -> Result<RgbStats> {
    ensure_not_empty(buffer)?;

    let mut sum = [0.0_f64; 3];
    let mut sum_sq = [0.0_f64; 3];
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    let mut hist = [vec![0u32; RGB_BINS], vec![0u32; RGB_BINS], vec![0u32; RGB_BINS]];

    for px in buffer.rgb_pixels() {
        for c in 0..3 {
            let v = px[c];
            let vf = f64::from(v);
            sum[c] += vf;
            sum_sq[c] += vf * vf;
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
            hist[c][v as usize] += 1;
        }
    }

    let n = buffer.pixel_count() as f64;
    let [hr, hg, hb] = hist;
    let channel = |c: usize, histogram: Vec<u32>| -> Result<ChannelStats> {
        let mean = sum[c] / n;
        let variance = (sum_sq[c] / n - mean * mean).max(0.0);
        Ok(ChannelStats {
            mean: (mean / 255.0) as f32,
            std_dev: (variance.sqrt() / 255.0) as f32,
            min: f32::from(min[c]) / 255.0,
            max: f32::from(max[c]) / 255.0,
            distribution: Distribution::from_histogram(histogram)?,
        })
    };

    Ok(RgbStats {
        red: channel(0, hr)?,
        green: channel(1, hg)?,
        blue: channel(2, hb)?,
        pixel_count: buffer.pixel_count(),
    })
}

/// Bin of a normalized hue.
pub fn hue_bin(hue: f32) -> usize {
    ((hue * HUE_BINS as f32).floor() as isize).rem_euclid(HUE_BINS as isize) as usize
}

/// Bin of a normalized saturation or lightness.
pub fn percent_bin(value: f32) -> usize {
    ((value * 100.0).round().max(0.0) as usize).min(PERCENT_BINS - 1)
}

/// Bin of an L\* value.
pub fn l_bin(l: f32) -> usize {
    (l.round().max(0.0) as usize).min(L_BINS - 1)
}

/// Bin of an a\* or b\* value.
pub fn ab_bin(v: f32) -> usize {
    ((v + AB_OFFSET).round().max(0.0) as usize).min(AB_BINS - 1)
}

fn sampled_stats(
    buffer: &PixelBuffer,
    stride: usize,
    smooth: bool,
) -> Result<(HslStats, LabStats, usize)> {
    let mut hue = vec![0u32; HUE_BINS];
    let mut sat = vec![0u32; PERCENT_BINS];
    let mut light = vec![0u32; PERCENT_BINS];
    let mut l = vec![0u32; L_BINS];
    let mut a = vec![0u32; AB_BINS];
    let mut b = vec![0u32; AB_BINS];
    let mut count = 0usize;

    for px in buffer.strided_rgb(stride) {
        let rgb = px.map(|c| f32::from(c) / 255.0);

        let [h, s, li] = rgb_to_hsl(rgb);
        hue[hue_bin(h)] += 1;
        sat[percent_bin(s)] += 1;
        light[percent_bin(li)] += 1;

        let lab = rgb_to_lab(rgb);
        l[l_bin(lab[0])] += 1;
        a[ab_bin(lab[1])] += 1;
        b[ab_bin(lab[2])] += 1;

        count += 1;
    }

    let build = |hist: Vec<u32>| {
        if smooth {
            Distribution::from_histogram_smoothed(hist)
        } else {
            Distribution::from_histogram(hist)
        }
    };

    let hsl = HslStats {
        hue: build(hue)?,
        saturation: build(sat)?,
        lightness: build(light)?,
    };
    let lab = LabStats {
        l: build(l)?,
        a: build(a)?,
        b: build(b)?,
    };
    Ok((hsl, lab, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    const EPSILON: f32 = 1e-6;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / (width - 1)) as u8);
                data.push((y * 255 / (height - 1)) as u8);
                data.push(((x + y) * 255 / (width + height - 2)) as u8);
            }
        }
        PixelBuffer::new(width, height, PixelFormat::Rgb8, data).unwrap()
    }

    #[test]
    fn test_empty_buffer_is_invalid_input() {
        let empty = PixelBuffer::new(0, 4, PixelFormat::Rgb8, vec![]).unwrap();
        assert!(matches!(
            ImageStats::compute(&empty),
            Err(TransferError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_uniform_buffer_stats() {
        let buf = PixelBuffer::filled(8, 8, [51, 102, 204, 255]);
        let stats = rgb_stats(&buf).unwrap();
        assert!((stats.red.mean - 0.2).abs() < EPSILON);
        assert!((stats.green.mean - 0.4).abs() < EPSILON);
        assert!((stats.blue.mean - 0.8).abs() < EPSILON);
        assert!(stats.red.std_dev.abs() < EPSILON);
        assert_eq!(stats.red.min, stats.red.max);
        assert_eq!(stats.blue.distribution.support, (204, 204));
        assert_eq!(stats.pixel_count, 64);
    }

    #[test]
    fn test_rgb_cdfs_are_monotone_and_complete() {
        let stats = ImageStats::compute(&gradient(64, 48)).unwrap();
        for channel in stats.rgb.channels() {
            let cdf = channel.distribution.cdf.values();
            assert!(cdf.windows(2).all(|w| w[1] >= w[0]));
            assert!((cdf[RGB_BINS - 1] - 1.0).abs() < EPSILON);
        }
        for dist in [&stats.lab.l, &stats.lab.a, &stats.hsl.hue] {
            let top = dist.cdf.at(dist.bins() - 1);
            assert!((top - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_sampling_caps_sample_count() {
        let buf = gradient(200, 100);
        let options = StatsOptions {
            sample_target: 1_000,
            ..StatsOptions::default()
        };
        let stats = ImageStats::compute_with(&buf, &options).unwrap();
        assert_eq!(sample_stride(20_000, 1_000), 20);
        assert_eq!(stats.sample_count, 1_000);
        assert_eq!(stats.lab.l.total(), 1_000);
    }

    #[test]
    fn test_small_buffer_samples_every_pixel() {
        let stats = ImageStats::compute(&gradient(10, 10)).unwrap();
        assert_eq!(stats.sample_count, 100);
    }

    #[test]
    fn test_bins_clamp_to_range() {
        assert_eq!(hue_bin(0.0), 0);
        assert_eq!(hue_bin(0.9999), 359);
        assert_eq!(hue_bin(1.0), 0);
        assert_eq!(percent_bin(1.2), 100);
        assert_eq!(l_bin(-3.0), 0);
        assert_eq!(ab_bin(-128.0), 0);
        assert_eq!(ab_bin(200.0), 255);
    }

    #[test]
    fn test_contrast_matched_maps_z_scores() {
        let buf = gradient(16, 16);
        let stats = rgb_stats(&buf).unwrap();
        let red = &stats.red;
        // Matching a channel to itself is the identity inside the range.
        let v = red.contrast_matched(red.mean, red);
        assert!((v - red.mean).abs() < EPSILON);
    }
}
