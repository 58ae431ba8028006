//! Whole-image classifiers: monochrome, high contrast, dominant color, and
//! color temperature.
//!
//! The sampling classifiers visit a fixed stride of roughly
//! [`CLASSIFIER_SAMPLES`] pixels, so their answer is deterministic for a
//! given buffer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::stats::{self, ImageStats, RgbStats};
use crate::error::Result;
use crate::image::PixelBuffer;
use crate::transform::params::StatsOptions;

/// Approximate number of pixels visited by the sampling classifiers.
pub const CLASSIFIER_SAMPLES: usize = 1_000;
/// Largest per-pair channel difference (8-bit) still counted as gray.
pub const MONOCHROME_TOLERANCE: u8 = 5;
/// Luminance-weighted channel standard deviation above which an image is
/// high contrast.
pub const HIGH_CONTRAST_THRESHOLD: f32 = 0.2;
/// Channel average (8-bit) a channel must exceed to count as strong.
pub const DOMINANT_FLOOR: f32 = 100.0;
/// Lead (8-bit) a strong channel must hold over the weakest channel.
pub const DOMINANT_MARGIN: f32 = 20.0;

const LUMA_REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Hue axis a reference leans toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantColor {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
}

impl DominantColor {
    /// Channels the hue axis runs along (`true` = boosted).
    pub fn axis(self) -> [bool; 3] {
        match self {
            Self::Red => [true, false, false],
            Self::Green => [false, true, false],
            Self::Blue => [false, false, true],
            Self::Yellow => [true, true, false],
            Self::Magenta => [true, false, true],
            Self::Cyan => [false, true, true],
        }
    }

    fn from_strong(strong: [bool; 3]) -> Option<Self> {
        match strong {
            [true, false, false] => Some(Self::Red),
            [false, true, false] => Some(Self::Green),
            [false, false, true] => Some(Self::Blue),
            [true, true, false] => Some(Self::Yellow),
            [true, false, true] => Some(Self::Magenta),
            [false, true, true] => Some(Self::Cyan),
            _ => None,
        }
    }
}

/// Warm / cool / neutral category of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureKind {
    Warm,
    Cool,
    Neutral,
}

/// Color temperature derived from the red/blue mean ratio.
///
/// ```text
/// ratio    = mean_r / mean_b
/// kind     = warm if ratio > 1.1, cool if ratio < 0.9, else neutral
/// strength = min(1, |ratio − 1|)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTemperature {
    pub kind: TemperatureKind,
    /// In [0, 1].
    pub strength: f32,
}

impl ColorTemperature {
    pub const WARM_RATIO: f32 = 1.1;
    pub const COOL_RATIO: f32 = 0.9;

    /// Neutral with zero strength.
    pub const NEUTRAL: Self = Self {
        kind: TemperatureKind::Neutral,
        strength: 0.0,
    };

    /// Classify from RGB statistics.
    pub fn from_stats(rgb: &RgbStats) -> Self {
        let [r, _, b] = rgb.means();
        if b <= f32::EPSILON {
            // No blue at all: warm when there is any red, otherwise undefined.
            return if r > f32::EPSILON {
                Self {
                    kind: TemperatureKind::Warm,
                    strength: 1.0,
                }
            } else {
                Self::NEUTRAL
            };
        }

        let ratio = r / b;
        let strength = (ratio - 1.0).abs().min(1.0);
        let kind = if ratio > Self::WARM_RATIO {
            TemperatureKind::Warm
        } else if ratio < Self::COOL_RATIO {
            TemperatureKind::Cool
        } else {
            TemperatureKind::Neutral
        };
        Self { kind, strength }
    }

    /// +strength when warm, −strength when cool, 0 when neutral.
    pub fn signed_strength(&self) -> f32 {
        match self.kind {
            TemperatureKind::Warm => self.strength,
            TemperatureKind::Cool => -self.strength,
            TemperatureKind::Neutral => 0.0,
        }
    }
}

fn classifier_stride(buffer: &PixelBuffer) -> usize {
    stats::sample_stride(buffer.pixel_count(), CLASSIFIER_SAMPLES)
}

/// `true` iff every sampled pixel has all pairwise channel differences
/// within [`MONOCHROME_TOLERANCE`]. An empty buffer is not monochrome.
pub fn is_monochrome(buffer: &PixelBuffer) -> bool {
    if buffer.is_empty() {
        return false;
    }
    buffer.strided_rgb(classifier_stride(buffer)).all(|[r, g, b]| {
        r.abs_diff(g) <= MONOCHROME_TOLERANCE
            && r.abs_diff(b) <= MONOCHROME_TOLERANCE
            && g.abs_diff(b) <= MONOCHROME_TOLERANCE
    })
}

/// `true` iff the luminance-weighted channel standard deviation exceeds
/// [`HIGH_CONTRAST_THRESHOLD`].
pub fn is_high_contrast(rgb: &RgbStats) -> bool {
    let spread: f32 = rgb
        .channels()
        .iter()
        .zip(LUMA_REC709)
        .map(|(c, w)| c.std_dev * w)
        .sum();
    spread > HIGH_CONTRAST_THRESHOLD
}

/// Hue axis of the sampled channel averages, if any channel clearly leads.
pub fn dominant_color(buffer: &PixelBuffer) -> Option<DominantColor> {
    if buffer.is_empty() {
        return None;
    }

    let mut sum = [0.0_f64; 3];
    let mut count = 0usize;
    for px in buffer.strided_rgb(classifier_stride(buffer)) {
        for c in 0..3 {
            sum[c] += f64::from(px[c]);
        }
        count += 1;
    }
    let avg = sum.map(|s| (s / count as f64) as f32);
    let weakest = avg[0].min(avg[1]).min(avg[2]);
    let strong = avg.map(|a| a > DOMINANT_FLOOR && a - weakest > DOMINANT_MARGIN);

    DominantColor::from_strong(strong)
}

/// Everything the builder needs from one image. Once analyzed, the pixel
/// buffer itself can be dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProfile {
    pub stats: ImageStats,
    pub monochrome: bool,
    pub high_contrast: bool,
    pub dominant: Option<DominantColor>,
    pub temperature: ColorTemperature,
}

impl ImageProfile {
    /// Compute statistics and run every classifier.
    ///
    /// Fails with `InvalidInput` on an empty buffer, before any statistics
    /// work begins.
    pub fn analyze(buffer: &PixelBuffer, options: &StatsOptions) -> Result<Self> {
        let stats = ImageStats::compute_with(buffer, options)?;
        let monochrome = is_monochrome(buffer);
        let high_contrast = is_high_contrast(&stats.rgb);
        let dominant = dominant_color(buffer);
        let temperature = ColorTemperature::from_stats(&stats.rgb);

        debug!(
            width = buffer.width(),
            height = buffer.height(),
            monochrome,
            high_contrast,
            ?dominant,
            ?temperature,
            "analyzed image"
        );

        Ok(Self {
            stats,
            monochrome,
            high_contrast,
            dominant,
            temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use crate::image::PixelFormat;

    fn checker(a: [u8; 3], b: [u8; 3], size: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..size {
            for x in 0..size {
                data.extend_from_slice(if (x + y) % 2 == 0 { &a } else { &b });
            }
        }
        PixelBuffer::new(size, size, PixelFormat::Rgb8, data).unwrap()
    }

    #[test]
    fn test_gray_image_is_monochrome() {
        let buf = checker([10, 12, 9], [200, 203, 198], 40);
        assert!(is_monochrome(&buf));
    }

    #[test]
    fn test_tinted_image_is_not_monochrome() {
        let buf = checker([10, 10, 10], [200, 180, 150], 40);
        assert!(!is_monochrome(&buf));
    }

    #[test]
    fn test_black_white_checker_is_high_contrast() {
        let stats = stats::rgb_stats(&checker([0; 3], [255; 3], 20)).unwrap();
        assert!(is_high_contrast(&stats));
        let flat = stats::rgb_stats(&checker([120; 3], [130; 3], 20)).unwrap();
        assert!(!is_high_contrast(&flat));
    }

    #[test]
    fn test_dominant_color_axes() {
        let red = PixelBuffer::filled(8, 8, [220, 40, 40, 255]);
        assert_eq!(dominant_color(&red), Some(DominantColor::Red));
        let yellow = PixelBuffer::filled(8, 8, [220, 210, 40, 255]);
        assert_eq!(dominant_color(&yellow), Some(DominantColor::Yellow));
        let cyan = PixelBuffer::filled(8, 8, [30, 200, 210, 255]);
        assert_eq!(dominant_color(&cyan), Some(DominantColor::Cyan));
    }

    #[test]
    fn test_dark_or_gray_image_has_no_dominant_color() {
        let dark = PixelBuffer::filled(8, 8, [90, 20, 20, 255]);
        assert_eq!(dominant_color(&dark), None);
        let gray = PixelBuffer::filled(8, 8, [180, 180, 180, 255]);
        assert_eq!(dominant_color(&gray), None);
    }

    #[test]
    fn test_temperature_from_red_blue_ratio() {
        let warm = stats::rgb_stats(&PixelBuffer::filled(4, 4, [200, 150, 100, 255])).unwrap();
        let t = ColorTemperature::from_stats(&warm);
        assert_eq!(t.kind, TemperatureKind::Warm);
        assert!((t.strength - 1.0).abs() < 1e-6);

        let cool = stats::rgb_stats(&PixelBuffer::filled(4, 4, [80, 100, 100, 255])).unwrap();
        let t = ColorTemperature::from_stats(&cool);
        assert_eq!(t.kind, TemperatureKind::Cool);
        assert!((t.strength - 0.2).abs() < 1e-5);
        assert!(t.signed_strength() < 0.0);

        let neutral = stats::rgb_stats(&PixelBuffer::filled(4, 4, [128; 4])).unwrap();
        assert_eq!(
            ColorTemperature::from_stats(&neutral).kind,
            TemperatureKind::Neutral
        );
    }

    #[test]
    fn test_black_image_temperature_is_neutral() {
        let black = stats::rgb_stats(&PixelBuffer::filled(4, 4, [0, 0, 0, 255])).unwrap();
        assert_eq!(ColorTemperature::from_stats(&black), ColorTemperature::NEUTRAL);
    }

    #[test]
    fn test_analyze_rejects_empty_buffer() {
        let empty = PixelBuffer::filled(0, 0, [0; 4]);
        assert!(matches!(
            ImageProfile::analyze(&empty, &StatsOptions::default()),
            Err(TransferError::InvalidInput(_))
        ));
    }
}
