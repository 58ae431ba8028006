//! Luminance zones: shadow, midtone, and highlight weighting.
//!
//! ```text
//! L         = 0.2126 R + 0.7152 G + 0.0722 B
//! shadow    = max(0, 1 − 3.3 L)
//! midtone   = 1 − |2.5 (L − 0.5)|
//! highlight = max(0, 3.3 (L − 0.7))
//! ```
//!
//! The weights are independent and may overlap. The midtone weight is not
//! floored: it is negative for L below 0.1 and above 0.9. Consumers that
//! need a partition of unity clamp it themselves.

use serde::{Deserialize, Serialize};

/// Rec. 709 luminance weights.
pub const LUMA_REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Weight a zone must exceed to select its tone curve.
pub const ACTIVE_ZONE_THRESHOLD: f32 = 0.5;

/// Rec. 709 luminance of a normalized RGB triple.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_REC709[0] + rgb[1] * LUMA_REC709[1] + rgb[2] * LUMA_REC709[2]
}

/// Tonal zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Shadow,
    Midtone,
    Highlight,
}

/// Per-zone weights of one color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneWeights {
    pub shadow: f32,
    pub midtone: f32,
    pub highlight: f32,
}

impl ZoneWeights {
    /// Weights for a luminance value.
    pub fn classify(luminance: f32) -> Self {
        Self {
            shadow: (1.0 - 3.3 * luminance).max(0.0),
            midtone: 1.0 - (2.5 * (luminance - 0.5)).abs(),
            highlight: (3.3 * (luminance - 0.7)).max(0.0),
        }
    }

    /// Weights for a normalized RGB triple.
    pub fn of_rgb(rgb: [f32; 3]) -> Self {
        Self::classify(luminance(rgb))
    }

    /// The zone whose weight exceeds [`ACTIVE_ZONE_THRESHOLD`], checked in
    /// shadow, highlight, midtone order. Midtone when none does.
    pub fn active_zone(&self) -> Zone {
        if self.shadow > ACTIVE_ZONE_THRESHOLD {
            Zone::Shadow
        } else if self.highlight > ACTIVE_ZONE_THRESHOLD {
            Zone::Highlight
        } else {
            Zone::Midtone
        }
    }
}
