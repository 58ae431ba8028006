//! Look adjustments applied after the three matched candidates are blended:
//! saturation boost, temperature push, split toning, and dominant-hue boost.
//!
//! Each adjustment is a pure function of the color and a few scalars, and
//! each has a neutral setting that leaves the color untouched.

use crate::analysis::classify::{ColorTemperature, DominantColor};
use crate::color_management::{hsl_to_rgb, rgb_to_hsl};
use crate::grading::zones::ZoneWeights;

/// Scale HSL saturation by `1 + boost`.
///
/// ```text
/// (h, s, l) = hsl(rgb)
/// out = rgb(h, min(s × (1 + boost), 1), l)
/// ```
///
/// `boost = 0.0` and gray input produce no change.
pub fn boost_saturation(rgb: [f32; 3], boost: f32) -> [f32; 3] {
    if boost.abs() < 1e-7 {
        return rgb;
    }
    let [h, s, l] = rgb_to_hsl(rgb);
    if s < 1e-7 {
        return rgb;
    }
    hsl_to_rgb([h, (s * (1.0 + boost)).clamp(0.0, 1.0), l])
}

/// Push red and blue in opposite directions along the reference's
/// warm/cool axis.
///
/// ```text
/// k   = strength × signed_strength(temperature)
/// out = (R + k, G, B − k)
/// ```
///
/// A neutral temperature produces no change.
pub fn apply_temperature(rgb: [f32; 3], temperature: &ColorTemperature, strength: f32) -> [f32; 3] {
    let k = strength * temperature.signed_strength();
    if k.abs() < 1e-7 {
        return rgb;
    }
    [
        (rgb[0] + k).clamp(0.0, 1.0),
        rgb[1],
        (rgb[2] - k).clamp(0.0, 1.0),
    ]
}

/// Warm the shadows and cool the highlights, each in proportion to its
/// zone weight.
///
/// ```text
/// d   = strength × (min(shadow, 1) − min(highlight, 1))
/// out = (R + d, G, B − d)
/// ```
///
/// Pure midtones (both weights zero) are unchanged.
pub fn apply_split_toning(rgb: [f32; 3], weights: &ZoneWeights, strength: f32) -> [f32; 3] {
    let d = strength * (weights.shadow.min(1.0) - weights.highlight.min(1.0));
    if d.abs() < 1e-7 {
        return rgb;
    }
    [
        (rgb[0] + d).clamp(0.0, 1.0),
        rgb[1],
        (rgb[2] - d).clamp(0.0, 1.0),
    ]
}

/// Scale the channels along the dominant hue axis by `1 + boost`.
pub fn boost_dominant_hue(rgb: [f32; 3], dominant: DominantColor, boost: f32) -> [f32; 3] {
    let axis = dominant.axis();
    let mut out = rgb;
    for c in 0..3 {
        if axis[c] {
            out[c] = (out[c] * (1.0 + boost)).clamp(0.0, 1.0);
        }
    }
    out
}
