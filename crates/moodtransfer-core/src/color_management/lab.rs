//! sRGB ↔ CIE L\*a\*b\* (D65, 2° observer).
//!
//! ```text
//! sRGB ──linearize──→ linear RGB ──M──→ XYZ ──/white, f()──→ L*a*b*
//!
//! f(t) = t^(1/3)               t >  0.008856
//!        7.787·t + 16/116      otherwise
//! ```
//!
//! The inverse is mathematically pure: it clamps its input to the valid
//! L\*a\*b\* domain and its output to [0, 1], reporting both through
//! [`LabInversion::clamped`]. Gamut repair lives in
//! [`gamut`](super::gamut) and is never folded in here.

use crate::color_management::color_space::{D65_WHITE, SRGB_TO_XYZ, XYZ_TO_SRGB};
use crate::color_management::transfer::SrgbTransfer;
use crate::error::{Result, TransferError};

/// CIE ε: the cube-root/linear split of `f()`.
const EPSILON: f32 = 0.008_856;
/// CIE κ/116 slope of the linear segment.
const KAPPA_SLOPE: f32 = 7.787;
const OFFSET: f32 = 16.0 / 116.0;

/// Valid L\* range.
pub const L_RANGE: (f32, f32) = (0.0, 100.0);
/// Valid a\*/b\* range.
pub const AB_RANGE: (f32, f32) = (-128.0, 127.0);

/// Result of an L\*a\*b\* → sRGB inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabInversion {
    /// Encoded sRGB in [0, 1].
    pub rgb: [f32; 3],
    /// `true` when either the input was outside the L\*a\*b\* domain or the
    /// output fell outside the sRGB gamut and had to be clamped.
    pub clamped: bool,
}

/// Convert encoded sRGB in [0, 1] to `[L, a, b]`.
pub fn rgb_to_lab(rgb: [f32; 3]) -> [f32; 3] {
    let linear = SrgbTransfer.linearize(rgb);
    let xyz = SRGB_TO_XYZ.apply(linear);

    let fx = forward(xyz[0] / D65_WHITE[0]);
    let fy = forward(xyz[1] / D65_WHITE[1]);
    let fz = forward(xyz[2] / D65_WHITE[2]);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Convert `[L, a, b]` back to encoded sRGB.
///
/// Fails with [`TransferError::ConversionFailure`] when the input or the
/// result is not finite.
pub fn lab_to_rgb(lab: [f32; 3]) -> Result<LabInversion> {
    if lab.iter().any(|v| !v.is_finite()) {
        return Err(TransferError::ConversionFailure("non-finite L*a*b* input"));
    }

    let l = lab[0].clamp(L_RANGE.0, L_RANGE.1);
    let a = lab[1].clamp(AB_RANGE.0, AB_RANGE.1);
    let b = lab[2].clamp(AB_RANGE.0, AB_RANGE.1);
    let mut clamped = l != lab[0] || a != lab[1] || b != lab[2];

    let fy = (l + 16.0) / 116.0;
    let fx = a / 500.0 + fy;
    let fz = fy - b / 200.0;

    let xyz = [
        inverse(fx) * D65_WHITE[0],
        inverse(fy) * D65_WHITE[1],
        inverse(fz) * D65_WHITE[2],
    ];
    let encoded = SrgbTransfer.encode(XYZ_TO_SRGB.apply(xyz));

    if encoded.iter().any(|v| !v.is_finite()) {
        return Err(TransferError::ConversionFailure("non-finite sRGB output"));
    }

    let rgb = encoded.map(|c| c.clamp(0.0, 1.0));
    clamped |= rgb != encoded;
    Ok(LabInversion { rgb, clamped })
}

/// Chroma `√(a² + b²)` of an L\*a\*b\* color.
pub fn chroma(lab: [f32; 3]) -> f32 {
    lab[1].hypot(lab[2])
}

fn forward(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        KAPPA_SLOPE * t + OFFSET
    }
}

fn inverse(t: f32) -> f32 {
    let cubed = t * t * t;
    if cubed > EPSILON {
        cubed
    } else {
        (t - OFFSET) / KAPPA_SLOPE
    }
}
