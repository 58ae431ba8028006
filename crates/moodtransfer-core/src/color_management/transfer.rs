//! sRGB transfer function (IEC 61966-2-1).
//!
//! Converts between gamma-encoded sRGB samples and linear light, the first
//! and last stage of the RGB↔LAB path.

/// A transfer function that converts between linear and non-linear encodings.
pub trait TransferFunction: Send + Sync {
    /// Convert from non-linear (encoded) to linear light.
    fn to_linear(&self, encoded: f32) -> f32;

    /// Convert from linear light to non-linear (encoded).
    fn to_encoded(&self, linear: f32) -> f32;
}

/// sRGB transfer function per IEC 61966-2-1.
///
/// ```text
/// to_linear:   V <= 0.04045 → V / 12.92
///              V >  0.04045 → ((V + 0.055) / 1.055) ^ 2.4
///
/// from_linear: L <= 0.0031308 → L × 12.92
///              L >  0.0031308 → 1.055 × L^(1/2.4) − 0.055
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SrgbTransfer;

impl SrgbTransfer {
    const LINEAR_THRESHOLD: f32 = 0.04045;
    const ENCODED_THRESHOLD: f32 = 0.003_130_8;
    const GAMMA: f32 = 2.4;

    /// Linearize an encoded RGB triplet.
    pub fn linearize(&self, rgb: [f32; 3]) -> [f32; 3] {
        rgb.map(|c| self.to_linear(c))
    }

    /// Encode a linear RGB triplet.
    pub fn encode(&self, rgb: [f32; 3]) -> [f32; 3] {
        rgb.map(|c| self.to_encoded(c))
    }
}

impl TransferFunction for SrgbTransfer {
    fn to_linear(&self, encoded: f32) -> f32 {
        if encoded <= Self::LINEAR_THRESHOLD {
            encoded / 12.92
        } else {
            ((encoded + 0.055) / 1.055).powf(Self::GAMMA)
        }
    }

    fn to_encoded(&self, linear: f32) -> f32 {
        if linear <= Self::ENCODED_THRESHOLD {
            linear * 12.92
        } else {
            1.055 * linear.powf(1.0 / Self::GAMMA) - 0.055
        }
    }
}
