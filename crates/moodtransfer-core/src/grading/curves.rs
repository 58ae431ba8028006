//! Fixed per-zone tone curves and the contrast S-curve.
//!
//! Every curve here maps [0, 1] onto [0, 1], keeps both endpoints fixed,
//! and is monotone, so a curve can never invert tonal order.
//!
//! # Algorithm
//! ```text
//! smoothstep(t) = t² × (3 − 2t)
//!
//! shadow(c)     = mix_s × c^γ + (1 − mix_s) × c                       γ = 0.95
//! highlight(c)  = mix_h × (c + a × sin(πc)) + (1 − mix_h) × c         a = 0.02
//! s_curve(c)    = 0.5 × (2c)^k                 c < 0.5                k = 1.2
//!                 1 − 0.5 × (2(1 − c))^k       otherwise
//! midtone(c)    = mix_m × s_curve(c) + (1 − mix_m) × c
//!                 mix_m = lerp(0.7, 0.5, min(highlight weight, 1))
//! ```

use crate::grading::zones::{Zone, ZoneWeights};
use crate::transform::params::TuningConstants;

/// Hermite smoothstep of `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation, `a` at `t = 0`, `b` at `t = 1`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Two-piece power S-curve around 0.5.
pub fn s_curve(c: f32, exponent: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c < 0.5 {
        0.5 * (2.0 * c).powf(exponent)
    } else {
        1.0 - 0.5 * (2.0 * (1.0 - c)).powf(exponent)
    }
}

/// Zone-selected tone curves, parameterized by the tuning constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurves {
    pub shadow_gamma: f32,
    pub shadow_mix: f32,
    pub highlight_amplitude: f32,
    pub highlight_mix: f32,
    pub midtone_exponent: f32,
    pub midtone_mix: f32,
    pub midtone_mix_highlight: f32,
}

impl Default for ToneCurves {
    fn default() -> Self {
        Self::new(&TuningConstants::default())
    }
}

impl ToneCurves {
    pub fn new(tuning: &TuningConstants) -> Self {
        Self {
            shadow_gamma: tuning.shadow_gamma,
            shadow_mix: tuning.shadow_curve_mix,
            highlight_amplitude: tuning.highlight_sine_amplitude,
            highlight_mix: tuning.highlight_curve_mix,
            midtone_exponent: tuning.midtone_curve_exponent,
            midtone_mix: tuning.midtone_curve_mix,
            midtone_mix_highlight: tuning.midtone_curve_mix_highlight,
        }
    }

    /// Gentle lift of dark values.
    pub fn shadow(&self, c: f32) -> f32 {
        let c = c.clamp(0.0, 1.0);
        lerp(c, c.powf(self.shadow_gamma), self.shadow_mix)
    }

    /// Sine micro-adjustment, mostly identity.
    pub fn highlight(&self, c: f32) -> f32 {
        let c = c.clamp(0.0, 1.0);
        let curved = c + self.highlight_amplitude * (std::f32::consts::PI * c).sin();
        lerp(c, curved, self.highlight_mix).clamp(0.0, 1.0)
    }

    /// S-curve whose share drops as highlights take over.
    pub fn midtone(&self, c: f32, highlight_weight: f32) -> f32 {
        let c = c.clamp(0.0, 1.0);
        let mix = lerp(
            self.midtone_mix,
            self.midtone_mix_highlight,
            highlight_weight.clamp(0.0, 1.0),
        );
        lerp(c, s_curve(c, self.midtone_exponent), mix)
    }

    /// Apply the curve of the active zone to every channel.
    pub fn apply(&self, rgb: [f32; 3], weights: &ZoneWeights) -> [f32; 3] {
        match weights.active_zone() {
            Zone::Shadow => rgb.map(|c| self.shadow(c)),
            Zone::Highlight => rgb.map(|c| self.highlight(c)),
            Zone::Midtone => rgb.map(|c| self.midtone(c, weights.highlight)),
        }
    }
}

/// Pull every channel toward its smoothstep, gentler in highlights.
///
/// ```text
/// c' = c + strength × (1 − 0.5 × min(hw, 1)) × (smoothstep(c) − c)
/// ```
pub fn contrast_s_curve(rgb: [f32; 3], strength: f32, highlight_weight: f32) -> [f32; 3] {
    let amount = strength * (1.0 - 0.5 * highlight_weight.clamp(0.0, 1.0));
    rgb.map(|c| {
        let c = c.clamp(0.0, 1.0);
        c + amount * (smoothstep(c) - c)
    })
}
