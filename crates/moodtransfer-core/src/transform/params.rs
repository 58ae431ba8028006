//! Central configuration for a color-transfer build.
//!
//! `TransferConfig` is the single source of truth for one LUT build. A built
//! [`Lut3D`](crate::transform::lut::Lut3D) is tied to the config it was
//! built with; changing any field means building a new LUT.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

/// Grid size per axis of every LUT the builder produces.
pub const LUT_SIZE: usize = 33;

/// Largest accepted steep-slope neighbor window half-width.
pub const MAX_SMOOTHING_WINDOW: usize = 32;

/// Allowed deviation of a zone blend row's sum from 1.
const BLEND_SUM_TOLERANCE: f32 = 1e-3;

/// Toggles for the post-inversion gamut repair heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamutRepair {
    /// Counter the excess-cyan drift of inconsistent L\*a\*b\* inputs.
    pub cyan_bias: bool,
    /// Counter wash-out when every channel ends up bright.
    pub wash_out: bool,
}

impl GamutRepair {
    /// Both repairs off: the L\*a\*b\* path is the pure inversion.
    pub const fn disabled() -> Self {
        Self {
            cyan_bias: false,
            wash_out: false,
        }
    }
}

impl Default for GamutRepair {
    fn default() -> Self {
        Self {
            cyan_bias: true,
            wash_out: true,
        }
    }
}

/// Blend weights for the three matched candidates, `[lab, hsl, rgb]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneBlend {
    pub shadows: [f32; 3],
    pub midtones: [f32; 3],
    pub highlights: [f32; 3],
}

impl ZoneBlend {
    /// Every row must be finite, non-negative, and sum to 1.
    pub fn validate(&self) -> Result<()> {
        for (name, row) in [
            ("shadows", self.shadows),
            ("midtones", self.midtones),
            ("highlights", self.highlights),
        ] {
            if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(TransferError::InvalidInput(format!(
                    "tuning.zone_blend.{name} must be finite and non-negative, got {row:?}"
                )));
            }
            let sum: f32 = row.iter().sum();
            if (sum - 1.0).abs() > BLEND_SUM_TOLERANCE {
                return Err(TransferError::InvalidInput(format!(
                    "tuning.zone_blend.{name} must sum to 1, got {sum}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ZoneBlend {
    fn default() -> Self {
        Self {
            shadows: [0.30, 0.30, 0.40],
            midtones: [0.25, 0.35, 0.40],
            highlights: [0.20, 0.35, 0.45],
        }
    }
}

/// Empirically tuned constants. None of these has a derivation; they are
/// exposed so a caller can override them, not so they can be reasoned about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConstants {
    /// Share of the identity value kept after matching (70/30 matched/identity).
    pub identity_bias: f32,
    /// CDF change across neighboring bins that counts as a steep slope.
    pub steep_slope_threshold: f32,
    /// Half-width of the neighbor window used on steep L\*a\*b\* slopes.
    pub smoothing_window: usize,
    /// Weight of the mean/std-dev contrast-matched value in the RGB path.
    /// 0.0 disables contrast preservation.
    pub contrast_preservation: f32,
    /// Per-zone `[lab, hsl, rgb]` blend presets.
    pub zone_blend: ZoneBlend,
    /// L\*a\*b\* chroma above which the desaturation guard kicks in.
    pub chroma_guard_threshold: f32,
    /// Weight moved from L\*a\*b\*+HSL to RGB by the desaturation guard.
    pub chroma_guard_shift: f32,
    /// Relative saturation boost after blending.
    pub saturation_boost: f32,
    /// Channel push per unit of reference temperature strength.
    pub temperature_strength: f32,
    /// Split-toning tint magnitude per unit of zone weight.
    pub split_tone_strength: f32,
    /// Contrast S-curve mix for high-contrast references.
    pub contrast_strength: f32,
    /// Gain along the reference's dominant hue axis.
    pub dominant_hue_boost: f32,
    /// Maximum intensity reduction in strong highlights.
    pub highlight_intensity_reduction: f32,
    /// Relative amplitude of the anti-banding intensity perturbation.
    pub noise_amplitude: f32,
    /// Shadow tone-curve exponent.
    pub shadow_gamma: f32,
    /// Share of the shadow curve in the shadow blend.
    pub shadow_curve_mix: f32,
    /// Amplitude of the highlight sine micro-adjustment.
    pub highlight_sine_amplitude: f32,
    /// Share of the highlight curve in the highlight blend.
    pub highlight_curve_mix: f32,
    /// Exponent of the two-piece midtone S-curve.
    pub midtone_curve_exponent: f32,
    /// Share of the midtone curve in the midtone blend.
    pub midtone_curve_mix: f32,
    /// Midtone curve share as highlights take over.
    pub midtone_curve_mix_highlight: f32,
}

impl Default for TuningConstants {
    fn default() -> Self {
        Self {
            identity_bias: 0.30,
            steep_slope_threshold: 0.08,
            smoothing_window: 3,
            contrast_preservation: 0.0,
            zone_blend: ZoneBlend::default(),
            chroma_guard_threshold: 60.0,
            chroma_guard_shift: 0.05,
            saturation_boost: 0.10,
            temperature_strength: 0.06,
            split_tone_strength: 0.03,
            contrast_strength: 0.15,
            dominant_hue_boost: 0.05,
            highlight_intensity_reduction: 0.30,
            noise_amplitude: 0.02,
            shadow_gamma: 0.95,
            shadow_curve_mix: 0.60,
            highlight_sine_amplitude: 0.02,
            highlight_curve_mix: 0.40,
            midtone_curve_exponent: 1.2,
            midtone_curve_mix: 0.70,
            midtone_curve_mix_highlight: 0.50,
        }
    }
}

impl TuningConstants {
    /// Reject non-finite or out-of-range constants.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("identity_bias", self.identity_bias),
            ("steep_slope_threshold", self.steep_slope_threshold),
            ("contrast_preservation", self.contrast_preservation),
            ("chroma_guard_shift", self.chroma_guard_shift),
            ("saturation_boost", self.saturation_boost),
            ("temperature_strength", self.temperature_strength),
            ("split_tone_strength", self.split_tone_strength),
            ("contrast_strength", self.contrast_strength),
            ("dominant_hue_boost", self.dominant_hue_boost),
            ("highlight_intensity_reduction", self.highlight_intensity_reduction),
            ("noise_amplitude", self.noise_amplitude),
            ("shadow_curve_mix", self.shadow_curve_mix),
            ("highlight_sine_amplitude", self.highlight_sine_amplitude),
            ("highlight_curve_mix", self.highlight_curve_mix),
            ("midtone_curve_mix", self.midtone_curve_mix),
            ("midtone_curve_mix_highlight", self.midtone_curve_mix_highlight),
        ] {
            check_unit(&format!("tuning.{name}"), value)?;
        }
        for (name, value) in [
            ("shadow_gamma", self.shadow_gamma),
            ("midtone_curve_exponent", self.midtone_curve_exponent),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TransferError::InvalidInput(format!(
                    "tuning.{name} must be finite and positive, got {value}"
                )));
            }
        }
        if !self.chroma_guard_threshold.is_finite() || self.chroma_guard_threshold < 0.0 {
            return Err(TransferError::InvalidInput(format!(
                "tuning.chroma_guard_threshold must be finite and non-negative, got {}",
                self.chroma_guard_threshold
            )));
        }
        if self.smoothing_window > MAX_SMOOTHING_WINDOW {
            return Err(TransferError::InvalidInput(format!(
                "tuning.smoothing_window must be at most {MAX_SMOOTHING_WINDOW}, got {}",
                self.smoothing_window
            )));
        }
        self.zone_blend.validate()
    }
}

/// Everything a LUT build depends on besides the two images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Overall blend strength in [0, 1]. 0.0 produces an identity LUT.
    pub intensity: f32,
    /// Anti-banding noise strength in [0, 1]. 0.0 makes the build noise-free.
    pub anti_banding: f32,
    /// Apply the look stages (saturation boost, temperature, split toning,
    /// contrast, dominant hue, tone curves) on top of the pure transfer.
    pub stylize: bool,
    /// Post-inversion gamut repair toggles.
    pub gamut_repair: GamutRepair,
    /// Emit per-event diagnostics through `tracing`.
    pub diagnostics: bool,
    /// Overridable tuning constants.
    pub tuning: TuningConstants,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            anti_banding: 0.8,
            stylize: true,
            gamut_repair: GamutRepair::default(),
            diagnostics: false,
            tuning: TuningConstants::default(),
        }
    }
}

impl TransferConfig {
    /// Pure distribution transfer: no look stages, no gamut repair, no noise.
    pub fn neutral() -> Self {
        Self {
            anti_banding: 0.0,
            stylize: false,
            gamut_repair: GamutRepair::disabled(),
            ..Self::default()
        }
    }

    /// Same config with a different intensity.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Same config with a different anti-banding strength.
    pub fn with_anti_banding(mut self, anti_banding: f32) -> Self {
        self.anti_banding = anti_banding;
        self
    }

    /// Reject non-finite or out-of-range scalars.
    pub fn validate(&self) -> Result<()> {
        check_unit("intensity", self.intensity)?;
        check_unit("anti_banding", self.anti_banding)?;
        self.tuning.validate()
    }

    /// Parse a config from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Options for statistics extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsOptions {
    /// Approximate number of pixels sampled for HSL and L\*a\*b\* statistics.
    pub sample_target: usize,
    /// Smooth the sparse sampled histograms before building their CDFs.
    pub smooth_sampled: bool,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            sample_target: 5_000,
            smooth_sampled: false,
        }
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TransferError::InvalidInput(format!(
            "{name} must be finite and within [0, 1], got {value}"
        )))
    }
}
