//! Gamut repair heuristics applied after an L\*a\*b\* → sRGB inversion.
//!
//! When the three matched L\*a\*b\* channels come from independent
//! distributions they are not guaranteed to describe a consistent color,
//! and the inversion can drift toward cyan or flatten into a washed-out
//! pastel. These two corrections are empirical and each can be switched
//! off through [`GamutRepair`], so the pure conversion in
//! [`lab`](super::lab) stays testable on its own.
//!
//! ```text
//! cyan bias:  R < 0.3 and G > 0.5 and B > 0.5
//!             R' = R × 1.15 + 0.03,  G' = G × 0.95,  B' = B × 0.95
//!
//! wash-out:   R, G, B > 0.6
//!             C' = 0.5 + (C − 0.5) × 1.1
//! ```

use crate::transform::params::GamutRepair;

/// Red ceiling below which the cyan-bias correction may fire.
pub const CYAN_RED_CEILING: f32 = 0.3;
/// Green/blue floor above which the cyan-bias correction may fire.
pub const CYAN_GB_FLOOR: f32 = 0.5;
/// Floor every channel must exceed for the wash-out correction.
pub const WASH_OUT_FLOOR: f32 = 0.6;

const CYAN_RED_GAIN: f32 = 1.15;
const CYAN_RED_LIFT: f32 = 0.03;
const CYAN_GB_DAMP: f32 = 0.95;
const WASH_OUT_CONTRAST: f32 = 1.1;

/// Which repair stages changed a color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub cyan_bias: bool,
    pub wash_out: bool,
}

impl RepairReport {
    /// `true` if any stage changed the color.
    pub fn any(&self) -> bool {
        self.cyan_bias || self.wash_out
    }
}

/// Apply the enabled repair stages, in order cyan bias then wash-out.
pub fn repair(rgb: [f32; 3], settings: &GamutRepair) -> ([f32; 3], RepairReport) {
    let mut out = rgb;
    let mut report = RepairReport::default();

    if settings.cyan_bias && has_cyan_bias(out) {
        out = correct_cyan_bias(out);
        report.cyan_bias = true;
    }
    if settings.wash_out && is_washed_out(out) {
        out = correct_wash_out(out);
        report.wash_out = true;
    }

    (out, report)
}

/// Low red with both green and blue high.
pub fn has_cyan_bias(rgb: [f32; 3]) -> bool {
    rgb[0] < CYAN_RED_CEILING && rgb[1] > CYAN_GB_FLOOR && rgb[2] > CYAN_GB_FLOOR
}

/// Every channel above the wash-out floor.
pub fn is_washed_out(rgb: [f32; 3]) -> bool {
    rgb.iter().all(|&c| c > WASH_OUT_FLOOR)
}

/// Boost red, damp green and blue.
pub fn correct_cyan_bias(rgb: [f32; 3]) -> [f32; 3] {
    [
        (rgb[0] * CYAN_RED_GAIN + CYAN_RED_LIFT).min(1.0),
        rgb[1] * CYAN_GB_DAMP,
        rgb[2] * CYAN_GB_DAMP,
    ]
}

/// Mild contrast push around 0.5.
pub fn correct_wash_out(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| (0.5 + (c - 0.5) * WASH_OUT_CONTRAST).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> GamutRepair {
        GamutRepair {
            cyan_bias: true,
            wash_out: true,
        }
    }

    #[test]
    fn test_cyan_bias_boosts_red_and_damps_green_blue() {
        let (out, report) = repair([0.1, 0.7, 0.8], &all_on());
        assert!(report.cyan_bias);
        assert!(out[0] > 0.1);
        assert!(out[1] < 0.7);
        assert!(out[2] < 0.8);
    }

    #[test]
    fn test_wash_out_pushes_contrast() {
        let (out, report) = repair([0.7, 0.8, 0.9], &all_on());
        assert!(report.wash_out && !report.cyan_bias);
        assert!(out[0] > 0.7 && out[2] > 0.9);
        assert!(out[2] <= 1.0);
    }

    #[test]
    fn test_disabled_repairs_are_passthrough() {
        let rgb = [0.1, 0.7, 0.8];
        let (out, report) = repair(rgb, &GamutRepair::disabled());
        assert_eq!(out, rgb);
        assert!(!report.any());
    }

    #[test]
    fn test_in_range_color_is_untouched() {
        let rgb = [0.4, 0.5, 0.3];
        let (out, report) = repair(rgb, &all_on());
        assert_eq!(out, rgb);
        assert!(!report.any());
    }

    #[test]
    fn test_gray_stays_gray() {
        let (out, _) = repair([0.8, 0.8, 0.8], &all_on());
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }
}
