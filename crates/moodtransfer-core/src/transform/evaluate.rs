//! Per-node evaluation: the full transfer chain for a single grid color.
//!
//! [`evaluate_node`] is a pure function of the node color, its grid
//! coordinate, and an immutable [`NodeContext`], so nodes can be evaluated
//! in any order and on any thread.
//!
//! # Chain
//! 1. Zone weights from Rec. 709 luminance.
//! 2. L\*a\*b\* candidate: match L\*, a\*, b\* independently (steep-slope
//!    refinement on), invert, optionally gamut-repair. A failed inversion
//!    substitutes the node color and moves the L\*a\*b\* blend weight to RGB.
//! 3. RGB candidate (per-channel match, optional contrast preservation) and
//!    HSL candidate (circular hue match, saturation and lightness match).
//! 4. Zone-weighted blend of the three candidates with the chroma guard.
//! 5. Saturation boost (stylize).
//! 6. Monochrome reference: collapse to luminance.
//! 7. Otherwise temperature, split toning, contrast S-curve, dominant hue
//!    (stylize).
//! 8. Zone tone curve on the graded color (stylize).
//! 9. Effective intensity: base, minus highlight reduction, times
//!    anti-banding noise.
//! 10. `out = lerp(node, graded, smoothstep(t_eff))`.
//! 11. Non-finite output falls back to the node color.
//!
//! Intensity enters only through step 10, so intensity 0 is an exact
//! identity and every node moves monotonically away from its identity
//! color as intensity grows. The step 7 magnitudes (temperature, split
//! toning, dominant hue) are therefore fixed per unit of their tuning
//! constant and reach the output scaled by `smoothstep(t_eff)`, not by
//! intensity directly.

use crate::analysis::classify::ImageProfile;
use crate::analysis::stats::{AB_OFFSET, ChannelStats, HUE_BINS};
use crate::color_management::gamut::{self, RepairReport};
use crate::color_management::lab::chroma;
use crate::color_management::{hsl_to_rgb, lab_to_rgb, rgb_to_hsl, rgb_to_lab};
use crate::error::Result;
use crate::grading::adjust;
use crate::grading::curves::{self, ToneCurves};
use crate::grading::matcher::{CdfPair, DistributionMatcher};
use crate::grading::zones::{ZoneWeights, luminance};
use crate::transform::noise;
use crate::transform::params::TransferConfig;

/// Immutable inputs shared by every node of one build.
#[derive(Debug, Clone)]
pub struct NodeContext<'a> {
    pub config: &'a TransferConfig,
    pub reference: &'a ImageProfile,
    pub target: &'a ImageProfile,
    matcher: DistributionMatcher,
    curves: ToneCurves,
    rgb: [CdfPair<'a>; 3],
    hsl: [CdfPair<'a>; 3],
    lab: [CdfPair<'a>; 3],
}

impl<'a> NodeContext<'a> {
    /// Pair every target distribution with its reference counterpart.
    ///
    /// Matching maps values of the image being graded (`target`) onto the
    /// distributions of the `reference`.
    pub fn new(
        config: &'a TransferConfig,
        reference: &'a ImageProfile,
        target: &'a ImageProfile,
    ) -> Result<Self> {
        let (r, t) = (&reference.stats, &target.stats);
        Ok(Self {
            config,
            reference,
            target,
            matcher: DistributionMatcher::new(&config.tuning),
            curves: ToneCurves::new(&config.tuning),
            rgb: [
                CdfPair::new(&t.rgb.red.distribution, &r.rgb.red.distribution)?,
                CdfPair::new(&t.rgb.green.distribution, &r.rgb.green.distribution)?,
                CdfPair::new(&t.rgb.blue.distribution, &r.rgb.blue.distribution)?,
            ],
            hsl: [
                CdfPair::new(&t.hsl.hue, &r.hsl.hue)?,
                CdfPair::new(&t.hsl.saturation, &r.hsl.saturation)?,
                CdfPair::new(&t.hsl.lightness, &r.hsl.lightness)?,
            ],
            lab: [
                CdfPair::new(&t.lab.l, &r.lab.l)?,
                CdfPair::new(&t.lab.a, &r.lab.a)?,
                CdfPair::new(&t.lab.b, &r.lab.b)?,
            ],
        })
    }
}

/// Noteworthy events while evaluating one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeEvents {
    /// The L\*a\*b\* inversion clamped its input or output.
    pub lab_clamped: bool,
    /// The L\*a\*b\* inversion failed and the node color was substituted.
    pub lab_failed: bool,
    /// Gamut repair stages that fired.
    pub repair: RepairReport,
    /// The chain produced a non-finite color and the node color was kept.
    pub non_finite: bool,
}

/// Result of evaluating one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeOutput {
    pub rgb: [f32; 3],
    pub events: NodeEvents,
}

/// Run the full chain for node color `rgb` at grid coordinate `coord`.
pub fn evaluate_node(ctx: &NodeContext<'_>, rgb: [f32; 3], coord: [usize; 3]) -> NodeOutput {
    let config = ctx.config;
    let tuning = &config.tuning;
    let mut events = NodeEvents::default();

    // 1. Zones
    let weights = ZoneWeights::of_rgb(rgb);

    // 2. L*a*b* candidate
    let lab_in = rgb_to_lab(rgb);
    let lab_matched = [
        ctx.matcher.match_refined(&ctx.lab[0], lab_in[0]),
        ctx.matcher.match_refined(&ctx.lab[1], lab_in[1] + AB_OFFSET) - AB_OFFSET,
        ctx.matcher.match_refined(&ctx.lab[2], lab_in[2] + AB_OFFSET) - AB_OFFSET,
    ];
    let lab_candidate = match lab_to_rgb(lab_matched) {
        Ok(inversion) => {
            events.lab_clamped = inversion.clamped;
            let (repaired, report) = gamut::repair(inversion.rgb, &config.gamut_repair);
            events.repair = report;
            Some(repaired)
        }
        Err(_) => {
            events.lab_failed = true;
            None
        }
    };

    // 3. RGB and HSL candidates
    let rgb_candidate = match_rgb(ctx, rgb);
    let hsl_candidate = match_hsl(ctx, rgb);

    // 4. Blend
    let blend = blend_weights(ctx, &weights, chroma(lab_in));
    let mut graded = blend_candidates(blend, lab_candidate, hsl_candidate, rgb_candidate);

    // 5. Saturation boost
    if config.stylize {
        graded = adjust::boost_saturation(graded, tuning.saturation_boost);
    }

    // 6–7. Monochrome collapse or look stages
    if ctx.reference.monochrome {
        graded = [luminance(graded); 3];
    } else if config.stylize {
        graded = adjust::apply_temperature(
            graded,
            &ctx.reference.temperature,
            tuning.temperature_strength,
        );
        graded = adjust::apply_split_toning(graded, &weights, tuning.split_tone_strength);
        if ctx.reference.high_contrast {
            graded = curves::contrast_s_curve(graded, tuning.contrast_strength, weights.highlight);
        }
        if let Some(dominant) = ctx.reference.dominant {
            graded = adjust::boost_dominant_hue(graded, dominant, tuning.dominant_hue_boost);
        }
    }

    // 8. Tone curve
    if config.stylize {
        graded = ctx.curves.apply(graded, &weights);
    }
    let graded = graded.map(|c| c.clamp(0.0, 1.0));

    // 9–10. Effective intensity and final blend
    let t = effective_intensity(ctx, &weights, coord);
    let s = curves::smoothstep(t);
    let mut out = [0.0_f32; 3];
    for c in 0..3 {
        out[c] = curves::lerp(rgb[c], graded[c], s);
    }

    // 11. Non-finite guard
    if out.iter().any(|v| !v.is_finite()) {
        events.non_finite = true;
        out = rgb;
    }

    NodeOutput { rgb: out, events }
}

fn match_rgb(ctx: &NodeContext<'_>, rgb: [f32; 3]) -> [f32; 3] {
    let preservation = ctx.config.tuning.contrast_preservation;
    let reference = ctx.reference.stats.rgb.channels();
    let target = ctx.target.stats.rgb.channels();
    let mut out = [0.0_f32; 3];
    for c in 0..3 {
        let matched = ctx.matcher.match_value(&ctx.rgb[c], rgb[c] * 255.0) / 255.0;
        out[c] = if preservation > 0.0 && !ctx.rgb[c].is_identical() {
            preserve_contrast(matched, rgb[c], reference[c], target[c], preservation)
        } else {
            matched
        };
    }
    out
}

fn preserve_contrast(
    matched: f32,
    value: f32,
    reference: &ChannelStats,
    target: &ChannelStats,
    weight: f32,
) -> f32 {
    let contrast = reference.contrast_matched(value, target);
    curves::lerp(matched, contrast, weight)
}

fn match_hsl(ctx: &NodeContext<'_>, rgb: [f32; 3]) -> [f32; 3] {
    let [h, s, l] = rgb_to_hsl(rgb);
    let hue_bins = HUE_BINS as f32;
    let h = ctx.matcher.match_circular(&ctx.hsl[0], h * hue_bins) / hue_bins;
    let s = ctx.matcher.match_value(&ctx.hsl[1], s * 100.0) / 100.0;
    let l = ctx.matcher.match_value(&ctx.hsl[2], l * 100.0) / 100.0;
    hsl_to_rgb([h, s.clamp(0.0, 1.0), l.clamp(0.0, 1.0)])
}

/// Zone-weighted `[lab, hsl, rgb]` blend with the desaturation guard.
///
/// Zone weights are clamped at zero before normalizing, so a negative
/// midtone weight at the extremes contributes nothing.
fn blend_weights(ctx: &NodeContext<'_>, weights: &ZoneWeights, lab_chroma: f32) -> [f32; 3] {
    let tuning = &ctx.config.tuning;
    let presets = &tuning.zone_blend;
    let shares = [weights.shadow, weights.midtone, weights.highlight].map(|w| w.max(0.0));
    let total: f32 = shares.iter().sum();

    let mut blend = if total <= f32::EPSILON {
        presets.midtones
    } else {
        let mut acc = [0.0_f32; 3];
        for (preset, w) in [presets.shadows, presets.midtones, presets.highlights]
            .into_iter()
            .zip(shares)
        {
            for i in 0..3 {
                acc[i] += preset[i] * w / total;
            }
        }
        acc
    };

    if lab_chroma > tuning.chroma_guard_threshold {
        let shift = tuning.chroma_guard_shift;
        blend[0] = (blend[0] - shift * 0.5).max(0.0);
        blend[1] = (blend[1] - shift * 0.5).max(0.0);
        blend[2] += shift;
    }
    blend
}

/// Weighted sum of the `[lab, hsl, rgb]` candidates. Without a L\*a\*b\*
/// candidate its weight moves to the RGB path.
fn blend_candidates(
    mut blend: [f32; 3],
    lab: Option<[f32; 3]>,
    hsl: [f32; 3],
    rgb: [f32; 3],
) -> [f32; 3] {
    let lab = lab.unwrap_or_else(|| {
        blend[2] += blend[0];
        blend[0] = 0.0;
        [0.0; 3]
    });
    let mut out = [0.0_f32; 3];
    for c in 0..3 {
        out[c] = blend[0] * lab[c] + blend[1] * hsl[c] + blend[2] * rgb[c];
    }
    out
}

/// Intensity after highlight reduction and anti-banding perturbation.
///
/// ```text
/// t = clamp(i × (1 − reduction × min(hw, 1)) × (1 + anti_banding × amplitude × n), 0, 1)
/// ```
///
/// A monochrome reference skips the highlight reduction so the gray
/// collapse reaches every node.
fn effective_intensity(ctx: &NodeContext<'_>, weights: &ZoneWeights, coord: [usize; 3]) -> f32 {
    let config = ctx.config;
    let tuning = &config.tuning;

    let reduction = if ctx.reference.monochrome {
        0.0
    } else {
        tuning.highlight_intensity_reduction * weights.highlight.min(1.0)
    };
    let perturbation = if config.anti_banding > 0.0 {
        config.anti_banding * tuning.noise_amplitude * noise::node_noise(coord[0], coord[1], coord[2])
    } else {
        0.0
    };
    (config.intensity * (1.0 - reduction) * (1.0 + perturbation)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{PixelBuffer, PixelFormat};
    use crate::transform::params::StatsOptions;

    const EPSILON: f32 = 2e-3;

    fn gradient() -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..32u32 {
            for x in 0..32u32 {
                data.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]);
            }
        }
        PixelBuffer::new(32, 32, PixelFormat::Rgb8, data).unwrap()
    }

    fn profile(buf: &PixelBuffer) -> ImageProfile {
        ImageProfile::analyze(buf, &StatsOptions::default()).unwrap()
    }

    #[test]
    fn test_identical_images_give_identity_nodes() {
        let p = profile(&gradient());
        let config = TransferConfig::neutral();
        let ctx = NodeContext::new(&config, &p, &p).unwrap();
        for rgb in [[0.0, 0.0, 0.0], [0.25, 0.5, 0.75], [1.0, 0.2, 0.6], [1.0; 3]] {
            let out = evaluate_node(&ctx, rgb, [0, 0, 0]);
            for c in 0..3 {
                assert!(
                    (out.rgb[c] - rgb[c]).abs() < EPSILON,
                    "{rgb:?} -> {:?}",
                    out.rgb
                );
            }
            assert!(!out.events.non_finite);
        }
    }

    #[test]
    fn test_zero_intensity_is_exact_identity() {
        let reference = profile(&PixelBuffer::filled(8, 8, [230, 120, 40, 255]));
        let target = profile(&gradient());
        let config = TransferConfig::default().with_intensity(0.0);
        let ctx = NodeContext::new(&config, &reference, &target).unwrap();
        let rgb = [0.3, 0.6, 0.9];
        assert_eq!(evaluate_node(&ctx, rgb, [3, 4, 5]).rgb, rgb);
    }

    #[test]
    fn test_monochrome_reference_yields_gray() {
        let reference = profile(&PixelBuffer::filled(8, 8, [90, 90, 90, 255]));
        let target = profile(&gradient());
        let config = TransferConfig::default();
        let ctx = NodeContext::new(&config, &reference, &target).unwrap();
        let out = evaluate_node(&ctx, [0.9, 0.1, 0.3], [29, 3, 9]).rgb;
        assert!((out[0] - out[1]).abs() < 0.01 && (out[1] - out[2]).abs() < 0.01, "{out:?}");
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        let p = profile(&gradient());
        let config = TransferConfig::default();
        let ctx = NodeContext::new(&config, &p, &p).unwrap();
        for l in [0.0, 0.2, 0.5, 0.8, 1.0] {
            for chroma in [0.0, 80.0] {
                let w = blend_weights(&ctx, &ZoneWeights::classify(l), chroma);
                assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5, "{w:?}");
            }
        }
    }

    #[test]
    fn test_extreme_luminance_blend_ignores_negative_midtone() {
        let p = profile(&gradient());
        let config = TransferConfig::default();
        let ctx = NodeContext::new(&config, &p, &p).unwrap();
        let presets = config.tuning.zone_blend;

        let black = blend_weights(&ctx, &ZoneWeights::classify(0.0), 0.0);
        for i in 0..3 {
            assert!((black[i] - presets.shadows[i]).abs() < 1e-6, "{black:?}");
        }
        let white = blend_weights(&ctx, &ZoneWeights::classify(1.0), 0.0);
        for i in 0..3 {
            assert!((white[i] - presets.highlights[i]).abs() < 1e-6, "{white:?}");
            assert!(white[i] >= 0.0);
        }
    }

    #[test]
    fn test_missing_lab_candidate_moves_weight_to_rgb() {
        let hsl = [0.2, 0.4, 0.6];
        let rgb = [0.9, 0.5, 0.1];
        let blend = [0.3, 0.3, 0.4];
        let out = blend_candidates(blend, None, hsl, rgb);
        for c in 0..3 {
            let expected = 0.3 * hsl[c] + 0.7 * rgb[c];
            assert!((out[c] - expected).abs() < 1e-6, "{out:?}");
        }

        let with_lab = blend_candidates(blend, Some([1.0; 3]), hsl, rgb);
        assert!((with_lab[0] - (0.3 + 0.3 * hsl[0] + 0.4 * rgb[0])).abs() < 1e-6);
    }

    #[test]
    fn test_failed_lab_inversion_is_flagged() {
        let reference = profile(&PixelBuffer::filled(8, 8, [230, 120, 40, 255]));
        let target = profile(&gradient());
        // Bypasses validation: a NaN damping weight poisons every match.
        let mut config = TransferConfig::default();
        config.tuning.identity_bias = f32::NAN;
        let ctx = NodeContext::new(&config, &reference, &target).unwrap();
        let rgb = [0.4, 0.5, 0.6];
        let out = evaluate_node(&ctx, rgb, [13, 16, 19]);
        assert!(out.events.lab_failed);
        assert!(!out.events.lab_clamped);
        assert!(out.events.non_finite);
        assert_eq!(out.rgb, rgb);
    }

    #[test]
    fn test_non_finite_output_falls_back_to_node_color() {
        let reference = profile(&PixelBuffer::filled(8, 8, [230, 120, 40, 255]));
        let target = profile(&gradient());
        let config = TransferConfig::default().with_intensity(f32::NAN);
        let ctx = NodeContext::new(&config, &reference, &target).unwrap();
        for rgb in [[0.0, 0.0, 0.0], [0.7, 0.2, 0.9], [1.0; 3]] {
            let out = evaluate_node(&ctx, rgb, [1, 2, 3]);
            assert!(out.events.non_finite);
            assert!(!out.events.lab_failed);
            assert_eq!(out.rgb, rgb);
        }
    }

    #[test]
    fn test_chroma_guard_shifts_toward_rgb() {
        let p = profile(&gradient());
        let config = TransferConfig::default();
        let ctx = NodeContext::new(&config, &p, &p).unwrap();
        let zones = ZoneWeights::classify(0.5);
        let calm = blend_weights(&ctx, &zones, 10.0);
        let vivid = blend_weights(&ctx, &zones, 90.0);
        assert!((vivid[2] - calm[2] - 0.05).abs() < 1e-6);
        assert!(vivid[0] < calm[0] && vivid[1] < calm[1]);
    }
}
