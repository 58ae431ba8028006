//! RGB ↔ HSL with all three components normalized to [0, 1].
//!
//! Hue is circular: 0.0 and 1.0 both denote red, and any hue outside
//! [0, 1) is wrapped before conversion back to RGB.

/// Convert RGB to `[hue, saturation, lightness]`, each in [0, 1].
pub fn rgb_to_hsl(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lum = (max + min) * 0.5;

    if (max - min).abs() < 1e-10 {
        return [0.0, 0.0, lum];
    }

    let delta = max - min;
    let sat = if lum > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let hue = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    [wrap_hue(hue / 6.0), sat, lum]
}

/// Convert `[hue, saturation, lightness]` back to RGB.
pub fn hsl_to_rgb(hsl: [f32; 3]) -> [f32; 3] {
    let [hue, sat, lum] = hsl;
    if sat.abs() < 1e-10 {
        return [lum, lum, lum];
    }

    let q = if lum < 0.5 {
        lum * (1.0 + sat)
    } else {
        lum + sat - lum * sat
    };
    let p = 2.0 * lum - q;
    let h = wrap_hue(hue);

    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

/// Wrap a hue into [0, 1).
pub fn wrap_hue(hue: f32) -> f32 {
    let wrapped = hue.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_hsl_roundtrip_preserves_values() {
        for original in [[0.8, 0.4, 0.2], [0.1, 0.9, 0.3], [0.2, 0.3, 0.95], [0.7, 0.1, 0.6]] {
            let back = hsl_to_rgb(rgb_to_hsl(original));
            for i in 0..3 {
                assert!(
                    (original[i] - back[i]).abs() < 1e-4,
                    "channel {i}: {:.6} vs {:.6}",
                    original[i],
                    back[i]
                );
            }
        }
    }

    #[test]
    fn test_hsl_gray_has_zero_saturation() {
        let [_, s, l] = rgb_to_hsl([0.5, 0.5, 0.5]);
        assert!(s.abs() < EPSILON);
        assert!((l - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_hsl_primary_hues() {
        assert!(rgb_to_hsl([1.0, 0.0, 0.0])[0].abs() < EPSILON);
        assert!((rgb_to_hsl([0.0, 1.0, 0.0])[0] - 1.0 / 3.0).abs() < EPSILON);
        assert!((rgb_to_hsl([0.0, 0.0, 1.0])[0] - 2.0 / 3.0).abs() < EPSILON);
        // Magenta-ish red sits just below the wrap point.
        let h = rgb_to_hsl([1.0, 0.0, 0.1])[0];
        assert!(h > 0.95 && h < 1.0, "hue {h}");
    }

    #[test]
    fn test_hue_wraps_circularly() {
        let a = hsl_to_rgb([0.25, 0.8, 0.5]);
        let b = hsl_to_rgb([1.25, 0.8, 0.5]);
        let c = hsl_to_rgb([-0.75, 0.8, 0.5]);
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < EPSILON);
            assert!((a[i] - c[i]).abs() < EPSILON);
        }
        assert_eq!(wrap_hue(-1e-9), 0.0);
    }
}
