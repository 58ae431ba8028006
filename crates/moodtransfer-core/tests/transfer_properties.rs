//! End-to-end properties of the color-transfer engine: statistics, LUT
//! builds, sampling, and `.cube` export.
//!
//! Run with: `cargo test -p moodtransfer-core`

use std::ops::ControlFlow;

use moodtransfer_core::analysis::ImageStats;
use moodtransfer_core::color_management::{lab_to_rgb, rgb_to_lab};
use moodtransfer_core::transform::cube::{DEFAULT_TITLE, parse_cube, write_cube};
use moodtransfer_core::{
    BuildOutcome, Lut3D, LutBuilder, LutSampler, PixelBuffer, PixelFormat, TransferConfig,
    TransferError,
};
use palette::{IntoColor, Lab, LinSrgb, Srgb};

const EPSILON: f32 = 2e-3;

/// Colorful test image: hue sweeps across x, brightness down y.
fn create_test_gradient(width: u32, height: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = x * 255 / (width - 1);
            let g = y * 255 / (height - 1);
            let b = 255 - (x + y) * 255 / (width + height - 2);
            data.extend_from_slice(&[r as u8, g as u8, b as u8]);
        }
    }
    PixelBuffer::new(width, height, PixelFormat::Rgb8, data).unwrap()
}

/// Gray ramp, R = G = B everywhere.
fn create_gray_ramp(width: u32, height: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = ((x + y * width) * 255 / (width * height - 1)) as u8;
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    PixelBuffer::new(width, height, PixelFormat::Rgba8, data).unwrap()
}

fn node_distance(lut: &Lut3D, r: usize, g: usize, b: usize) -> [f32; 3] {
    let node = lut.get(r, g, b);
    let id = lut.node_color(r, g, b);
    [
        (node[0] - id[0]).abs(),
        (node[1] - id[1]).abs(),
        (node[2] - id[2]).abs(),
    ]
}

// --- Statistics and conversion ---------------------------------------------

#[test]
fn test_cdfs_are_monotone_and_reach_one() {
    let stats = ImageStats::compute(&create_test_gradient(97, 61)).unwrap();
    let distributions = [
        &stats.rgb.red.distribution,
        &stats.rgb.green.distribution,
        &stats.rgb.blue.distribution,
        &stats.hsl.hue,
        &stats.hsl.saturation,
        &stats.hsl.lightness,
        &stats.lab.l,
        &stats.lab.a,
        &stats.lab.b,
    ];
    for dist in distributions {
        let cdf = dist.cdf.values();
        assert!(cdf.windows(2).all(|w| w[1] >= w[0]));
        let top = cdf[cdf.len() - 1];
        assert!((top - 1.0).abs() <= 1e-6, "top bin {top}");
    }
}

#[test]
fn test_lab_matches_independent_reference() {
    for rgb in [[0.2, 0.4, 0.6], [0.9, 0.1, 0.3], [0.5, 0.5, 0.5], [0.05, 0.8, 0.2]] {
        let ours = rgb_to_lab(rgb);
        let linear: LinSrgb = Srgb::new(rgb[0], rgb[1], rgb[2]).into_linear();
        let theirs: Lab = linear.into_color();
        assert!((ours[0] - theirs.l).abs() < 0.1, "L {rgb:?}: {} vs {}", ours[0], theirs.l);
        assert!((ours[1] - theirs.a).abs() < 0.2, "a {rgb:?}: {} vs {}", ours[1], theirs.a);
        assert!((ours[2] - theirs.b).abs() < 0.2, "b {rgb:?}: {} vs {}", ours[2], theirs.b);

        let back = lab_to_rgb(ours).unwrap();
        for c in 0..3 {
            assert!((back.rgb[c] - rgb[c]).abs() < 1e-3);
        }
    }
}

#[test]
fn test_empty_buffers_are_rejected() {
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let empty = PixelBuffer::new(0, 0, PixelFormat::Rgb8, vec![]).unwrap();
    assert!(matches!(
        builder.build(&empty, &create_test_gradient(8, 8)),
        Err(TransferError::InvalidInput(_))
    ));
}

// --- Build properties -------------------------------------------------------

#[test]
fn test_identical_images_build_identity_lut() {
    let image = create_test_gradient(64, 48);
    let builder = LutBuilder::new(TransferConfig::neutral()).unwrap();
    let lut = builder.build(&image, &image).unwrap();
    let deviation = lut.max_identity_deviation();
    assert!(deviation < EPSILON, "max deviation {deviation}");

    let graded = LutSampler::apply(&lut, &image).unwrap();
    for (a, b) in graded.as_bytes().iter().zip(image.as_bytes()) {
        assert!(a.abs_diff(*b) <= 1, "{a} vs {b}");
    }
}

#[test]
fn test_monochrome_reference_forces_gray_nodes() {
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let lut = builder
        .build(&create_gray_ramp(40, 30), &create_test_gradient(64, 48))
        .unwrap();
    for node in lut.nodes() {
        assert!(
            (node[0] - node[1]).abs() < 0.01 && (node[1] - node[2]).abs() < 0.01,
            "colored node {node:?}"
        );
    }
}

#[test]
fn test_intensity_is_monotone_and_zero_is_identity() {
    let reference = PixelBuffer::filled(24, 24, [220, 150, 60, 255]);
    let target = create_test_gradient(64, 48);
    let build = |intensity: f32| {
        LutBuilder::new(TransferConfig::default().with_intensity(intensity))
            .unwrap()
            .build(&reference, &target)
            .unwrap()
    };
    let none = build(0.0);
    let half = build(0.5);
    let full = build(1.0);

    assert!(none.max_identity_deviation() < 1e-7);
    let n = full.size();
    for r in 0..n {
        for g in 0..n {
            for b in 0..n {
                let d_half = node_distance(&half, r, g, b);
                let d_full = node_distance(&full, r, g, b);
                for c in 0..3 {
                    assert!(
                        d_full[c] + 1e-6 >= d_half[c],
                        "node ({r},{g},{b}) channel {c}: {} < {}",
                        d_full[c],
                        d_half[c]
                    );
                }
            }
        }
    }
    assert!(full.max_identity_deviation() > half.max_identity_deviation());
}

#[test]
fn test_mid_gray_maps_to_mid_gray() {
    let gray = PixelBuffer::filled(16, 16, [128, 128, 128, 255]);
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let lut = builder.build(&gray, &gray).unwrap();
    let out = LutSampler::sample(&lut, [0.5, 0.5, 0.5]);
    for c in out {
        assert!((c - 0.5).abs() < 0.01, "{out:?}");
    }
}

#[test]
fn test_white_reference_brightens_black_target() {
    let white = PixelBuffer::filled(16, 16, [255, 255, 255, 255]);
    let black = PixelBuffer::filled(16, 16, [0, 0, 0, 255]);
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let lut = builder.build(&white, &black).unwrap();
    let graded = LutSampler::apply(&lut, &black).unwrap();
    for px in graded.rgb_pixels() {
        assert!(px.iter().all(|&c| c > 100), "pixel {px:?} not brightened");
    }
}

// --- Sampling and export ----------------------------------------------------

#[test]
fn test_built_lut_samples_exactly_at_grid_nodes() {
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let lut = builder
        .build(
            &PixelBuffer::filled(8, 8, [40, 90, 200, 255]),
            &create_test_gradient(32, 32),
        )
        .unwrap();
    let n = lut.size();
    let scale = (n - 1) as f32;
    // The 8 corners of cell (10, 20, 5) plus the outer corners.
    let mut coords = Vec::new();
    for dr in 0..2 {
        for dg in 0..2 {
            for db in 0..2 {
                coords.push((10 + dr, 20 + dg, 5 + db));
            }
        }
    }
    coords.extend([(0, 0, 0), (n - 1, n - 1, n - 1), (n - 1, 0, n - 1)]);
    for (r, g, b) in coords {
        let rgb = [r as f32 / scale, g as f32 / scale, b as f32 / scale];
        assert_eq!(LutSampler::sample(&lut, rgb), lut.get(r, g, b), "node ({r},{g},{b})");
    }
}

#[test]
fn test_cube_roundtrip_of_built_lut() {
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let lut = builder
        .build(
            &PixelBuffer::filled(8, 8, [200, 120, 90, 255]),
            &create_test_gradient(32, 32),
        )
        .unwrap();
    let text = write_cube(&lut, DEFAULT_TITLE);
    assert!(text.starts_with("TITLE \"MoodTransfer Color Grade\"\nLUT_3D_SIZE 33\n\n"));
    let parsed = parse_cube(&text).unwrap();
    assert_eq!(parsed.lut.size(), lut.size());
    for (a, b) in parsed.lut.as_flat().iter().zip(lut.as_flat()) {
        assert!((a - b).abs() <= 1e-6, "{a} vs {b}");
    }
}

// --- Drivers ----------------------------------------------------------------

#[test]
fn test_parallel_build_matches_sequential() {
    let reference = PixelBuffer::filled(8, 8, [30, 160, 140, 255]);
    let target = create_test_gradient(48, 32);
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let sequential = builder.build(&reference, &target).unwrap();
    let parallel = builder.build_parallel(&reference, &target).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_cancelled_build_yields_no_lut() {
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();
    let outcome = builder
        .build_with_progress(
            &PixelBuffer::filled(8, 8, [30, 160, 140, 255]),
            &create_test_gradient(16, 16),
            |_| ControlFlow::Break(()),
        )
        .unwrap();
    assert_eq!(outcome, BuildOutcome::Cancelled);
    assert!(matches!(
        outcome.into_lut(),
        Err(TransferError::BuildCancelled)
    ));
}

#[tokio::test]
async fn test_async_build_reports_progress_and_matches_blocking() {
    let reference = PixelBuffer::filled(8, 8, [180, 60, 200, 255]);
    let target = create_test_gradient(32, 32);
    let builder = LutBuilder::new(TransferConfig::default()).unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let lut = builder.build_async(&reference, &target, Some(tx)).await.unwrap();

    let mut steps = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        steps.push(progress.percent);
    }
    assert_eq!(steps.last(), Some(&100));
    assert!(steps.windows(2).all(|w| w[1] >= w[0] + 5), "steps {steps:?}");

    assert_eq!(lut, builder.build(&reference, &target).unwrap());
}
