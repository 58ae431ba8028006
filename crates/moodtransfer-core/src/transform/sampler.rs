//! Applying a [`Lut3D`] to colors and images with tetrahedral interpolation.
//!
//! # Algorithm
//! The unit cell around a color is split into six tetrahedra along its
//! main diagonal. The fractional offsets `(r, g, b)` inside the cell select
//! one, and the color is the barycentric combination of its four corners:
//!
//! ```text
//! r ≥ g ≥ b:  (1−r)·c000 + (r−g)·c100 + (g−b)·c110 + b·c111
//! r ≥ b > g:  (1−r)·c000 + (r−b)·c100 + (b−g)·c101 + g·c111
//! b > r ≥ g:  (1−b)·c000 + (b−r)·c001 + (r−g)·c101 + g·c111
//! b ≥ g > r:  (1−b)·c000 + (b−g)·c001 + (g−r)·c011 + r·c111
//! g > b > r:  (1−g)·c000 + (g−b)·c010 + (b−r)·c011 + r·c111
//! g > r ≥ b:  (1−g)·c000 + (g−r)·c010 + (r−b)·c110 + b·c111
//! ```
//!
//! Adjacent cells share their faces, so the result is continuous across
//! cell boundaries. At a grid node every weight is 0 or 1, so the stored
//! value comes back unmodified.

use glam::Vec3;
use rayon::prelude::*;

use crate::error::Result;
use crate::image::PixelBuffer;
use crate::transform::lut::Lut3D;
use crate::transform::noise;

/// Peak-to-peak dither added before lookup when applying to an image.
pub const DITHER_STRENGTH: f32 = 0.0016;

/// Stateless LUT application.
#[derive(Debug, Clone, Copy, Default)]
pub struct LutSampler;

impl LutSampler {
    /// Tetrahedral lookup of a normalized color. No dither.
    pub fn sample(lut: &Lut3D, rgb: [f32; 3]) -> [f32; 3] {
        let n = lut.size();
        let max = (n - 1) as f32;

        let mut cell = [0usize; 3];
        let mut frac = [0.0_f32; 3];
        for c in 0..3 {
            let pos = rgb[c].clamp(0.0, 1.0) * max;
            let base = (pos.floor() as usize).min(n - 2);
            cell[c] = base;
            frac[c] = pos - base as f32;
        }

        let [r0, g0, b0] = cell;
        let corner = |dr: usize, dg: usize, db: usize| Vec3::from_array(lut.get(r0 + dr, g0 + dg, b0 + db));
        let [rd, gd, bd] = frac;

        let c000 = corner(0, 0, 0);
        let c111 = corner(1, 1, 1);

        let out = if rd >= gd {
            if gd >= bd {
                c000 * (1.0 - rd) + corner(1, 0, 0) * (rd - gd) + corner(1, 1, 0) * (gd - bd) + c111 * bd
            } else if rd >= bd {
                c000 * (1.0 - rd) + corner(1, 0, 0) * (rd - bd) + corner(1, 0, 1) * (bd - gd) + c111 * gd
            } else {
                c000 * (1.0 - bd) + corner(0, 0, 1) * (bd - rd) + corner(1, 0, 1) * (rd - gd) + c111 * gd
            }
        } else if bd >= gd {
            c000 * (1.0 - bd) + corner(0, 0, 1) * (bd - gd) + corner(0, 1, 1) * (gd - rd) + c111 * rd
        } else if bd >= rd {
            c000 * (1.0 - gd) + corner(0, 1, 0) * (gd - bd) + corner(0, 1, 1) * (bd - rd) + c111 * rd
        } else {
            c000 * (1.0 - gd) + corner(0, 1, 0) * (gd - rd) + corner(1, 1, 0) * (rd - bd) + c111 * bd
        };

        out.to_array()
    }

    /// Apply the LUT to every pixel. A deterministic per-pixel dither is
    /// added to all three channels before lookup; alpha is copied through.
    pub fn apply(lut: &Lut3D, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let channels = buffer.format().channels();
        let mut out = buffer.as_bytes().to_vec();
        for (index, (dst, src)) in out
            .chunks_exact_mut(channels)
            .zip(buffer.as_bytes().chunks_exact(channels))
            .enumerate()
        {
            map_pixel(lut, index, src, dst);
        }
        PixelBuffer::new(buffer.width(), buffer.height(), buffer.format(), out)
    }

    /// Same result as [`apply`](Self::apply), rows sharded across rayon.
    pub fn apply_parallel(lut: &Lut3D, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let channels = buffer.format().channels();
        let width = buffer.width() as usize;
        let row_len = (width * channels).max(1);
        let mut out = buffer.as_bytes().to_vec();

        out.par_chunks_mut(row_len)
            .zip(buffer.as_bytes().par_chunks(row_len))
            .enumerate()
            .for_each(|(y, (dst_row, src_row))| {
                for (x, (dst, src)) in dst_row
                    .chunks_exact_mut(channels)
                    .zip(src_row.chunks_exact(channels))
                    .enumerate()
                {
                    map_pixel(lut, y * width + x, src, dst);
                }
            });

        PixelBuffer::new(buffer.width(), buffer.height(), buffer.format(), out)
    }
}

fn map_pixel(lut: &Lut3D, index: usize, src: &[u8], dst: &mut [u8]) {
    let dither = noise::pixel_dither(index) * DITHER_STRENGTH * 0.5;
    let rgb = [
        (f32::from(src[0]) / 255.0 + dither).clamp(0.0, 1.0),
        (f32::from(src[1]) / 255.0 + dither).clamp(0.0, 1.0),
        (f32::from(src[2]) / 255.0 + dither).clamp(0.0, 1.0),
    ];
    let mapped = LutSampler::sample(lut, rgb);
    for c in 0..3 {
        dst[c] = (mapped[c] * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}
