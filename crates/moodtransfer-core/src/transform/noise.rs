//! Deterministic coordinate-keyed noise.
//!
//! Anti-banding perturbations must be a pure function of grid or pixel
//! coordinates: a global random stream would make builds irreproducible and
//! parallel shards disagree with the sequential result.
//!
//! ```text
//! hash(x, y, z)      integer avalanche hash → u32
//! gradient_noise(p)  Perlin gradient noise over hashed lattice gradients, in [−1, 1]
//! node_noise(i,j,k)  gradient_noise(ijk × NODE_FREQUENCY + NODE_OFFSET)
//! pixel_dither(n)    hash(n) mapped to [−1, 1]
//! ```

use glam::Vec3;

/// Lattice frequency of the per-node intensity noise.
pub const NODE_FREQUENCY: f32 = 0.25;
/// Sub-lattice offset; gradient noise is zero at integer points.
pub const NODE_OFFSET: Vec3 = Vec3::new(0.31, 0.47, 0.73);

const SEED: u32 = 12_345;

/// The 12 cube-edge gradients of improved Perlin noise.
const GRADIENTS: [Vec3; 12] = [
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(-1.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, -1.0),
    Vec3::new(-1.0, 0.0, -1.0),
    Vec3::new(0.0, 1.0, 1.0),
    Vec3::new(0.0, -1.0, 1.0),
    Vec3::new(0.0, 1.0, -1.0),
    Vec3::new(0.0, -1.0, -1.0),
];

/// Integer hash of a lattice point.
pub fn hash(x: i32, y: i32, z: i32) -> u32 {
    let mut n = (x as u32)
        .wrapping_mul(73_856_093)
        .wrapping_add((y as u32).wrapping_mul(19_349_663))
        .wrapping_add((z as u32).wrapping_mul(83_492_791))
        .wrapping_add(SEED);
    n ^= n << 13;
    n ^= n >> 17;
    n = n.wrapping_mul(n.wrapping_mul(n).wrapping_mul(15_731).wrapping_add(789_221));
    n = n.wrapping_add(1_376_312_589);
    n ^= n >> 16;
    n
}

/// Map a hash to [−1, 1].
fn unit_signed(h: u32) -> f32 {
    (h & 0x00ff_ffff) as f32 / 0x00ff_ffff as f32 * 2.0 - 1.0
}

/// Quintic fade `6t⁵ − 15t⁴ + 10t³`.
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn corner(cell: [i32; 3], offset: [i32; 3], frac: Vec3) -> f32 {
    let h = hash(cell[0] + offset[0], cell[1] + offset[1], cell[2] + offset[2]);
    let gradient = GRADIENTS[(h % GRADIENTS.len() as u32) as usize];
    let delta = frac - Vec3::new(offset[0] as f32, offset[1] as f32, offset[2] as f32);
    gradient.dot(delta)
}

/// 3D gradient noise, continuous in `p`, clamped to [−1, 1].
pub fn gradient_noise(p: Vec3) -> f32 {
    let base = p.floor();
    let cell = [base.x as i32, base.y as i32, base.z as i32];
    let frac = p - base;
    let u = Vec3::new(fade(frac.x), fade(frac.y), fade(frac.z));

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

    let x00 = lerp(corner(cell, [0, 0, 0], frac), corner(cell, [1, 0, 0], frac), u.x);
    let x10 = lerp(corner(cell, [0, 1, 0], frac), corner(cell, [1, 1, 0], frac), u.x);
    let x01 = lerp(corner(cell, [0, 0, 1], frac), corner(cell, [1, 0, 1], frac), u.x);
    let x11 = lerp(corner(cell, [0, 1, 1], frac), corner(cell, [1, 1, 1], frac), u.x);

    let y0 = lerp(x00, x10, u.y);
    let y1 = lerp(x01, x11, u.y);
    lerp(y0, y1, u.z).clamp(-1.0, 1.0)
}

/// Noise value for grid node `(r, g, b)`.
pub fn node_noise(r: usize, g: usize, b: usize) -> f32 {
    let p = Vec3::new(r as f32, g as f32, b as f32) * NODE_FREQUENCY + NODE_OFFSET;
    gradient_noise(p)
}

/// Dither value in [−1, 1] for the pixel at flat index `index`.
pub fn pixel_dither(index: usize) -> f32 {
    let lo = index as u32 as i32;
    let hi = (index as u64 >> 32) as u32 as i32;
    unit_signed(hash(lo, hi, 0x5eed))
}
