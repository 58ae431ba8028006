//! The 3D lookup table produced by the builder.

use crate::error::{Result, TransferError};

/// An immutable 3D lookup table of RGB triples.
///
/// # Layout
/// Nodes are stored r-outermost, b-innermost:
/// ```text
/// index(r, g, b) = r × N² + g × N + b
/// flat float offset = index × 3
/// ```
/// This differs from the `.cube` line order (b outermost, r fastest); the
/// codec in [`cube`](super::cube) translates between the two.
///
/// A `Lut3D` has no mutating methods. A different configuration means a
/// fresh build.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    size: usize,
    data: Vec<[f32; 3]>,
}

impl Lut3D {
    /// Smallest usable grid.
    pub const MIN_SIZE: usize = 2;
    /// Largest grid the codec accepts.
    pub const MAX_SIZE: usize = 256;

    /// The identity LUT of the given size.
    pub fn identity(size: usize) -> Result<Self> {
        check_size(size)?;
        let scale = 1.0 / (size - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for r in 0..size {
            for g in 0..size {
                for b in 0..size {
                    data.push([r as f32 * scale, g as f32 * scale, b as f32 * scale]);
                }
            }
        }
        Ok(Self { size, data })
    }

    /// Wrap node values already in r-outer order.
    pub fn from_data(size: usize, data: Vec<[f32; 3]>) -> Result<Self> {
        check_size(size)?;
        if data.len() != size * size * size {
            return Err(TransferError::InvalidInput(format!(
                "LUT of size {size} needs {} nodes, got {}",
                size * size * size,
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    /// Caller guarantees `data.len() == size³` and a valid size.
    pub(crate) fn from_parts(size: usize, data: Vec<[f32; 3]>) -> Self {
        debug_assert_eq!(data.len(), size * size * size);
        Self { size, data }
    }

    /// Grid size per axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Flat node index of grid coordinate `(r, g, b)`.
    pub fn index(&self, r: usize, g: usize, b: usize) -> usize {
        (r * self.size + g) * self.size + b
    }

    /// Node value at grid coordinate `(r, g, b)`.
    ///
    /// # Panics
    /// Panics if any coordinate is `>= size()`.
    pub fn get(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[self.index(r, g, b)]
    }

    /// Normalized input color of grid coordinate `(r, g, b)`.
    pub fn node_color(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        let scale = 1.0 / (self.size - 1) as f32;
        [r as f32 * scale, g as f32 * scale, b as f32 * scale]
    }

    /// All nodes in r-outer order.
    pub fn nodes(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Node values as a flat `[r, g, b, r, g, b, ...]` slice.
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data)
    }

    /// Largest per-channel distance of any node from the identity color.
    pub fn max_identity_deviation(&self) -> f32 {
        let mut max = 0.0_f32;
        for r in 0..self.size {
            for g in 0..self.size {
                for b in 0..self.size {
                    let node = self.get(r, g, b);
                    let id = self.node_color(r, g, b);
                    for c in 0..3 {
                        max = max.max((node[c] - id[c]).abs());
                    }
                }
            }
        }
        max
    }
}

fn check_size(size: usize) -> Result<()> {
    if (Lut3D::MIN_SIZE..=Lut3D::MAX_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(TransferError::InvalidInput(format!(
            "LUT size {size} outside {}..={}",
            Lut3D::MIN_SIZE,
            Lut3D::MAX_SIZE
        )))
    }
}
