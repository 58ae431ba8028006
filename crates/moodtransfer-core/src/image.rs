//! Pixel buffers handed to the engine by the decoding layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TransferError};

/// Sample layout of an 8-bit pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Interleaved 8-bit R, G, B.
    Rgb8,
    /// Interleaved 8-bit R, G, B, A.
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb8 => write!(f, "RGB8"),
            Self::Rgba8 => write!(f, "RGBA8"),
        }
    }
}

/// An immutable 8-bit RGB(A) image.
///
/// The sample storage is shared, so cloning a buffer is cheap and never
/// copies pixels. Buffers with zero pixels can be constructed (a decoder may
/// legitimately produce one) but are rejected by every analysis entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Arc<[u8]>,
}

impl PixelBuffer {
    /// Wrap interleaved samples. Fails if `data` does not hold exactly
    /// `width × height` pixels of `format`.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or_else(|| {
                TransferError::InvalidInput(format!("buffer dimensions {width}x{height} overflow"))
            })?;
        if data.len() != expected {
            return Err(TransferError::InvalidInput(format!(
                "{format} buffer of {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data: data.into(),
        })
    }

    /// Build an RGBA buffer filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let pixels = vec![rgba; count];
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data: bytemuck::cast_slice::<[u8; 4], u8>(&pixels).into(),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw interleaved samples.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// `true` when the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// RGB samples of the pixel at flat index `index` (row-major).
    ///
    /// # Panics
    /// Panics if `index >= pixel_count()`.
    pub fn rgb(&self, index: usize) -> [u8; 3] {
        let offset = index * self.format.channels();
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    /// Iterate RGB samples in row-major order, ignoring alpha.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data
            .chunks_exact(self.format.channels())
            .map(|px| [px[0], px[1], px[2]])
    }

    /// Iterate every `stride`-th pixel, starting at the first.
    pub fn strided_rgb(&self, stride: usize) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.rgb_pixels().step_by(stride.max(1))
    }

    /// Convert to an `image` crate RGBA image.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let data = match self.format {
            PixelFormat::Rgba8 => self.data.to_vec(),
            PixelFormat::Rgb8 => self
                .rgb_pixels()
                .flat_map(|[r, g, b]| [r, g, b, u8::MAX])
                .collect(),
        };
        // Length is validated at construction, so this cannot fail.
        image::RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

impl From<image::RgbaImage> for PixelBuffer {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data: img.into_raw().into(),
        }
    }
}

impl From<image::RgbImage> for PixelBuffer {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: img.into_raw().into(),
        }
    }
}
