//! MoodTransfer Core: reference-driven color transfer baked into 3D LUTs.
//!
//! The engine learns a color transformation from a reference image and
//! bakes it into a 33³ lookup table that can be applied to any image and
//! exported as `.cube` text.
//!
//! ```text
//! reference ─┐                               ┌─→ LutSampler ─→ graded buffer
//!            ├─→ ImageProfile ×2 ─→ LutBuilder ─→ Lut3D
//! target ────┘                               └─→ cube codec ─→ .cube text
//! ```
//!
//! Decoding, preview, and UI are left to the caller; this crate only sees
//! 8-bit [`PixelBuffer`]s.

pub mod analysis;
pub mod color_management;
pub mod error;
pub mod grading;
pub mod image;
pub mod transform;

// Re-exports for convenience.
pub use analysis::ImageProfile;
pub use error::{Result, TransferError};
pub use crate::image::{PixelBuffer, PixelFormat};
pub use transform::builder::{BuildOutcome, BuildProgress, LutBuild, LutBuilder};
pub use transform::lut::Lut3D;
pub use transform::params::{StatsOptions, TransferConfig};
pub use transform::sampler::LutSampler;
