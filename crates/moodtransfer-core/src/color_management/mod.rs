//! Color management: transfer functions and RGB↔HSL / RGB↔L\*a\*b\* conversions.

pub mod color_space;
pub mod gamut;
pub mod hsl;
pub mod lab;
pub mod transfer;

pub use hsl::{hsl_to_rgb, rgb_to_hsl};
pub use lab::{LabInversion, lab_to_rgb, rgb_to_lab};
