//! Grading building blocks: zones, distribution matching, tone curves, and
//! look adjustments.

pub mod adjust;
pub mod curves;
pub mod matcher;
pub mod zones;

pub use curves::ToneCurves;
pub use matcher::{CdfPair, DistributionMatcher};
pub use zones::{Zone, ZoneWeights, luminance};
