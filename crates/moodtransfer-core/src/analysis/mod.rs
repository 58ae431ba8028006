//! Image analysis: histograms, per-channel statistics, and classifiers.

pub mod classify;
pub mod histogram;
pub mod stats;

pub use classify::{ColorTemperature, DominantColor, ImageProfile, TemperatureKind};
pub use histogram::{Cdf, Distribution};
pub use stats::{ChannelStats, HslStats, ImageStats, LabStats, RgbStats};
