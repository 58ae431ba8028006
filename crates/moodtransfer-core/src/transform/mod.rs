//! LUT construction, application, and serialization.

pub mod builder;
pub mod cube;
pub mod evaluate;
pub mod lut;
pub mod noise;
pub mod params;
pub mod sampler;

pub use builder::{BuildDiagnostics, BuildOutcome, BuildProgress, LutBuild, LutBuilder};
pub use cube::{CubeFile, load_cube, parse_cube, save_cube, write_cube};
pub use lut::Lut3D;
pub use params::{GamutRepair, LUT_SIZE, StatsOptions, TransferConfig, TuningConstants};
pub use sampler::LutSampler;
