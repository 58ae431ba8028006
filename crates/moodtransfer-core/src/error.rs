//! Error taxonomy for the color-transfer engine.

/// Everything the engine can report to a caller.
///
/// `ConversionFailure` is recovered per node inside the builder and never
/// escapes a build; it is public so the pure conversion can be tested on
/// its own.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Empty or degenerate pixel buffer, or an out-of-range parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A color-space inversion produced non-finite values.
    #[error("color conversion failed: {0}")]
    ConversionFailure(&'static str),
    /// A matcher was invoked without the distribution data it requires.
    #[error("contract violation: {0}")]
    ContractViolation(String),
    /// The caller stopped driving the build before it completed.
    #[error("LUT build cancelled")]
    BuildCancelled,
    /// Malformed `.cube` text.
    #[error("cube parse error on line {line}: {message}")]
    CubeParse { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TransferError>;
