//! Error types for spectral denoising

use thiserror::Error;

/// Denoise error types
#[derive(Error, Debug)]
pub enum DenoiseError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Signal too short to produce the required frames
    #[error("Insufficient samples: need at least {needed}, got {got}")]
    InsufficientSamples {
        /// Samples or frames required
        needed: usize,
        /// Samples or frames available
        got: usize,
    },

    /// Spectral transform rejected its input
    #[error("Transform failure: {0}")]
    TransformFailure(String),

    /// Accumulator or spectrum allocation failed
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// Buffer size mismatch
    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
}

/// Result type for denoise operations
pub type DenoiseResult<T> = Result<T, DenoiseError>;

/// Allocate a zero-filled buffer, reporting failure instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize, what: &str) -> DenoiseResult<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| DenoiseError::AllocationFailure(format!("{what} ({len} elements): {e}")))?;
    buf.resize(len, T::default());
    Ok(buf)
}
