//! ReelForge Spectral Denoise
//!
//! Stationary noise removal by magnitude spectral subtraction:
//!
//! ## Analysis
//! - Fixed-size overlapping frames (default 1024 samples, 512 hop)
//! - Real-input FFT per frame
//!
//! ## Noise Profile
//! - Average magnitude per bin over the whole signal
//! - Serializable, so a profile learned once can be reapplied
//!
//! ## Subtraction
//! - Per-bin magnitude subtraction clamped at zero
//! - Original phase preserved
//!
//! ## Resynthesis
//! - Inverse FFT per frame
//! - Overlap-add normalized by per-sample frame coverage
//!
//! ## Example
//!
//! ```rust,ignore
//! use rf_denoise::{DenoiseConfig, SpectralSubtraction};
//!
//! let processor = SpectralSubtraction::new(DenoiseConfig::default())?;
//! let output = processor.process(&samples)?;
//! println!("removed {:.1} dB", output.report.reduction_db);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod fft;
pub mod frame;
pub mod overlap_add;
pub mod pipeline;
pub mod profile;
pub mod subtract;

mod error;

pub use config::DenoiseConfig;
pub use error::{DenoiseError, DenoiseResult};
pub use fft::SpectralTransform;
pub use frame::{Frame, FrameSegmenter};
pub use overlap_add::OverlapAdd;
pub use pipeline::{DenoiseOutput, DenoiseReport, SpectralSubtraction};
pub use profile::{NoiseEstimator, NoiseProfile, estimate_noise_profile};
pub use subtract::{subtract_bin, subtract_spectrum};

/// Denoise a mono signal in one call.
///
/// Returns the reconstructed signal, which spans every complete frame of
/// the input. For the profile and level report, use [`SpectralSubtraction`].
pub fn denoise(signal: &[f64], config: &DenoiseConfig) -> DenoiseResult<Vec<f64>> {
    SpectralSubtraction::new(config.clone())?
        .process(signal)
        .map(|output| output.samples)
}
