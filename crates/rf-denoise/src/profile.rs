//! Noise profile estimation
//!
//! First pass of the denoiser: every frame's magnitude spectrum is summed
//! into a per-bin accumulator which is then divided by the frame count.
//! The whole signal is treated as representative of stationary noise;
//! there is no voice-activity detection, so loud program material raises
//! the estimate as well.

use crate::config::DenoiseConfig;
use crate::error::{DenoiseError, DenoiseResult, try_zeroed};
use crate::fft::magnitude;
use crate::pipeline::SpectralSubtraction;
use realfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Averaged noise magnitude per frequency bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseProfile {
    /// Average magnitude spectrum
    magnitude: Vec<f64>,
    /// Number of frames averaged
    frame_count: usize,
    /// FFT size used
    frame_size: usize,
}

impl NoiseProfile {
    /// Build a profile from known magnitudes (e.g. loaded from disk)
    pub fn from_magnitudes(
        frame_size: usize,
        magnitude: Vec<f64>,
        frame_count: usize,
    ) -> DenoiseResult<Self> {
        let profile = Self {
            magnitude,
            frame_count,
            frame_size,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// All-zero profile (subtraction becomes a pass-through)
    pub fn silent(frame_size: usize) -> DenoiseResult<Self> {
        Ok(Self {
            magnitude: try_zeroed(frame_size / 2 + 1, "noise profile")?,
            frame_count: 0,
            frame_size,
        })
    }

    /// Check shape and values
    pub fn validate(&self) -> DenoiseResult<()> {
        let bins = self.frame_size / 2 + 1;
        if self.magnitude.len() != bins {
            return Err(DenoiseError::BufferMismatch {
                expected: bins,
                got: self.magnitude.len(),
            });
        }
        if self.magnitude.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(DenoiseError::InvalidConfiguration(
                "noise profile magnitudes must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Per-bin magnitudes
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitude
    }

    /// Number of bins
    pub fn num_bins(&self) -> usize {
        self.magnitude.len()
    }

    /// Frames averaged into this profile
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Frame size the profile was measured with
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Bin with the largest noise magnitude
    pub fn peak_bin(&self) -> usize {
        self.magnitude
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &m)| if m > best.1 { (i, m) } else { best })
            .0
    }

    /// Mean magnitude across bins
    pub fn mean_magnitude(&self) -> f64 {
        if self.magnitude.is_empty() {
            return 0.0;
        }
        self.magnitude.iter().sum::<f64>() / self.magnitude.len() as f64
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> DenoiseResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DenoiseError::InvalidConfiguration(e.to_string()))
    }

    /// Parse and validate a profile from JSON
    pub fn from_json_str(json: &str) -> DenoiseResult<Self> {
        let profile: Self = serde_json::from_str(json)
            .map_err(|e| DenoiseError::InvalidConfiguration(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }
}

/// Magnitude accumulator for the estimation pass
#[derive(Debug, Clone)]
pub struct NoiseEstimator {
    /// Summed magnitudes per bin
    accumulator: Vec<f64>,
    /// Frames accumulated
    frame_count: usize,
    /// FFT size
    frame_size: usize,
}

impl NoiseEstimator {
    /// Create zeroed accumulator
    pub fn new(frame_size: usize) -> DenoiseResult<Self> {
        Ok(Self {
            accumulator: try_zeroed(frame_size / 2 + 1, "noise accumulator")?,
            frame_count: 0,
            frame_size,
        })
    }

    /// Add one frame's magnitude spectrum
    pub fn accumulate(&mut self, spectrum: &[Complex<f64>]) -> DenoiseResult<()> {
        if spectrum.len() != self.accumulator.len() {
            return Err(DenoiseError::BufferMismatch {
                expected: self.accumulator.len(),
                got: spectrum.len(),
            });
        }

        for (acc, &bin) in self.accumulator.iter_mut().zip(spectrum) {
            *acc += magnitude(bin);
        }
        self.frame_count += 1;
        Ok(())
    }

    /// Merge partial sums from another estimator
    pub fn merge(&mut self, other: &NoiseEstimator) -> DenoiseResult<()> {
        if other.accumulator.len() != self.accumulator.len() {
            return Err(DenoiseError::BufferMismatch {
                expected: self.accumulator.len(),
                got: other.accumulator.len(),
            });
        }

        for (acc, &partial) in self.accumulator.iter_mut().zip(&other.accumulator) {
            *acc += partial;
        }
        self.frame_count += other.frame_count;
        Ok(())
    }

    /// Frames accumulated so far
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Average the accumulator into an immutable profile
    pub fn finish(self, min_frames: usize) -> DenoiseResult<NoiseProfile> {
        let needed = min_frames.max(1);
        if self.frame_count < needed {
            return Err(DenoiseError::InsufficientSamples {
                needed,
                got: self.frame_count,
            });
        }

        let n = self.frame_count as f64;
        let magnitude = self.accumulator.into_iter().map(|sum| sum / n).collect();

        Ok(NoiseProfile {
            magnitude,
            frame_count: self.frame_count,
            frame_size: self.frame_size,
        })
    }
}

/// Estimate the noise profile of a whole signal
///
/// Honors `config.parallel`; see [`SpectralSubtraction::estimate_profile`].
pub fn estimate_noise_profile(
    signal: &[f64],
    config: &DenoiseConfig,
) -> DenoiseResult<NoiseProfile> {
    SpectralSubtraction::new(config.clone())?.estimate_profile(signal)
}
