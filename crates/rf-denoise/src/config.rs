//! Denoise configuration

use crate::error::{DenoiseError, DenoiseResult};
use serde::{Deserialize, Serialize};

/// Default analysis frame size (samples)
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Default hop between frame starts (samples, 50% overlap)
pub const DEFAULT_HOP_SIZE: usize = 512;

/// Spectral subtraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// FFT frame size (power of 2)
    pub frame_size: usize,

    /// Hop size between frames (divides frame_size, smaller than it)
    pub hop_size: usize,

    /// Minimum frames required to build a noise profile
    pub min_frames_for_profile: usize,

    /// Process frames on the rayon thread pool
    pub parallel: bool,

    /// Worker threads for parallel mode (0 = rayon default)
    pub max_threads: usize,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            min_frames_for_profile: 1,
            parallel: false,
            max_threads: 0,
        }
    }
}

impl DenoiseConfig {
    /// Number of complex frequency bins (frame_size / 2 + 1)
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Frames covering each interior output sample
    pub fn overlap_factor(&self) -> usize {
        self.frame_size / self.hop_size.max(1)
    }

    /// Check parameter consistency
    pub fn validate(&self) -> DenoiseResult<()> {
        if self.frame_size == 0 || self.hop_size == 0 {
            return Err(DenoiseError::InvalidConfiguration(format!(
                "frame_size ({}) and hop_size ({}) must be positive",
                self.frame_size, self.hop_size
            )));
        }
        if !self.frame_size.is_power_of_two() {
            return Err(DenoiseError::InvalidConfiguration(format!(
                "frame_size must be a power of two, got {}",
                self.frame_size
            )));
        }
        if self.hop_size >= self.frame_size {
            return Err(DenoiseError::InvalidConfiguration(format!(
                "hop_size ({}) must be smaller than frame_size ({})",
                self.hop_size, self.frame_size
            )));
        }
        if self.frame_size % self.hop_size != 0 {
            return Err(DenoiseError::InvalidConfiguration(format!(
                "hop_size ({}) must divide frame_size ({}) evenly",
                self.hop_size, self.frame_size
            )));
        }
        if self.min_frames_for_profile == 0 {
            return Err(DenoiseError::InvalidConfiguration(
                "min_frames_for_profile must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> DenoiseResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DenoiseError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> DenoiseResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DenoiseError::InvalidConfiguration(e.to_string()))
    }

    /// Builder pattern: set frame size, keeping 50% overlap
    pub fn with_frame_size(mut self, size: usize) -> Self {
        self.frame_size = size;
        self.hop_size = size / 2;
        self
    }

    /// Builder pattern: set hop size
    pub fn with_hop_size(mut self, hop: usize) -> Self {
        self.hop_size = hop;
        self
    }

    /// Builder pattern: set minimum profile frames
    pub fn with_min_frames(mut self, frames: usize) -> Self {
        self.min_frames_for_profile = frames;
        self
    }

    /// Builder pattern: enable parallel processing
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder pattern: limit worker threads
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }
}
