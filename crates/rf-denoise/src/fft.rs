//! Real-input spectral transform
//!
//! Forward maps `frame_size` samples to `frame_size / 2 + 1` complex bins.
//! Inverse maps them back and divides by `frame_size`, so a forward/inverse
//! round trip returns the original samples.

use crate::error::{DenoiseError, DenoiseResult, try_zeroed};
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Forward/inverse transform pair for a fixed frame size
#[derive(Clone)]
pub struct SpectralTransform {
    /// Frame size
    frame_size: usize,
    /// Forward FFT
    forward: Arc<dyn RealToComplex<f64>>,
    /// Inverse FFT
    inverse: Arc<dyn ComplexToReal<f64>>,
    /// Time-domain input scratch (realfft consumes its input)
    time_in: Vec<f64>,
    /// Forward output
    spectrum: Vec<Complex<f64>>,
    /// Inverse input scratch
    spectrum_in: Vec<Complex<f64>>,
    /// Inverse output
    time_out: Vec<f64>,
    /// FFT scratch
    scratch_fwd: Vec<Complex<f64>>,
    /// IFFT scratch
    scratch_inv: Vec<Complex<f64>>,
}

impl SpectralTransform {
    /// Plan transforms and allocate scratch buffers
    pub fn new(frame_size: usize) -> DenoiseResult<Self> {
        if frame_size == 0 || frame_size % 2 != 0 {
            return Err(DenoiseError::TransformFailure(format!(
                "frame size must be even and positive, got {}",
                frame_size
            )));
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(frame_size);
        let inverse = planner.plan_fft_inverse(frame_size);
        let bins = frame_size / 2 + 1;

        Ok(Self {
            frame_size,
            time_in: try_zeroed(frame_size, "transform input")?,
            spectrum: try_zeroed(bins, "spectrum")?,
            spectrum_in: try_zeroed(bins, "inverse spectrum")?,
            time_out: try_zeroed(frame_size, "transform output")?,
            scratch_fwd: try_zeroed(forward.get_scratch_len(), "forward scratch")?,
            scratch_inv: try_zeroed(inverse.get_scratch_len(), "inverse scratch")?,
            forward,
            inverse,
        })
    }

    /// Frame size this transform was planned for
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of complex bins (frame_size / 2 + 1)
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Forward transform of one frame
    pub fn forward(&mut self, frame: &[f64]) -> DenoiseResult<&[Complex<f64>]> {
        if frame.len() != self.frame_size {
            return Err(DenoiseError::TransformFailure(format!(
                "expected {} samples, got {}",
                self.frame_size,
                frame.len()
            )));
        }

        self.time_in.copy_from_slice(frame);
        self.forward
            .process_with_scratch(&mut self.time_in, &mut self.spectrum, &mut self.scratch_fwd)
            .map_err(|e| DenoiseError::TransformFailure(e.to_string()))?;

        Ok(&self.spectrum)
    }

    /// Inverse transform, normalized by frame size
    pub fn inverse(&mut self, spectrum: &[Complex<f64>]) -> DenoiseResult<&[f64]> {
        let bins = self.num_bins();
        if spectrum.len() != bins {
            return Err(DenoiseError::TransformFailure(format!(
                "expected {} bins, got {}",
                bins,
                spectrum.len()
            )));
        }

        self.spectrum_in.copy_from_slice(spectrum);
        // DC and Nyquist are real for a real signal
        self.spectrum_in[0].im = 0.0;
        self.spectrum_in[bins - 1].im = 0.0;

        self.inverse
            .process_with_scratch(&mut self.spectrum_in, &mut self.time_out, &mut self.scratch_inv)
            .map_err(|e| DenoiseError::TransformFailure(e.to_string()))?;

        let norm = 1.0 / self.frame_size as f64;
        for sample in &mut self.time_out {
            *sample *= norm;
        }

        Ok(&self.time_out)
    }
}

/// Complex magnitude `sqrt(re² + im²)`
#[inline]
pub fn magnitude(bin: Complex<f64>) -> f64 {
    (bin.re * bin.re + bin.im * bin.im).sqrt()
}
