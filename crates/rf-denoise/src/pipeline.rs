//! Two-pass spectral subtraction pipeline
//!
//! Pass 1 estimates the noise profile over every frame; pass 2 subtracts it
//! from each frame and overlap-adds the result. Pass 2 cannot start before
//! pass 1 has finished, since every frame reads the global profile.
//!
//! In parallel mode both passes split the frame list into contiguous
//! batches. Each batch owns its transform, estimator and a frame-aligned
//! output segment; partial results are merged in batch order after the
//! parallel section, so no shared state is written concurrently.

use crate::config::DenoiseConfig;
use crate::error::{DenoiseError, DenoiseResult, try_zeroed};
use crate::fft::SpectralTransform;
use crate::frame::{Frame, FrameSegmenter};
use crate::overlap_add::OverlapAdd;
use crate::profile::{NoiseEstimator, NoiseProfile};
use crate::subtract::subtract_spectrum;
use rayon::prelude::*;
use realfft::num_complex::Complex;

/// Frames processed per rayon task
const BATCH_FRAMES: usize = 32;

/// Levels below this are treated as silence in reports
const SILENCE_RMS: f64 = 1e-12;

/// Summary of one denoise run
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseReport {
    /// Frames processed per pass
    pub frames: usize,
    /// Output length (samples spanned by complete frames)
    pub covered_len: usize,
    /// RMS of the input over the covered span
    pub input_rms: f64,
    /// RMS of the output
    pub output_rms: f64,
    /// Energy removed (dB, positive = quieter)
    pub reduction_db: f64,
}

impl DenoiseReport {
    /// Compare input and output levels
    pub fn measure(input: &[f64], output: &[f64], frames: usize) -> Self {
        let covered = &input[..output.len().min(input.len())];
        let input_rms = rms(covered);
        let output_rms = rms(output);

        let reduction_db = if input_rms < SILENCE_RMS {
            0.0
        } else if output_rms < SILENCE_RMS {
            f64::INFINITY
        } else {
            20.0 * (input_rms / output_rms).log10()
        };

        Self {
            frames,
            covered_len: output.len(),
            input_rms,
            output_rms,
            reduction_db,
        }
    }
}

/// Denoised signal plus the profile that produced it
#[derive(Debug, Clone)]
pub struct DenoiseOutput {
    /// Reconstructed signal
    pub samples: Vec<f64>,
    /// Noise profile subtracted from every frame
    pub profile: NoiseProfile,
    /// Run summary
    pub report: DenoiseReport,
}

/// Spectral subtraction processor
pub struct SpectralSubtraction {
    /// Configuration
    config: DenoiseConfig,
    /// Dedicated worker pool when a thread limit is set
    pool: Option<rayon::ThreadPool>,
}

impl SpectralSubtraction {
    /// Create processor, validating the configuration
    pub fn new(config: DenoiseConfig) -> DenoiseResult<Self> {
        config.validate()?;

        let pool = if config.parallel && config.max_threads > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_threads)
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!(
                        "Failed to build {}-thread pool, using global pool: {}",
                        config.max_threads,
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    /// Active configuration
    pub fn config(&self) -> &DenoiseConfig {
        &self.config
    }

    /// Estimate the profile, subtract it and reconstruct
    pub fn process(&self, signal: &[f64]) -> DenoiseResult<DenoiseOutput> {
        let profile = self.estimate_profile(signal)?;
        self.finish_with(signal, profile)
    }

    /// Skip estimation and subtract a previously learned profile
    pub fn process_with_profile(
        &self,
        signal: &[f64],
        profile: &NoiseProfile,
    ) -> DenoiseResult<DenoiseOutput> {
        self.finish_with(signal, profile.clone())
    }

    /// Pass 1: average magnitude spectrum over all frames
    pub fn estimate_profile(&self, signal: &[f64]) -> DenoiseResult<NoiseProfile> {
        let segmenter = self.segmenter(signal)?;

        let estimator = if self.config.parallel {
            let frames: Vec<Frame<'_>> = segmenter.frames().collect();
            self.install(|| self.estimate_batches(&frames))?
        } else {
            let mut transform = SpectralTransform::new(self.config.frame_size)?;
            let mut estimator = NoiseEstimator::new(self.config.frame_size)?;
            for frame in segmenter.frames() {
                estimator.accumulate(transform.forward(frame.samples)?)?;
            }
            estimator
        };

        log::debug!(
            "Noise estimation: {} frames, {} bins, parallel={}",
            estimator.frame_count(),
            self.config.num_bins(),
            self.config.parallel
        );

        estimator.finish(self.config.min_frames_for_profile)
    }

    /// Pass 2: subtract the profile from every frame and overlap-add
    pub fn apply_profile(&self, signal: &[f64], profile: &NoiseProfile) -> DenoiseResult<Vec<f64>> {
        if profile.frame_size() != self.config.frame_size {
            return Err(DenoiseError::InvalidConfiguration(format!(
                "noise profile measured with frame_size {}, processor uses {}",
                profile.frame_size(),
                self.config.frame_size
            )));
        }
        profile.validate()?;

        let segmenter = self.segmenter(signal)?;
        let mut output = OverlapAdd::new(segmenter.covered_len(), self.config.frame_size)?;

        if self.config.parallel {
            let frames: Vec<Frame<'_>> = segmenter.frames().collect();
            let segments = self.install(|| self.subtract_batches(&frames, profile))?;
            for (offset, segment) in &segments {
                output.absorb(*offset, segment)?;
            }
        } else {
            let mut transform = SpectralTransform::new(self.config.frame_size)?;
            let mut spectrum = try_zeroed(self.config.num_bins(), "spectrum")?;
            for frame in segmenter.frames() {
                subtract_frame(&mut transform, &mut spectrum, frame, profile, &mut output, 0)?;
            }
        }

        Ok(output.finish())
    }

    fn finish_with(&self, signal: &[f64], profile: NoiseProfile) -> DenoiseResult<DenoiseOutput> {
        let samples = self.apply_profile(signal, &profile)?;
        let frames = self.segmenter(signal)?.frame_count();
        let report = DenoiseReport::measure(signal, &samples, frames);

        log::info!(
            "Denoised {} frames ({} samples): RMS {:.6} -> {:.6} ({:.2} dB), noise peak at bin {}",
            report.frames,
            report.covered_len,
            report.input_rms,
            report.output_rms,
            report.reduction_db,
            profile.peak_bin()
        );

        Ok(DenoiseOutput {
            samples,
            profile,
            report,
        })
    }

    fn segmenter<'a>(&self, signal: &'a [f64]) -> DenoiseResult<FrameSegmenter<'a>> {
        let segmenter = FrameSegmenter::new(signal, self.config.frame_size, self.config.hop_size)?;
        if segmenter.frame_count() == 0 {
            return Err(DenoiseError::InsufficientSamples {
                needed: self.config.frame_size,
                got: signal.len(),
            });
        }
        Ok(segmenter)
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn estimate_batches(&self, frames: &[Frame<'_>]) -> DenoiseResult<NoiseEstimator> {
        let frame_size = self.config.frame_size;

        let partials = frames
            .par_chunks(BATCH_FRAMES)
            .map(|batch| -> DenoiseResult<NoiseEstimator> {
                let mut transform = SpectralTransform::new(frame_size)?;
                let mut estimator = NoiseEstimator::new(frame_size)?;
                for frame in batch {
                    estimator.accumulate(transform.forward(frame.samples)?)?;
                }
                Ok(estimator)
            })
            .collect::<DenoiseResult<Vec<_>>>()?;

        let mut total = NoiseEstimator::new(frame_size)?;
        for partial in &partials {
            total.merge(partial)?;
        }
        Ok(total)
    }

    fn subtract_batches(
        &self,
        frames: &[Frame<'_>],
        profile: &NoiseProfile,
    ) -> DenoiseResult<Vec<(usize, OverlapAdd)>> {
        let frame_size = self.config.frame_size;
        let bins = self.config.num_bins();

        frames
            .par_chunks(BATCH_FRAMES)
            .map(|batch| -> DenoiseResult<(usize, OverlapAdd)> {
                let start = batch.first().map_or(0, |f| f.offset);
                let end = batch.last().map_or(start, |f| f.offset + frame_size);

                let mut transform = SpectralTransform::new(frame_size)?;
                let mut spectrum = try_zeroed(bins, "spectrum")?;
                let mut segment = OverlapAdd::new(end - start, frame_size)?;
                for frame in batch {
                    subtract_frame(
                        &mut transform,
                        &mut spectrum,
                        *frame,
                        profile,
                        &mut segment,
                        start,
                    )?;
                }
                Ok((start, segment))
            })
            .collect()
    }
}

/// Forward, subtract, inverse and accumulate one frame
fn subtract_frame(
    transform: &mut SpectralTransform,
    spectrum: &mut [Complex<f64>],
    frame: Frame<'_>,
    profile: &NoiseProfile,
    output: &mut OverlapAdd,
    base_offset: usize,
) -> DenoiseResult<()> {
    spectrum.copy_from_slice(transform.forward(frame.samples)?);
    subtract_spectrum(spectrum, profile)?;
    let cleaned = transform.inverse(spectrum)?;
    output.add_frame(frame.offset - base_offset, cleaned)
}

fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|s| s * s).sum::<f64>() / signal.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine(freq_bin: f64, len: usize, amp: f64) -> Vec<f64> {
        (0..len)
            .map(|i| amp * (2.0 * std::f64::consts::PI * freq_bin * i as f64 / 1024.0).sin())
            .collect()
    }

    #[test]
    fn test_processor_rejects_bad_config() {
        let config = DenoiseConfig::default().with_hop_size(1024);
        assert!(matches!(
            SpectralSubtraction::new(config),
            Err(DenoiseError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_short_signal_rejected() {
        let processor = SpectralSubtraction::new(DenoiseConfig::default()).unwrap();
        assert!(matches!(
            processor.process(&[0.1; 1000]),
            Err(DenoiseError::InsufficientSamples { needed: 1024, got: 1000 })
        ));
    }

    #[test]
    fn test_silent_profile_reconstructs_input() {
        let processor = SpectralSubtraction::new(DenoiseConfig::default()).unwrap();
        let signal = sine(7.0, 4096, 0.5);
        let profile = NoiseProfile::silent(1024).unwrap();

        let output = processor.apply_profile(&signal, &profile).unwrap();
        assert_eq!(output.len(), 4096);
        for (a, b) in signal.iter().zip(&output) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_profile_frame_size_mismatch() {
        let processor = SpectralSubtraction::new(DenoiseConfig::default()).unwrap();
        let profile = NoiseProfile::silent(2048).unwrap();
        assert!(matches!(
            processor.apply_profile(&vec![0.0; 4096], &profile),
            Err(DenoiseError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let signal: Vec<f64> = sine(5.0, 48_000, 0.3)
            .iter()
            .zip(sine(91.0, 48_000, 0.05))
            .map(|(a, b)| a + b)
            .collect();

        let seq = SpectralSubtraction::new(DenoiseConfig::default()).unwrap();
        let par = SpectralSubtraction::new(
            DenoiseConfig::default().with_parallel(true).with_max_threads(3),
        )
        .unwrap();

        let a = seq.process(&signal).unwrap();
        let b = par.process(&signal).unwrap();

        assert_eq!(a.samples.len(), b.samples.len());
        assert_eq!(a.report.frames, b.report.frames);
        for (x, y) in a.profile.magnitudes().iter().zip(b.profile.magnitudes()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
        for (x, y) in a.samples.iter().zip(&b.samples) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_report_levels() {
        let report =
            DenoiseReport::measure(&[0.5, -0.5, 0.5, -0.5], &[0.05, -0.05, 0.05, -0.05], 1);
        assert_abs_diff_eq!(report.input_rms, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(report.output_rms, 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(report.reduction_db, 20.0, epsilon = 1e-9);

        let silent = DenoiseReport::measure(&[0.0; 4], &[0.0; 4], 1);
        assert_eq!(silent.reduction_db, 0.0);

        let removed = DenoiseReport::measure(&[0.1; 4], &[0.0; 4], 1);
        assert!(removed.reduction_db.is_infinite());
    }

    #[test]
    fn test_process_with_saved_profile() {
        let processor = SpectralSubtraction::new(DenoiseConfig::default()).unwrap();
        let noise = vec![0.01; 4096];
        let profile = processor.estimate_profile(&noise).unwrap();

        let output = processor.process_with_profile(&noise, &profile).unwrap();
        assert_eq!(output.profile, profile);
        assert!(output.samples.iter().all(|s| s.abs() < 1e-9));
    }
}
