//! Overlap-add reconstruction
//!
//! Processed frames are summed back at their original offsets. Each output
//! sample is then divided by the number of frames that covered it, so the
//! head and tail (covered by fewer frames than the interior) come out at
//! full amplitude instead of attenuated.

use crate::error::{DenoiseError, DenoiseResult, try_zeroed};

/// Output accumulator with per-sample coverage
#[derive(Debug, Clone)]
pub struct OverlapAdd {
    /// Summed frame contributions
    accumulator: Vec<f64>,
    /// Frames covering each sample
    coverage: Vec<u32>,
    /// Frame size
    frame_size: usize,
}

impl OverlapAdd {
    /// Create zeroed accumulator of `len` samples
    pub fn new(len: usize, frame_size: usize) -> DenoiseResult<Self> {
        Ok(Self {
            accumulator: try_zeroed(len, "overlap-add accumulator")?,
            coverage: try_zeroed(len, "overlap-add coverage")?,
            frame_size,
        })
    }

    /// Accumulator length
    pub fn len(&self) -> usize {
        self.accumulator.len()
    }

    /// True when the accumulator holds no samples
    pub fn is_empty(&self) -> bool {
        self.accumulator.is_empty()
    }

    /// Add one frame at `offset`
    pub fn add_frame(&mut self, offset: usize, frame: &[f64]) -> DenoiseResult<()> {
        if frame.len() != self.frame_size {
            return Err(DenoiseError::BufferMismatch {
                expected: self.frame_size,
                got: frame.len(),
            });
        }
        let end = self.span_end(offset, frame.len())?;

        for (out, &sample) in self.accumulator[offset..end].iter_mut().zip(frame) {
            *out += sample;
        }
        for count in &mut self.coverage[offset..end] {
            *count += 1;
        }
        Ok(())
    }

    /// Merge a partial reconstruction that starts at `offset`
    pub fn absorb(&mut self, offset: usize, other: &OverlapAdd) -> DenoiseResult<()> {
        let end = self.span_end(offset, other.len())?;

        for (out, &sample) in self.accumulator[offset..end].iter_mut().zip(&other.accumulator) {
            *out += sample;
        }
        for (count, &c) in self.coverage[offset..end].iter_mut().zip(&other.coverage) {
            *count += c;
        }
        Ok(())
    }

    /// End of `[offset, offset + len)` if it fits in the accumulator
    fn span_end(&self, offset: usize, len: usize) -> DenoiseResult<usize> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.accumulator.len())
            .ok_or(DenoiseError::BufferMismatch {
                expected: self.accumulator.len(),
                got: offset.saturating_add(len),
            })
    }

    /// Frames covering sample `index`
    pub fn coverage_at(&self, index: usize) -> u32 {
        self.coverage.get(index).copied().unwrap_or(0)
    }

    /// Normalize by coverage and return the output signal
    pub fn finish(self) -> Vec<f64> {
        let mut output = self.accumulator;
        for (sample, &count) in output.iter_mut().zip(&self.coverage) {
            if count > 0 {
                *sample /= count as f64;
            }
        }
        output
    }
}
