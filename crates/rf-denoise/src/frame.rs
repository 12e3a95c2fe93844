//! Frame segmentation
//!
//! Slices a signal into fixed-length overlapping analysis frames. Frames
//! are produced only while `offset + frame_size <= len`; a trailing partial
//! frame is dropped rather than zero-padded, so no spurious edge energy
//! enters the noise estimate.

use crate::error::{DenoiseError, DenoiseResult};

/// Borrowed view of one analysis frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Frame number (0-based, relative to the segmenter start)
    pub index: usize,
    /// Sample offset into the original signal
    pub offset: usize,
    /// Exactly `frame_size` samples
    pub samples: &'a [f64],
}

/// Restartable frame source over a borrowed signal
#[derive(Debug, Clone, Copy)]
pub struct FrameSegmenter<'a> {
    signal: &'a [f64],
    frame_size: usize,
    hop_size: usize,
    start: usize,
}

impl<'a> FrameSegmenter<'a> {
    /// Create segmenter starting at offset 0
    pub fn new(signal: &'a [f64], frame_size: usize, hop_size: usize) -> DenoiseResult<Self> {
        if frame_size == 0 || hop_size == 0 {
            return Err(DenoiseError::InvalidConfiguration(
                "frame_size and hop_size must be positive".into(),
            ));
        }
        Ok(Self {
            signal,
            frame_size,
            hop_size,
            start: 0,
        })
    }

    /// Start segmentation at `offset` (must be a multiple of the hop size)
    pub fn starting_at(mut self, offset: usize) -> DenoiseResult<Self> {
        if offset % self.hop_size != 0 {
            return Err(DenoiseError::InvalidConfiguration(format!(
                "start offset {} is not a multiple of hop_size {}",
                offset, self.hop_size
            )));
        }
        self.start = offset;
        Ok(self)
    }

    /// Frame size in samples
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Hop size in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of complete frames available
    pub fn frame_count(&self) -> usize {
        let available = self.signal.len().saturating_sub(self.start);
        if available < self.frame_size {
            0
        } else {
            (available - self.frame_size) / self.hop_size + 1
        }
    }

    /// Samples spanned by all frames, measured from the start offset
    pub fn covered_len(&self) -> usize {
        match self.frame_count() {
            0 => 0,
            n => (n - 1) * self.hop_size + self.frame_size,
        }
    }

    /// Offset of frame `index` in the original signal
    pub fn frame_offset(&self, index: usize) -> usize {
        self.start + index * self.hop_size
    }

    /// Lazy iterator over frames; each call restarts from the first frame
    pub fn frames(self) -> impl Iterator<Item = Frame<'a>> + 'a {
        let start = self.start;
        let hop = self.hop_size;
        let tail = self.signal.get(start..).unwrap_or(&[]);

        tail.windows(self.frame_size)
            .step_by(hop)
            .enumerate()
            .map(move |(index, samples)| Frame {
                index,
                offset: start + index * hop,
                samples,
            })
    }
}
