//! WAV loading and output sinks

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::io::Write;
use std::path::Path;

/// Decoded mono signal
#[derive(Debug, Clone)]
pub struct LoadedSignal {
    /// Samples normalized to [-1.0, 1.0]
    pub samples: Vec<f64>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source file
    pub source_channels: u16,
}

/// Output sample format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BitDepth {
    /// 32-bit IEEE float
    #[default]
    Float32,
    /// 16-bit signed PCM
    Int16,
}

/// Load a WAV file as mono; multi-channel input is averaged down
pub fn load_wav(path: &Path) -> Result<LoadedSignal> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        bail!("{}: no channels", path.display());
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to decode {}", path.display()))?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?
        }
    };

    let samples = if num_channels == 1 {
        interleaved
    } else {
        log::warn!(
            "{}: {} channels, downmixing to mono",
            path.display(),
            num_channels
        );
        let scale = 1.0 / num_channels as f64;
        interleaved
            .chunks_exact(num_channels)
            .map(|frame| frame.iter().sum::<f64>() * scale)
            .collect()
    };

    log::debug!(
        "Loaded {}: {} samples @ {} Hz ({} bit {:?})",
        path.display(),
        samples.len(),
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    Ok(LoadedSignal {
        samples,
        sample_rate: spec.sample_rate,
        source_channels: spec.channels,
    })
}

/// Write a mono WAV file
pub fn write_wav(
    path: &Path,
    samples: &[f64],
    sample_rate: u32,
    bit_depth: BitDepth,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: match bit_depth {
            BitDepth::Float32 => 32,
            BitDepth::Int16 => 16,
        },
        sample_format: match bit_depth {
            BitDepth::Float32 => hound::SampleFormat::Float,
            BitDepth::Int16 => hound::SampleFormat::Int,
        },
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    match bit_depth {
        BitDepth::Float32 => {
            for &s in samples {
                writer.write_sample(s as f32)?;
            }
        }
        BitDepth::Int16 => {
            for &s in samples {
                writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)?;
            }
        }
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
}

/// Print samples as text: a header line, then space-separated values
pub fn print_signal<W: Write>(mut out: W, samples: &[f64]) -> std::io::Result<()> {
    writeln!(out, "Cleaned audio signal:")?;
    for s in samples {
        write!(out, "{:.6} ", s)?;
    }
    writeln!(out)?;
    out.flush()
}
