//! ReelForge Denoise - spectral subtraction from the command line
//!
//! Usage:
//!   rf-denoise input.wav                     - print cleaned samples to stdout
//!   rf-denoise input.wav -o clean.wav        - write cleaned WAV
//!   rf-denoise input.wav --save-profile p.json -o clean.wav
//!   rf-denoise other.wav --noise-profile p.json -o other_clean.wav

mod io;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rf_denoise::{DenoiseConfig, NoiseProfile, SpectralSubtraction};

use crate::io::BitDepth;

#[derive(Parser, Debug)]
#[command(name = "rf-denoise", version, about = "Spectral subtraction noise reduction")]
struct Cli {
    /// Input WAV file
    input: PathBuf,

    /// Write cleaned audio to this WAV file instead of printing samples
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output sample format
    #[arg(long, value_enum, default_value_t)]
    bit_depth: BitDepth,

    /// JSON configuration file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// FFT frame size (power of two; hop defaults to half)
    #[arg(long)]
    frame_size: Option<usize>,

    /// Hop size between frames
    #[arg(long)]
    hop_size: Option<usize>,

    /// Minimum frames required for the noise profile
    #[arg(long)]
    min_frames: Option<usize>,

    /// Process frames in parallel
    #[arg(long)]
    parallel: bool,

    /// Worker threads for --parallel (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Save the estimated noise profile as JSON
    #[arg(long)]
    save_profile: Option<PathBuf>,

    /// Apply a previously saved noise profile instead of estimating one
    #[arg(long)]
    noise_profile: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;
    log::info!(
        "Frame size {}, hop {}, parallel={}",
        config.frame_size,
        config.hop_size,
        config.parallel
    );

    let signal = io::load_wav(&cli.input)?;
    log::info!(
        "Loaded {} samples at {} Hz from {} ({} channel(s))",
        signal.samples.len(),
        signal.sample_rate,
        cli.input.display(),
        signal.source_channels
    );
    let processor = SpectralSubtraction::new(config).context("Invalid denoise configuration")?;

    let output = match &cli.noise_profile {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let profile = NoiseProfile::from_json_str(&json)
                .with_context(|| format!("Invalid noise profile {}", path.display()))?;
            processor.process_with_profile(&signal.samples, &profile)
        }
        None => processor.process(&signal.samples),
    }
    .with_context(|| format!("Failed to denoise {}", cli.input.display()))?;

    if let Some(path) = &cli.save_profile {
        fs::write(path, output.profile.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Noise profile saved to {}", path.display());
    }

    match &cli.output {
        Some(path) => {
            io::write_wav(path, &output.samples, signal.sample_rate, cli.bit_depth)?;
            log::info!(
                "Wrote {} samples to {} ({:.2} dB removed)",
                output.samples.len(),
                path.display(),
                output.report.reduction_db
            );
        }
        None => {
            let stdout = std::io::stdout();
            io::print_signal(std::io::BufWriter::new(stdout.lock()), &output.samples)
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Defaults, then the JSON file, then command-line flags
fn build_config(cli: &Cli) -> Result<DenoiseConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            DenoiseConfig::from_json_str(&json)
                .with_context(|| format!("Invalid configuration {}", path.display()))?
        }
        None => DenoiseConfig::default(),
    };

    if let Some(size) = cli.frame_size {
        config = config.with_frame_size(size);
    }
    if let Some(hop) = cli.hop_size {
        config = config.with_hop_size(hop);
    }
    if let Some(frames) = cli.min_frames {
        config = config.with_min_frames(frames);
    }
    if cli.parallel {
        config = config.with_parallel(true);
    }
    if let Some(threads) = cli.threads {
        config = config.with_max_threads(threads);
    }

    config.validate()?;
    Ok(config)
}
