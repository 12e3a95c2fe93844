//! Magnitude spectral subtraction
//!
//! Each bin keeps its noisy phase; only the magnitude is reduced, clamped
//! at zero. Phase is not cleaned, which is the usual source of "musical
//! noise" in low-SNR regions.

use crate::error::{DenoiseError, DenoiseResult};
use crate::fft::magnitude;
use crate::profile::NoiseProfile;
use realfft::num_complex::Complex;

/// Subtract `noise` from one bin's magnitude, preserving phase
#[inline]
pub fn subtract_bin(bin: Complex<f64>, noise: f64) -> Complex<f64> {
    let mag = (magnitude(bin) - noise).max(0.0);
    let phase = bin.im.atan2(bin.re);
    Complex::new(mag * phase.cos(), mag * phase.sin())
}

/// Apply the noise profile to a whole spectrum in place
pub fn subtract_spectrum(
    spectrum: &mut [Complex<f64>],
    profile: &NoiseProfile,
) -> DenoiseResult<()> {
    let noise = profile.magnitudes();
    if spectrum.len() != noise.len() {
        return Err(DenoiseError::BufferMismatch {
            expected: noise.len(),
            got: spectrum.len(),
        });
    }

    for (bin, &n) in spectrum.iter_mut().zip(noise) {
        *bin = subtract_bin(*bin, n);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_magnitude_reduced_phase_kept() {
        let bin = Complex::new(3.0, 4.0);
        let out = subtract_bin(bin, 2.5);

        assert_abs_diff_eq!(magnitude(out), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out.im.atan2(out.re), bin.im.atan2(bin.re), epsilon = 1e-12);
    }

    #[test]
    fn test_clamped_at_zero() {
        let out = subtract_bin(Complex::new(-0.3, 0.1), 5.0);
        assert_eq!(magnitude(out), 0.0);
    }

    #[test]
    fn test_zero_noise_is_identity() {
        let bin = Complex::new(-1.5, 0.75);
        let out = subtract_bin(bin, 0.0);
        assert_abs_diff_eq!(out.re, bin.re, epsilon = 1e-12);
        assert_abs_diff_eq!(out.im, bin.im, epsilon = 1e-12);
    }

    #[test]
    fn test_spectrum_non_negative() {
        let profile = NoiseProfile::from_magnitudes(8, vec![1.0, 0.5, 10.0, 0.0, 2.0], 1).unwrap();
        let mut spectrum = vec![
            Complex::new(0.5, 0.0),
            Complex::new(0.0, 2.0),
            Complex::new(3.0, -3.0),
            Complex::new(-1.0, 1.0),
            Complex::new(2.0, 0.0),
        ];

        subtract_spectrum(&mut spectrum, &profile).unwrap();

        let mags: Vec<f64> = spectrum.iter().map(|&c| magnitude(c)).collect();
        assert!(mags.iter().all(|&m| m >= 0.0));
        assert_eq!(mags[0], 0.0);
        assert_abs_diff_eq!(mags[1], 1.5, epsilon = 1e-12);
        assert_eq!(mags[2], 0.0);
        assert_abs_diff_eq!(mags[3], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(mags[4], 0.0);
    }

    #[test]
    fn test_bin_mismatch_fails_fast() {
        let profile = NoiseProfile::silent(1024).unwrap();
        let mut spectrum = vec![Complex::new(1.0, 0.0); 512];

        let result = subtract_spectrum(&mut spectrum, &profile);
        assert!(matches!(
            result,
            Err(DenoiseError::BufferMismatch { expected: 513, got: 512 })
        ));
        assert!(spectrum.iter().all(|c| c.re == 1.0));
    }
}
