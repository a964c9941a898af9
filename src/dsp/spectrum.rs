//! Hamming-windowed power spectrum and in-band peak search.

use crate::constants::{EPSILON, MIN_CYCLES_FOR_ESTIMATE, SECONDS_PER_MINUTE};
use crate::dsp::bandpass::effective_highcut;
use crate::utils::safe_cast::{f64_to_usize_clamp, usize_to_f64};
use crate::{Error, Result};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Power at one in-band frequency bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumBin {
    /// Bin centre frequency in Hz
    pub frequency_hz: f64,
    /// Squared DFT magnitude
    pub power: f64,
}

/// Result of one spectral analysis pass
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralEstimate {
    /// Frequency of the strongest in-band bin, refined if interpolation was requested
    pub dominant_frequency_hz: f64,
    /// In-band bins in ascending frequency order
    pub spectrum: Vec<SpectrumBin>,
    /// Power of the strongest in-band bin
    pub peak_power: f64,
    /// Sum of power over all in-band bins
    pub total_power: f64,
    /// Bin spacing in Hz
    pub resolution_hz: f64,
}

impl SpectralEstimate {
    /// Dominant frequency in beats per minute
    #[must_use]
    pub fn bpm(&self) -> f64 {
        self.dominant_frequency_hz * SECONDS_PER_MINUTE
    }

    /// Number of in-band bins
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.spectrum.len()
    }

    /// Whether the band carries no measurable energy
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.total_power <= EPSILON
    }
}

/// Samples needed to cover two full cycles of `lowcut_hz`
#[must_use]
pub fn min_samples_for(sample_rate_hz: f64, lowcut_hz: f64) -> usize {
    f64_to_usize_clamp((MIN_CYCLES_FOR_ESTIMATE * sample_rate_hz / lowcut_hz).ceil(), 2, usize::MAX)
}

/// First and last DFT bin of an `n`-point transform whose frequency lies in
/// the closed band `[lowcut_hz, highcut_hz]`, `None` if no bin does.
///
/// Only bins up to `n / 2` are considered.
#[must_use]
pub fn band_bins(n: usize, sample_rate_hz: f64, lowcut_hz: f64, highcut_hz: f64) -> Option<(usize, usize)> {
    if n == 0 {
        return None;
    }
    let half_n = n / 2;
    let resolution = sample_rate_hz / usize_to_f64(n);
    let tolerance = resolution * 1e-9;
    let freq = |k: usize| usize_to_f64(k) * resolution;
    let in_band = |k: usize| freq(k) >= lowcut_hz - tolerance && freq(k) <= highcut_hz + tolerance;

    let guess = f64_to_usize_clamp((lowcut_hz / resolution).floor(), 0, half_n);
    let first = (guess.saturating_sub(1)..=half_n)
        .take_while(|&k| freq(k) <= highcut_hz + tolerance)
        .find(|&k| in_band(k))?;
    let last = (first..=half_n).take_while(|&k| in_band(k)).last()?;
    Some((first, last))
}

/// Hamming window coefficients
fn hamming_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denom = usize_to_f64(size - 1);
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * usize_to_f64(i) / denom).cos())
        .collect()
}

/// Find the dominant frequency of `filtered` inside `[lowcut_hz, highcut_hz]`.
///
/// The highcut is clamped below Nyquist the same way the bandpass filter
/// clamps it. Ties between equal bins resolve to the lower frequency.
///
/// # Errors
///
/// Returns `Error::InvalidConfiguration` for a non-positive sample rate or an
/// empty band, and `Error::InsufficientData` when fewer than
/// [`min_samples_for`] samples are given or no bin falls inside the band
pub fn estimate(
    filtered: &[f64],
    sample_rate_hz: f64,
    lowcut_hz: f64,
    highcut_hz: f64,
    interpolate: bool,
) -> Result<SpectralEstimate> {
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 || !lowcut_hz.is_finite() || lowcut_hz <= 0.0 {
        return Err(Error::InvalidConfiguration(format!(
            "Sample rate and low cutoff must be positive, got {sample_rate_hz} Hz and {lowcut_hz} Hz"
        )));
    }
    let highcut = effective_highcut(sample_rate_hz, highcut_hz);
    if !highcut.is_finite() || lowcut_hz >= highcut {
        return Err(Error::InvalidConfiguration(format!(
            "Low cutoff {lowcut_hz} Hz must be below high cutoff {highcut} Hz"
        )));
    }

    let n = filtered.len();
    let required = min_samples_for(sample_rate_hz, lowcut_hz);
    if n < required {
        return Err(Error::InsufficientData { samples: n, required });
    }

    let window = hamming_window(n);
    let mut buffer: Vec<Complex64> = filtered
        .iter()
        .zip(window.iter())
        .map(|(s, w)| Complex64::new(s * w, 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let half_n = n / 2;
    let power: Vec<f64> = buffer.iter().take(half_n + 1).map(Complex64::norm_sqr).collect();

    let resolution = sample_rate_hz / usize_to_f64(n);
    let Some((first, last)) = band_bins(n, sample_rate_hz, lowcut_hz, highcut) else {
        let needed = f64_to_usize_clamp((sample_rate_hz / (highcut - lowcut_hz)).ceil(), n + 1, usize::MAX);
        return Err(Error::InsufficientData {
            samples: n,
            required: needed,
        });
    };

    // First maximum wins on ties
    let mut peak_bin = first;
    for k in first..=last {
        if power[k] > power[peak_bin] {
            peak_bin = k;
        }
    }

    let peak_power = power[peak_bin];
    let total_power: f64 = power[first..=last].iter().sum();

    let mut dominant = usize_to_f64(peak_bin) * resolution;
    if interpolate && peak_bin > 0 && peak_bin < half_n {
        let (left, center, right) = (power[peak_bin - 1], power[peak_bin], power[peak_bin + 1]);
        let denom = left - 2.0 * center + right;
        if denom.abs() > EPSILON {
            let delta = 0.5 * (left - right) / denom;
            if delta.is_finite() && delta.abs() <= 1.0 {
                dominant = ((usize_to_f64(peak_bin) + delta) * resolution).clamp(lowcut_hz, highcut);
            }
        }
    }

    let spectrum = (first..=last)
        .map(|k| SpectrumBin {
            frequency_hz: usize_to_f64(k) * resolution,
            power: power[k],
        })
        .collect();

    Ok(SpectralEstimate {
        dominant_frequency_hz: dominant,
        spectrum,
        peak_power,
        total_power,
        resolution_hz: resolution,
    })
}
