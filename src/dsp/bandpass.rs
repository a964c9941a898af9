//! Zero-phase Butterworth bandpass filter.
//!
//! The filter is designed as cascaded second-order sections: Butterworth
//! analog prototype, lowpass-to-bandpass transform, then bilinear transform
//! with prewarped band edges. It is applied forward and backward over an
//! odd-extended copy of the signal, each pass starting from steady-state
//! section states, so the output has no phase shift and no start-up transient.

use crate::constants::{BUTTERWORTH_ORDER, EPSILON, NYQUIST_CLAMP_FACTOR};
use crate::utils::safe_cast::usize_to_f64;
use crate::{Error, Result};
use log::debug;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Upper cutoff actually usable at `sample_rate_hz`.
///
/// Cutoffs at or above Nyquist are pulled down to 99% of Nyquist.
#[must_use]
pub fn effective_highcut(sample_rate_hz: f64, highcut_hz: f64) -> f64 {
    let nyquist = sample_rate_hz / 2.0;
    if highcut_hz >= nyquist {
        NYQUIST_CLAMP_FACTOR * nyquist
    } else {
        highcut_hz
    }
}

/// One second-order section, `a[0]` normalised to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    /// Numerator coefficients
    pub b: [f64; 3],
    /// Denominator coefficients
    pub a: [f64; 3],
}

impl Biquad {
    /// Complex response at `z^-1 = e^{-jω}`
    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = z_inv2 * self.b[2] + z_inv * self.b[1] + self.b[0];
        let den = z_inv2 * self.a[2] + z_inv * self.a[1] + self.a[0];
        num / den
    }

    /// Steady-state output for a constant unit input
    fn dc_gain(&self) -> f64 {
        let den = self.a.iter().sum::<f64>();
        if den.abs() <= EPSILON {
            return 0.0;
        }
        self.b.iter().sum::<f64>() / den
    }
}

/// Designed bandpass filter, reusable across calls
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<Biquad>,
    sample_rate_hz: f64,
    lowcut_hz: f64,
    highcut_hz: f64,
}

impl BandpassFilter {
    /// Design a 4th-order Butterworth bandpass for the given band
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if the sample rate or cutoffs are
    /// not positive, or the low cutoff is not below the usable high cutoff
    pub fn new(sample_rate_hz: f64, lowcut_hz: f64, highcut_hz: f64) -> Result<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Sample rate must be positive, got {sample_rate_hz}"
            )));
        }
        if !lowcut_hz.is_finite() || !highcut_hz.is_finite() || lowcut_hz <= 0.0 || highcut_hz <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Cutoffs must be positive, got {lowcut_hz}-{highcut_hz} Hz"
            )));
        }

        let highcut = effective_highcut(sample_rate_hz, highcut_hz);
        if highcut < highcut_hz {
            debug!("High cutoff {highcut_hz} Hz clamped to {highcut:.3} Hz at {sample_rate_hz} Hz sampling");
        }
        if lowcut_hz >= highcut {
            return Err(Error::InvalidConfiguration(format!(
                "Low cutoff {lowcut_hz} Hz must be below high cutoff {highcut:.3} Hz"
            )));
        }

        let sections = design_sections(BUTTERWORTH_ORDER, sample_rate_hz, lowcut_hz, highcut)?;

        Ok(Self {
            sections,
            sample_rate_hz,
            lowcut_hz,
            highcut_hz: highcut,
        })
    }

    /// Second-order sections in application order
    #[must_use]
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Lower cutoff in Hz
    #[must_use]
    pub fn lowcut_hz(&self) -> f64 {
        self.lowcut_hz
    }

    /// Upper cutoff in Hz after Nyquist clamping
    #[must_use]
    pub fn highcut_hz(&self) -> f64 {
        self.highcut_hz
    }

    /// Magnitude of a single forward pass at `frequency_hz`
    #[must_use]
    pub fn gain_at(&self, frequency_hz: f64) -> f64 {
        let omega = 2.0 * PI * frequency_hz / self.sample_rate_hz;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
            .norm()
    }

    /// Filter forward and backward, returning a signal of the same length
    ///
    /// # Errors
    ///
    /// Returns `Error::InsufficientData` for fewer than two samples
    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>> {
        let n = signal.len();
        if n < 2 {
            return Err(Error::InsufficientData { samples: n, required: 2 });
        }

        let pad = (3 * (2 * self.sections.len() + 1)).min(n - 1);
        let extended = odd_extend(signal, pad);
        let zi = self.steady_state();

        let mut forward = self.run(&extended, &zi);
        forward.reverse();
        let mut backward = self.run(&forward, &zi);
        backward.reverse();

        Ok(backward[pad..pad + n].to_vec())
    }

    /// Per-section states matching a unit step already in progress
    fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|s| {
                let gain = s.dc_gain();
                let state = [scale * (gain - s.b[0]), scale * (s.b[2] - s.a[2] * gain)];
                scale *= gain;
                state
            })
            .collect()
    }

    /// Single pass through the cascade (direct form II transposed), states
    /// seeded as `zi` scaled by the first input sample
    fn run(&self, input: &[f64], zi: &[[f64; 2]]) -> Vec<f64> {
        let x0 = input.first().copied().unwrap_or(0.0);
        let mut states: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect();

        input
            .iter()
            .map(|&x| {
                self.sections.iter().zip(states.iter_mut()).fold(x, |v, (s, z)| {
                    let y = s.b[0] * v + z[0];
                    z[0] = s.b[1] * v - s.a[1] * y + z[1];
                    z[1] = s.b[2] * v - s.a[2] * y;
                    y
                })
            })
            .collect()
    }
}

/// Design and apply a zero-phase Butterworth bandpass in one call
///
/// # Errors
///
/// See [`BandpassFilter::new`] and [`BandpassFilter::apply`]
pub fn bandpass(signal: &[f64], sample_rate_hz: f64, lowcut_hz: f64, highcut_hz: f64) -> Result<Vec<f64>> {
    BandpassFilter::new(sample_rate_hz, lowcut_hz, highcut_hz)?.apply(signal)
}

/// Reflect `pad` samples about each end point: `2·x[0] − x[i]` on the left,
/// `2·x[n−1] − x[n−1−i]` on the right
fn odd_extend(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));
    extended
}

/// Butterworth bandpass of prototype order `order` (even) as `order` biquads
fn design_sections(order: usize, fs: f64, lowcut: f64, highcut: f64) -> Result<Vec<Biquad>> {
    if order == 0 || order % 2 != 0 {
        return Err(Error::FilterError(format!(
            "Butterworth order must be even and positive, got {order}"
        )));
    }

    // Prewarped analog band edges (rad/s)
    let warped_low = 2.0 * fs * (PI * lowcut / fs).tan();
    let warped_high = 2.0 * fs * (PI * highcut / fs).tan();
    let bandwidth = warped_high - warped_low;
    let center_sq = warped_low * warped_high;
    let two_fs = Complex64::new(2.0 * fs, 0.0);

    let order_f = usize_to_f64(order);
    let mut sections = Vec::with_capacity(order);

    // Upper-half-plane prototype poles; each conjugate partner yields the
    // conjugate bandpass poles, so every pole pair below makes one section
    for k in 0..order / 2 {
        let theta = PI * (2.0 * usize_to_f64(k) + order_f + 1.0) / (2.0 * order_f);
        let prototype = Complex64::from_polar(1.0, theta);

        // Roots of s² − p·bw·s + w0² = 0
        let pb = prototype * bandwidth;
        let disc = (pb * pb - 4.0 * center_sq).sqrt();
        for analog in [(pb + disc) / 2.0, (pb - disc) / 2.0] {
            let pole = (two_fs + analog) / (two_fs - analog);
            sections.push(Biquad {
                // Zeros at z = 1 and z = −1
                b: [1.0, 0.0, -1.0],
                a: [1.0, -2.0 * pole.re, pole.norm_sqr()],
            });
        }
    }

    // Unity gain at the digital image of the geometric centre frequency
    let center_omega = 2.0 * (center_sq.sqrt() / (2.0 * fs)).atan();
    let z_inv = Complex64::from_polar(1.0, -center_omega);
    let response = sections
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
        .norm();
    if !response.is_finite() || response <= EPSILON {
        return Err(Error::FilterError(format!(
            "Degenerate bandpass design for {lowcut}-{highcut} Hz at {fs} Hz"
        )));
    }

    let per_section = (1.0 / response).powf(1.0 / usize_to_f64(sections.len()));
    for section in &mut sections {
        section.b = [per_section, 0.0, -per_section];
    }

    Ok(sections)
}
