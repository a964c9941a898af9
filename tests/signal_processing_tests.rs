//! Tests for the detrend, bandpass, spectrum and confidence stages working together

mod test_helpers;

use approx::assert_relative_eq;
use heart_rate_estimation::dsp::{bandpass, confidence, detrend, spectrum, BandpassFilter};
use heart_rate_estimation::Error;
use test_helpers::*;

fn analyze(trace: &[f64], fs: f64) -> spectrum::SpectralEstimate {
    let normalized = detrend(trace).unwrap();
    let filtered = bandpass(&normalized, fs, 0.8, 3.0).unwrap();
    spectrum::estimate(&filtered, fs, 0.8, 3.0, true).unwrap()
}

#[test]
fn test_pure_sinusoids_within_one_bin() {
    for bpm in [54.0, 60.0, 72.0, 90.0, 132.0, 170.0] {
        let estimate = analyze(&pulse_trace(bpm, 5.0, 300), FPS);
        let bin_bpm = 60.0 * estimate.resolution_hz;
        assert!(
            (estimate.bpm() - bpm).abs() <= bin_bpm,
            "{bpm} BPM estimated as {:.2}",
            estimate.bpm()
        );
    }
}

#[test]
fn test_off_bin_frequency_refined_by_interpolation() {
    // 75 BPM = 1.25 Hz sits halfway between two 0.1 Hz bins
    let trace = pulse_trace(75.0, 5.0, 300);
    let normalized = detrend(&trace).unwrap();
    let filtered = bandpass(&normalized, FPS, 0.8, 3.0).unwrap();

    let coarse = spectrum::estimate(&filtered, FPS, 0.8, 3.0, false).unwrap();
    let refined = spectrum::estimate(&filtered, FPS, 0.8, 3.0, true).unwrap();

    assert!((coarse.bpm() - 75.0).abs() <= 3.0 + 1e-9);
    assert!((refined.bpm() - 75.0).abs() < (coarse.bpm() - 75.0).abs());
}

#[test]
fn test_slow_drift_is_ignored() {
    // Illumination drift plus a 66 BPM pulse
    let trace: Vec<f64> = pulse_trace(66.0, 3.0, 300)
        .iter()
        .enumerate()
        .map(|(i, v)| v + 0.15 * i as f64)
        .collect();
    let estimate = analyze(&trace, FPS);
    assert!((estimate.bpm() - 66.0).abs() <= 6.0);
}

#[test]
fn test_constant_signal_has_zero_confidence() {
    let normalized = detrend(&[142.0; 300]).unwrap();
    assert!(normalized.iter().all(|v| *v == 0.0));

    let filtered = bandpass(&normalized, FPS, 0.8, 3.0).unwrap();
    let estimate = spectrum::estimate(&filtered, FPS, 0.8, 3.0, true).unwrap();
    assert!(estimate.is_degenerate());
    assert_eq!(confidence::score(&estimate, 1.0), 0.0);
}

#[test]
fn test_spectral_estimate_is_bit_identical() {
    let trace = noisy_pulse_trace(84.0, 10.0, 3.0, 300, 11);
    let first = analyze(&trace, FPS);
    let second = analyze(&trace, FPS);

    assert_eq!(first, second);
    assert_eq!(first.dominant_frequency_hz.to_bits(), second.dominant_frequency_hz.to_bits());
    assert_eq!(first.peak_power.to_bits(), second.peak_power.to_bits());
}

#[test]
fn test_confidence_grows_with_snr() {
    let mut previous = -1.0;
    for amplitude in [0.5, 2.0, 8.0, 32.0] {
        let estimate = analyze(&noisy_pulse_trace(72.0, amplitude, 4.0, 300, 5), FPS);
        let score = confidence::score(&estimate, 1.0);
        assert!(score >= previous - 0.05, "amplitude {amplitude}: {score:.3} after {previous:.3}");
        previous = score;
    }
    assert!(previous > 0.6);
}

#[test]
fn test_confidence_scales_with_fill_ratio() {
    let estimate = analyze(&pulse_trace(72.0, 10.0, 300), FPS);
    let full = confidence::score(&estimate, 1.0);
    assert_relative_eq!(confidence::score(&estimate, 0.5), full * 0.5);
    assert_eq!(confidence::score(&estimate, 0.0), 0.0);
}

#[test]
fn test_low_sample_rate_clamps_highcut() {
    // Nyquist is 2.5 Hz, below the 3.0 Hz default
    let fs = 5.0;
    let filter = BandpassFilter::new(fs, 0.8, 3.0).unwrap();
    assert_relative_eq!(filter.highcut_hz(), 0.99 * 2.5);

    let trace: Vec<f64> = (0..100)
        .map(|i| 128.0 + 5.0 * (2.0 * std::f64::consts::PI * 1.5 * i as f64 / fs).sin())
        .collect();
    let normalized = detrend(&trace).unwrap();
    let filtered = filter.apply(&normalized).unwrap();
    let estimate = spectrum::estimate(&filtered, fs, 0.8, 3.0, true).unwrap();

    assert!(estimate.spectrum.iter().all(|bin| bin.frequency_hz <= filter.highcut_hz()));
    assert!((estimate.dominant_frequency_hz - 1.5).abs() <= estimate.resolution_hz);
}

#[test]
fn test_short_buffers_are_rejected() {
    assert!(matches!(detrend(&[1.0]), Err(Error::InsufficientData { .. })));

    let filtered = bandpass(&detrend(&pulse_trace(72.0, 5.0, 60)).unwrap(), FPS, 0.8, 3.0).unwrap();
    assert!(matches!(
        spectrum::estimate(&filtered, FPS, 0.8, 3.0, true),
        Err(Error::InsufficientData {
            samples: 60,
            required: 75
        })
    ));
}

#[test]
fn test_clean_tone_between_bins_scores_high() {
    // Each sits halfway between two 0.1 Hz bins
    for bpm in [75.0, 81.0, 99.0, 123.0] {
        let estimate = analyze(&pulse_trace(bpm, 10.0, 300), FPS);
        let score = confidence::score(&estimate, 1.0);
        assert!(score > 0.8, "{bpm} BPM scored {score:.3}");
        assert!(confidence::concentration(&estimate) < 0.6);
    }

    let on_bin = confidence::score(&analyze(&pulse_trace(60.0, 10.0, 300), FPS), 1.0);
    assert!(on_bin > 0.8);
}
