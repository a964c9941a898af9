//! Confidence scoring for spectral estimates.

use crate::constants::EPSILON;
use crate::dsp::spectrum::SpectralEstimate;
use crate::utils::safe_cast::usize_to_f64;

/// Squared correlation between adjacent Hamming-windowed DFT bins of white noise,
/// `(ab / (a² + b²/2))²` for `w = a − b·cos`
const HAMMING_ADJACENT_POWER_CORRELATION: f64 = 0.390_7;

/// Fewest in-band bins for which the peak's neighbours are counted with it
const MIN_BINS_FOR_LOBE: usize = 5;

/// Share of in-band power held by the dominant bin, in `[0, 1]`
#[must_use]
pub fn concentration(estimate: &SpectralEstimate) -> f64 {
    if estimate.total_power <= EPSILON {
        return 0.0;
    }
    (estimate.peak_power / estimate.total_power).clamp(0.0, 1.0)
}

/// Index of the first strongest in-band bin
fn peak_index(estimate: &SpectralEstimate) -> Option<usize> {
    let mut peak: Option<usize> = None;
    for (i, bin) in estimate.spectrum.iter().enumerate() {
        if peak.map_or(true, |p| bin.power > estimate.spectrum[p].power) {
            peak = Some(i);
        }
    }
    peak
}

/// Share of in-band power held by the dominant bin and its two neighbours.
///
/// A tone between two bins splits its energy across the window's main lobe,
/// so the lobe rather than the single bin is compared against the band.
/// Falls back to [`concentration`] for bands narrower than five bins.
#[must_use]
pub fn lobe_concentration(estimate: &SpectralEstimate) -> f64 {
    let bins = estimate.bin_count();
    if bins < MIN_BINS_FOR_LOBE {
        return concentration(estimate);
    }
    if estimate.total_power <= EPSILON {
        return 0.0;
    }
    let Some(peak) = peak_index(estimate) else {
        return 0.0;
    };

    let lo = peak.saturating_sub(1);
    let hi = (peak + 1).min(bins - 1);
    let lobe: f64 = estimate.spectrum[lo..=hi].iter().map(|bin| bin.power).sum();
    (lobe / estimate.total_power).clamp(0.0, 1.0)
}

/// Expected lobe share for Hamming-windowed white noise spread over `bins` bins.
///
/// For i.i.d. exponential bin powers the expected maximum is `H_m` times the
/// mean, so the expected single-bin share is `H_m / m`. Each neighbour of the
/// maximum carries `ρ²·H_m + (1 − ρ²)` on average, `ρ²` being the adjacent-bin
/// power correlation of the window.
fn noise_baseline(bins: usize) -> f64 {
    let harmonic: f64 = (1..=bins).map(|k| 1.0 / usize_to_f64(k)).sum();
    let m = usize_to_f64(bins);
    if bins < MIN_BINS_FOR_LOBE {
        return harmonic / m;
    }
    let rho2 = HAMMING_ADJACENT_POWER_CORRELATION;
    (harmonic + 2.0 * (rho2 * harmonic + (1.0 - rho2))) / m
}

/// Lobe concentration rescaled so that pure noise scores 0 and a single tone scores 1
#[must_use]
pub fn normalized_concentration(estimate: &SpectralEstimate) -> f64 {
    let bins = estimate.bin_count();
    if bins <= 1 || estimate.total_power <= EPSILON {
        return 0.0;
    }

    let baseline = noise_baseline(bins);
    if baseline >= 1.0 {
        return 0.0;
    }
    ((lobe_concentration(estimate) - baseline) / (1.0 - baseline)).clamp(0.0, 1.0)
}

/// Confidence in `[0, 1]` for an estimate taken at `fill_ratio` buffer occupancy.
///
/// Non-decreasing in both the peak's dominance and the fill ratio, and zero
/// when either is at its minimum.
#[must_use]
pub fn score(estimate: &SpectralEstimate, fill_ratio: f64) -> f64 {
    if !fill_ratio.is_finite() {
        return 0.0;
    }
    normalized_concentration(estimate) * fill_ratio.clamp(0.0, 1.0)
}
