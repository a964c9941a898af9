//! Summary statistics over a session's heart rate readings.

use crate::estimator::HeartRateReading;
use crate::utils::safe_cast::usize_to_f64;

/// Median of `values`, `None` when empty
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    if len % 2 == 0 {
        Some((sorted[len / 2 - 1] + sorted[len / 2]) / 2.0)
    } else {
        Some(sorted[len / 2])
    }
}

/// Statistical summary of a set of values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Number of values
    pub count: usize,
    /// Mean value of the data
    pub mean: f64,
    /// Median value of the data
    pub median: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

impl Statistics {
    /// Summarise `data`, `None` when empty
    #[must_use]
    pub fn from_values(data: &[f64]) -> Option<Self> {
        let median = median(data)?;
        let n = usize_to_f64(data.len());
        let mean = data.iter().sum::<f64>() / n;

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: data.len(),
            mean,
            median,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}

/// Accumulates readings over a monitoring session
#[derive(Debug, Clone, Default)]
pub struct SessionStatistics {
    bpm: Vec<f64>,
    confidence: Vec<f64>,
}

impl SessionStatistics {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reading
    pub fn record(&mut self, reading: &HeartRateReading) {
        self.bpm.push(reading.bpm);
        self.confidence.push(reading.confidence);
    }

    /// Number of recorded readings
    #[must_use]
    pub fn len(&self) -> usize {
        self.bpm.len()
    }

    /// Whether no reading has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bpm.is_empty()
    }

    /// Summary of recorded BPM values
    #[must_use]
    pub fn bpm(&self) -> Option<Statistics> {
        Statistics::from_values(&self.bpm)
    }

    /// Mean confidence of recorded readings
    #[must_use]
    pub fn mean_confidence(&self) -> Option<f64> {
        Statistics::from_values(&self.confidence).map(|s| s.mean)
    }

    /// Forget all readings
    pub fn clear(&mut self) {
        self.bpm.clear();
        self.confidence.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reading(bpm: f64, confidence: f64) -> HeartRateReading {
        HeartRateReading {
            bpm,
            smoothed_bpm: bpm,
            confidence,
            timestamp: 0.0,
            buffer_fill_ratio: 1.0,
            dominant_frequency_hz: bpm / 60.0,
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_statistics() {
        let stats = Statistics::from_values(&[60.0, 70.0, 80.0, 90.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.mean, 75.0);
        assert_relative_eq!(stats.median, 75.0);
        assert_relative_eq!(stats.std_dev, 125.0_f64.sqrt());
        assert_relative_eq!(stats.min, 60.0);
        assert_relative_eq!(stats.max, 90.0);
        assert_relative_eq!(stats.range, 30.0);

        assert!(Statistics::from_values(&[]).is_none());
    }

    #[test]
    fn test_session_statistics() {
        let mut session = SessionStatistics::new();
        assert!(session.bpm().is_none());

        session.record(&reading(70.0, 0.8));
        session.record(&reading(74.0, 0.6));
        assert_eq!(session.len(), 2);
        assert_relative_eq!(session.bpm().unwrap().mean, 72.0);
        assert_relative_eq!(session.mean_confidence().unwrap(), 0.7);

        session.clear();
        assert!(session.is_empty());
    }
}
