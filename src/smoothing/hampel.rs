use super::BpmSmoother;
use crate::constants::MAD_TO_SIGMA;
use crate::statistics::median;
use crate::{Error, Result};
use std::collections::VecDeque;

/// Hampel filter: readings further than `threshold` robust standard
/// deviations from the window median are replaced by the median
pub struct HampelSmoother {
    window_size: usize,
    threshold: f64,
    history: VecDeque<f64>,
}

impl HampelSmoother {
    /// Create a Hampel smoother
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is not odd and positive, or the
    /// threshold is negative
    pub fn new(window_size: usize, threshold: f64) -> Result<Self> {
        if window_size == 0 || window_size % 2 == 0 {
            return Err(Error::FilterError(format!(
                "Hampel window must be odd and greater than 0, got {window_size}"
            )));
        }
        if !(threshold >= 0.0) {
            return Err(Error::FilterError(format!(
                "Hampel threshold must be non-negative, got {threshold}"
            )));
        }
        Ok(Self {
            window_size,
            threshold,
            history: VecDeque::with_capacity(window_size),
        })
    }

    fn filter_value(&self, bpm: f64) -> f64 {
        if self.history.is_empty() {
            return bpm;
        }

        let mut window: Vec<f64> = self.history.iter().copied().collect();
        window.push(bpm);
        let Some(center) = median(&window) else {
            return bpm;
        };

        let deviations: Vec<f64> = window.iter().map(|v| (v - center).abs()).collect();
        let sigma = MAD_TO_SIGMA * median(&deviations).unwrap_or(0.0);

        if (bpm - center).abs() > self.threshold * sigma {
            center
        } else {
            bpm
        }
    }
}

impl BpmSmoother for HampelSmoother {
    fn apply(&mut self, bpm: f64) -> f64 {
        let filtered = self.filter_value(bpm);

        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(filtered);

        filtered
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "HampelSmoother"
    }
}
