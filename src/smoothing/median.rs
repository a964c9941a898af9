use super::BpmSmoother;
use crate::statistics::median;
use crate::{Error, Result};
use std::collections::VecDeque;

/// Median of the last `window_size` readings
pub struct MedianSmoother {
    window_size: usize,
    history: VecDeque<f64>,
}

impl MedianSmoother {
    /// Create a median smoother over `window_size` readings
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is zero
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::FilterError("Median window must be greater than 0".to_string()));
        }
        Ok(Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        })
    }
}

impl BpmSmoother for MedianSmoother {
    fn apply(&mut self, bpm: f64) -> f64 {
        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(bpm);

        let values: Vec<f64> = self.history.iter().copied().collect();
        median(&values).unwrap_or(bpm)
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "MedianSmoother"
    }
}
