use super::BpmSmoother;
use crate::utils::safe_cast::usize_to_f64;
use crate::{Error, Result};
use std::collections::VecDeque;

/// Average of the last `window_size` readings
pub struct MovingAverageSmoother {
    window_size: usize,
    history: VecDeque<f64>,
}

impl MovingAverageSmoother {
    /// Create a moving average over `window_size` readings
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is zero
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::FilterError("Moving average window must be greater than 0".to_string()));
        }
        Ok(Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        })
    }
}

impl BpmSmoother for MovingAverageSmoother {
    fn apply(&mut self, bpm: f64) -> f64 {
        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(bpm);

        self.history.iter().sum::<f64>() / usize_to_f64(self.history.len())
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageSmoother"
    }
}
