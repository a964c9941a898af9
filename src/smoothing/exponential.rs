use super::BpmSmoother;
use crate::{Error, Result};

/// Exponential smoothing: `s = α·x + (1 − α)·s_prev`
pub struct ExponentialSmoother {
    alpha: f64,
    last: Option<f64>,
}

impl ExponentialSmoother {
    /// Create an exponential smoother
    ///
    /// # Errors
    ///
    /// Returns an error unless `alpha` is in `(0, 1]`
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
        }
        Ok(Self { alpha, last: None })
    }
}

impl BpmSmoother for ExponentialSmoother {
    fn apply(&mut self, bpm: f64) -> f64 {
        let smoothed = match self.last {
            Some(last) => self.alpha * bpm + (1.0 - self.alpha) * last,
            None => bpm,
        };
        self.last = Some(smoothed);
        smoothed
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialSmoother"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_smoother() {
        let mut smoother = ExponentialSmoother::new(0.5).unwrap();

        // First reading passes through
        assert_eq!(smoother.apply(60.0), 60.0);
        assert_eq!(smoother.apply(80.0), 70.0);
        assert_eq!(smoother.apply(80.0), 75.0);

        smoother.reset();
        assert_eq!(smoother.apply(90.0), 90.0);
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(ExponentialSmoother::new(0.0).is_err());
        assert!(ExponentialSmoother::new(1.0).is_ok());
        assert!(ExponentialSmoother::new(f64::NAN).is_err());
    }
}
