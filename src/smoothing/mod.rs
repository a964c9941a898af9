//! Smoothing of successive heart rate readings.
//!
//! Each spectral estimate is independent, so consecutive BPM values jitter by
//! up to a frequency bin. A smoother turns that sequence into a steadier
//! display value without touching the raw estimate.

/// Moving average over the most recent readings
pub mod moving_average;

/// Median over the most recent readings
pub mod median;

/// Exponential smoothing for responsive tracking
pub mod exponential;

/// Hampel filter for rejecting isolated outlier readings
pub mod hampel;

use crate::constants::{
    DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_HAMPEL_THRESHOLD, DEFAULT_HAMPEL_WINDOW, DEFAULT_MEDIAN_WINDOW,
    DEFAULT_MOVING_AVERAGE_WINDOW,
};
use crate::{Error, Result};

/// Trait for all BPM smoothers
pub trait BpmSmoother: Send {
    /// Feed a new reading and return the smoothed value
    fn apply(&mut self, bpm: f64) -> f64;

    /// Reset smoother state
    fn reset(&mut self);

    /// Get smoother name
    fn name(&self) -> &str;
}

/// Pass-through smoother
pub struct NoSmoothing;

impl BpmSmoother for NoSmoothing {
    fn apply(&mut self, bpm: f64) -> f64 {
        bpm
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoSmoothing"
    }
}

fn parse_param<T: std::str::FromStr>(spec: &str, value: Option<&str>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' in smoother spec '{spec}'"))),
    }
}

/// Create a smoother from a spec of the form `name[:param[:param]]`.
///
/// Known names: `none`, `moving_average[:window]`, `median[:window]`,
/// `exponential[:alpha]`, `hampel[:window[:threshold]]`.
///
/// # Errors
///
/// Returns `Error::FilterError` for an unknown name, unparsable parameters or
/// parameters the smoother rejects
pub fn create_smoother(spec: &str) -> Result<Box<dyn BpmSmoother>> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let first = parts.next();
    let second = parts.next();
    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters in smoother spec '{spec}'")));
    }

    match name.as_str() {
        "none" | "nosmoothing" => Ok(Box::new(NoSmoothing)),
        "moving_average" | "movingaverage" => {
            let window = parse_param(spec, first, DEFAULT_MOVING_AVERAGE_WINDOW)?;
            Ok(Box::new(moving_average::MovingAverageSmoother::new(window)?))
        }
        "median" => {
            let window = parse_param(spec, first, DEFAULT_MEDIAN_WINDOW)?;
            Ok(Box::new(median::MedianSmoother::new(window)?))
        }
        "exponential" => {
            let alpha = parse_param(spec, first, DEFAULT_EXPONENTIAL_ALPHA)?;
            Ok(Box::new(exponential::ExponentialSmoother::new(alpha)?))
        }
        "hampel" => {
            let window = parse_param(spec, first, DEFAULT_HAMPEL_WINDOW)?;
            let threshold = parse_param(spec, second, DEFAULT_HAMPEL_THRESHOLD)?;
            Ok(Box::new(hampel::HampelSmoother::new(window, threshold)?))
        }
        _ => Err(Error::FilterError(format!("Unknown smoother type: {spec}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_smoothing() {
        let mut smoother = NoSmoothing;
        assert_eq!(smoother.apply(72.0), 72.0);
        assert_eq!(smoother.apply(90.0), 90.0);
    }

    #[test]
    fn test_create_smoother() {
        assert_eq!(create_smoother("none").unwrap().name(), "NoSmoothing");
        assert_eq!(create_smoother("moving_average:50").unwrap().name(), "MovingAverageSmoother");
        assert_eq!(create_smoother("median").unwrap().name(), "MedianSmoother");
        assert_eq!(create_smoother("exponential:0.3").unwrap().name(), "ExponentialSmoother");
        assert_eq!(create_smoother("hampel:7:2.5").unwrap().name(), "HampelSmoother");
        assert_eq!(create_smoother("Moving_Average").unwrap().name(), "MovingAverageSmoother");
    }

    #[test]
    fn test_create_smoother_rejects_bad_specs() {
        assert!(create_smoother("kalman").is_err());
        assert!(create_smoother("moving_average:abc").is_err());
        assert!(create_smoother("moving_average:0").is_err());
        assert!(create_smoother("exponential:1.5").is_err());
        assert!(create_smoother("hampel:4").is_err());
        assert!(create_smoother("median:5:1:2").is_err());
    }
}
