//! Heart rate estimation library using remote photoplethysmography (rPPG).
//!
//! Blood volume changes under the skin slightly modulate how much green light
//! the face reflects. This library samples the mean green intensity of a
//! forehead region in every frame and recovers the pulse frequency from that
//! trace:
//! 1. Face location to find the subject in the frame
//! 2. Forehead ROI derivation and green-channel sampling
//! 3. A rolling sample buffer
//! 4. Linear detrending and standardisation
//! 5. Zero-phase Butterworth bandpass filtering (0.8-3.0 Hz by default)
//! 6. Hamming-windowed FFT and in-band peak search
//! 7. Confidence scoring from how strongly the peak dominates the band
//!
//! `OpenCV` integration (Haar cascade face detection, capture, display) sits
//! behind the default `opencv` feature; the signal processing core does not
//! need it.
//!
//! # Examples
//!
//! ## Feeding frames
//!
//! ```no_run
//! use heart_rate_estimation::{
//!     config::{EstimatorConfig, RoiConfig},
//!     estimator::{HeartRateEstimator, Measurement},
//!     face_detection::FixedRegionClassifier,
//!     frame::Frame,
//!     smoothing::create_smoother,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut estimator = HeartRateEstimator::new(
//!     EstimatorConfig::default(),
//!     RoiConfig::default(),
//!     Box::new(FixedRegionClassifier::new(200, 100, 240, 240)),
//!     create_smoother("moving_average:50")?,
//! )?;
//!
//! for i in 0..600 {
//!     let frame = Frame::filled(640, 480, [90, 140, 170], f64::from(i) / 30.0)?;
//!     let report = estimator.process_frame(&frame)?;
//!     if let Measurement::Reading(reading) = report.measurement {
//!         println!("{:.1} BPM (confidence {:.2})", reading.bpm, reading.confidence);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the stages directly
//!
//! ```no_run
//! use heart_rate_estimation::dsp::{bandpass, confidence, detrend, spectrum};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let trace: Vec<f64> = (0..300)
//!     .map(|i| 120.0 + (2.0 * std::f64::consts::PI * 1.2 * f64::from(i) / 30.0).sin())
//!     .collect();
//!
//! let normalized = detrend(&trace)?;
//! let filtered = bandpass(&normalized, 30.0, 0.8, 3.0)?;
//! let estimate = spectrum::estimate(&filtered, 30.0, 0.8, 3.0, true)?;
//! println!("{:.1} BPM, confidence {:.2}", estimate.bpm(), confidence::score(&estimate, 1.0));
//! # Ok(())
//! # }
//! ```

/// Sample buffer holding the green-channel trace
pub mod buffer;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Signal processing stages
pub mod dsp;

/// Error types and result handling
pub mod error;

/// Heart rate estimator state machine
pub mod estimator;

/// Face location on top of pluggable classifiers
pub mod face_detection;

/// Owned video frame type
pub mod frame;

/// Forehead region of interest and green-channel sampling
pub mod roi;

/// Smoothing of successive BPM readings
pub mod smoothing;

/// Session statistics
pub mod statistics;

/// Utility functions for numeric casts and image conversion
pub mod utils;

/// Main application module
#[cfg(feature = "opencv")]
pub mod app;

pub use buffer::{Sample, SignalBuffer};
pub use error::{Error, Result};
pub use estimator::{EstimatorState, FrameReport, HeartRateEstimator, HeartRateReading, Measurement, SharedHeartRateEstimator};
pub use frame::Frame;
