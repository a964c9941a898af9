//! Error types for the heart rate estimation library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No face candidate survived detection for this frame
    #[error("No face detected")]
    NoFaceDetected,

    /// Not enough buffered samples to produce an estimate
    #[error("Insufficient data: {samples} samples buffered, {required} required")]
    InsufficientData {
        /// Samples currently available
        samples: usize,
        /// Samples needed before an estimate can be produced
        required: usize,
    },

    /// Buffered signal carries no in-band energy (flat or zero-variance)
    #[error("Degenerate signal: no in-band energy in the buffered samples")]
    DegenerateSignal,

    /// Construction-time configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter design or smoother construction error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Shared estimator lock was poisoned by a panicking thread
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration file could not be parsed or written
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error only affects the current frame and the session can continue
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoFaceDetected | Self::InsufficientData { .. } | Self::DegenerateSignal | Self::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let err = Error::InsufficientData { samples: 50, required: 300 };
        assert_eq!(err.to_string(), "Insufficient data: 50 samples buffered, 300 required");
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(Error::NoFaceDetected.is_recoverable());
        assert!(Error::DegenerateSignal.is_recoverable());
        assert!(!Error::InvalidConfiguration("highcut <= lowcut".to_string()).is_recoverable());
    }
}
