//! Owned video frame type consumed by the estimation pipeline.

use crate::{Error, Result};
use ndarray::{Array3, ArrayView3};

/// A single video frame: an H×W grid of 3-channel 8-bit pixels plus its capture time.
///
/// Channel index 1 is green for both RGB and BGR layouts, so the pipeline does
/// not care which of the two the frame source delivers.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Array3<u8>,
    timestamp: f64,
}

impl Frame {
    /// Wrap an `(height, width, 3)` pixel array
    ///
    /// # Errors
    ///
    /// Returns an error if the array does not have exactly 3 channels, has a
    /// zero-sized spatial dimension, or the timestamp is not finite
    pub fn new(pixels: Array3<u8>, timestamp: f64) -> Result<Self> {
        let (height, width, channels) = pixels.dim();
        if channels != 3 {
            return Err(Error::InvalidInput(format!("Frame must have 3 channels, got {channels}")));
        }
        if height == 0 || width == 0 {
            return Err(Error::InvalidInput(format!("Invalid frame dimensions: {width}x{height}")));
        }
        if !timestamp.is_finite() {
            return Err(Error::InvalidInput(format!("Frame timestamp must be finite, got {timestamp}")));
        }
        Ok(Self { pixels, timestamp })
    }

    /// Build a frame from interleaved row-major pixel bytes
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len() != width * height * 3`
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>, timestamp: f64) -> Result<Self> {
        let pixels = Array3::from_shape_vec((height, width, 3), data)
            .map_err(|e| Error::InvalidInput(format!("Failed to create frame from raw data: {e}")))?;
        Self::new(pixels, timestamp)
    }

    /// Frame filled with a single color
    ///
    /// # Errors
    ///
    /// Returns an error for zero-sized dimensions or a non-finite timestamp
    pub fn filled(width: usize, height: usize, pixel: [u8; 3], timestamp: f64) -> Result<Self> {
        let pixels = Array3::from_shape_fn((height, width, 3), |(_, _, ch)| pixel[ch]);
        Self::new(pixels, timestamp)
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    /// Capture timestamp in seconds
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Read-only view of the pixel grid
    #[must_use]
    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_frame_dimensions() {
        let frame = Frame::filled(64, 48, [10, 20, 30], 0.5).unwrap();
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.pixels()[[0, 0, 1]], 20);
        assert_eq!(frame.timestamp(), 0.5);
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(Frame::from_raw(4, 4, vec![0; 10], 0.0).is_err());
        assert!(Frame::from_raw(4, 4, vec![0; 48], 0.0).is_ok());
    }

    #[test]
    fn test_rejects_invalid_frames() {
        assert!(Frame::new(Array3::zeros((4, 4, 1)), 0.0).is_err());
        assert!(Frame::new(Array3::zeros((0, 4, 3)), 0.0).is_err());
        assert!(Frame::new(Array3::zeros((4, 4, 3)), f64::NAN).is_err());
    }
}
