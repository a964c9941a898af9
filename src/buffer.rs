//! Rolling window of green-channel samples.

use crate::utils::safe_cast::usize_to_f64;
use crate::{Error, Result};
use std::collections::VecDeque;

/// One green-channel measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Capture time in seconds
    pub timestamp: f64,
    /// Mean green intensity over the ROI
    pub value: f64,
}

impl Sample {
    /// Create a sample
    #[must_use]
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Fixed-capacity FIFO of samples with strictly increasing timestamps
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SignalBuffer {
    /// Create an empty buffer holding at most `capacity` samples
    ///
    /// # Errors
    ///
    /// Returns an error if capacity is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "Buffer size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        })
    }

    /// Append a sample, evicting the oldest one once full.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the buffer untouched, if the sample is not
    /// finite or its timestamp does not advance past the newest sample
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if !sample.timestamp.is_finite() || !sample.value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Sample must be finite, got ({}, {})",
                sample.timestamp, sample.value
            )));
        }
        if let Some(last) = self.samples.back() {
            if sample.timestamp <= last.timestamp {
                return Err(Error::InvalidInput(format!(
                    "Sample timestamp {} does not advance past {}",
                    sample.timestamp, last.timestamp
                )));
            }
        }

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Ok(())
    }

    /// Samples in arrival order
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Copy of the sample values in arrival order
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Most recent sample
    #[must_use]
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Number of buffered samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples retained
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupancy in `[0, 1]`
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        usize_to_f64(self.samples.len()) / usize_to_f64(self.capacity)
    }

    /// Sample rate implied by the buffered timestamps, if at least two samples exist
    #[must_use]
    pub fn observed_sample_rate(&self) -> Option<f64> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        let span = last.timestamp - first.timestamp;
        if self.samples.len() < 2 || span <= 0.0 {
            return None;
        }
        Some(usize_to_f64(self.samples.len() - 1) / span)
    }

    /// Drop all samples
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
