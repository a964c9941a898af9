//! Heart rate estimator: owns the sample buffer and drives the pipeline.
//!
//! Every frame goes through face location, ROI derivation and green-channel
//! sampling. Once enough samples are buffered, every accepted sample re-runs
//! detrend, bandpass, spectral analysis and confidence scoring over the whole
//! buffer and yields a fresh reading.

use crate::buffer::{Sample, SignalBuffer};
use crate::config::{Config, EstimatorConfig, RoiConfig};
use crate::dsp::{confidence, detrend, spectrum, BandpassFilter};
use crate::face_detection::{FaceClassifier, FaceLocator, FaceRegion};
use crate::frame::Frame;
use crate::roi::{derive_roi, mean_green, Roi};
use crate::smoothing::BpmSmoother;
use crate::{Error, Result};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorState {
    /// No samples buffered
    Empty,
    /// Some samples buffered, fewer than required
    Filling,
    /// Enough samples buffered to estimate on every new sample
    Ready,
}

/// A heart rate estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartRateReading {
    /// Beats per minute from the dominant frequency
    pub bpm: f64,
    /// BPM after the configured smoother
    pub smoothed_bpm: f64,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Timestamp of the newest sample that contributed
    pub timestamp: f64,
    /// Buffer occupancy when the estimate was taken
    pub buffer_fill_ratio: f64,
    /// Dominant in-band frequency in Hz
    pub dominant_frequency_hz: f64,
}

/// Outcome of processing one frame or sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Fresh heart rate estimate
    Reading(HeartRateReading),
    /// Not enough samples buffered yet
    InsufficientData {
        /// Samples currently buffered
        samples: usize,
        /// Samples needed before estimating
        required: usize,
    },
    /// Buffer is full enough but carries no in-band energy
    DegenerateSignal {
        /// Timestamp of the newest sample
        timestamp: f64,
        /// Buffer occupancy
        buffer_fill_ratio: f64,
    },
}

impl Measurement {
    /// The reading, if this measurement is one
    #[must_use]
    pub fn reading(&self) -> Option<&HeartRateReading> {
        match self {
            Self::Reading(reading) => Some(reading),
            _ => None,
        }
    }

    /// Raw BPM, if available
    #[must_use]
    pub fn bpm(&self) -> Option<f64> {
        self.reading().map(|r| r.bpm)
    }

    /// Confidence, zero for anything but a reading
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.reading().map_or(0.0, |r| r.confidence)
    }
}

/// Everything learned from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Face used for sampling
    pub face: Option<FaceRegion>,
    /// Forehead region sampled
    pub roi: Option<Roi>,
    /// Sample added to the buffer
    pub sample: Option<Sample>,
    /// Estimator state after this frame
    pub state: EstimatorState,
    /// Current measurement
    pub measurement: Measurement,
}

impl FrameReport {
    /// Whether a face was found in this frame
    #[must_use]
    pub fn face_detected(&self) -> bool {
        self.face.is_some()
    }
}

/// rPPG heart rate estimator
pub struct HeartRateEstimator {
    config: EstimatorConfig,
    roi_config: RoiConfig,
    locator: FaceLocator,
    filter: BandpassFilter,
    buffer: SignalBuffer,
    smoother: Box<dyn BpmSmoother>,
    state: EstimatorState,
    latest: Option<Measurement>,
    required_samples: usize,
}

impl HeartRateEstimator {
    /// Create an estimator
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if either configuration is unusable
    pub fn new(
        config: EstimatorConfig,
        roi_config: RoiConfig,
        classifier: Box<dyn FaceClassifier>,
        smoother: Box<dyn BpmSmoother>,
    ) -> Result<Self> {
        config.validate()?;
        roi_config.validate()?;

        let filter = BandpassFilter::new(config.sample_rate_hz, config.lowcut_hz, config.highcut_hz)?;
        let buffer = SignalBuffer::new(config.buffer_size)?;
        let required_samples = config.required_samples();

        info!(
            "Heart rate estimator: {} samples at {} Hz, band {:.2}-{:.2} Hz, {} required, face classifier {}, smoother {}",
            config.buffer_size,
            config.sample_rate_hz,
            config.lowcut_hz,
            filter.highcut_hz(),
            required_samples,
            classifier.name(),
            smoother.name()
        );

        Ok(Self {
            config,
            roi_config,
            locator: FaceLocator::new(classifier),
            filter,
            buffer,
            smoother,
            state: EstimatorState::Empty,
            latest: None,
            required_samples,
        })
    }

    /// Create an estimator from the application configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or names an unknown smoother
    pub fn from_config(config: &Config, classifier: Box<dyn FaceClassifier>) -> Result<Self> {
        let smoother = config.create_smoother()?;
        Self::new(config.estimator.clone(), config.roi.clone(), classifier, smoother)
    }

    /// Process one video frame.
    ///
    /// Frames without a usable face leave the buffer and state untouched and
    /// report the most recent measurement.
    ///
    /// # Errors
    ///
    /// Returns an error only if the signal pipeline itself fails; per-frame
    /// detection and sampling problems are absorbed
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        let face = match self.locator.locate(frame) {
            Ok(face) => face,
            Err(Error::NoFaceDetected) => {
                debug!("No face at t={:.3}s", frame.timestamp());
                return Ok(self.report(None, None, None));
            }
            Err(e) => {
                warn!("Face detection failed at t={:.3}s: {e}", frame.timestamp());
                return Ok(self.report(None, None, None));
            }
        };

        let roi = derive_roi(&face, frame.width(), frame.height(), &self.roi_config);
        let Some(value) = mean_green(frame, &roi) else {
            warn!("ROI {roi:?} does not fit {}x{} frame", frame.width(), frame.height());
            return Ok(self.report(Some(face), Some(roi), None));
        };

        let sample = Sample::new(frame.timestamp(), value);
        if let Err(e) = self.buffer.push(sample) {
            warn!("Sample rejected: {e}");
            return Ok(self.report(Some(face), Some(roi), None));
        }

        self.update()?;
        Ok(self.report(Some(face), Some(roi), Some(sample)))
    }

    /// Process a sample taken by the caller, bypassing face location
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a non-finite sample or a timestamp
    /// that does not advance; the buffer is unchanged in that case
    pub fn process_sample(&mut self, sample: Sample) -> Result<Measurement> {
        self.buffer.push(sample)?;
        self.update()
    }

    /// Discard all buffered samples and smoother history
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.smoother.reset();
        self.latest = None;
        self.state = EstimatorState::Empty;
        info!("Heart rate estimator reset");
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> EstimatorState {
        self.state
    }

    /// Estimator configuration
    #[must_use]
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// ROI configuration
    #[must_use]
    pub fn roi_config(&self) -> &RoiConfig {
        &self.roi_config
    }

    /// Read-only view of the sample buffer
    #[must_use]
    pub fn buffer(&self) -> &SignalBuffer {
        &self.buffer
    }

    /// Most recent measurement, `None` before the first sample
    #[must_use]
    pub fn latest_measurement(&self) -> Option<&Measurement> {
        self.latest.as_ref()
    }

    /// Samples that must be buffered before estimating
    #[must_use]
    pub fn required_samples(&self) -> usize {
        self.required_samples
    }

    /// Name of the face classifier in use
    #[must_use]
    pub fn classifier_name(&self) -> &str {
        self.locator.classifier_name()
    }

    fn current_measurement(&self) -> Measurement {
        self.latest.unwrap_or(Measurement::InsufficientData {
            samples: self.buffer.len(),
            required: self.required_samples,
        })
    }

    fn report(&self, face: Option<FaceRegion>, roi: Option<Roi>, sample: Option<Sample>) -> FrameReport {
        FrameReport {
            face,
            roi,
            sample,
            state: self.state,
            measurement: self.current_measurement(),
        }
    }

    fn update(&mut self) -> Result<Measurement> {
        let samples = self.buffer.len();
        let next = if samples >= self.required_samples {
            EstimatorState::Ready
        } else if samples == 0 {
            EstimatorState::Empty
        } else {
            EstimatorState::Filling
        };
        if next != self.state {
            if next == EstimatorState::Ready {
                info!("Buffer holds {samples} samples, estimating heart rate");
            } else {
                debug!("Estimator state {:?} -> {next:?}", self.state);
            }
            self.state = next;
        }

        let insufficient = Measurement::InsufficientData {
            samples,
            required: self.required_samples,
        };
        let measurement = if self.state == EstimatorState::Ready {
            match self.analyze() {
                Ok(reading) => Measurement::Reading(reading),
                Err(Error::DegenerateSignal) => Measurement::DegenerateSignal {
                    timestamp: self.latest_timestamp(),
                    buffer_fill_ratio: self.buffer.fill_ratio(),
                },
                Err(Error::InsufficientData { required, .. }) => {
                    warn!("Analysis of {samples} samples needs {required}");
                    Measurement::InsufficientData { samples, required }
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Analysis failed: {e}");
                    insufficient
                }
                Err(e) => return Err(e),
            }
        } else {
            insufficient
        };

        self.latest = Some(measurement);
        Ok(measurement)
    }

    fn latest_timestamp(&self) -> f64 {
        self.buffer.latest().map_or(0.0, |s| s.timestamp)
    }

    fn analyze(&mut self) -> Result<HeartRateReading> {
        let timestamp = self.latest_timestamp();
        let fill_ratio = self.buffer.fill_ratio();

        let normalized = detrend(&self.buffer.values())?;
        let filtered = self.filter.apply(&normalized)?;
        let estimate = spectrum::estimate(
            &filtered,
            self.config.sample_rate_hz,
            self.filter.lowcut_hz(),
            self.filter.highcut_hz(),
            self.config.interpolate_peak,
        )?;

        if estimate.is_degenerate() {
            debug!("No in-band energy at t={timestamp:.3}s");
            return Err(Error::DegenerateSignal);
        }

        let bpm = estimate.bpm();
        let reading = HeartRateReading {
            bpm,
            smoothed_bpm: self.smoother.apply(bpm),
            confidence: confidence::score(&estimate, fill_ratio),
            timestamp,
            buffer_fill_ratio: fill_ratio,
            dominant_frequency_hz: estimate.dominant_frequency_hz,
        };
        debug!(
            "t={timestamp:.3}s: {:.1} BPM (smoothed {:.1}), confidence {:.2}",
            reading.bpm, reading.smoothed_bpm, reading.confidence
        );

        Ok(reading)
    }
}

/// Estimator handle that can be shared between a producer thread feeding
/// frames and consumers reading the latest measurement
#[derive(Clone)]
pub struct SharedHeartRateEstimator {
    inner: Arc<Mutex<HeartRateEstimator>>,
}

impl SharedHeartRateEstimator {
    /// Wrap an estimator for shared use
    #[must_use]
    pub fn new(estimator: HeartRateEstimator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HeartRateEstimator>> {
        self.inner
            .lock()
            .map_err(|e| Error::Concurrency(format!("Estimator lock poisoned: {e}")))
    }

    /// See [`HeartRateEstimator::process_frame`]
    ///
    /// # Errors
    ///
    /// Returns `Error::Concurrency` if the lock is poisoned, otherwise as
    /// [`HeartRateEstimator::process_frame`]
    pub fn process_frame(&self, frame: &Frame) -> Result<FrameReport> {
        self.lock()?.process_frame(frame)
    }

    /// See [`HeartRateEstimator::process_sample`]
    ///
    /// # Errors
    ///
    /// Returns `Error::Concurrency` if the lock is poisoned, otherwise as
    /// [`HeartRateEstimator::process_sample`]
    pub fn process_sample(&self, sample: Sample) -> Result<Measurement> {
        self.lock()?.process_sample(sample)
    }

    /// See [`HeartRateEstimator::reset`]
    ///
    /// # Errors
    ///
    /// Returns `Error::Concurrency` if the lock is poisoned
    pub fn reset(&self) -> Result<()> {
        self.lock()?.reset();
        Ok(())
    }

    /// Snapshot of the most recent measurement
    ///
    /// # Errors
    ///
    /// Returns `Error::Concurrency` if the lock is poisoned
    pub fn latest_measurement(&self) -> Result<Option<Measurement>> {
        Ok(self.lock()?.latest_measurement().copied())
    }

    /// Snapshot of the current state
    ///
    /// # Errors
    ///
    /// Returns `Error::Concurrency` if the lock is poisoned
    pub fn state(&self) -> Result<EstimatorState> {
        Ok(self.lock()?.state())
    }
}
