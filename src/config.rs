//! Configuration management for the heart rate estimation application

use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_CASCADE_MIN_NEIGHBORS, DEFAULT_CASCADE_MIN_SIZE, DEFAULT_CASCADE_SCALE_FACTOR,
    DEFAULT_FPS, DEFAULT_HIGHCUT_HZ, DEFAULT_LOWCUT_HZ, DEFAULT_MIN_FILL_RATIO, DEFAULT_MOVING_AVERAGE_WINDOW,
    DEFAULT_ROI_HEIGHT_FRACTION, DEFAULT_ROI_TOP_FRACTION, DEFAULT_ROI_WIDTH_FRACTION,
};
use crate::dsp::bandpass::effective_highcut;
use crate::dsp::spectrum::{band_bins, min_samples_for};
use crate::smoothing::BpmSmoother;
use crate::utils::safe_cast::{f64_to_usize_clamp, usize_to_f64};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Signal processing configuration
    pub estimator: EstimatorConfig,

    /// Forehead region configuration
    pub roi: RoiConfig,

    /// Face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// BPM smoothing configuration
    pub smoothing: SmoothingConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Construction-time parameters of the heart rate estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Rolling buffer capacity in samples
    pub buffer_size: usize,

    /// Nominal frame rate of the source in Hz
    pub sample_rate_hz: f64,

    /// Lower edge of the heart rate band in Hz
    pub lowcut_hz: f64,

    /// Upper edge of the heart rate band in Hz, clamped below Nyquist
    pub highcut_hz: f64,

    /// Buffer occupancy required before estimating (0.0-1.0]
    pub min_fill_ratio: f64,

    /// Refine the spectral peak with parabolic interpolation
    pub interpolate_peak: bool,
}

/// Forehead band as fractions of the face box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Band width relative to the face width, centred horizontally
    pub width_fraction: f64,

    /// Offset of the band's top edge below the face's top edge, relative to face height
    pub top_fraction: f64,

    /// Band height relative to the face height
    pub height_fraction: f64,
}

/// Haar cascade face detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Path to the `OpenCV` cascade XML file
    pub cascade_path: PathBuf,

    /// Image pyramid scale step (> 1.0)
    pub scale_factor: f64,

    /// Neighbouring detections required to keep a candidate
    pub min_neighbors: i32,

    /// Minimum face size in pixels
    pub min_size: i32,
}

/// BPM smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Smoother spec, e.g. `moving_average:50`, `median:5`, `exponential:0.2`,
    /// `hampel:7:3.0` or `none`
    pub smoother: String,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// GUI mode: `window` or `none`
    pub gui_mode: String,

    /// Window title
    pub window_title: String,

    /// Flip image horizontally
    pub flip_x: bool,

    /// Draw the face rectangle as well as the ROI
    pub show_face: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            sample_rate_hz: DEFAULT_FPS,
            lowcut_hz: DEFAULT_LOWCUT_HZ,
            highcut_hz: DEFAULT_HIGHCUT_HZ,
            min_fill_ratio: DEFAULT_MIN_FILL_RATIO,
            interpolate_peak: true,
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            width_fraction: DEFAULT_ROI_WIDTH_FRACTION,
            top_fraction: DEFAULT_ROI_TOP_FRACTION,
            height_fraction: DEFAULT_ROI_HEIGHT_FRACTION,
        }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            cascade_path: PathBuf::from("assets/haarcascade_frontalface_default.xml"),
            scale_factor: DEFAULT_CASCADE_SCALE_FACTOR,
            min_neighbors: DEFAULT_CASCADE_MIN_NEIGHBORS,
            min_size: DEFAULT_CASCADE_MIN_SIZE,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            smoother: format!("moving_average:{DEFAULT_MOVING_AVERAGE_WINDOW}"),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            gui_mode: "window".to_string(),
            window_title: "Heart Rate Monitor".to_string(),
            flip_x: true,
            show_face: true,
        }
    }
}

impl EstimatorConfig {
    /// Upper band edge actually used, after clamping below Nyquist
    #[must_use]
    pub fn effective_highcut(&self) -> f64 {
        effective_highcut(self.sample_rate_hz, self.highcut_hz)
    }

    /// Samples needed for two full cycles of the lowest band frequency
    #[must_use]
    pub fn spectral_min_samples(&self) -> usize {
        min_samples_for(self.sample_rate_hz, self.lowcut_hz)
    }

    /// Samples that must be buffered before an estimate is attempted
    #[must_use]
    pub fn required_samples(&self) -> usize {
        let by_fill = f64_to_usize_clamp(
            (self.min_fill_ratio * usize_to_f64(self.buffer_size)).ceil(),
            1,
            self.buffer_size.max(1),
        );
        by_fill.max(self.spectral_min_samples())
    }

    /// Validate estimator parameters
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` describing the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfiguration(
                "Buffer size must be greater than 0".to_string(),
            ));
        }
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Sample rate must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if !self.lowcut_hz.is_finite() || self.lowcut_hz <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Low cutoff must be positive, got {}",
                self.lowcut_hz
            )));
        }
        if !self.highcut_hz.is_finite() || self.highcut_hz <= self.lowcut_hz {
            return Err(Error::InvalidConfiguration(format!(
                "High cutoff {} must exceed low cutoff {}",
                self.highcut_hz, self.lowcut_hz
            )));
        }
        let highcut = self.effective_highcut();
        if self.lowcut_hz >= highcut {
            return Err(Error::InvalidConfiguration(format!(
                "Low cutoff {} is not below the usable high cutoff {highcut:.3} at {} Hz",
                self.lowcut_hz, self.sample_rate_hz
            )));
        }
        if !(self.min_fill_ratio > 0.0 && self.min_fill_ratio <= 1.0) {
            return Err(Error::InvalidConfiguration(
                "Minimum fill ratio must be in (0.0, 1.0]".to_string(),
            ));
        }
        let spectral_min = self.spectral_min_samples();
        if spectral_min > self.buffer_size {
            return Err(Error::InvalidConfiguration(format!(
                "Buffer of {} samples cannot hold the {spectral_min} needed for {} Hz at {} Hz",
                self.buffer_size, self.lowcut_hz, self.sample_rate_hz
            )));
        }
        // Every window length the estimator analyses must resolve the band
        for n in self.required_samples()..=self.buffer_size {
            if band_bins(n, self.sample_rate_hz, self.lowcut_hz, highcut).is_none() {
                return Err(Error::InvalidConfiguration(format!(
                    "No frequency bin of a {n}-sample window at {} Hz falls inside {}-{highcut:.3} Hz",
                    self.sample_rate_hz, self.lowcut_hz
                )));
            }
        }
        Ok(())
    }

    /// Use the frame rate reported by a video source as the sample rate.
    ///
    /// Non-finite or non-positive rates (sources that do not know their rate)
    /// are ignored. Returns whether the sample rate changed.
    pub fn adopt_source_rate(&mut self, reported_fps: f64) -> bool {
        if !reported_fps.is_finite() || reported_fps <= 0.0 {
            return false;
        }
        if (reported_fps - self.sample_rate_hz).abs() <= f64::EPSILON {
            return false;
        }
        self.sample_rate_hz = reported_fps;
        true
    }
}

impl RoiConfig {
    /// Validate ROI fractions
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if a fraction is not finite or
    /// the band would have no extent
    pub fn validate(&self) -> Result<()> {
        if !(self.width_fraction.is_finite() && self.top_fraction.is_finite() && self.height_fraction.is_finite()) {
            return Err(Error::InvalidConfiguration("ROI fractions must be finite".to_string()));
        }
        if self.width_fraction <= 0.0 || self.height_fraction <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "ROI width and height fractions must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the configured BPM smoother
    ///
    /// # Errors
    ///
    /// Returns an error if the smoother spec is unknown or malformed
    pub fn create_smoother(&self) -> Result<Box<dyn BpmSmoother>> {
        crate::smoothing::create_smoother(&self.smoothing.smoother)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        self.estimator.validate()?;
        self.roi.validate()?;

        if self.face_detection.scale_factor <= 1.0 {
            return Err(Error::ConfigError(
                "Cascade scale factor must be greater than 1.0".to_string(),
            ));
        }
        if self.face_detection.min_neighbors < 0 {
            return Err(Error::ConfigError(
                "Cascade min neighbors must not be negative".to_string(),
            ));
        }
        if self.face_detection.min_size < 0 {
            return Err(Error::ConfigError("Cascade min size must not be negative".to_string()));
        }

        // Fail early on a bad smoother spec rather than at startup of the loop
        self.create_smoother()?;

        if !matches!(self.display.gui_mode.as_str(), "window" | "none") {
            return Err(Error::ConfigError(format!(
                "GUI mode must be 'window' or 'none', got '{}'",
                self.display.gui_mode
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Heart Rate Estimation Configuration

# Signal processing
estimator:
  buffer_size: 300
  sample_rate_hz: 30.0
  lowcut_hz: 0.8
  highcut_hz: 3.0
  min_fill_ratio: 1.0
  interpolate_peak: true

# Forehead band, as fractions of the face box
roi:
  width_fraction: 0.5
  top_fraction: 0.1
  height_fraction: 0.25

# Haar cascade parameters
face_detection:
  cascade_path: "assets/haarcascade_frontalface_default.xml"
  scale_factor: 1.1
  min_neighbors: 5
  min_size: 100

# Smoothing of successive BPM readings
smoothing:
  smoother: "moving_average:50"

# Display settings
display:
  gui_mode: "window"
  window_title: "Heart Rate Monitor"
  flip_x: true
  show_face: true
"#;
