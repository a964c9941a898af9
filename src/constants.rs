//! Constants used throughout the application

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Default number of buffered samples (10 seconds at 30 fps)
pub const DEFAULT_BUFFER_SIZE: usize = 300;

/// Default lower edge of the heart rate band in Hz (48 BPM)
pub const DEFAULT_LOWCUT_HZ: f64 = 0.8;

/// Default upper edge of the heart rate band in Hz (180 BPM)
pub const DEFAULT_HIGHCUT_HZ: f64 = 3.0;

/// Default minimum buffer occupancy before estimates are produced
pub const DEFAULT_MIN_FILL_RATIO: f64 = 1.0;

/// Butterworth prototype order for the bandpass filter
pub const BUTTERWORTH_ORDER: usize = 4;

/// Fraction of the Nyquist frequency used when the upper cutoff must be clamped
pub const NYQUIST_CLAMP_FACTOR: f64 = 0.99;

/// Full cycles of the lowest band frequency required before estimating
pub const MIN_CYCLES_FOR_ESTIMATE: f64 = 2.0;

/// Seconds per minute, for Hz to BPM conversion
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Forehead band defaults as fractions of the face box
pub const DEFAULT_ROI_WIDTH_FRACTION: f64 = 0.5;
pub const DEFAULT_ROI_TOP_FRACTION: f64 = 0.1;
pub const DEFAULT_ROI_HEIGHT_FRACTION: f64 = 0.25;

/// Index of the green channel in both RGB and BGR pixel layouts
pub const GREEN_CHANNEL: usize = 1;

/// Haar cascade detection defaults
pub const DEFAULT_CASCADE_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_CASCADE_MIN_NEIGHBORS: i32 = 5;
pub const DEFAULT_CASCADE_MIN_SIZE: i32 = 100;

/// Default window sizes for BPM smoothers
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 50;
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;
pub const DEFAULT_HAMPEL_WINDOW: usize = 7;

/// Default smoother parameters
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.2;
pub const DEFAULT_HAMPEL_THRESHOLD: f64 = 3.0;

/// Scale factor turning a median absolute deviation into a standard deviation estimate
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
