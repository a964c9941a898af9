//! Main application module for heart rate monitoring from a camera or video file.

use crate::{
    config::Config,
    error::Result,
    estimator::{FrameReport, HeartRateEstimator, Measurement},
    face_detection::HaarCascadeClassifier,
    statistics::SessionStatistics,
    utils::{image_conversion::mat_to_frame, safe_cast::{f64_to_i32, usize_to_i32}},
};
use log::{info, warn};
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FPS},
};
use std::time::{Duration, Instant};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera index or video file path
    pub video_source: VideoSource,
    /// GUI display mode
    pub gui_mode: GuiMode,
    /// Mirror the image horizontally
    pub flip_x: bool,
    /// Draw the face rectangle as well as the ROI
    pub show_face: bool,
    /// Window title
    pub window_title: String,
    /// Take the sample rate from the video source when it reports one
    pub use_source_fps: bool,
}

/// Video source type
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMode {
    /// Annotated camera window
    Window,
    /// No GUI (headless), readings are logged
    None,
}

impl GuiMode {
    /// Parse a mode name, defaulting to a window for unknown names
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "none" => Self::None,
            _ => Self::Window,
        }
    }
}

/// Main application struct
pub struct HeartRateApp {
    config: AppConfig,
    estimator: HeartRateEstimator,
    video_capture: VideoCapture,
    source_fps: f64,
    session: SessionStatistics,
}

const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const CYAN: (f64, f64, f64) = (255.0, 255.0, 0.0);
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

fn color((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

impl HeartRateApp {
    /// Create a new heart rate monitoring application
    ///
    /// # Errors
    ///
    /// Returns an error if the video source cannot be opened, the cascade
    /// cannot be loaded or the configuration is invalid
    pub fn new(app_config: AppConfig, config: &Config) -> Result<Self> {
        info!("Initializing heart rate monitor");

        let video_capture = match &app_config.video_source {
            VideoSource::Camera(index) => {
                info!("Opening camera {index}");
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;

                // Reduce buffer size for lower latency (webcam only)
                cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {path}");
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
        };
        if !video_capture.is_opened()? {
            return Err(crate::Error::InvalidConfiguration(format!(
                "Could not open video source {:?}",
                app_config.video_source
            )));
        }

        let mut config = config.clone();
        let reported_fps = video_capture.get(CAP_PROP_FPS)?;
        if app_config.use_source_fps {
            if config.estimator.adopt_source_rate(reported_fps) {
                info!("Sampling at the source rate of {reported_fps:.2} fps");
            }
        } else if reported_fps.is_finite() && (reported_fps - config.estimator.sample_rate_hz).abs() > 1.0 {
            warn!(
                "Source reports {reported_fps:.1} fps but the estimator assumes {:.1} Hz",
                config.estimator.sample_rate_hz
            );
        }
        let source_fps = config.estimator.sample_rate_hz;

        let face_config = &config.face_detection;
        let classifier = HaarCascadeClassifier::new(
            &face_config.cascade_path,
            face_config.scale_factor,
            face_config.min_neighbors,
            face_config.min_size,
        )?;
        let estimator = HeartRateEstimator::from_config(&config, Box::new(classifier))?;

        if app_config.gui_mode == GuiMode::Window {
            highgui::named_window(&app_config.window_title, WINDOW_NORMAL)?;
        }

        Ok(Self {
            config: app_config,
            estimator,
            video_capture,
            source_fps,
            session: SessionStatistics::new(),
        })
    }

    /// Run the main application loop until the source ends or the user quits
    ///
    /// # Errors
    ///
    /// Returns an error if frame capture, conversion or display fails
    pub fn run(&mut self) -> Result<()> {
        info!("Starting main application loop");
        if self.config.gui_mode == GuiMode::Window {
            info!("Press 'r' to reset the measurement, 'q' or Esc to quit");
        }

        let is_file = matches!(self.config.video_source, VideoSource::File(_));
        let start_time = Instant::now();
        let mut last_log = Instant::now();
        let mut frame_count: u32 = 0;

        loop {
            let mut frame = Mat::default();
            if !self.video_capture.read(&mut frame)? || frame.empty() {
                if is_file {
                    info!("End of video file reached");
                    break;
                }
                warn!("Failed to read frame, retrying...");
                continue;
            }

            if self.config.flip_x {
                let temp = frame.clone();
                opencv::core::flip(&temp, &mut frame, 1)?;
            }

            // Files are timed by frame index so processing speed does not matter
            let timestamp = if is_file {
                f64::from(frame_count) / self.source_fps
            } else {
                start_time.elapsed().as_secs_f64()
            };
            frame_count += 1;

            let report = self.estimator.process_frame(&mat_to_frame(&frame, timestamp)?)?;
            if report.sample.is_some() {
                if let Measurement::Reading(reading) = report.measurement {
                    self.session.record(&reading);
                }
            }

            if last_log.elapsed() >= Duration::from_secs(1) {
                self.log_status(&report);
                last_log = Instant::now();
            }

            if self.config.gui_mode == GuiMode::Window {
                self.draw(&mut frame, &report)?;
                highgui::imshow(&self.config.window_title, &frame)?;

                let key = highgui::wait_key(1)?;
                if key == 27 || key == i32::from(b'q') {
                    info!("Exit requested by user");
                    break;
                }
                if key == i32::from(b'r') {
                    self.estimator.reset();
                }
            }
        }

        self.log_summary();
        info!("Application shutting down");
        Ok(())
    }

    /// Session statistics collected so far
    #[must_use]
    pub fn session(&self) -> &SessionStatistics {
        &self.session
    }

    fn log_status(&self, report: &FrameReport) {
        match report.measurement {
            Measurement::Reading(reading) => info!(
                "Heart rate {:.1} BPM (smoothed {:.1}), confidence {:.2}",
                reading.bpm, reading.smoothed_bpm, reading.confidence
            ),
            Measurement::InsufficientData { samples, required } => {
                info!("Collecting samples: {samples}/{required}");
            }
            Measurement::DegenerateSignal { .. } => warn!("Signal is flat, check lighting and ROI"),
        }
        if !report.face_detected() {
            info!("No face detected");
        }
    }

    fn log_summary(&self) {
        match self.session.bpm() {
            Some(stats) => {
                info!("Session summary over {} readings:", stats.count);
                info!("  Mean HR:   {:.1} BPM", stats.mean);
                info!("  Median HR: {:.1} BPM", stats.median);
                info!("  Std dev:   {:.1} BPM", stats.std_dev);
                info!("  Range:     {:.1}-{:.1} BPM", stats.min, stats.max);
                if let Some(confidence) = self.session.mean_confidence() {
                    info!("  Mean confidence: {confidence:.2}");
                }
            }
            None => info!("No heart rate readings were produced"),
        }
    }

    fn draw(&self, frame: &mut Mat, report: &FrameReport) -> Result<()> {
        if self.config.show_face {
            if let Some(face) = report.face {
                let rect = Rect::new(
                    usize_to_i32(face.x)?,
                    usize_to_i32(face.y)?,
                    usize_to_i32(face.width)?,
                    usize_to_i32(face.height)?,
                );
                imgproc::rectangle(frame, rect, color(GREEN), 2, LINE_8, 0)?;
            }
        }
        if let Some(roi) = report.roi {
            let rect = Rect::new(
                usize_to_i32(roi.x)?,
                usize_to_i32(roi.y)?,
                usize_to_i32(roi.width)?,
                usize_to_i32(roi.height)?,
            );
            imgproc::rectangle(frame, rect, color(CYAN), 2, LINE_8, 0)?;
        }

        let (headline, headline_color) = match report.measurement {
            Measurement::Reading(reading) => (
                format!("HR: {:.1} BPM (avg {:.1})", reading.bpm, reading.smoothed_bpm),
                GREEN,
            ),
            Measurement::InsufficientData { samples, required } => {
                (format!("Collecting data... {samples}/{required}"), WHITE)
            }
            Measurement::DegenerateSignal { .. } => ("Signal too flat".to_string(), RED),
        };
        Self::text(frame, &headline, 10, 30, headline_color)?;
        Self::text(
            frame,
            &format!("Confidence: {:.2}", report.measurement.confidence()),
            10,
            60,
            WHITE,
        )?;
        if !report.face_detected() {
            Self::text(frame, "No face detected", 10, 90, RED)?;
        }

        self.draw_fill_bar(frame)
    }

    fn draw_fill_bar(&self, frame: &mut Mat) -> Result<()> {
        const BAR_WIDTH: i32 = 200;
        const BAR_HEIGHT: i32 = 20;

        let x = 10;
        let y = (frame.rows() - BAR_HEIGHT - 10).max(0);
        imgproc::rectangle(
            frame,
            Rect::new(x, y, BAR_WIDTH, BAR_HEIGHT),
            color(WHITE),
            1,
            LINE_8,
            0,
        )?;

        let fill = self.estimator.buffer().fill_ratio().clamp(0.0, 1.0);
        let filled = f64_to_i32(f64::from(BAR_WIDTH) * fill)?;
        if filled > 0 {
            imgproc::rectangle(
                frame,
                Rect::new(x, y, filled, BAR_HEIGHT),
                color(GREEN),
                -1,
                LINE_8,
                0,
            )?;
        }

        if let Some(rate) = self.estimator.buffer().observed_sample_rate() {
            Self::text(frame, &format!("{rate:.1} Hz"), x + BAR_WIDTH + 10, y + 15, WHITE)?;
        }
        Ok(())
    }

    fn text(frame: &mut Mat, text: &str, x: i32, y: i32, rgb: (f64, f64, f64)) -> Result<()> {
        imgproc::put_text(
            frame,
            text,
            Point::new(x, y),
            FONT_HERSHEY_SIMPLEX,
            0.7,
            color(rgb),
            2,
            LINE_8,
            false,
        )?;
        Ok(())
    }
}
