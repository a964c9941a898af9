//! Heart rate monitor: remote photoplethysmography from a webcam or video file.

use anyhow::{Context, Result};
use clap::Parser;
use heart_rate_estimation::app::{AppConfig, GuiMode, HeartRateApp, VideoSource};
use heart_rate_estimation::config::Config;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Video file to process
    #[arg(short, long)]
    video: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Haar cascade XML file for face detection
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Number of samples in the analysis window
    #[arg(short, long)]
    buffer_size: Option<usize>,

    /// Sample rate in Hz (default: the rate the video source reports)
    #[arg(long)]
    fps: Option<f64>,

    /// BPM smoother (none, moving_average:N, median:N, exponential:A, hampel:N:T)
    #[arg(short, long)]
    smoother: Option<String>,

    /// GUI display mode (window, none)
    #[arg(short, long)]
    gui: Option<String>,

    /// Mirror the image horizontally
    #[arg(long)]
    flip: Option<bool>,

    /// Write the example configuration to stdout and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{}", heart_rate_estimation::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    info!("Heart Rate Estimation");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Command line overrides the file
    if let Some(cascade) = args.cascade {
        config.face_detection.cascade_path = cascade;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.estimator.buffer_size = buffer_size;
    }
    let use_source_fps = args.fps.is_none();
    if let Some(fps) = args.fps {
        config.estimator.sample_rate_hz = fps;
    }
    if let Some(smoother) = args.smoother {
        config.smoothing.smoother = smoother;
    }
    if let Some(gui) = args.gui {
        config.display.gui_mode = gui;
    }
    if let Some(flip) = args.flip {
        config.display.flip_x = flip;
    }

    config.validate().context("Invalid configuration")?;

    let app_config = AppConfig {
        video_source: if let Some(video_path) = args.video {
            VideoSource::File(video_path)
        } else {
            VideoSource::Camera(args.cam)
        },
        gui_mode: GuiMode::from_name(&config.display.gui_mode),
        flip_x: config.display.flip_x,
        show_face: config.display.show_face,
        window_title: config.display.window_title.clone(),
        use_source_fps,
    };

    let mut app = HeartRateApp::new(app_config, &config).context("Failed to start heart rate monitor")?;
    app.run()?;

    Ok(())
}
