//! Helper functions and utilities for tests
#![allow(dead_code)]

use heart_rate_estimation::{
    config::{EstimatorConfig, RoiConfig},
    face_detection::{FaceCandidate, FaceClassifier},
    smoothing::NoSmoothing,
    Frame, HeartRateEstimator, Result, Sample,
};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::VecDeque;
use std::f64::consts::PI;

pub const FPS: f64 = 30.0;

/// Gaussian noise source with a fixed seed
pub struct GaussianNoise {
    rng: StdRng,
    normal: Normal<f64>,
}

impl GaussianNoise {
    pub fn new(seed: u64, sigma: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            normal: Normal::new(0.0, sigma).unwrap(),
        }
    }

    pub fn sample(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}

/// Timestamp of sample `i` at the nominal frame rate
pub fn timestamp(i: usize) -> f64 {
    i as f64 / FPS
}

/// Green-channel trace of a pulse at `bpm` around a mid-grey baseline
pub fn pulse_trace(bpm: f64, amplitude: f64, n: usize) -> Vec<f64> {
    let freq = bpm / 60.0;
    (0..n)
        .map(|i| 128.0 + amplitude * (2.0 * PI * freq * timestamp(i)).sin())
        .collect()
}

/// Pulse trace with additive Gaussian noise
pub fn noisy_pulse_trace(bpm: f64, amplitude: f64, sigma: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut noise = GaussianNoise::new(seed, sigma);
    pulse_trace(bpm, amplitude, n)
        .into_iter()
        .map(|v| v + noise.sample())
        .collect()
}

/// Pure Gaussian noise around a mid-grey baseline
pub fn white_noise_trace(sigma: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut noise = GaussianNoise::new(seed, sigma);
    (0..n).map(|_| 128.0 + noise.sample()).collect()
}

/// Samples for a trace at the nominal frame rate
pub fn samples(trace: &[f64]) -> Vec<Sample> {
    trace
        .iter()
        .enumerate()
        .map(|(i, &v)| Sample::new(timestamp(i), v))
        .collect()
}

/// Frame with uniform colour whose green channel carries `green`
pub fn frame_with_green(width: usize, height: usize, green: f64, ts: f64) -> Result<Frame> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let g = green.round().clamp(0.0, 255.0) as u8;
    Frame::filled(width, height, [60, g, 150], ts)
}

/// Classifier that replays a scripted sequence of detections, then repeats the last one
pub struct ScriptedClassifier {
    script: VecDeque<Vec<FaceCandidate>>,
    last: Vec<FaceCandidate>,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Vec<FaceCandidate>>) -> Self {
        Self {
            script: script.into(),
            last: Vec::new(),
        }
    }
}

impl FaceClassifier for ScriptedClassifier {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceCandidate>> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last.clone())
    }

    fn name(&self) -> &str {
        "ScriptedClassifier"
    }
}

/// Face candidate helper
pub fn candidate(x: i32, y: i32, width: i32, height: i32) -> FaceCandidate {
    FaceCandidate {
        x,
        y,
        width,
        height,
        score: 1.0,
    }
}

/// Estimator with default signal settings and no smoothing
pub fn default_estimator(classifier: Box<dyn FaceClassifier>) -> Result<HeartRateEstimator> {
    HeartRateEstimator::new(
        EstimatorConfig::default(),
        RoiConfig::default(),
        classifier,
        Box::new(NoSmoothing),
    )
}
