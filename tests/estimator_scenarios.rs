//! End-to-end scenarios for the heart rate estimator

mod test_helpers;

use heart_rate_estimation::{
    config::{EstimatorConfig, RoiConfig},
    face_detection::FixedRegionClassifier,
    smoothing::{create_smoother, NoSmoothing},
    EstimatorState, HeartRateEstimator, Measurement, Sample, SharedHeartRateEstimator,
};
use std::thread;
use test_helpers::*;

fn feed(estimator: &mut HeartRateEstimator, trace: &[f64]) -> Measurement {
    let mut last = None;
    for sample in samples(trace) {
        last = Some(estimator.process_sample(sample).unwrap());
    }
    last.expect("trace must not be empty")
}

fn sample_estimator() -> HeartRateEstimator {
    default_estimator(Box::new(FixedRegionClassifier::new(0, 0, 10, 10))).unwrap()
}

#[test]
fn test_noisy_72_bpm_is_recovered() {
    // Amplitude 20 against sigma 4: SNR of about 11 dB
    let trace = noisy_pulse_trace(72.0, 20.0, 4.0, 300, 42);
    let mut estimator = sample_estimator();

    let measurement = feed(&mut estimator, &trace);
    let reading = measurement.reading().expect("full buffer should produce a reading");

    assert!(
        (70.0..=74.0).contains(&reading.bpm),
        "estimated {:.2} BPM",
        reading.bpm
    );
    assert!(reading.confidence >= 0.5, "confidence {:.3}", reading.confidence);
    assert_eq!(reading.buffer_fill_ratio, 1.0);
    assert_eq!(estimator.state(), EstimatorState::Ready);
}

#[test]
fn test_white_noise_has_low_confidence() {
    for seed in [1, 7, 99] {
        let trace = white_noise_trace(4.0, 300, seed);
        let mut estimator = sample_estimator();

        let measurement = feed(&mut estimator, &trace);
        assert!(
            measurement.confidence() <= 0.3,
            "seed {seed}: confidence {:.3}",
            measurement.confidence()
        );
    }
}

#[test]
fn test_partial_buffer_reports_insufficient_data() {
    let trace = pulse_trace(72.0, 20.0, 50);
    let mut estimator = sample_estimator();

    let measurement = feed(&mut estimator, &trace);
    assert_eq!(
        measurement,
        Measurement::InsufficientData {
            samples: 50,
            required: 300
        }
    );
    assert_eq!(measurement.confidence(), 0.0);
    assert_eq!(estimator.state(), EstimatorState::Filling);
}

#[test]
fn test_every_sample_below_threshold_is_insufficient() {
    let trace = pulse_trace(72.0, 20.0, 299);
    let mut estimator = sample_estimator();

    for sample in samples(&trace) {
        let measurement = estimator.process_sample(sample).unwrap();
        assert!(matches!(measurement, Measurement::InsufficientData { .. }));
    }
    assert!(estimator.process_sample(Sample::new(timestamp(299), 128.0)).unwrap().reading().is_some());
}

#[test]
fn test_reset_matches_fresh_estimator() {
    let mut used = sample_estimator();
    feed(&mut used, &noisy_pulse_trace(80.0, 10.0, 2.0, 320, 3));
    used.reset();

    let mut fresh = sample_estimator();

    let sample = Sample::new(0.0, 131.5);
    let from_used = used.process_sample(sample).unwrap();
    let from_fresh = fresh.process_sample(sample).unwrap();

    assert_eq!(from_used, from_fresh);
    assert_eq!(used.state(), fresh.state());
    assert_eq!(used.buffer().values(), fresh.buffer().values());
    assert_eq!(used.latest_measurement(), fresh.latest_measurement());
}

#[test]
fn test_lower_fill_threshold_scales_confidence() {
    let config = EstimatorConfig {
        min_fill_ratio: 0.5,
        ..EstimatorConfig::default()
    };
    let mut estimator = HeartRateEstimator::new(
        config,
        RoiConfig::default(),
        Box::new(FixedRegionClassifier::new(0, 0, 10, 10)),
        Box::new(NoSmoothing),
    )
    .unwrap();
    assert_eq!(estimator.required_samples(), 150);

    let measurement = feed(&mut estimator, &pulse_trace(72.0, 20.0, 150));
    let reading = measurement.reading().expect("half-full buffer should be enough");
    assert_eq!(reading.buffer_fill_ratio, 0.5);
    assert!(reading.confidence <= 0.5);
    assert!(reading.confidence > 0.25);
    assert!((reading.bpm - 72.0).abs() <= 12.0);
}

#[test]
fn test_frames_drive_the_pipeline() {
    let classifier = ScriptedClassifier::new(vec![vec![candidate(80, 40, 160, 160)]]);
    let mut estimator = default_estimator(Box::new(classifier)).unwrap();

    let trace = pulse_trace(72.0, 20.0, 300);
    let mut last = None;
    for (i, green) in trace.iter().enumerate() {
        let frame = frame_with_green(320, 240, *green, timestamp(i)).unwrap();
        let report = estimator.process_frame(&frame).unwrap();
        assert!(report.face_detected());
        let roi = report.roi.unwrap();
        assert!(roi.right() <= 320 && roi.bottom() <= 240);
        last = Some(report);
    }

    let report = last.unwrap();
    assert_eq!(report.state, EstimatorState::Ready);
    let reading = report.measurement.reading().unwrap();
    assert!((70.0..=74.0).contains(&reading.bpm), "estimated {:.2} BPM", reading.bpm);
}

#[test]
fn test_missing_face_does_not_touch_buffer() {
    let face = vec![candidate(80, 40, 160, 160)];
    let mut script: Vec<_> = (0..300).map(|_| face.clone()).collect();
    script.extend((0..5).map(|_| Vec::new()));
    let mut estimator = default_estimator(Box::new(ScriptedClassifier::new(script))).unwrap();

    let trace = pulse_trace(72.0, 20.0, 305);
    let mut ready_measurement = None;
    for (i, green) in trace.iter().enumerate() {
        let frame = frame_with_green(320, 240, *green, timestamp(i)).unwrap();
        let report = estimator.process_frame(&frame).unwrap();

        if i < 300 {
            ready_measurement = Some(report.measurement);
            continue;
        }

        assert!(!report.face_detected());
        assert!(report.sample.is_none());
        assert_eq!(report.state, EstimatorState::Ready);
        assert_eq!(Some(report.measurement), ready_measurement);
        assert_eq!(estimator.buffer().len(), 300);
        assert_eq!(estimator.buffer().latest().unwrap().timestamp, timestamp(299));
    }
}

#[test]
fn test_smoothed_bpm_follows_configured_smoother() {
    let mut estimator = HeartRateEstimator::new(
        EstimatorConfig::default(),
        RoiConfig::default(),
        Box::new(FixedRegionClassifier::new(0, 0, 10, 10)),
        create_smoother("moving_average:50").unwrap(),
    )
    .unwrap();

    let trace = pulse_trace(72.0, 20.0, 400);
    let mut readings = Vec::new();
    for sample in samples(&trace) {
        if let Measurement::Reading(reading) = estimator.process_sample(sample).unwrap() {
            readings.push(reading);
        }
    }

    assert_eq!(readings.len(), 101);
    let first = readings[0];
    assert_eq!(first.smoothed_bpm, first.bpm);

    let window = &readings[readings.len() - 50..];
    let mean = window.iter().map(|r| r.bpm).sum::<f64>() / 50.0;
    let last = readings[readings.len() - 1];
    assert!((last.smoothed_bpm - mean).abs() < 1e-9);
}

#[test]
fn test_shared_estimator_across_threads() {
    let shared = SharedHeartRateEstimator::new(sample_estimator());
    let producer = shared.clone();

    let handle = thread::spawn(move || {
        for sample in samples(&pulse_trace(72.0, 20.0, 300)) {
            producer.process_sample(sample).unwrap();
        }
    });

    // Readers only ever see whole measurements
    let mut seen_samples = 0;
    while !handle.is_finished() {
        if let Some(Measurement::InsufficientData { samples, required }) = shared.latest_measurement().unwrap() {
            assert!(samples >= seen_samples);
            assert_eq!(required, 300);
            seen_samples = samples;
        }
        thread::yield_now();
    }
    handle.join().unwrap();

    assert_eq!(shared.state().unwrap(), EstimatorState::Ready);
    let measurement = shared.latest_measurement().unwrap().unwrap();
    assert!((measurement.bpm().unwrap() - 72.0).abs() <= 2.0);

    shared.reset().unwrap();
    assert_eq!(shared.state().unwrap(), EstimatorState::Empty);
    assert!(shared.latest_measurement().unwrap().is_none());
}

#[test]
fn test_bpm_follows_configured_sample_rate() {
    // 72 BPM filmed at 25 fps, timestamped by frame index
    let fs = 25.0;
    let trace: Vec<Sample> = (0..250)
        .map(|i| {
            let t = i as f64 / fs;
            Sample::new(t, 128.0 + 20.0 * (2.0 * std::f64::consts::PI * 1.2 * t).sin())
        })
        .collect();

    let mut config = EstimatorConfig {
        buffer_size: 250,
        ..EstimatorConfig::default()
    };
    assert!(config.adopt_source_rate(fs));

    let mut estimator = HeartRateEstimator::new(
        config,
        RoiConfig::default(),
        Box::new(FixedRegionClassifier::new(0, 0, 10, 10)),
        Box::new(NoSmoothing),
    )
    .unwrap();

    let mut last = None;
    for sample in trace {
        last = Some(estimator.process_sample(sample).unwrap());
    }
    let reading = *last.unwrap().reading().expect("full buffer should produce a reading");
    assert!((reading.bpm - 72.0).abs() <= 1.0, "estimated {:.2} BPM", reading.bpm);
    assert!((reading.dominant_frequency_hz - 1.2).abs() <= 0.02);
}
