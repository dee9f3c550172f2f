//! End-to-end runs of the monitor over image sequences on disk

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vigil_core::{
    BoundingBox, CapabilityError, CapabilityResult, Detection, Detector, FailurePolicy, Frame,
    StopReason, ZoneDefinition,
};
use vigil_monitor::{ImageSequenceSource, Monitor, MonitorConfig, MonitorError, PrefetchSource};
use vigil_sensor::ModelArtifacts;

const FOREST: &str = r#"{
    "n_features": 5,
    "trees": [
        {
            "children_left":  [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature":        [1, -2, -2],
            "threshold":      [0.5, -2.0, -2.0],
            "value":          [[60.0, 40.0], [58.0, 1.0], [2.0, 39.0]]
        }
    ]
}"#;

const SCALER: &str = r#"{
    "mean_":  [0.3, 50.0, 0.25, 20.0, 11.5],
    "scale_": [0.45, 20.0, 0.43, 2.0, 6.9]
}"#;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

/// Sees a person near the bottom of every bright frame.
struct BrightMeansPerson;

impl Detector for BrightMeansPerson {
    fn detect(&self, frame: &Frame, category: &str, _min: f32) -> CapabilityResult<Vec<Detection>> {
        if frame.data.first().copied().unwrap_or(0) < 128 {
            return Ok(Vec::new());
        }
        Ok(vec![Detection::new(
            0,
            category,
            0.9,
            BoundingBox::new(20.0, 10.0, 40.0, 44.0),
        )])
    }
}

struct Broken;

impl Detector for Broken {
    fn detect(&self, _: &Frame, _: &str, _: f32) -> CapabilityResult<Vec<Detection>> {
        Err(CapabilityError::new("inference failed"))
    }
}

struct Fixture {
    dir: TempDir,
    frames: PathBuf,
    events: PathBuf,
}

impl Fixture {
    /// One frame per entry, bright where `true`.
    fn new(brightness: &[bool]) -> Self {
        let dir = TempDir::new().unwrap();
        let frames = dir.path().join("frames");
        fs::create_dir(&frames).unwrap();
        for (i, bright) in brightness.iter().enumerate() {
            let level = if *bright { 240 } else { 15 };
            image::RgbImage::from_pixel(WIDTH, HEIGHT, image::Rgb([level, level, level]))
                .save(frames.join(format!("frame_{:04}.png", i + 1)))
                .unwrap();
        }
        fs::write(dir.path().join("model_iot.json"), FOREST).unwrap();
        fs::write(dir.path().join("scaler.json"), SCALER).unwrap();
        let events = dir.path().join("results/events/fusion_events.jsonl");
        Self { dir, frames, events }
    }

    fn config(&self) -> MonitorConfig {
        let mut config = MonitorConfig {
            frames_dir: self.frames.clone(),
            cadence: 2,
            events_path: Some(self.events.clone()),
            ..Default::default()
        };
        config.sensor.model_path = self.dir.path().join("model_iot.json");
        config.sensor.scaler_path = self.dir.path().join("scaler.json");
        config.sensor.seed = Some(42);
        config.sensor.intrusion_rate = 0.0;
        config
    }

    fn monitor(&self, config: &MonitorConfig, detector: impl Detector + Send + 'static) -> Monitor {
        let artifacts =
            ModelArtifacts::load(&config.sensor.model_path, &config.sensor.scaler_path).unwrap();
        let source = PrefetchSource::spawn(ImageSequenceSource::open(&self.frames, 30.0).unwrap(), 2);
        Monitor::assemble(config, artifacts, detector, Box::new(source)).unwrap()
    }

    fn events(&self) -> Vec<serde_json::Value> {
        read_lines(&self.events)
    }
}

fn read_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn intruder_frames_raise_alert_and_are_recorded() {
    let fixture = Fixture::new(&[false, false, true, false]);
    let config = fixture.config();

    let summary = fixture.monitor(&config, BrightMeansPerson).run().unwrap();
    assert_eq!(summary.frames, 4);
    assert_eq!(summary.alert_frames, 1);
    assert_eq!(summary.sensor_samples, 2);
    assert_eq!(summary.stop_reason, Some(StopReason::SourceExhausted));

    let events = fixture.events();
    let alerts: Vec<bool> = events.iter().map(|e| e["alert"].as_bool().unwrap()).collect();
    assert_eq!(alerts, vec![false, false, true, false]);
    assert_eq!(events[2]["frame_index"], 3);
    assert_eq!(events[2]["intruders"].as_array().unwrap().len(), 1);
    assert_eq!(events[1]["sampled"], true);
    assert_eq!(events[2]["sampled"], false);
}

#[test]
fn corrupt_image_mid_sequence_is_skipped() {
    let fixture = Fixture::new(&[false, true, true, false]);
    fs::write(fixture.frames.join("frame_0003.png"), b"truncated upload").unwrap();
    let config = fixture.config();

    let summary = fixture.monitor(&config, BrightMeansPerson).run().unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.alert_frames, 1);
    assert_eq!(summary.stop_reason, Some(StopReason::SourceExhausted));

    let alerts: Vec<bool> = fixture
        .events()
        .iter()
        .map(|e| e["alert"].as_bool().unwrap())
        .collect();
    assert_eq!(alerts, vec![false, true, false]);
}

#[test]
fn corrupt_image_stops_the_run_when_failing_fast() {
    let fixture = Fixture::new(&[false, true, false]);
    fs::write(fixture.frames.join("frame_0002.png"), b"truncated upload").unwrap();
    let mut config = fixture.config();
    config.failure_policy = FailurePolicy::Propagate;

    let artifacts =
        ModelArtifacts::load(&config.sensor.model_path, &config.sensor.scaler_path).unwrap();
    let sequence = ImageSequenceSource::open(&fixture.frames, 30.0)
        .unwrap()
        .with_skip_unreadable(false);
    let source = PrefetchSource::spawn(sequence, 2);
    let monitor = Monitor::assemble(&config, artifacts, BrightMeansPerson, Box::new(source)).unwrap();

    let err = monitor.run().unwrap_err();
    assert!(matches!(err, MonitorError::Fusion(_)));
    assert!(err.to_string().contains("frame_0002.png"));
}

#[test]
fn person_above_custom_zone_is_not_an_alert() {
    let fixture = Fixture::new(&[true, true]);
    let mut config = fixture.config();
    // Top strip only; the person stands at y = 44
    config.zone = ZoneDefinition::Polygon {
        points: vec![[0.0, 0.0], [63.0, 0.0], [63.0, 20.0], [0.0, 20.0]],
    };

    let summary = fixture.monitor(&config, BrightMeansPerson).run().unwrap();
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.alert_frames, 0);
}

#[test]
fn sensor_intrusion_is_held_between_samples() {
    let fixture = Fixture::new(&[false; 5]);
    let mut config = fixture.config();
    config.sensor.intrusion_rate = 1.0;

    let summary = fixture.monitor(&config, BrightMeansPerson).run().unwrap();

    // Nothing sampled on frame 1, so only frames 2..=5 alert
    assert_eq!(summary.alert_frames, 4);
    let labels: Vec<u64> = fixture
        .events()
        .iter()
        .map(|e| e["sensor_label"].as_u64().unwrap())
        .collect();
    assert_eq!(labels, vec![0, 1, 1, 1, 1]);
}

#[test]
fn detector_failure_is_skipped_by_default() {
    let fixture = Fixture::new(&[true, true, true]);
    let config = fixture.config();

    let summary = fixture.monitor(&config, Broken).run().unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.degraded_frames, 3);
    assert_eq!(summary.alert_frames, 0);
    assert!(fixture.events().iter().all(|e| e["degraded"] == true));
}

#[test]
fn detector_failure_stops_the_run_when_failing_fast() {
    let fixture = Fixture::new(&[true, true]);
    let mut config = fixture.config();
    config.failure_policy = FailurePolicy::Propagate;

    let err = fixture.monitor(&config, Broken).run().unwrap_err();
    assert!(matches!(err, MonitorError::Fusion(_)));
    assert!(err.to_string().contains("inference failed"));
}

#[test]
fn cancelled_before_start_processes_nothing() {
    let fixture = Fixture::new(&[true, true]);
    let config = fixture.config();

    let monitor = fixture.monitor(&config, BrightMeansPerson);
    monitor.cancel_token().cancel();
    let summary = monitor.run().unwrap();

    assert_eq!(summary.frames, 0);
    assert_eq!(summary.stop_reason, Some(StopReason::Cancelled));
    assert!(fixture.events().is_empty());
}

#[test]
fn missing_sensor_model_fails_startup() {
    let fixture = Fixture::new(&[false]);
    let mut config = fixture.config();
    config.sensor.model_path = fixture.dir.path().join("missing.json");

    let err = Monitor::from_config(&config).err().unwrap();
    assert!(matches!(err, MonitorError::Artifact(_)));
}

#[test]
fn missing_detector_model_fails_startup() {
    let fixture = Fixture::new(&[false]);
    let mut config = fixture.config();
    config.detector.model_path = fixture.dir.path().join("missing.onnx");

    let err = Monitor::from_config(&config).err().unwrap();
    assert!(matches!(err, MonitorError::Engine(_)));
}

#[test]
fn zone_outside_frame_fails_startup() {
    let fixture = Fixture::new(&[false]);
    let mut config = fixture.config();
    config.zone = ZoneDefinition::Polygon {
        points: vec![[0.0, 0.0], [500.0, 0.0], [500.0, 500.0]],
    };

    let artifacts =
        ModelArtifacts::load(&config.sensor.model_path, &config.sensor.scaler_path).unwrap();
    let source = ImageSequenceSource::open(&fixture.frames, 30.0).unwrap();
    let err = Monitor::assemble(&config, artifacts, BrightMeansPerson, Box::new(source))
        .err()
        .unwrap();
    assert!(matches!(err, MonitorError::Fusion(_)));
}
