//! End-to-end decision scenarios driven through the loop controller.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use vigil_core::{
    BoundingBox, CapabilityError, CapabilityResult, Detection, Detector, EveryNthFrame,
    FailurePolicy, Frame, FrameFormat, FrameReport, FrameSink, FrameSource, LoopController,
    Normalizer, SensorClassifier, SensorLabel, SensorSample, SensorSampler, SensorSignal,
    SensorState, StopReason, VisionSignal, Zone,
};

/// Returns canned detections keyed by frame timestamp.
struct Script(HashMap<u64, Vec<Detection>>);

impl Detector for Script {
    fn detect(&self, frame: &Frame, _: &str, _: f32) -> CapabilityResult<Vec<Detection>> {
        Ok(self.0.get(&frame.timestamp_us).cloned().unwrap_or_default())
    }
}

struct Replay(VecDeque<SensorSample>);

impl SensorSampler for Replay {
    fn draw_sample(&mut self) -> CapabilityResult<SensorSample> {
        self.0
            .pop_front()
            .ok_or_else(|| CapabilityError::new("sensor feed empty"))
    }
}

struct Raw;

impl Normalizer for Raw {
    fn normalize(&self, sample: &SensorSample) -> CapabilityResult<Vec<f64>> {
        Ok(sample.features().to_vec())
    }
}

/// Intrusion when motion is present and the room is loud.
struct MotionAndNoise;

impl SensorClassifier for MotionAndNoise {
    fn classify(&self, features: &[f64]) -> CapabilityResult<SensorLabel> {
        Ok(if features[0] == 1.0 && features[1] >= 70.0 {
            SensorLabel::Intrusion
        } else {
            SensorLabel::Normal
        })
    }
}

/// Frames numbered 1..=count via their timestamp.
struct Numbered {
    next: u64,
    count: u64,
}

impl Numbered {
    fn new(count: u64) -> Self {
        Self { next: 1, count }
    }
}

impl FrameSource for Numbered {
    fn next_frame(&mut self) -> CapabilityResult<Option<Frame>> {
        if self.next > self.count {
            return Ok(None);
        }
        let mut frame = Frame::blank(100, 100, FrameFormat::RGB8);
        frame.timestamp_us = self.next;
        self.next += 1;
        Ok(Some(frame))
    }
}

#[derive(Clone, Default)]
struct Collect(Arc<Mutex<Vec<FrameReport>>>);

impl FrameSink for Collect {
    fn emit(&mut self, _frame: &Frame, report: &FrameReport) -> CapabilityResult<()> {
        self.0.lock().unwrap().push(report.clone());
        Ok(())
    }
}

fn person_standing_at(x: f32, y: f32) -> Detection {
    Detection::new(0, "person", 0.8, BoundingBox::new(x - 10.0, y - 40.0, x + 10.0, y))
}

fn intruder_reading() -> SensorSample {
    SensorSample {
        motion: true,
        sound_level: 85.0,
        vibration: true,
        temperature: 20.5,
        hour: 23,
    }
}

fn quiet_reading() -> SensorSample {
    SensorSample {
        motion: false,
        sound_level: 40.0,
        vibration: false,
        temperature: 20.5,
        hour: 14,
    }
}

fn controller(detections: HashMap<u64, Vec<Detection>>, samples: Vec<SensorSample>) -> LoopController {
    LoopController::new(
        Zone::bottom_half(100, 100).unwrap(),
        VisionSignal::new(Script(detections)),
        SensorSignal::new(Replay(samples.into()), Raw, MotionAndNoise),
        EveryNthFrame::new(30).unwrap(),
    )
}

fn run(ctl: &mut LoopController, frames: u64) -> Vec<FrameReport> {
    let sink = Collect::default();
    let summary = ctl.run(&mut Numbered::new(frames), &mut sink.clone()).unwrap();
    assert_eq!(summary.stop_reason, Some(StopReason::SourceExhausted));
    let reports = sink.0.lock().unwrap().clone();
    reports
}

#[test]
fn intruder_inside_zone_raises_video_flag() {
    let detections = HashMap::from([(1, vec![person_standing_at(50.0, 80.0)])]);
    let mut ctl = controller(detections, vec![]);

    let reports = run(&mut ctl, 1);
    assert!(reports[0].result.video_flag);
    assert!(reports[0].result.alert);
    assert_eq!(reports[0].flagged.len(), 1);
}

#[test]
fn person_outside_zone_is_ignored() {
    let detections = HashMap::from([(1, vec![person_standing_at(50.0, 10.0)])]);
    let mut ctl = controller(detections, vec![]);

    let reports = run(&mut ctl, 1);
    assert!(!reports[0].result.video_flag);
    assert!(!reports[0].result.alert);
    assert!(reports[0].flagged.is_empty());
}

#[test]
fn sensor_label_is_sampled_on_cadence_and_held() {
    let mut ctl = controller(HashMap::new(), vec![intruder_reading(), quiet_reading()]);
    let reports = run(&mut ctl, 60);

    let frame = |n: usize| &reports[n - 1];

    assert_eq!(frame(29).sensor, SensorState::default());
    assert!(!frame(29).result.alert);

    assert!(frame(30).sampled);
    assert_eq!(frame(30).sensor.last_label, SensorLabel::Intrusion);
    assert_eq!(frame(30).sensor.last_sample, Some(intruder_reading()));

    for n in 31..=59 {
        assert!(!frame(n).sampled);
        assert_eq!(frame(n).sensor.last_label, SensorLabel::Intrusion, "frame {n}");
        assert!(frame(n).result.alert, "frame {n}");
    }

    assert!(frame(60).sampled);
    assert_eq!(frame(60).sensor.last_label, SensorLabel::Normal);
    assert!(!frame(60).result.alert);
}

#[test]
fn cached_sensor_alert_carries_over_quiet_video() {
    let detections = HashMap::from([(30, vec![person_standing_at(50.0, 80.0)])]);
    let mut ctl = controller(detections, vec![intruder_reading()]);
    let reports = run(&mut ctl, 31);

    let last = &reports[30];
    assert_eq!(last.frame_index, 31);
    assert!(!last.result.video_flag);
    assert_eq!(last.result.sensor_label, SensorLabel::Intrusion);
    assert!(last.result.alert);
}

#[test]
fn frames_are_reported_in_arrival_order() {
    let mut ctl = controller(HashMap::new(), vec![quiet_reading()]);
    let reports = run(&mut ctl, 45);

    let indices: Vec<u64> = reports.iter().map(|r| r.frame_index).collect();
    let expected: Vec<u64> = (1..=45).collect();
    assert_eq!(indices, expected);
}

#[test]
fn sensor_failure_keeps_previous_label_when_skipping() {
    // Feed holds a single reading, so the second sampling point fails
    let mut ctl = controller(HashMap::new(), vec![intruder_reading()])
        .with_failure_policy(FailurePolicy::SkipFrame);
    let reports = run(&mut ctl, 60);

    let at_60 = &reports[59];
    assert!(at_60.degraded);
    assert!(!at_60.sampled);
    assert_eq!(at_60.sensor.last_label, SensorLabel::Intrusion);
    assert_eq!(at_60.sensor.sampled_at, Some(30));
    assert_eq!(ctl.summary().degraded_frames, 1);
}
