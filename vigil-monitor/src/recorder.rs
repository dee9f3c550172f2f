//! Alert event log.
//!
//! Writes one JSON object per processed frame and logs alert transitions.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};
use vigil_core::{
    BoundingBox, CapabilityError, CapabilityResult, Frame, FrameReport, FrameSink, SensorLabel,
};

use crate::error::{MonitorError, Result};

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Wall-clock time the decision was recorded (RFC 3339, UTC)
    pub timestamp: String,
    pub frame_index: u64,
    pub alert: bool,
    pub video_flag: bool,
    pub sensor_label: SensorLabel,
    /// Sound level of the held sensor sample, if any sample was taken yet
    pub sound_level: Option<f64>,
    pub sampled: bool,
    pub degraded: bool,
    /// Boxes of the detections standing inside the zone
    pub intruders: Vec<BoundingBox>,
}

impl EventRecord {
    pub fn from_report(report: &FrameReport) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            frame_index: report.frame_index,
            alert: report.result.alert,
            video_flag: report.result.video_flag,
            sensor_label: report.result.sensor_label,
            sound_level: report.sensor.last_sample.map(|s| s.sound_level),
            sampled: report.sampled,
            degraded: report.degraded,
            intruders: report.flagged.iter().map(|d| d.bbox).collect(),
        }
    }
}

/// [`FrameSink`] that appends an [`EventRecord`] per frame to a writer.
pub struct EventRecorder<W: Write> {
    out: W,
    alert_active: bool,
    records: u64,
}

impl EventRecorder<BufWriter<File>> {
    /// Create (or truncate) the log file, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MonitorError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| MonitorError::io(path, e))?;
        info!(path = %path.display(), "recording events");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl EventRecorder<io::Sink> {
    /// Logs alert transitions without writing records anywhere.
    pub fn discard() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> EventRecorder<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            alert_active: false,
            records: 0,
        }
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn alert_active(&self) -> bool {
        self.alert_active
    }

    /// Erase the writer type so file and discarding recorders share one type.
    pub fn boxed(self) -> EventRecorder<Box<dyn Write + Send>>
    where
        W: Send + 'static,
    {
        EventRecorder {
            out: Box::new(self.out),
            alert_active: self.alert_active,
            records: self.records,
        }
    }

    /// Flush buffered records and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn track_transition(&mut self, report: &FrameReport) {
        let alert = report.result.alert;
        if alert == self.alert_active {
            return;
        }
        self.alert_active = alert;

        if alert {
            warn!(
                frame = report.frame_index,
                video = report.result.video_flag,
                sensor = %report.result.sensor_label,
                intruders = report.flagged.len(),
                "alert raised"
            );
        } else {
            info!(frame = report.frame_index, "alert cleared");
        }
    }
}

impl<W: Write> FrameSink for EventRecorder<W> {
    fn emit(&mut self, _frame: &Frame, report: &FrameReport) -> CapabilityResult<()> {
        self.track_transition(report);

        let record = EventRecord::from_report(report);
        serde_json::to_writer(&mut self.out, &record).map_err(CapabilityError::from_err)?;
        self.out.write_all(b"\n").map_err(CapabilityError::from_err)?;
        self.records += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vigil_core::{fuse, Detection, FrameFormat, SensorSample, SensorState};

    fn report(frame_index: u64, video_flag: bool, label: SensorLabel) -> FrameReport {
        let flagged = if video_flag {
            vec![Detection::new(
                0,
                "person",
                0.9,
                BoundingBox::new(10.0, 20.0, 30.0, 60.0),
            )]
        } else {
            Vec::new()
        };
        FrameReport {
            frame_index,
            result: fuse(video_flag, label),
            flagged,
            sensor: SensorState {
                last_label: label,
                last_sample: Some(SensorSample {
                    motion: false,
                    sound_level: 42.0,
                    vibration: false,
                    temperature: 20.5,
                    hour: 14,
                }),
                sampled_at: Some(1),
            },
            sampled: frame_index == 1,
            degraded: false,
        }
    }

    #[test]
    fn test_one_json_line_per_frame() {
        let frame = Frame::blank(4, 4, FrameFormat::RGB8);
        let mut recorder = EventRecorder::new(Vec::new());

        recorder.emit(&frame, &report(1, false, SensorLabel::Normal)).unwrap();
        recorder.emit(&frame, &report(2, true, SensorLabel::Normal)).unwrap();
        recorder.emit(&frame, &report(3, false, SensorLabel::Intrusion)).unwrap();
        assert_eq!(recorder.records(), 3);

        let bytes = recorder.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["alert"], false);
        assert_eq!(lines[0]["sampled"], true);
        assert_eq!(lines[1]["alert"], true);
        assert_eq!(lines[1]["video_flag"], true);
        assert_eq!(lines[1]["intruders"][0]["y2"], 60.0);
        assert_eq!(lines[2]["sensor_label"], 1);
        assert_eq!(lines[2]["sound_level"], 42.0);
        assert!(lines[2]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_tracks_alert_transitions() {
        let frame = Frame::blank(4, 4, FrameFormat::RGB8);
        let mut recorder = EventRecorder::discard();

        recorder.emit(&frame, &report(1, true, SensorLabel::Normal)).unwrap();
        assert!(recorder.alert_active());
        recorder.emit(&frame, &report(2, false, SensorLabel::Normal)).unwrap();
        assert!(!recorder.alert_active());
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results/events/fusion_events.jsonl");

        let mut recorder = EventRecorder::create(&path).unwrap();
        let frame = Frame::blank(4, 4, FrameFormat::RGB8);
        recorder.emit(&frame, &report(1, false, SensorLabel::Normal)).unwrap();
        recorder.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
