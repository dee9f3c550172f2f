//! Frame-by-frame decision loop.
//!
//! One frame is fully processed (vision, optional sensor sample, fusion)
//! before the next is fetched. Cancellation is observed between frames
//! only, so the last emitted report always belongs to a whole frame.
//!
//! ```text
//!   RUNNING ──(source exhausted | cancelled)──▶ STOPPED
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capability::{FrameSink, FrameSource};
use crate::detection::Detection;
use crate::error::{Capability, CapabilityError, FusionError, Result};
use crate::frame::Frame;
use crate::fusion::{FusionEngine, FusionResult};
use crate::sensor::{SamplingPolicy, SensorSignal, SensorState};
use crate::vision::{VisionOutcome, VisionSignal};
use crate::zone::Zone;

/// Cooperative stop flag shared between the loop and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What to do when the detector or a sensor capability fails on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the failure to the caller of the frame step
    #[default]
    Propagate,
    /// Log it, treat the video flag as false and keep the held sensor state
    SkipFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    SourceExhausted,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SourceExhausted => f.write_str("source exhausted"),
            StopReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Running,
    Stopped(StopReason),
}

/// Everything the sink receives about one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// 1-based index of the frame in arrival order
    pub frame_index: u64,
    pub result: FusionResult,
    /// Detections standing inside the zone
    pub flagged: Vec<Detection>,
    /// Sensor state the fusion read for this frame
    pub sensor: SensorState,
    /// Whether a new sensor sample was taken on this frame
    pub sampled: bool,
    /// Whether a capability failure was skipped on this frame
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub alert_frames: u64,
    pub sensor_samples: u64,
    pub degraded_frames: u64,
    pub stop_reason: Option<StopReason>,
}

/// Drives vision, sensor sampling and fusion once per frame.
pub struct LoopController {
    zone: Zone,
    vision: VisionSignal,
    sensor: SensorSignal,
    fusion: FusionEngine,
    cadence: Box<dyn SamplingPolicy + Send>,
    policy: FailurePolicy,
    cancel: CancelToken,
    state: LoopState,
    frame_index: u64,
    summary: RunSummary,
}

impl LoopController {
    pub fn new(
        zone: Zone,
        vision: VisionSignal,
        sensor: SensorSignal,
        cadence: impl SamplingPolicy + Send + 'static,
    ) -> Self {
        Self {
            zone,
            vision,
            sensor,
            fusion: FusionEngine,
            cadence: Box::new(cadence),
            policy: FailurePolicy::default(),
            cancel: CancelToken::new(),
            state: LoopState::Running,
            frame_index: 0,
            summary: RunSummary::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for stopping the loop from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn sensor_state(&self) -> &SensorState {
        self.sensor.state()
    }

    /// Number of frames fetched so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Process one frame: vision, cadence-gated sensor sample, fusion.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        self.frame_index += 1;
        let frame_index = self.frame_index;
        let mut degraded = false;

        let vision = match self
            .check_frame_size(frame, frame_index)
            .and_then(|()| self.vision.evaluate(frame, &self.zone, frame_index))
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.absorb(err)?;
                degraded = true;
                VisionOutcome::default()
            }
        };

        let sampled_state = self
            .sensor
            .maybe_sample(frame_index, self.cadence.as_ref())
            .map(|state| *state);
        let sensor = match sampled_state {
            Ok(state) => state,
            Err(err) => {
                self.absorb(err)?;
                degraded = true;
                *self.sensor.state()
            }
        };

        let result = self.fusion.fuse(vision.video_flag, sensor.last_label);
        let sampled = sensor.sampled_at == Some(frame_index);

        self.summary.frames += 1;
        self.summary.alert_frames += u64::from(result.alert);
        self.summary.sensor_samples += u64::from(sampled);
        self.summary.degraded_frames += u64::from(degraded);

        Ok(FrameReport {
            frame_index,
            result,
            flagged: vision.flagged,
            sensor,
            sampled,
            degraded,
        })
    }

    /// Fetch, process and emit one frame, or stop.
    ///
    /// Once stopped, further calls do nothing and report the same state.
    pub fn step<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<LoopState>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        if let LoopState::Stopped(_) = self.state {
            return Ok(self.state);
        }
        if self.cancel.is_cancelled() {
            return Ok(self.stop(StopReason::Cancelled));
        }

        let next = source.next_frame().map_err(|e| {
            FusionError::capability(Capability::FrameSource, self.frame_index + 1, e)
        })?;
        let Some(frame) = next else {
            return Ok(self.stop(StopReason::SourceExhausted));
        };

        let report = self.process_frame(&frame)?;
        sink.emit(&frame, &report)
            .map_err(|e| FusionError::capability(Capability::Sink, report.frame_index, e))?;

        Ok(self.state)
    }

    /// Step until the loop stops.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        while self.step(source, sink)? == LoopState::Running {}
        Ok(self.summary)
    }

    fn stop(&mut self, reason: StopReason) -> LoopState {
        info!(
            frames = self.summary.frames,
            alert_frames = self.summary.alert_frames,
            "decision loop stopped: {reason}"
        );
        self.state = LoopState::Stopped(reason);
        self.summary.stop_reason = Some(reason);
        self.state
    }

    /// The zone is only meaningful for frames of the size it was built for.
    fn check_frame_size(&self, frame: &Frame, frame_index: u64) -> Result<()> {
        let (width, height) = self.zone.frame_size();
        if (frame.width, frame.height) == (width, height) {
            return Ok(());
        }
        Err(FusionError::capability(
            Capability::FrameSource,
            frame_index,
            CapabilityError::new(format!(
                "frame is {}x{} but the zone was built for {}x{}",
                frame.width, frame.height, width, height
            )),
        ))
    }

    fn absorb(&self, err: FusionError) -> Result<()> {
        match self.policy {
            FailurePolicy::Propagate => Err(err),
            FailurePolicy::SkipFrame => {
                warn!(error = %err, "skipping failed capability for this frame");
                Ok(())
            }
        }
    }
}
