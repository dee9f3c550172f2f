//! Wires configuration, capabilities and the decision loop together.

use std::fs;
use std::io::Write;

use tracing::info;
use vigil_core::{
    CancelToken, Detector, EveryNthFrame, FailurePolicy, FrameSource, LoopController, RunSummary,
    SensorSignal, VisionSignal,
};
use vigil_sensor::{ModelArtifacts, SimulatedSampler};
use vigil_vision::{VideoEngine, VideoEngineConfig};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::logging::prefix::OPEN;
use crate::recorder::EventRecorder;
use crate::source::{ImageSequenceSource, PrefetchSource, Primed};

type BoxedSource = Box<dyn FrameSource + Send>;

/// A fully assembled monitor, ready to run.
pub struct Monitor {
    controller: LoopController,
    source: Primed<BoxedSource>,
    recorder: EventRecorder<Box<dyn Write + Send>>,
}

impl Monitor {
    /// Load every artifact named by `config` and open the frame sequence.
    ///
    /// Sensor artifacts are loaded first so a missing model fails fast,
    /// before the detector is initialized.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;

        let artifacts = ModelArtifacts::load(&config.sensor.model_path, &config.sensor.scaler_path)?;
        let detector = load_detector(config)?;

        let sequence = ImageSequenceSource::open(&config.frames_dir, config.fps)?
            .with_skip_unreadable(config.failure_policy == FailurePolicy::SkipFrame);
        let source = PrefetchSource::spawn(sequence, config.prefetch);

        Self::assemble(config, artifacts, detector, Box::new(source))
    }

    /// Build a monitor around already-constructed capabilities.
    ///
    /// The first frame is fetched here to size the zone.
    pub fn assemble(
        config: &MonitorConfig,
        artifacts: ModelArtifacts,
        detector: impl Detector + Send + 'static,
        source: BoxedSource,
    ) -> Result<Self> {
        config.validate()?;

        let source = Primed::new(source).map_err(|e| MonitorError::Source(e.to_string()))?;
        let (width, height) = source
            .first_frame()
            .map(|frame| (frame.width, frame.height))
            .ok_or_else(|| MonitorError::Source("frame source produced no frames".to_string()))?;
        let zone = config.zone.resolve(width, height)?;

        let sampler = match config.sensor.seed {
            Some(seed) => SimulatedSampler::seeded(seed),
            None => SimulatedSampler::from_entropy(),
        }
        .with_intrusion_rate(config.sensor.intrusion_rate);

        let sensor = SensorSignal::new(sampler, artifacts.scaler, artifacts.classifier);
        let vision = VisionSignal::new(detector)
            .with_category(config.category.clone())
            .with_min_confidence(config.min_confidence);

        let controller = LoopController::new(zone, vision, sensor, EveryNthFrame::new(config.cadence)?)
            .with_failure_policy(config.failure_policy);

        let recorder = match &config.events_path {
            Some(path) => EventRecorder::create(path)?.boxed(),
            None => EventRecorder::discard().boxed(),
        };

        info!(
            "{} Monitor ready: {}x{} frames, zone of {} points, sensor every {} frames",
            OPEN,
            width,
            height,
            controller.zone().points().len(),
            config.cadence
        );

        Ok(Self {
            controller,
            source,
            recorder,
        })
    }

    /// Handle that stops the loop after the frame in progress.
    pub fn cancel_token(&self) -> CancelToken {
        self.controller.cancel_token()
    }

    /// Run until the frames run out or the loop is cancelled. Blocks.
    pub fn run(mut self) -> Result<RunSummary> {
        let outcome = self.controller.run(&mut self.source, &mut self.recorder);

        let records = self.recorder.records();
        self.recorder
            .finish()
            .map_err(|e| MonitorError::Task(format!("failed to flush event log: {e}")))?;

        let summary = outcome?;
        info!(
            frames = summary.frames,
            alert_frames = summary.alert_frames,
            sensor_samples = summary.sensor_samples,
            degraded_frames = summary.degraded_frames,
            records,
            "run complete"
        );
        Ok(summary)
    }
}

fn load_detector(config: &MonitorConfig) -> Result<VideoEngine> {
    let labels = match &config.detector.labels_path {
        Some(path) => Some(fs::read_to_string(path).map_err(|e| MonitorError::io(path, e))?),
        None => None,
    };

    let engine = VideoEngine::new(VideoEngineConfig {
        model_path: config.detector.model_path.to_string_lossy().into_owned(),
        confidence_threshold: config.detector.confidence_threshold,
        nms_threshold: config.detector.nms_threshold,
        input_width: config.detector.input_width,
        input_height: config.detector.input_height,
        num_threads: config.detector.num_threads,
        labels,
    })?;
    engine.load()?;
    Ok(engine)
}
