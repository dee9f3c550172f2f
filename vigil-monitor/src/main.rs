//! Vigil Monitor - Main Entry Point
//!
//! Usage:
//!     vigil-monitor --frames data/frames --model yolov8n.onnx
//!     vigil-monitor --config vigil.json --seed 42

use clap::Parser;
use tracing::info;
use vigil_monitor::logging::{self, prefix::CLOSE};
use vigil_monitor::{shutdown_signal, Args, Monitor, MonitorConfig, MonitorError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_with_filter(&args.log_level);

    info!("Starting Vigil Monitor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    args.apply(&mut config);

    let monitor = tokio::task::spawn_blocking(move || Monitor::from_config(&config))
        .await
        .map_err(|e| MonitorError::Task(e.to_string()))??;
    let cancel = monitor.cancel_token();

    let mut run = tokio::task::spawn_blocking(move || monitor.run());
    let joined = tokio::select! {
        joined = &mut run => joined,
        _ = shutdown_signal() => {
            cancel.cancel();
            run.await
        }
    };
    let summary = joined.map_err(|e| MonitorError::Task(e.to_string()))??;

    info!(
        "{} Stopped ({}): {} frames, {} with alert",
        CLOSE,
        summary
            .stop_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        summary.frames,
        summary.alert_frames
    );
    Ok(())
}
