//! Frame sources for the monitor.
//!
//! - [`ImageSequenceSource`]: decodes a directory of still images in name order
//! - [`PrefetchSource`]: decodes ahead on a worker thread
//! - [`Primed`]: peeks the first frame so the zone can be sized before the loop starts

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use tracing::{debug, info, warn};
use vigil_core::{CapabilityError, CapabilityResult, Frame, FrameFormat, FrameSource};

use crate::error::{MonitorError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Sorted directory of still images played back as a video stream.
///
/// Files that fail to decode are skipped with a warning unless
/// [`ImageSequenceSource::with_skip_unreadable`] turns that off.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    frame_interval_us: f64,
    skip_unreadable: bool,
    skipped: usize,
}

impl ImageSequenceSource {
    /// Collect the images in `dir`. Fails if the directory is missing or holds no images.
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| MonitorError::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| MonitorError::io(dir, e))?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(MonitorError::Source(format!(
                "no images found in {}",
                dir.display()
            )));
        }
        paths.sort();

        info!(frames = paths.len(), dir = %dir.display(), "frame sequence opened");
        Ok(Self::from_paths(paths, fps))
    }

    pub fn from_paths(paths: Vec<PathBuf>, fps: f64) -> Self {
        Self {
            paths,
            cursor: 0,
            frame_interval_us: 1_000_000.0 / fps,
            skip_unreadable: true,
            skipped: 0,
        }
    }

    /// Fail the fetch on an undecodable file instead of skipping it.
    pub fn with_skip_unreadable(mut self, skip: bool) -> Self {
        self.skip_unreadable = skip;
        self
    }

    /// Files skipped so far because they could not be decoded.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> CapabilityResult<Option<Frame>> {
        while let Some(path) = self.paths.get(self.cursor) {
            // Timestamps follow file position so gaps stay visible
            let timestamp_us = (self.cursor as f64 * self.frame_interval_us) as u64;
            self.cursor += 1;

            let image = match image::open(path) {
                Ok(image) => image.to_rgb8(),
                Err(e) if self.skip_unreadable => {
                    self.skipped += 1;
                    warn!(path = %path.display(), error = %e, "skipping unreadable frame");
                    continue;
                }
                Err(e) => return Err(CapabilityError::new(format!("{}: {e}", path.display()))),
            };
            let (width, height) = image.dimensions();

            return Ok(Some(Frame::new(
                width,
                height,
                FrameFormat::RGB8,
                image.into_raw(),
                timestamp_us,
            )));
        }
        Ok(None)
    }
}

/// Runs another source on a worker thread, keeping up to `depth` frames decoded ahead.
///
/// Frames are forwarded in arrival order. The worker stops after the first
/// error or when the inner source is exhausted.
pub struct PrefetchSource {
    frames: Option<Receiver<CapabilityResult<Frame>>>,
    worker: Option<JoinHandle<()>>,
}

impl PrefetchSource {
    pub fn spawn<S>(mut inner: S, depth: usize) -> Self
    where
        S: FrameSource + Send + 'static,
    {
        let (tx, rx) = bounded(depth.max(1));

        let worker = thread::spawn(move || loop {
            let item = match inner.next_frame() {
                Ok(Some(frame)) => Ok(frame),
                Ok(None) => break,
                Err(e) => Err(e),
            };
            let failed = item.is_err();
            if tx.send(item).is_err() || failed {
                break;
            }
        });

        Self {
            frames: Some(rx),
            worker: Some(worker),
        }
    }
}

impl FrameSource for PrefetchSource {
    fn next_frame(&mut self) -> CapabilityResult<Option<Frame>> {
        let Some(frames) = &self.frames else {
            return Ok(None);
        };
        match frames.recv() {
            Ok(item) => item.map(Some),
            // Worker finished and the queue is drained
            Err(_) => Ok(None),
        }
    }
}

impl Drop for PrefetchSource {
    fn drop(&mut self) {
        // Closing the channel unblocks a worker waiting on a full queue
        self.frames.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                debug!("prefetch worker panicked");
            }
        }
    }
}

/// Source whose first frame has already been fetched.
pub struct Primed<S> {
    first: Option<Frame>,
    inner: S,
}

impl<S: FrameSource> Primed<S> {
    pub fn new(mut inner: S) -> CapabilityResult<Self> {
        let first = inner.next_frame()?;
        Ok(Self { first, inner })
    }

    /// The peeked frame, until it is handed out.
    pub fn first_frame(&self) -> Option<&Frame> {
        self.first.as_ref()
    }
}

impl<S: FrameSource> FrameSource for Primed<S> {
    fn next_frame(&mut self) -> CapabilityResult<Option<Frame>> {
        match self.first.take() {
            Some(frame) => Ok(Some(frame)),
            None => self.inner.next_frame(),
        }
    }
}
