//! Frame acquisition. The capture handle is owned here, never by the detector.

use anyhow::{bail, Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Anything that yields decoded BGR frames in capture order.
pub trait FrameReader {
    /// `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Mat>>;

    /// Nominal frame rate, if the source knows it.
    fn fps(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Device(i32),
    File(PathBuf),
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Device(index) => write!(f, "camera {}", index),
            SourceKind::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An opened camera or video file, released on drop.
pub struct FrameSource {
    capture: VideoCapture,
    kind: SourceKind,
    frames_read: u64,
}

impl FrameSource {
    pub fn open_device(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .with_context(|| format!("Failed to open camera {}", index))?;
        Self::from_capture(capture, SourceKind::Device(index))
    }

    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let capture = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
            .with_context(|| format!("Failed to open video: {:?}", path))?;
        Self::from_capture(capture, SourceKind::File(path.to_path_buf()))
    }

    fn from_capture(capture: VideoCapture, kind: SourceKind) -> Result<Self> {
        if !capture.is_opened()? {
            bail!("{} could not be opened", kind);
        }
        log::info!("FrameSource: opened {}", kind);

        Ok(Self {
            capture,
            kind,
            frames_read: 0,
        })
    }

    fn release_capture(&mut self) -> Result<()> {
        if self.capture.is_opened()? {
            self.capture.release()?;
            log::info!(
                "FrameSource: released {} after {} frames",
                self.kind,
                self.frames_read
            );
        }
        Ok(())
    }
}

impl FrameReader for FrameSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        self.frames_read += 1;
        Ok(Some(frame))
    }

    fn fps(&self) -> Option<f64> {
        self.capture
            .get(videoio::CAP_PROP_FPS)
            .ok()
            .filter(|fps| fps.is_finite() && *fps > 0.0)
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        if let Err(err) = self.release_capture() {
            log::warn!("FrameSource: failed to release {}: {}", self.kind, err);
        }
    }
}
