//! Precondition violations on frames handed to the pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("frame is empty")]
    EmptyFrame,

    #[error("unsupported frame type {typ} with {channels} channels (expected 8-bit, 3 channels)")]
    UnsupportedFrame { typ: i32, channels: i32 },

    #[error("mask size mismatch: {expected:?} vs {actual:?}")]
    MaskSizeMismatch {
        expected: (i32, i32),
        actual: (i32, i32),
    },

    #[error("buffer holds {actual} bytes, {width}x{height} BGR needs {expected}")]
    BufferSize {
        width: i32,
        height: i32,
        expected: usize,
        actual: usize,
    },
}
