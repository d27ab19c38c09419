//! Domain types for traffic signal color detection.
//!
//! Nothing in here touches pixels directly; the OpenCV pipeline lives in
//! `traffic-light-cv` and builds on these types.

pub mod color;
pub mod range;
pub mod state;

pub use color::SignalColor;
pub use range::{ColorRanges, HsvPixel, HsvRange};
pub use state::{PixelCounts, SignalState};
