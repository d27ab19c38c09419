//! Traffic Light Computer Vision Library
//!
//! Per-frame signal color detection with OpenCV: HSV segmentation, region
//! extraction for annotation and a strict-majority state classifier.

pub mod bbox;
pub mod classify;
pub mod detection;
pub mod error;
pub mod segmentation;
pub mod utils;

// Re-export commonly used types
pub use bbox::{BBox, Region, RegionCollection};
pub use classify::StateClassifier;
pub use detection::{
    Detection, DetectionConfig, DetectionReport, FileReport, TrafficLightDetector,
};
pub use error::DetectionError;
pub use segmentation::{ColorMasks, RegionExtractor, Segmenter};
pub use traffic_light_core::{
    ColorRanges, HsvPixel, HsvRange, PixelCounts, SignalColor, SignalState,
};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;
    use opencv::core::{Mat, Scalar};

    /// A segmented class that can be annotated on a frame
    pub trait Detectable {
        fn get_color(&self) -> (u8, u8, u8);

        /// OpenCV color scalar (BGR order)
        fn get_bgr_scalar(&self) -> Scalar {
            let (r, g, b) = self.get_color();
            Scalar::new(b as f64, g as f64, r as f64, 255.0)
        }
    }

    impl Detectable for SignalColor {
        fn get_color(&self) -> (u8, u8, u8) {
            self.display_rgb()
        }
    }

    /// Something that turns one decoded BGR frame into an annotated frame and a report.
    ///
    /// Delivery adapters depend on this rather than on a concrete detector.
    pub trait FrameProcessor {
        fn process(&self, frame: &mut Mat) -> Result<DetectionReport>;
    }
}
