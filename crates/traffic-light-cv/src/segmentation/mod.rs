//! Color segmentation module

pub mod extractor;
pub mod segmenter;

pub use extractor::RegionExtractor;
pub use segmenter::Segmenter;

use crate::Result;
use crate::error::DetectionError;
use opencv::{
    core::{self, Mat},
    prelude::*,
};
use traffic_light_core::{PixelCounts, SignalColor};

/// One binary mask (0 or 255, `CV_8UC1`) per signal color, all the size of the source frame
#[derive(Debug, Clone)]
pub struct ColorMasks {
    pub red: Mat,
    pub yellow: Mat,
    pub green: Mat,
}

impl ColorMasks {
    pub fn get(&self, color: SignalColor) -> &Mat {
        match color {
            SignalColor::Red => &self.red,
            SignalColor::Yellow => &self.yellow,
            SignalColor::Green => &self.green,
        }
    }

    /// Masks in processing order: red, yellow, green
    pub fn iter(&self) -> impl Iterator<Item = (SignalColor, &Mat)> {
        SignalColor::ALL.into_iter().map(move |color| (color, self.get(color)))
    }

    /// Common `(width, height)` of the three masks. Fails if they disagree.
    pub fn dimensions(&self) -> Result<(i32, i32)> {
        let expected = (self.red.cols(), self.red.rows());
        for mask in [&self.yellow, &self.green] {
            let actual = (mask.cols(), mask.rows());
            if actual != expected {
                return Err(DetectionError::MaskSizeMismatch { expected, actual }.into());
            }
        }
        Ok(expected)
    }

    /// Raw set-pixel totals per mask, no area filtering
    pub fn pixel_counts(&self) -> Result<PixelCounts> {
        let count = |mask: &Mat| -> Result<u64> {
            if mask.empty() {
                return Ok(0);
            }
            Ok(core::count_non_zero(mask)? as u64)
        };

        Ok(PixelCounts::new(
            count(&self.red)?,
            count(&self.yellow)?,
            count(&self.green)?,
        ))
    }
}
