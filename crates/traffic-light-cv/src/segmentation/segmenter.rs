//! HSV threshold segmentation

use super::ColorMasks;
use crate::Result;
use crate::utils::ImageUtils;
use anyhow::Context;
use opencv::{
    core::{self, CV_8UC1, Mat, Scalar},
    imgproc,
    prelude::*,
};
use traffic_light_core::{ColorRanges, HsvPixel, HsvRange, SignalColor};

/// Splits a BGR frame into red, yellow and green masks using fixed HSV ranges
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    ranges: ColorRanges,
}

impl Segmenter {
    pub fn new(ranges: ColorRanges) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &ColorRanges {
        &self.ranges
    }

    /// Convert an 8-bit BGR frame to 8-bit HSV (hue in half degrees)
    pub fn to_hsv(&self, frame: &Mat) -> Result<Mat> {
        ImageUtils::ensure_8uc3(frame)?;

        let mut hsv = Mat::default();
        imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_BGR2HSV, 0)
            .context("BGR to HSV conversion failed")?;
        Ok(hsv)
    }

    /// Segment a BGR frame
    pub fn segment(&self, frame: &Mat) -> Result<ColorMasks> {
        let hsv = self.to_hsv(frame)?;
        self.segment_hsv(&hsv)
    }

    /// Segment a frame that is already in HSV
    pub fn segment_hsv(&self, hsv: &Mat) -> Result<ColorMasks> {
        ImageUtils::ensure_8uc3(hsv)?;

        Ok(ColorMasks {
            red: self.mask_for(hsv, SignalColor::Red)?,
            yellow: self.mask_for(hsv, SignalColor::Yellow)?,
            green: self.mask_for(hsv, SignalColor::Green)?,
        })
    }

    /// Union of `in_range` over every range configured for `color`
    fn mask_for(&self, hsv: &Mat, color: SignalColor) -> Result<Mat> {
        let mut mask = Mat::zeros(hsv.rows(), hsv.cols(), CV_8UC1)?.to_mat()?;

        for range in self.ranges.for_color(color) {
            let part = Self::in_range(hsv, range)?;
            let mut merged = Mat::default();
            core::bitwise_or(&mask, &part, &mut merged, &core::no_array())
                .with_context(|| format!("Failed to merge {} mask", color))?;
            mask = merged;
        }

        Ok(mask)
    }

    fn in_range(hsv: &Mat, range: &HsvRange) -> Result<Mat> {
        let mut mask = Mat::default();
        core::in_range(
            hsv,
            &Self::to_scalar(range.lower),
            &Self::to_scalar(range.upper),
            &mut mask,
        )
        .context("HSV range threshold failed")?;
        Ok(mask)
    }

    fn to_scalar(pixel: HsvPixel) -> Scalar {
        Scalar::new(pixel.h as f64, pixel.s as f64, pixel.v as f64, 0.0)
    }
}
