//! Frame annotation: region outlines and the state label

use crate::Result;
use crate::bbox::RegionCollection;
use crate::detection::config::VisualizationConfig;
use crate::traits::Detectable;
use anyhow::Context;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
};
use traffic_light_core::SignalState;

/// Text drawn for a state, e.g. `Traffic Light: RED`
pub fn label_text(state: SignalState) -> String {
    format!("Traffic Light: {}", state)
}

/// Draws onto caller-owned frames; holds no frame state of its own
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    config: VisualizationConfig,
}

impl Annotator {
    pub fn new(config: VisualizationConfig) -> Self {
        Self { config }
    }

    /// Outline every region in collection order
    pub fn draw_regions(&self, frame: &mut Mat, regions: &RegionCollection) -> Result<()> {
        if !self.config.draw_boxes {
            return Ok(());
        }

        for region in regions {
            imgproc::rectangle_points(
                frame,
                region.bbox.top_left(),
                region.bbox.bottom_right(),
                region.color.get_bgr_scalar(),
                self.config.box_thickness,
                LINE_8,
                0,
            )
            .with_context(|| format!("Failed to draw {} region", region.color))?;
        }

        Ok(())
    }

    pub fn draw_label(&self, frame: &mut Mat, state: SignalState) -> Result<()> {
        if !self.config.draw_label {
            return Ok(());
        }

        let (r, g, b) = self.config.label_color;
        let (x, y) = self.config.label_origin;
        imgproc::put_text(
            frame,
            &label_text(state),
            Point::new(x, y),
            FONT_HERSHEY_SIMPLEX,
            self.config.font_scale,
            Scalar::new(b as f64, g as f64, r as f64, 255.0),
            self.config.label_thickness,
            LINE_8,
            false,
        )
        .context("Failed to draw state label")?;

        Ok(())
    }
}
