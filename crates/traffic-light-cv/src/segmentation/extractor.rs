//! Connected region extraction from binary masks

use super::ColorMasks;
use crate::Result;
use crate::bbox::{BBox, Region, RegionCollection};
use anyhow::Context;
use opencv::{
    core::{Mat, Point, Vector},
    imgproc,
};
use traffic_light_core::SignalColor;

/// Regions at or below this contour area are treated as noise
pub const DEFAULT_MIN_AREA: f64 = 200.0;

/// Finds outer contours in a mask and keeps the ones large enough to draw
#[derive(Debug, Clone, Copy)]
pub struct RegionExtractor {
    min_area: f64,
}

impl RegionExtractor {
    pub fn new(min_area: f64) -> Self {
        Self { min_area }
    }

    /// Regions of one mask with area strictly greater than `min_area`.
    ///
    /// Only outer boundaries count: a hole inside a blob does not produce a
    /// second region. Area is the contour area, which for a solid blob is a
    /// little smaller than its pixel count.
    pub fn extract(&self, mask: &Mat, color: SignalColor) -> Result<RegionCollection> {
        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .with_context(|| format!("Contour search failed on {} mask", color))?;

        let mut regions = RegionCollection::new();
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            let rect = imgproc::bounding_rect(&contour)?;
            regions.push(Region::new(color, area, BBox::from_rect(rect)));
        }

        let found = regions.len();
        let kept = regions.filter_by_area(self.min_area);
        log::trace!("{} mask: {} contours, {} kept", color, found, kept.len());

        Ok(kept)
    }

    /// Regions of all three masks, red first, then yellow, then green
    pub fn extract_all(&self, masks: &ColorMasks) -> Result<RegionCollection> {
        let mut all = RegionCollection::new();
        for (color, mask) in masks.iter() {
            all.extend(self.extract(mask, color)?);
        }
        Ok(all)
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_AREA)
    }
}
