//! Detection configuration

use crate::Result;
use crate::segmentation::extractor::DEFAULT_MIN_AREA;
use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;
use traffic_light_core::ColorRanges;

/// Main detection configuration
///
/// Fixed for the lifetime of a detector. Fields missing from a JSON file
/// take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub ranges: ColorRanges,
    /// Regions with contour area at or below this are not drawn
    pub min_region_area: f64,
    pub visualization: VisualizationConfig,
}

/// Visualization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub draw_boxes: bool,
    pub draw_label: bool,
    pub box_thickness: i32,
    /// Bottom-left corner of the label text
    pub label_origin: (i32, i32),
    pub font_scale: f64,
    pub label_thickness: i32,
    /// (R, G, B)
    pub label_color: (u8, u8, u8),
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ranges: ColorRanges::default(),
            min_region_area: DEFAULT_MIN_AREA,
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            draw_boxes: true,
            draw_label: true,
            box_thickness: 2,
            label_origin: (50, 50),
            font_scale: 1.0,
            label_thickness: 2,
            label_color: (255, 255, 255),
        }
    }
}

impl DetectionConfig {
    /// Default thresholds with substituted color ranges
    pub fn with_ranges(ranges: ColorRanges) -> Self {
        Self {
            ranges,
            ..Default::default()
        }
    }

    /// Classification only, frames are left untouched
    pub fn without_annotation() -> Self {
        Self {
            visualization: VisualizationConfig {
                draw_boxes: false,
                draw_label: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.ranges.validate()?;
        ensure!(
            self.min_region_area.is_finite() && self.min_region_area >= 0.0,
            "min_region_area must be a non-negative number, got {}",
            self.min_region_area
        );

        let vis = &self.visualization;
        ensure!(vis.box_thickness > 0, "box_thickness must be positive, got {}", vis.box_thickness);
        ensure!(
            vis.label_thickness > 0,
            "label_thickness must be positive, got {}",
            vis.label_thickness
        );
        ensure!(
            vis.font_scale.is_finite() && vis.font_scale > 0.0,
            "font_scale must be positive, got {}",
            vis.font_scale
        );
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {:?}", path.as_ref()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_light_core::{HsvPixel, HsvRange};

    #[test]
    fn test_default_is_valid() -> Result<()> {
        DetectionConfig::default().validate()?;
        DetectionConfig::without_annotation().validate()?;
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = DetectionConfig::default();
        config.min_region_area = -1.0;
        assert!(config.validate().is_err());

        let mut config = DetectionConfig::default();
        config.visualization.box_thickness = 0;
        assert!(config.validate().is_err());

        let config = DetectionConfig::with_ranges(ColorRanges {
            red: vec![HsvRange::new(HsvPixel::new(170, 100, 100), HsvPixel::new(180, 255, 255))],
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");

        let mut config = DetectionConfig::default();
        config.min_region_area = 50.0;
        std::fs::write(&path, config.to_json_string()?)?;

        assert_eq!(DetectionConfig::from_json_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "visualization": { "draw_label": false } }"#)?;

        let config = DetectionConfig::from_json_file(&path)?;
        assert!(!config.visualization.draw_label);
        assert!(config.visualization.draw_boxes);
        assert_eq!(config.min_region_area, 200.0);
        assert_eq!(config.ranges, ColorRanges::default());
        Ok(())
    }
}
