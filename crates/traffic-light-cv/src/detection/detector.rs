//! Per-frame traffic light detector

use super::config::DetectionConfig;
use crate::Result;
use crate::bbox::RegionCollection;
use crate::classify::StateClassifier;
use crate::segmentation::{ColorMasks, RegionExtractor, Segmenter};
use crate::traits::FrameProcessor;
use crate::utils::{Annotator, ImageUtils};
use anyhow::Context;
use opencv::{core::Mat, prelude::*};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use traffic_light_core::{PixelCounts, SignalState};

/// What a frame was classified as and which regions were outlined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub state: SignalState,
    /// Raw mask totals the state was decided from
    pub counts: PixelCounts,
    /// Area-filtered regions, red then yellow then green
    pub regions: RegionCollection,
    /// (width, height)
    pub frame_size: (i32, i32),
}

/// A report tagged with the file it came from, as written to batch JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub report: DetectionReport,
}

/// Detection statistics
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStats {
    pub region_count: usize,
    pub processing_time_ms: u64,
}

/// Annotated copy of the input frame with its report
#[derive(Debug, Clone)]
pub struct Detection {
    pub annotated: Mat,
    pub report: DetectionReport,
    pub stats: DetectionStats,
}

/// Intermediate products of one frame, before anything is drawn
#[derive(Debug, Clone)]
pub struct Analysis {
    pub masks: ColorMasks,
    pub regions: RegionCollection,
    pub state: SignalState,
    pub counts: PixelCounts,
}

/// Stateless detector: segmentation, region extraction, classification, annotation.
///
/// Holds only immutable configuration, so one instance can serve any number of
/// threads as long as each call gets its own frame buffer.
#[derive(Debug, Clone)]
pub struct TrafficLightDetector {
    config: DetectionConfig,
    segmenter: Segmenter,
    extractor: RegionExtractor,
    classifier: StateClassifier,
    annotator: Annotator,
}

impl TrafficLightDetector {
    /// Create new detector
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate().context("Invalid detection config")?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: DetectionConfig) -> Self {
        Self {
            segmenter: Segmenter::new(config.ranges.clone()),
            extractor: RegionExtractor::new(config.min_region_area),
            classifier: StateClassifier::new(),
            annotator: Annotator::new(config.visualization.clone()),
            config,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Segment, extract and classify without touching the frame
    pub fn analyze(&self, frame: &Mat) -> Result<Analysis> {
        let masks = self.segmenter.segment(frame)?;
        let regions = self.extractor.extract_all(&masks)?;
        let (state, counts) = self.classifier.classify_with_counts(&masks)?;

        Ok(Analysis {
            masks,
            regions,
            state,
            counts,
        })
    }

    /// Detect and annotate `frame` in place: outlines first, label on top
    pub fn process_frame(&self, frame: &mut Mat) -> Result<DetectionReport> {
        let Analysis {
            regions,
            state,
            counts,
            ..
        } = self.analyze(frame)?;

        self.annotator.draw_regions(frame, &regions)?;
        self.annotator.draw_label(frame, state)?;

        log::debug!(
            "frame {}x{}: red={} yellow={} green={} regions={} -> {}",
            frame.cols(),
            frame.rows(),
            counts.red,
            counts.yellow,
            counts.green,
            regions.len(),
            state
        );

        Ok(DetectionReport {
            state,
            counts,
            regions,
            frame_size: (frame.cols(), frame.rows()),
        })
    }

    /// Detect on a copy; the input frame is left as is
    pub fn detect(&self, frame: &Mat) -> Result<Detection> {
        let start_time = std::time::Instant::now();

        let mut annotated = frame.try_clone()?;
        let report = self.process_frame(&mut annotated)?;

        let stats = DetectionStats {
            region_count: report.regions.len(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        Ok(Detection {
            annotated,
            report,
            stats,
        })
    }

    /// Detect from image file
    pub fn detect_from_file<P: AsRef<Path>>(&self, image_path: P) -> Result<Detection> {
        let image = ImageUtils::load_color(&image_path)
            .with_context(|| format!("Failed to load image: {:?}", image_path.as_ref()))?;

        let detection = self.detect(&image)?;
        log::info!("{:?}: {}", image_path.as_ref(), detection.report.state);
        Ok(detection)
    }

    /// Detect from image::RgbImage, returning an annotated RGB copy
    pub fn detect_from_rgb_image(
        &self,
        rgb_image: &image::RgbImage,
    ) -> Result<(image::RgbImage, DetectionReport)> {
        let mut frame = ImageUtils::rgb_to_mat(rgb_image)?;
        let report = self.process_frame(&mut frame)?;
        Ok((ImageUtils::mat_to_rgb(&frame)?, report))
    }

    /// Detect on many files; one result per input, in input order.
    ///
    /// A file that fails to load or process does not abort the rest of the batch.
    pub fn detect_files<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<Result<Detection>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            paths
                .par_iter()
                .map(|path| self.detect_from_file(path))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            paths.iter().map(|path| self.detect_from_file(path)).collect()
        }
    }

    /// Export detection reports in JSON format
    pub fn export_json<T: Serialize>(&self, reports: &[T], output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(reports)
            .context("Failed to serialize detection reports")?;

        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write JSON to: {:?}", output_path))?;

        Ok(())
    }
}

impl Default for TrafficLightDetector {
    fn default() -> Self {
        Self::from_validated(DetectionConfig::default())
    }
}

impl FrameProcessor for TrafficLightDetector {
    fn process(&self, frame: &mut Mat) -> Result<DetectionReport> {
        self.process_frame(frame)
    }
}
