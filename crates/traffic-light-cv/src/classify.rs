//! Frame-level state decision

use crate::Result;
use crate::segmentation::ColorMasks;
use traffic_light_core::{PixelCounts, SignalState};

/// Decides the reported state from the raw (unfiltered) masks.
///
/// Counting ignores the region area filter, so a wide faint glow can outvote
/// a small sharp lamp even though only the lamp gets a box.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateClassifier;

impl StateClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, masks: &ColorMasks) -> Result<SignalState> {
        Ok(self.classify_with_counts(masks)?.0)
    }

    /// State together with the counts it was decided from
    pub fn classify_with_counts(&self, masks: &ColorMasks) -> Result<(SignalState, PixelCounts)> {
        masks.dimensions()?;
        let counts = masks.pixel_counts()?;
        Ok((counts.classify(), counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::{
        core::{CV_8UC1, Mat, Rect, Scalar},
        imgproc,
    };

    fn mask_with(width: i32, height: i32, filled: Option<Rect>) -> Result<Mat> {
        let mut mask = Mat::new_rows_cols_with_default(height, width, CV_8UC1, Scalar::all(0.0))?;
        if let Some(rect) = filled {
            imgproc::rectangle(
                &mut mask,
                rect,
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }
        Ok(mask)
    }

    #[test]
    fn test_empty_masks_are_unknown() -> Result<()> {
        let masks = ColorMasks {
            red: mask_with(50, 50, None)?,
            yellow: mask_with(50, 50, None)?,
            green: mask_with(50, 50, None)?,
        };
        let (state, counts) = StateClassifier::new().classify_with_counts(&masks)?;
        assert_eq!(state, SignalState::Unknown);
        assert_eq!(counts, PixelCounts::default());
        Ok(())
    }

    #[test]
    fn test_majority_wins() -> Result<()> {
        let masks = ColorMasks {
            red: mask_with(50, 50, Some(Rect::new(0, 0, 5, 5)))?,
            yellow: mask_with(50, 50, None)?,
            green: mask_with(50, 50, Some(Rect::new(10, 10, 10, 10)))?,
        };
        let (state, counts) = StateClassifier::new().classify_with_counts(&masks)?;
        assert_eq!(counts, PixelCounts::new(25, 0, 100));
        assert_eq!(state, SignalState::Green);
        Ok(())
    }

    #[test]
    fn test_mismatched_masks_fail() -> Result<()> {
        let masks = ColorMasks {
            red: mask_with(50, 50, None)?,
            yellow: mask_with(40, 50, None)?,
            green: mask_with(50, 50, None)?,
        };
        let err = StateClassifier::new().classify(&masks).unwrap_err();
        assert!(err.downcast_ref::<crate::DetectionError>().is_some());
        Ok(())
    }
}
