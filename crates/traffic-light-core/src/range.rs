//! HSV inclusion ranges.
//!
//! Hue follows the 8-bit OpenCV convention: half degrees in `0..=179`.
//! Saturation and value span `0..=255`.

use crate::color::SignalColor;
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Largest hue value an 8-bit HSV image can hold.
pub const MAX_HUE: u8 = 179;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvPixel {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl HsvPixel {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive lower/upper bounds on all three channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: HsvPixel,
    pub upper: HsvPixel,
}

impl HsvRange {
    pub const fn new(lower: HsvPixel, upper: HsvPixel) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, pixel: HsvPixel) -> bool {
        (self.lower.h..=self.upper.h).contains(&pixel.h)
            && (self.lower.s..=self.upper.s).contains(&pixel.s)
            && (self.lower.v..=self.upper.v).contains(&pixel.v)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.upper.h <= MAX_HUE,
            "hue upper bound {} exceeds {}",
            self.upper.h,
            MAX_HUE
        );
        ensure!(
            self.lower.h <= self.upper.h
                && self.lower.s <= self.upper.s
                && self.lower.v <= self.upper.v,
            "inverted HSV range: {:?} > {:?}",
            self.lower,
            self.upper
        );
        Ok(())
    }
}

// Red wraps around hue 0 and needs two ranges.
pub const RED_LOW: HsvRange =
    HsvRange::new(HsvPixel::new(0, 100, 100), HsvPixel::new(10, 255, 255));
pub const RED_HIGH: HsvRange =
    HsvRange::new(HsvPixel::new(160, 100, 100), HsvPixel::new(179, 255, 255));
pub const YELLOW: HsvRange =
    HsvRange::new(HsvPixel::new(15, 100, 100), HsvPixel::new(35, 255, 255));
pub const GREEN: HsvRange =
    HsvRange::new(HsvPixel::new(40, 100, 100), HsvPixel::new(90, 255, 255));

/// Per-color union of HSV ranges. A pixel belongs to a color if any of
/// that color's ranges contains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRanges {
    pub red: Vec<HsvRange>,
    pub yellow: Vec<HsvRange>,
    pub green: Vec<HsvRange>,
}

impl Default for ColorRanges {
    fn default() -> Self {
        Self {
            red: vec![RED_LOW, RED_HIGH],
            yellow: vec![YELLOW],
            green: vec![GREEN],
        }
    }
}

impl ColorRanges {
    pub fn for_color(&self, color: SignalColor) -> &[HsvRange] {
        match color {
            SignalColor::Red => &self.red,
            SignalColor::Yellow => &self.yellow,
            SignalColor::Green => &self.green,
        }
    }

    pub fn matches(&self, color: SignalColor, pixel: HsvPixel) -> bool {
        self.for_color(color).iter().any(|range| range.contains(pixel))
    }

    /// Colors whose ranges contain `pixel`, in processing order.
    pub fn matching_colors(&self, pixel: HsvPixel) -> Vec<SignalColor> {
        SignalColor::ALL
            .into_iter()
            .filter(|&color| self.matches(color, pixel))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for color in SignalColor::ALL {
            for range in self.for_color(color) {
                range
                    .validate()
                    .map_err(|e| e.context(format!("invalid {} range", color)))?;
            }
        }
        Ok(())
    }
}
