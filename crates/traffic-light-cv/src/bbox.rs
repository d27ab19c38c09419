//! Bounding boxes and extracted color regions
//!
//! Core abstraction for representing what the region extractor found and what
//! the annotator draws.

use opencv::core::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use traffic_light_core::SignalColor;

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create from OpenCV Rect
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }

    /// Convert to OpenCV Rect
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Opposite corner at `(x + width, y + height)`, the convention outlines are drawn with
    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Area of the box itself, not of the region it encloses
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Calculate center point
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// True if `other` lies entirely inside this box
    pub fn contains(&self, other: &BBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

/// A connected region of one color mask that survived the area filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub color: SignalColor,
    /// Area enclosed by the outer contour
    pub area: f64,
    pub bbox: BBox,
}

impl Region {
    pub fn new(color: SignalColor, area: f64, bbox: BBox) -> Self {
        Self { color, area, bbox }
    }
}

/// Collection of regions with batch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionCollection {
    regions: Vec<Region>,
}

impl RegionCollection {
    /// Create new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from vector of regions
    pub fn from_vec(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn push(&mut self, region: Region) {
        self.regions.push(region);
    }

    /// Extend with another collection, keeping order
    pub fn extend(&mut self, other: RegionCollection) {
        self.regions.extend(other.regions);
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Keep regions whose area is strictly greater than `min_area`
    pub fn filter_by_area(mut self, min_area: f64) -> Self {
        self.regions.retain(|region| region.area > min_area);
        self
    }

    pub fn count_for(&self, color: SignalColor) -> usize {
        self.regions.iter().filter(|r| r.color == color).count()
    }

    /// Get statistics
    pub fn stats(&self) -> RegionStats {
        let mut color_counts: HashMap<SignalColor, usize> = HashMap::new();
        let mut total_area = 0.0;
        let mut max_area: f64 = 0.0;

        for region in &self.regions {
            *color_counts.entry(region.color).or_insert(0) += 1;
            total_area += region.area;
            max_area = max_area.max(region.area);
        }

        RegionStats {
            total_regions: self.regions.len(),
            color_counts,
            total_area,
            max_area,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }
}

impl IntoIterator for RegionCollection {
    type Item = Region;
    type IntoIter = std::vec::IntoIter<Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

impl<'a> IntoIterator for &'a RegionCollection {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

impl FromIterator<Region> for RegionCollection {
    fn from_iter<T: IntoIterator<Item = Region>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Statistics about a collection of regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionStats {
    pub total_regions: usize,
    pub color_counts: HashMap<SignalColor, usize>,
    pub total_area: f64,
    pub max_area: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_corners() {
        let bbox = BBox::new(10, 20, 30, 40);
        assert_eq!(bbox.top_left(), Point::new(10, 20));
        assert_eq!(bbox.bottom_right(), Point::new(40, 60));
        assert_eq!(bbox.center(), Point::new(25, 40));
        assert_eq!(BBox::from_rect(bbox.to_rect()), bbox);
    }

    #[test]
    fn test_bbox_contains() {
        let outer = BBox::new(0, 0, 50, 50);
        assert!(outer.contains(&BBox::new(10, 10, 20, 20)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&BBox::new(40, 40, 20, 20)));
    }

    #[test]
    fn test_area_filter_is_strict() {
        let collection: RegionCollection = vec![
            Region::new(SignalColor::Red, 200.0, BBox::new(0, 0, 20, 10)),
            Region::new(SignalColor::Red, 200.5, BBox::new(30, 0, 20, 11)),
            Region::new(SignalColor::Green, 900.0, BBox::new(0, 40, 30, 30)),
        ]
        .into_iter()
        .collect();

        let kept = collection.filter_by_area(200.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.count_for(SignalColor::Red), 1);

        let stats = kept.stats();
        assert_eq!(stats.total_regions, 2);
        assert_eq!(stats.color_counts.get(&SignalColor::Green), Some(&1));
        assert_eq!(stats.max_area, 900.0);
    }
}
