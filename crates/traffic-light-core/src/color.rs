use serde::{Deserialize, Serialize};
use std::fmt;

/// A lamp color the pipeline segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalColor {
    Red,
    Yellow,
    Green,
}

impl SignalColor {
    /// Processing order. Outlines of later colors are drawn over earlier ones.
    pub const ALL: [SignalColor; 3] = [SignalColor::Red, SignalColor::Yellow, SignalColor::Green];

    pub fn name(&self) -> &'static str {
        match self {
            SignalColor::Red => "red",
            SignalColor::Yellow => "yellow",
            SignalColor::Green => "green",
        }
    }

    /// Canonical display color as (R, G, B).
    pub fn display_rgb(&self) -> (u8, u8, u8) {
        match self {
            SignalColor::Red => (255, 0, 0),
            SignalColor::Yellow => (255, 255, 0),
            SignalColor::Green => (0, 255, 0),
        }
    }
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
