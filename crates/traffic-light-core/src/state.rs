//! Signal state and the winner-take-all decision over mask pixel counts.

use crate::color::SignalColor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single state reported for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalState {
    Red,
    Yellow,
    Green,
    Unknown,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Red => "RED",
            SignalState::Yellow => "YELLOW",
            SignalState::Green => "GREEN",
            SignalState::Unknown => "UNKNOWN",
        }
    }
}

impl From<SignalColor> for SignalState {
    fn from(color: SignalColor) -> Self {
        match color {
            SignalColor::Red => SignalState::Red,
            SignalColor::Yellow => SignalState::Yellow,
            SignalColor::Green => SignalState::Green,
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total number of set pixels in each color mask, before any area filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCounts {
    pub red: u64,
    pub yellow: u64,
    pub green: u64,
}

impl PixelCounts {
    pub fn new(red: u64, yellow: u64, green: u64) -> Self {
        Self { red, yellow, green }
    }

    pub fn get(&self, color: SignalColor) -> u64 {
        match color {
            SignalColor::Red => self.red,
            SignalColor::Yellow => self.yellow,
            SignalColor::Green => self.green,
        }
    }

    pub fn total(&self) -> u64 {
        self.red + self.yellow + self.green
    }

    /// Strict majority, red then yellow then green. Any tie at the top,
    /// including all zeros, is `Unknown`.
    pub fn classify(&self) -> SignalState {
        let (r, y, g) = (self.red, self.yellow, self.green);

        if r > y && r > g {
            SignalState::Red
        } else if y > r && y > g {
            SignalState::Yellow
        } else if g > r && g > y {
            SignalState::Green
        } else {
            SignalState::Unknown
        }
    }
}
