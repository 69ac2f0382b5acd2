//! Orientation constraint and the square tie-break policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which image orientations the user wants to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    #[default]
    Both,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Portrait,
        Orientation::Landscape,
        Orientation::Both,
    ];

    /// Orientation of a `width` x `height` image; ties count as landscape.
    ///
    /// Never returns `Both`. Callers that care about squares check them first.
    pub fn of(width: u32, height: u32) -> Orientation {
        if width < height {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Whether an image of the given size satisfies this constraint.
    ///
    /// Square images pass every constraint.
    pub fn accepts(self, width: u32, height: u32) -> bool {
        if width == height || self == Orientation::Both {
            return true;
        }
        Orientation::of(width, height) == self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Both => "both",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected orientation value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("orientation should be one of the following: portrait, landscape, both (got {0:?})")]
pub struct ParseOrientationError(pub String);

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Orientation::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseOrientationError(s.to_string()))
    }
}
