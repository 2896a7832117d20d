//! Heading computation and 10° direction binning.
//!
//! Headings use the planar convention `atan2(dy, dx)`: 0° points along +X
//! (east) and angles grow counter-clockwise, so east-west travel lands in the
//! 180/360 bins and north-south travel in 90/270.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TrajectoryPoint;

/// Width of a direction bin in degrees.
pub const BIN_WIDTH: u16 = 10;

/// Heading from `from` to `to` in degrees, normalized to `[0, 360)`.
///
/// Returns `None` for coincident points. Duplicate samples are routine in raw
/// logs, so this is not treated as an error.
pub fn heading(from: &TrajectoryPoint, to: &TrajectoryPoint) -> Option<f64> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    let degrees = dy.atan2(dx).to_degrees().rem_euclid(360.0);
    // rem_euclid can round tiny negative angles up to exactly 360
    if degrees >= 360.0 {
        Some(0.0)
    } else {
        Some(degrees)
    }
}

/// Per-point headings for a trajectory.
///
/// Point `i` carries the heading toward point `i + 1`; the last point repeats
/// the heading of the one before it.
pub fn classify_headings(points: &[TrajectoryPoint]) -> Vec<Option<f64>> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut headings: Vec<Option<f64>> = points
        .windows(2)
        .map(|w| heading(&w[0], &w[1]))
        .collect();
    let last = headings.last().copied().flatten();
    headings.push(last);
    headings
}

/// A 10°-wide heading bucket labeled by its center, one of `{10, 20, …, 360}`.
///
/// Bin 360 straddles the 0° seam and collects headings `≤ 5` or `> 355`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectionBin(u16);

impl DirectionBin {
    /// Bin for a heading, `None` for non-finite input.
    ///
    /// A heading `h` belongs to bin `g` when `g - 5 < h <= g + 5`.
    pub fn from_heading(h: f64) -> Option<Self> {
        if !h.is_finite() {
            return None;
        }
        if h <= 5.0 || h > 355.0 {
            return Some(DirectionBin(360));
        }
        (BIN_WIDTH..360)
            .step_by(BIN_WIDTH as usize)
            .find(|&g| {
                let center = f64::from(g);
                center - 5.0 < h && h <= center + 5.0
            })
            .map(DirectionBin)
    }

    /// Construct from a bin label, validating it is a multiple of 10 in `10..=360`.
    pub fn new(value: u16) -> Option<Self> {
        if (BIN_WIDTH..=360).contains(&value) && value % BIN_WIDTH == 0 {
            Some(DirectionBin(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// The bin 180° away.
    pub fn reciprocal(&self) -> Self {
        let v = (self.0 + 180) % 360;
        DirectionBin(if v == 0 { 360 } else { v })
    }

    /// Travel along the X axis.
    pub fn is_east_west(&self) -> bool {
        self.0 == 180 || self.0 == 360
    }

    /// Travel along the Y axis.
    pub fn is_north_south(&self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl fmt::Display for DirectionBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bin an optional heading. Undefined headings stay undefined.
pub fn bin_heading(heading: Option<f64>) -> Option<DirectionBin> {
    heading.and_then(DirectionBin::from_heading)
}
