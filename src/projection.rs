//! Reference frames and the reprojection seam.
//!
//! Merge tolerance, lengths and areas need a linear-unit frame. Geographic
//! input is mapped through a [`Projection`] before anything is measured, and
//! every written product is mapped back so one run never mixes frames.

use std::fmt;
use std::str::FromStr;

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};

use crate::{Bounds, LineSegment, SurveyError};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84_EPSG: u32 = 4326;

/// The frame input coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReferenceFrame {
    /// Longitude/latitude degrees (EPSG:4326)
    Geographic,
    /// Linear units, optionally tagged with an EPSG code
    Projected { epsg: Option<u32> },
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        ReferenceFrame::Geographic
    }
}

impl ReferenceFrame {
    pub fn is_geographic(&self) -> bool {
        matches!(self, ReferenceFrame::Geographic)
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            ReferenceFrame::Geographic => Some(WGS84_EPSG),
            ReferenceFrame::Projected { epsg } => *epsg,
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg() {
            Some(code) => write!(f, "EPSG:{code}"),
            None => f.write_str("projected"),
        }
    }
}

impl FromStr for ReferenceFrame {
    type Err = SurveyError;

    /// Accepts `EPSG:32614`, `32614`, `projected`, or an empty string (WGS84).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(ReferenceFrame::Geographic);
        }
        if trimmed.eq_ignore_ascii_case("projected") {
            return Ok(ReferenceFrame::Projected { epsg: None });
        }
        let code = trimmed
            .rsplit(':')
            .next()
            .unwrap_or(trimmed)
            .parse::<u32>()
            .map_err(|_| SurveyError::Config(format!("invalid reference frame '{s}'")))?;
        if code == WGS84_EPSG {
            Ok(ReferenceFrame::Geographic)
        } else {
            Ok(ReferenceFrame::Projected { epsg: Some(code) })
        }
    }
}

impl From<ReferenceFrame> for String {
    fn from(frame: ReferenceFrame) -> Self {
        frame.to_string()
    }
}

impl TryFrom<String> for ReferenceFrame {
    type Error = SurveyError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// A reversible mapping between the input frame and the working frame.
pub trait Projection: Send + Sync {
    /// Input frame to working (linear) frame.
    fn project(&self, c: Coord<f64>) -> Coord<f64>;
    /// Working frame back to input frame.
    fn unproject(&self, c: Coord<f64>) -> Coord<f64>;
    fn name(&self) -> String;

    /// Project every coordinate of a segment.
    fn project_segment(&self, segment: &LineSegment) -> LineSegment {
        LineSegment {
            geometry: segment.geometry.map_coords(|c| self.project(c)),
            ..segment.clone()
        }
    }

    /// Project an axis-aligned rectangle through its corners.
    ///
    /// Exact for projections that keep the axes parallel (identity,
    /// equirectangular).
    fn project_bounds(&self, bounds: &Bounds) -> Bounds {
        let a = self.project(Coord {
            x: bounds.min_x,
            y: bounds.min_y,
        });
        let b = self.project(Coord {
            x: bounds.max_x,
            y: bounds.max_y,
        });
        Bounds {
            min_x: a.x.min(b.x),
            max_x: a.x.max(b.x),
            min_y: a.y.min(b.y),
            max_y: a.y.max(b.y),
        }
    }
}

/// Coordinates are already in a linear frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Projection for Identity {
    fn project(&self, c: Coord<f64>) -> Coord<f64> {
        c
    }

    fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        c
    }

    fn name(&self) -> String {
        "identity".to_string()
    }
}

/// Equirectangular tangent-plane approximation around an origin.
///
/// Meters east/north of the origin; accurate to well under a meter per
/// kilometer across a single survey block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalEquirectangular {
    /// Origin longitude/latitude in degrees (x = lon, y = lat)
    pub origin: Coord<f64>,
    meters_per_degree_x: f64,
    meters_per_degree_y: f64,
}

impl LocalEquirectangular {
    pub fn new(origin: Coord<f64>) -> Self {
        let meters_per_degree_y = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let meters_per_degree_x = meters_per_degree_y * origin.y.to_radians().cos();
        Self {
            origin,
            meters_per_degree_x,
            meters_per_degree_y,
        }
    }

    /// Anchor at the center of the segments' bounds.
    pub fn centered_on(segments: &[LineSegment]) -> Option<Self> {
        let bounds = Bounds::from_coords(segments.iter().flat_map(|s| s.geometry.0.iter()))?;
        Some(Self::new(bounds.center()))
    }
}

impl Projection for LocalEquirectangular {
    fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.origin.x) * self.meters_per_degree_x,
            y: (c.y - self.origin.y) * self.meters_per_degree_y,
        }
    }

    fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + c.x / self.meters_per_degree_x,
            y: self.origin.y + c.y / self.meters_per_degree_y,
        }
    }

    fn name(&self) -> String {
        format!(
            "local equirectangular ({:.6}, {:.6})",
            self.origin.x, self.origin.y
        )
    }
}

/// Input frame of a batch and the linear frame it is measured in.
///
/// Projected input is measured as-is. Geographic input gets a
/// [`LocalEquirectangular`] plane centered on the batch's segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingFrame {
    /// Frame of the input coordinates and of every written product
    pub input: ReferenceFrame,
    /// Metric plane for geographic input, `None` when measuring as-is
    pub local: Option<LocalEquirectangular>,
}

impl WorkingFrame {
    /// Measure coordinates in the frame they arrive in.
    pub fn identity(input: ReferenceFrame) -> Self {
        Self { input, local: None }
    }

    /// Working frame for a batch of input-frame segments.
    pub fn for_segments(input: ReferenceFrame, segments: &[LineSegment]) -> Self {
        let local = if input.is_geographic() {
            LocalEquirectangular::centered_on(segments)
        } else {
            None
        };
        Self { input, local }
    }

    pub fn projection(&self) -> &dyn Projection {
        match &self.local {
            Some(local) => local,
            None => &Identity,
        }
    }

    /// Length of an input-frame segment in working units (meters).
    pub fn segment_length(&self, segment: &LineSegment) -> f64 {
        match &self.local {
            Some(local) => local.project_segment(segment).length(),
            None => segment.length(),
        }
    }

    pub fn segment_length_km(&self, segment: &LineSegment) -> f64 {
        self.segment_length(segment) / 1000.0
    }
}

impl Default for WorkingFrame {
    fn default() -> Self {
        Self::identity(ReferenceFrame::default())
    }
}

impl Projection for WorkingFrame {
    fn project(&self, c: Coord<f64>) -> Coord<f64> {
        self.projection().project(c)
    }

    fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        self.projection().unproject(c)
    }

    fn name(&self) -> String {
        format!("{} via {}", self.input, self.projection().name())
    }
}
