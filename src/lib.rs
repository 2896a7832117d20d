//! # Survey Lines
//!
//! Reconstructs aerial-survey flight lines from raw trajectory logs and
//! assembles them across flights into an ordered survey network with a
//! coverage polygon.
//!
//! This library provides:
//! - Heading classification into 10° direction bins
//! - Run segmentation of each flight into directional line segments
//! - Cross-flight merging of segments by endpoint proximity (R-tree + Union-Find)
//! - Deterministic line numbering by direction-specific spatial keys
//! - Boundary polygon construction by a greedy nearest-neighbor perimeter walk
//! - Thin file collaborators: whitespace-delimited trajectory input, GeoJSON,
//!   KML and text report output
//!
//! ## Features
//!
//! - **`parallel`** - Segment flights in parallel with rayon
//! - **`synthetic`** - Seeded lawn-mower survey generator for tests and benches
//! - **`cli`** - Build the `surveylines-cli` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use surveylines::{segment_flight, SegmentConfig, TrajectoryPoint};
//!
//! // A flight heading north along x = 0, turning, then heading south along x = 50
//! let mut points: Vec<TrajectoryPoint> =
//!     (0..20).map(|i| TrajectoryPoint::new(0.0, i as f64 * 10.0, 100.0)).collect();
//! points.push(TrajectoryPoint::new(25.0, 200.0, 100.0));
//! points.extend((0..20).map(|i| TrajectoryPoint::new(50.0, 190.0 - i as f64 * 10.0, 100.0)));
//!
//! let flight = segment_flight("flight-1", &points, &SegmentConfig::default());
//! assert_eq!(flight.segments.len(), 2);
//! assert_eq!(flight.direction.to_string(), "N-S");
//! ```

use std::fmt;
use std::str::FromStr;

use geo::{Centroid, Coord, Euclidean, Length, LineString, MultiLineString};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SurveyError};

// Union-Find data structure for proximity clustering
pub mod union_find;
pub use union_find::UnionFind;

// Planar geometry helpers (distances, extremes, rounding)
pub mod geo_utils;

// Heading computation and 10° binning
pub mod bearing;
pub use bearing::{bin_heading, classify_headings, heading, DirectionBin};

// Per-flight run segmentation
pub mod segmentation;
pub use segmentation::{segment_flight, FlightLines, PointState, Run, SegmentConfig};

// Cross-flight proximity merging
pub mod merging;
pub use merging::{cluster_segments, discard_unmerged, merge_segments, MergeConfig, SegmentCluster};

// Deterministic line numbering
pub mod ordering;
pub use ordering::order_lines;

// Extreme points and coverage polygon
pub mod perimeter;
pub use perimeter::{
    build_boundary, collect_extreme_points, extreme_points, select_in_rect, straighten_lines,
    BoundaryPolygon, ExclusionSet, ExtremePoint, ExtremeRole, PerimeterConfig, PointKey,
    StraightLine,
};

// Reference frames and reprojection seam
pub mod projection;
pub use projection::{Identity, LocalEquirectangular, Projection, ReferenceFrame, WorkingFrame};

// File collaborators (input parsing, vector and report output)
pub mod io;

// Batch orchestration across flights
pub mod pipeline;
pub use pipeline::{
    assemble_network, process_flights, run_survey, AtomicProgressTracker, BatchSummary,
    FlightBatch, NoopProgress, SurveyConfig, SurveyNetwork, SurveyPhase, SurveyProgress,
    SurveyResult,
};

// Synthetic survey generator
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A raw trajectory sample in the input reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl TrajectoryPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar coordinate (Z dropped).
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Check if all components are finite.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Direction label attached to every segment of a flight.
///
/// The variant order is the numbering order used by [`order_lines`]:
/// north-south lines first, then east-west, then everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DirectionLabel {
    NorthSouth,
    EastWest,
    /// Dominant bins were neither cardinal axis.
    Unknown,
    /// Any other label carried by imported data.
    Other(String),
}

impl DirectionLabel {
    pub fn as_str(&self) -> &str {
        match self {
            DirectionLabel::NorthSouth => "N-S",
            DirectionLabel::EastWest => "E-W",
            DirectionLabel::Unknown => "unknown-direction",
            DirectionLabel::Other(label) => label,
        }
    }

    pub fn is_east_west(&self) -> bool {
        matches!(self, DirectionLabel::EastWest)
    }
}

impl fmt::Display for DirectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectionLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(match compact.to_uppercase().as_str() {
            "N-S" | "NS" => DirectionLabel::NorthSouth,
            "E-W" | "EW" => DirectionLabel::EastWest,
            "UNKNOWN-DIRECTION" | "UNKNOWN" => DirectionLabel::Unknown,
            _ => DirectionLabel::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for DirectionLabel {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(label) => label,
            Err(never) => match never {},
        }
    }
}

impl From<DirectionLabel> for String {
    fn from(label: DirectionLabel) -> Self {
        label.as_str().to_string()
    }
}

/// Axis-aligned bounds of a coordinate set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of the given coordinates, `None` when empty.
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for c in iter {
            bounds.min_x = bounds.min_x.min(c.x);
            bounds.max_x = bounds.max_x.max(c.x);
            bounds.min_y = bounds.min_y.min(c.y);
            bounds.max_y = bounds.max_y.max(c.y);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, c: &Coord<f64>) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }
}

/// A directional polyline built from one surviving run of a flight.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    /// Flight (input file) this segment came from
    pub flight_id: String,
    /// 1-based position among the flight's segments
    pub sequence_id: u32,
    /// Direction label of the whole flight
    pub direction: DirectionLabel,
    /// At least two points, in original trajectory order
    pub geometry: LineString<f64>,
}

impl LineSegment {
    /// Planar length in working-frame units.
    pub fn length(&self) -> f64 {
        Euclidean.length(&self.geometry)
    }

    /// Length in kilometers, assuming a metric frame. For input-frame
    /// segments measure through [`WorkingFrame::segment_length_km`].
    pub fn length_km(&self) -> f64 {
        self.length() / 1000.0
    }

    pub fn start(&self) -> Option<Coord<f64>> {
        self.geometry.0.first().copied()
    }

    pub fn end(&self) -> Option<Coord<f64>> {
        self.geometry.0.last().copied()
    }

    /// First and last coordinate.
    pub fn endpoints(&self) -> Option<[Coord<f64>; 2]> {
        Some([self.start()?, self.end()?])
    }
}

/// Union of one or more segments judged to be the same physical line.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedLine {
    /// Component id assigned once during clustering
    pub group_id: u32,
    pub direction: DirectionLabel,
    /// Dissolved geometry of all member segments
    pub geometry: MultiLineString<f64>,
    /// Length of the dissolved geometry (overlaps counted once)
    pub length: f64,
    /// Number of input segments in the component
    pub segment_count: usize,
    /// Distinct source flights, sorted
    pub source_flights: Vec<String>,
}

impl MergedLine {
    pub fn length_km(&self) -> f64 {
        self.length / 1000.0
    }

    /// Length-weighted centroid of the dissolved geometry.
    pub fn centroid(&self) -> Option<Coord<f64>> {
        self.geometry.centroid().map(|p| p.0)
    }

    /// All coordinates of all pieces, in geometry order.
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.geometry.0.iter().flat_map(|ls| ls.0.iter())
    }

    /// True when no other segment was merged into this line.
    pub fn is_singleton(&self) -> bool {
        self.segment_count <= 1
    }
}

/// A merged line with its final sequence identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedLine {
    /// Dense 1-based identifier
    pub id: u32,
    /// Centroid used as the ordering key
    pub centroid: Coord<f64>,
    pub line: MergedLine,
}

impl OrderedLine {
    pub fn direction(&self) -> &DirectionLabel {
        &self.line.direction
    }

    pub fn length_km(&self) -> f64 {
        self.line.length_km()
    }
}
