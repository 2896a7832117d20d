//! # Coverage Perimeter
//!
//! Builds the survey boundary polygon from the extreme points of every
//! ordered line.
//!
//! ## Algorithm
//! 1. Take the two extreme points of each line along its principal axis
//!    (X for E-W lines, Y for everything else)
//! 2. Drop any points the caller excluded
//! 3. Seed the ring with the "max" point of smallest X
//! 4. Greedily append the nearest unused "max" point until none are left,
//!    then the nearest unused "min" point until none are left
//! 5. Close the ring back to the seed
//!
//! The walk is a nearest-neighbor heuristic, not an optimal tour, and is kept
//! exactly as is so boundaries stay reproducible between runs.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use geo::{Area, Coord, Line, LineString, Polygon};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{first_max_by, first_min_by, planar_distance, planar_distance_2};
use crate::{Bounds, DirectionLabel, OrderedLine, SurveyError};

/// Minimum distinct ring vertices for a polygon.
const MIN_RING_POINTS: usize = 3;

/// Square working units per hectare.
pub const SQUARE_UNITS_PER_HECTARE: f64 = 10_000.0;
/// Square working units per square kilometer.
pub const SQUARE_UNITS_PER_KM2: f64 = 1_000_000.0;

/// Which end of a line's principal axis a point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremeRole {
    Max,
    Min,
}

impl ExtremeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtremeRole::Max => "max",
            ExtremeRole::Min => "min",
        }
    }
}

impl fmt::Display for ExtremeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one extreme point: owning line id plus role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointKey {
    pub line_id: u32,
    pub role: ExtremeRole,
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_id, self.role)
    }
}

impl FromStr for PointKey {
    type Err = SurveyError;

    /// Parses `"<line_id>:<max|min>"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || SurveyError::Config(format!("invalid point key '{s}', expected <id>:<max|min>"));
        let (id, role) = s.split_once(':').ok_or_else(invalid)?;
        let line_id = id.trim().parse::<u32>().map_err(|_| invalid())?;
        let role = match role.trim().to_lowercase().as_str() {
            "max" => ExtremeRole::Max,
            "min" => ExtremeRole::Min,
            _ => return Err(invalid()),
        };
        Ok(PointKey { line_id, role })
    }
}

/// Points the caller wants left out of the boundary.
pub type ExclusionSet = BTreeSet<PointKey>;

/// Boundary construction settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerimeterConfig {
    /// Extreme points excluded from the boundary walk.
    /// Default: none
    pub exclude: Vec<PointKey>,
}

impl PerimeterConfig {
    pub fn exclusion_set(&self) -> ExclusionSet {
        self.exclude.iter().copied().collect()
    }
}

/// An extreme point of an ordered line.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremePoint {
    pub line_id: u32,
    pub role: ExtremeRole,
    pub direction: DirectionLabel,
    pub coord: Coord<f64>,
}

impl ExtremePoint {
    pub fn key(&self) -> PointKey {
        PointKey {
            line_id: self.line_id,
            role: self.role,
        }
    }
}

/// Max and min points of a line along its principal axis.
///
/// Ties resolve to the first occurrence in the coordinate sequence.
pub fn extreme_points(line: &OrderedLine) -> Option<[ExtremePoint; 2]> {
    let coords: Vec<Coord<f64>> = line.line.coords().copied().collect();
    let axis = |c: &Coord<f64>| {
        if line.direction().is_east_west() {
            c.x
        } else {
            c.y
        }
    };
    let max = first_max_by(&coords, axis)?;
    let min = first_min_by(&coords, axis)?;

    let point = |role, idx: usize| ExtremePoint {
        line_id: line.id,
        role,
        direction: line.direction().clone(),
        coord: coords[idx],
    };
    Some([point(ExtremeRole::Max, max), point(ExtremeRole::Min, min)])
}

/// Extreme points of every line, max before min, in line order.
pub fn collect_extreme_points(lines: &[OrderedLine]) -> Vec<ExtremePoint> {
    lines.iter().filter_map(extreme_points).flatten().collect()
}

/// Keys of the points inside `rect` (inclusive).
pub fn select_in_rect(points: &[ExtremePoint], rect: &Bounds) -> Vec<PointKey> {
    points
        .iter()
        .filter(|p| rect.contains(&p.coord))
        .map(ExtremePoint::key)
        .collect()
}

/// A line reduced to its two extreme points.
#[derive(Debug, Clone, PartialEq)]
pub struct StraightLine {
    pub id: u32,
    pub direction: DirectionLabel,
    /// From the max point to the min point
    pub line: Line<f64>,
}

impl StraightLine {
    pub fn length(&self) -> f64 {
        planar_distance(&self.line.start, &self.line.end)
    }
}

/// Replace every ordered line by the segment joining its extreme points.
pub fn straighten_lines(lines: &[OrderedLine]) -> Vec<StraightLine> {
    lines
        .iter()
        .filter_map(|l| {
            let [max, min] = extreme_points(l)?;
            Some(StraightLine {
                id: l.id,
                direction: l.direction().clone(),
                line: Line::new(max.coord, min.coord),
            })
        })
        .collect()
}

/// Closed coverage ring built from extreme points.
#[derive(Debug, Clone)]
pub struct BoundaryPolygon {
    /// Ring vertices in walk order, without the closing repeat
    pub vertices: Vec<ExtremePoint>,
    pub polygon: Polygon<f64>,
}

impl BoundaryPolygon {
    /// Closed exterior ring (first coordinate repeated at the end).
    pub fn ring(&self) -> &LineString<f64> {
        self.polygon.exterior()
    }

    /// Planar area in square working units.
    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    pub fn area_hectares(&self) -> f64 {
        self.area() / SQUARE_UNITS_PER_HECTARE
    }

    pub fn area_km2(&self) -> f64 {
        self.area() / SQUARE_UNITS_PER_KM2
    }
}

/// Move the candidate nearest to the chain's last point onto the chain until
/// none remain. Ties go to the earliest candidate.
fn extend_greedy<'a>(chain: &mut Vec<&'a ExtremePoint>, mut candidates: Vec<&'a ExtremePoint>) {
    while !candidates.is_empty() {
        let Some(last) = chain.last().map(|p| p.coord) else {
            chain.push(candidates.remove(0));
            continue;
        };
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, candidate) in candidates.iter().enumerate() {
            let d = planar_distance_2(&last, &candidate.coord);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        chain.push(candidates.remove(best));
    }
}

/// Walk the extreme points into a closed boundary polygon.
///
/// Returns `None` when no "max" point survives the exclusions or fewer than
/// three points remain.
pub fn build_boundary(points: &[ExtremePoint], exclude: &ExclusionSet) -> Option<BoundaryPolygon> {
    let available: Vec<&ExtremePoint> = points
        .iter()
        .filter(|p| !exclude.contains(&p.key()))
        .collect();

    let mut max_points: Vec<&ExtremePoint> = available
        .iter()
        .copied()
        .filter(|p| p.role == ExtremeRole::Max)
        .collect();
    max_points.sort_by(|a, b| a.coord.x.total_cmp(&b.coord.x));
    let min_points: Vec<&ExtremePoint> = available
        .iter()
        .copied()
        .filter(|p| p.role == ExtremeRole::Min)
        .collect();

    if max_points.is_empty() {
        warn!("[Perimeter] No max points available, boundary not built");
        return None;
    }
    if available.len() < MIN_RING_POINTS {
        warn!(
            "[Perimeter] Only {} points available, need {}",
            available.len(),
            MIN_RING_POINTS
        );
        return None;
    }

    let mut chain = vec![max_points.remove(0)];
    extend_greedy(&mut chain, max_points);
    extend_greedy(&mut chain, min_points);

    let mut ring: Vec<Coord<f64>> = chain.iter().map(|p| p.coord).collect();
    ring.push(chain[0].coord);
    let polygon = Polygon::new(LineString::new(ring), Vec::new());

    debug!(
        "[Perimeter] Ring of {} points, {} excluded",
        chain.len(),
        points.len() - available.len()
    );

    Some(BoundaryPolygon {
        vertices: chain.into_iter().cloned().collect(),
        polygon,
    })
}
