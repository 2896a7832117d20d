//! # Run Segmentation
//!
//! Turns one flight's ordered trajectory into directional line segments.
//!
//! ## Algorithm
//! 1. Compute a heading and a 10° bin for every point
//! 2. Pick the (at most two) most frequent bins: the survey heading and its
//!    reciprocal
//! 3. Walk the points once with a small state machine, marking points in a
//!    dominant bin as active and numbering maximal active blocks as runs
//! 4. Drop runs shorter than `M - M / divisor` points (M = longest run),
//!    which removes turn-arounds and noise while keeping the survey lines
//! 5. Label the flight from the bins that survived and emit one segment per run

use std::collections::HashMap;
use std::ops::Range;

use geo::Coord;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bearing::{bin_heading, classify_headings, DirectionBin};
use crate::geo_utils::line_string;
use crate::{DirectionLabel, LineSegment, TrajectoryPoint};

/// Configuration for run segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Number of most frequent bins treated as survey headings.
    /// Default: 2 (heading and reciprocal)
    pub dominant_bin_count: usize,

    /// Runs shorter than `M - M / run_discard_divisor` are discarded, where M
    /// is the longest run. Default: 3 (keep runs of at least two thirds of M)
    pub run_discard_divisor: usize,

    /// Minimum points for a run to produce a segment. Default: 2
    pub min_segment_points: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            dominant_bin_count: 2,
            run_discard_divisor: 3,
            min_segment_points: 2,
        }
    }
}

/// Per-point classification produced by the forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointState {
    /// Heading toward the next point, `None` for duplicates
    pub heading: Option<f64>,
    pub bin: Option<DirectionBin>,
    /// Bin is one of the dominant bins
    pub active: bool,
    /// Run the point belongs to (active points only)
    pub run_id: Option<u32>,
}

/// A maximal contiguous block of active points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub run_id: u32,
    /// Point indices covered by the run
    pub range: Range<usize>,
    /// Most frequent dominant bin inside the run
    pub bin: DirectionBin,
}

impl Run {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Segmentation result for one flight.
#[derive(Debug, Clone)]
pub struct FlightLines {
    pub flight_id: String,
    pub direction: DirectionLabel,
    /// Dominant bins, most frequent first
    pub dominant_bins: Vec<DirectionBin>,
    /// One entry per input point
    pub states: Vec<PointState>,
    /// Every run found before filtering
    pub runs: Vec<Run>,
    /// Runs that passed the length filter
    pub kept_runs: Vec<Run>,
    pub segments: Vec<LineSegment>,
}

impl FlightLines {
    pub(crate) fn empty(flight_id: &str, states: Vec<PointState>) -> Self {
        Self {
            flight_id: flight_id.to_string(),
            direction: DirectionLabel::Unknown,
            dominant_bins: Vec::new(),
            states,
            runs: Vec::new(),
            kept_runs: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of segment lengths in the units of the input coordinates.
    ///
    /// Kilometres depend on the batch frame; see
    /// [`FlightBatch::flight_length_km`](crate::FlightBatch::flight_length_km).
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length()).sum()
    }
}

/// The `count` most frequent defined bins, ties broken by first occurrence.
pub fn dominant_bins(bins: &[Option<DirectionBin>], count: usize) -> Vec<DirectionBin> {
    // (bin, frequency, first index)
    let mut tally: Vec<(DirectionBin, usize, usize)> = Vec::new();
    let mut slot: HashMap<DirectionBin, usize> = HashMap::new();

    for (i, bin) in bins.iter().enumerate() {
        let Some(bin) = bin else { continue };
        match slot.get(bin) {
            Some(&s) => tally[s].1 += 1,
            None => {
                slot.insert(*bin, tally.len());
                tally.push((*bin, 1, i));
            }
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    tally.into_iter().take(count).map(|(bin, _, _)| bin).collect()
}

/// Run numbering state for the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunTracker {
    /// No active point seen yet
    Idle,
    InRun(u32),
    /// Left run `n`; the next active point opens run `n + 1`
    Gap(u32),
}

impl RunTracker {
    fn step(self, active: bool) -> (Self, Option<u32>) {
        match (self, active) {
            (RunTracker::Idle, true) => (RunTracker::InRun(1), Some(1)),
            (RunTracker::Idle, false) => (RunTracker::Idle, None),
            (RunTracker::InRun(id), true) => (RunTracker::InRun(id), Some(id)),
            (RunTracker::InRun(id), false) => (RunTracker::Gap(id), None),
            (RunTracker::Gap(id), true) => (RunTracker::InRun(id + 1), Some(id + 1)),
            (RunTracker::Gap(id), false) => (RunTracker::Gap(id), None),
        }
    }
}

/// Build per-point states in a single forward pass.
pub fn classify_points(points: &[TrajectoryPoint], config: &SegmentConfig) -> Vec<PointState> {
    classify(points, config).0
}

fn classify(
    points: &[TrajectoryPoint],
    config: &SegmentConfig,
) -> (Vec<PointState>, Vec<DirectionBin>) {
    let headings = classify_headings(points);
    let bins: Vec<Option<DirectionBin>> = headings.iter().map(|h| bin_heading(*h)).collect();
    let dominant = dominant_bins(&bins, config.dominant_bin_count);

    let mut tracker = RunTracker::Idle;
    let states = headings
        .iter()
        .zip(bins.iter())
        .map(|(&heading, &bin)| {
            let active = bin.is_some_and(|b| dominant.contains(&b));
            let (next, run_id) = tracker.step(active);
            tracker = next;
            PointState {
                heading,
                bin,
                active,
                run_id,
            }
        })
        .collect();
    (states, dominant)
}

/// Group consecutive points sharing a run id.
pub fn find_runs(states: &[PointState]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < states.len() {
        let Some(run_id) = states[i].run_id else {
            i += 1;
            continue;
        };
        let start = i;
        while i < states.len() && states[i].run_id == Some(run_id) {
            i += 1;
        }
        let bins: Vec<Option<DirectionBin>> = states[start..i].iter().map(|s| s.bin).collect();
        if let Some(&bin) = dominant_bins(&bins, 1).first() {
            runs.push(Run {
                run_id,
                range: start..i,
                bin,
            });
        }
    }
    runs
}

/// Keep runs with at least `M - M / divisor` points, M being the longest run.
pub fn filter_runs(runs: &[Run], divisor: usize) -> Vec<Run> {
    let Some(longest) = runs.iter().map(Run::len).max() else {
        return Vec::new();
    };
    let threshold = longest - longest.checked_div(divisor).unwrap_or(0);
    runs.iter()
        .filter(|r| r.len() >= threshold)
        .cloned()
        .collect()
}

/// Label a flight from the bins of the retained points.
///
/// 180/360 anywhere wins as east-west, then 90/270 as north-south.
pub fn label_direction(states: &[PointState], kept: &[Run]) -> DirectionLabel {
    let retained = || {
        kept.iter()
            .flat_map(|r| states[r.range.clone()].iter())
            .filter_map(|s| s.bin)
    };
    if retained().any(|b| b.is_east_west()) {
        DirectionLabel::EastWest
    } else if retained().any(|b| b.is_north_south()) {
        DirectionLabel::NorthSouth
    } else {
        DirectionLabel::Unknown
    }
}

/// Segment one flight into directional line segments.
///
/// Never fails: flights without dominant bins or without surviving runs
/// come back with no segments and a logged warning.
pub fn segment_flight(
    flight_id: &str,
    points: &[TrajectoryPoint],
    config: &SegmentConfig,
) -> FlightLines {
    let (states, dominant) = classify(points, config);
    if dominant.is_empty() {
        warn!(
            "[Segmenter] {}: no defined headings in {} points",
            flight_id,
            points.len()
        );
        return FlightLines::empty(flight_id, states);
    }

    let runs = find_runs(&states);
    let kept_runs = filter_runs(&runs, config.run_discard_divisor);
    debug!(
        "[Segmenter] {}: dominant bins {:?}, {} runs, {} kept",
        flight_id,
        dominant.iter().map(|b| b.value()).collect::<Vec<_>>(),
        runs.len(),
        kept_runs.len()
    );

    let direction = label_direction(&states, &kept_runs);

    let mut segments = Vec::new();
    for run in &kept_runs {
        if run.len() < config.min_segment_points.max(2) {
            continue;
        }
        let coords: Vec<Coord<f64>> = points[run.range.clone()].iter().map(|p| p.coord()).collect();
        let Some(geometry) = line_string(coords) else {
            continue;
        };
        let segment = LineSegment {
            flight_id: flight_id.to_string(),
            sequence_id: segments.len() as u32 + 1,
            direction: direction.clone(),
            geometry,
        };
        if segment.length() > 0.0 {
            segments.push(segment);
        }
    }

    if segments.is_empty() {
        warn!("[Segmenter] {}: every run was filtered out", flight_id);
    }

    FlightLines {
        flight_id: flight_id.to_string(),
        direction,
        dominant_bins: dominant,
        states,
        runs,
        kept_runs,
        segments,
    }
}
