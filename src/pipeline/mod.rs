//! # Survey Pipeline
//!
//! Orchestrates a batch of flights end to end.
//!
//! ## Stages
//! 1. Read every trajectory file (a bad file skips that flight only)
//! 2. Segment each flight independently (optionally on a rayon pool)
//! 3. Barrier: collect every segment of the batch and fix the working frame
//!    (a local metric plane when the input is geographic)
//! 4. Project, merge across flights, apply the singleton policy, order
//! 5. Extract extreme points, straighten lines and build the boundary
//!
//! Every length and area is measured in the working frame.

mod progress;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, SurveyError};
use crate::io::trajectory::{flight_id, read_trajectory, Flight, ReaderConfig};
use crate::merging::{discard_unmerged, merge_segments, MergeConfig};
use crate::ordering::order_lines;
use crate::perimeter::{
    build_boundary, collect_extreme_points, straighten_lines, BoundaryPolygon, ExtremePoint,
    PerimeterConfig, StraightLine,
};
use crate::projection::{Projection, ReferenceFrame, WorkingFrame};
use crate::segmentation::{classify_points, segment_flight, FlightLines, SegmentConfig};
use crate::{LineSegment, OrderedLine};

pub use progress::{AtomicProgressTracker, NoopProgress, SurveyPhase, SurveyProgress};

/// Points a flight needs before a heading can be computed.
const MIN_FLIGHT_POINTS: usize = 2;

/// Every setting of a survey run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub reader: ReaderConfig,
    /// Frame of the input coordinates. Default: EPSG:4326
    pub frame: ReferenceFrame,
    pub segment: SegmentConfig,
    pub merge: MergeConfig,
    pub perimeter: PerimeterConfig,
}

impl SurveyConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| SurveyError::io(path, e))?;
        let config: SurveyConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.merge.validate()?;
        if self.segment.dominant_bin_count == 0 {
            return Err(SurveyError::Config(
                "dominant_bin_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of every flight in a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Flights that produced at least one segment
    pub processed: Vec<String>,
    /// Flights read successfully that produced no segments, including
    /// those with too few points for a heading
    pub empty: Vec<String>,
    /// Flights skipped with the reason
    pub failed: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.processed.len() + self.empty.len() + self.failed.len()
    }

    fn record_failure(&mut self, id: String, error: &SurveyError) {
        warn!("[Pipeline] Skipping flight {}: {}", id, error);
        self.failed.push((id, error.to_string()));
    }
}

/// Segmented flights of a batch.
///
/// Segments keep their input-frame coordinates; `frame` measures them.
#[derive(Debug, Clone, Default)]
pub struct FlightBatch {
    /// Flights in input order, including those with no segments
    pub flights: Vec<FlightLines>,
    pub summary: BatchSummary,
    pub frame: WorkingFrame,
}

impl FlightBatch {
    /// Every segment of every flight, in flight order.
    pub fn segments(&self) -> impl Iterator<Item = &LineSegment> {
        self.flights.iter().flat_map(|f| f.segments.iter())
    }

    /// Production length of one flight in kilometers.
    pub fn flight_length_km(&self, flight: &FlightLines) -> f64 {
        flight
            .segments
            .iter()
            .map(|s| self.frame.segment_length_km(s))
            .sum()
    }

    pub fn total_length_km(&self) -> f64 {
        self.flights.iter().map(|f| self.flight_length_km(f)).sum()
    }
}

/// Cross-flight products in the working frame.
#[derive(Debug, Clone)]
pub struct SurveyNetwork {
    pub frame: WorkingFrame,
    /// Input segments after projection
    pub segments: Vec<LineSegment>,
    pub lines: Vec<OrderedLine>,
    pub extreme_points: Vec<ExtremePoint>,
    pub straight_lines: Vec<StraightLine>,
    pub boundary: Option<BoundaryPolygon>,
}

impl SurveyNetwork {
    /// Projection between the input frame and the working frame.
    pub fn projection(&self) -> &dyn Projection {
        self.frame.projection()
    }

    pub fn total_length_km(&self) -> f64 {
        self.lines.iter().map(OrderedLine::length_km).sum()
    }
}

/// A complete survey run.
#[derive(Debug, Clone)]
pub struct SurveyResult {
    pub batch: FlightBatch,
    pub network: SurveyNetwork,
}

fn segment_checked(flight: &Flight, config: &SegmentConfig) -> Result<FlightLines> {
    flight
        .points
        .get(MIN_FLIGHT_POINTS - 1)
        .ok_or_insufficient_points(&flight.id, flight.points.len(), MIN_FLIGHT_POINTS)?;
    Ok(segment_flight(&flight.id, &flight.points, config))
}

fn process_one(
    flight: &Flight,
    config: &SegmentConfig,
    progress: &dyn SurveyProgress,
) -> Result<Result<FlightLines>> {
    if progress.is_cancelled() {
        return Err(SurveyError::Cancelled);
    }
    let outcome = segment_checked(flight, config);
    progress.on_progress();
    Ok(outcome)
}

/// Segment every flight independently.
///
/// Flights without segments, including those with fewer than two points, are
/// listed as empty. Cancellation is checked before each flight and aborts the
/// whole batch. The batch's working frame is fixed once every flight is
/// segmented.
pub fn process_flights(
    flights: &[Flight],
    config: &SurveyConfig,
    progress: &dyn SurveyProgress,
) -> Result<FlightBatch> {
    progress.on_phase(SurveyPhase::Segmenting, flights.len() as u32);

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<FlightLines>> = {
        use rayon::prelude::*;
        flights
            .par_iter()
            .map(|flight| process_one(flight, &config.segment, progress))
            .collect::<Result<Vec<_>>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Result<FlightLines>> = flights
        .iter()
        .map(|flight| process_one(flight, &config.segment, progress))
        .collect::<Result<Vec<_>>>()?;

    let mut batch = FlightBatch::default();
    for (flight, outcome) in flights.iter().zip(outcomes) {
        match outcome {
            Ok(lines) if lines.is_empty() => {
                batch.summary.empty.push(flight.id.clone());
                batch.flights.push(lines);
            }
            Ok(lines) => {
                batch.summary.processed.push(flight.id.clone());
                batch.flights.push(lines);
            }
            Err(e @ SurveyError::InsufficientPoints { .. }) => {
                debug!("[Pipeline] No output for flight {}: {}", flight.id, e);
                batch.summary.empty.push(flight.id.clone());
                let states = classify_points(&flight.points, &config.segment);
                batch.flights.push(FlightLines::empty(&flight.id, states));
            }
            Err(e) => batch.summary.record_failure(flight.id.clone(), &e),
        }
    }

    let segments: Vec<LineSegment> = batch.segments().cloned().collect();
    batch.frame = WorkingFrame::for_segments(config.frame, &segments);

    for lines in batch.flights.iter().filter(|f| !f.is_empty()) {
        info!(
            "[Pipeline] Flight {} with direction {} processed: {} segments, {:.3} km",
            lines.flight_id,
            lines.direction,
            lines.segments.len(),
            batch.flight_length_km(lines)
        );
    }
    Ok(batch)
}

/// Merge, order and bound the segments of a batch.
///
/// Segments are projected into the batch's working frame first. Excluded
/// extreme points come from `config.perimeter`.
pub fn assemble_network(batch: &FlightBatch, config: &SurveyConfig) -> SurveyNetwork {
    let frame = batch.frame;
    let segments: Vec<LineSegment> = batch
        .segments()
        .map(|s| frame.project_segment(s))
        .collect();

    let merged = merge_segments(&segments, &config.merge);
    let merged = discard_unmerged(merged, &config.merge.drop_unmerged);
    let lines = order_lines(merged);
    let extreme_points = collect_extreme_points(&lines);
    let straight_lines = straighten_lines(&lines);
    let boundary = build_boundary(&extreme_points, &config.perimeter.exclusion_set());

    info!(
        "[Pipeline] Network: {} lines, {:.3} km, boundary {}",
        lines.len(),
        lines.iter().map(OrderedLine::length_km).sum::<f64>(),
        match &boundary {
            Some(b) => format!("{:.3} ha", b.area_hectares()),
            None => "not built".to_string(),
        }
    );

    SurveyNetwork {
        frame,
        segments,
        lines,
        extreme_points,
        straight_lines,
        boundary,
    }
}

/// Read, segment and assemble a batch of trajectory files.
///
/// Fails only when there is nothing to process, on cancellation or on an
/// invalid configuration. Unreadable files are skipped and reported in the
/// batch summary.
pub fn run_survey(
    paths: &[PathBuf],
    config: &SurveyConfig,
    progress: &dyn SurveyProgress,
) -> Result<SurveyResult> {
    if paths.is_empty() {
        return Err(SurveyError::NoInputFiles);
    }
    config.validate()?;

    progress.on_phase(SurveyPhase::Reading, paths.len() as u32);
    let mut flights = Vec::with_capacity(paths.len());
    let mut read_failures = BatchSummary::default();
    for path in paths {
        if progress.is_cancelled() {
            return Err(SurveyError::Cancelled);
        }
        match read_trajectory(path, &config.reader) {
            Ok(flight) => flights.push(flight),
            Err(e) => read_failures.record_failure(flight_id(path), &e),
        }
        progress.on_progress();
    }

    let mut batch = process_flights(&flights, config, progress)?;
    let mut failed = read_failures.failed;
    failed.append(&mut batch.summary.failed);
    batch.summary.failed = failed;

    progress.on_phase(SurveyPhase::Assembling, 1);
    let network = assemble_network(&batch, config);
    progress.on_progress();

    info!(
        "[Pipeline] {} flights: {} processed, {} empty, {} failed",
        batch.summary.total(),
        batch.summary.processed.len(),
        batch.summary.empty.len(),
        batch.summary.failed.len()
    );

    Ok(SurveyResult { batch, network })
}
