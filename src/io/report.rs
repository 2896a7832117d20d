//! Plain-text reports.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{Result, SurveyError};
use crate::perimeter::BoundaryPolygon;
use crate::projection::WorkingFrame;
use crate::segmentation::FlightLines;
use crate::OrderedLine;

/// Per-flight production length plus the grand total, measured in `frame`.
pub fn flight_report(flights: &[FlightLines], frame: &WorkingFrame) -> String {
    let mut out = String::new();
    let mut total = 0.0;
    for flight in flights {
        let km: f64 = flight
            .segments
            .iter()
            .map(|s| frame.segment_length_km(s))
            .sum();
        total += km;
        let _ = writeln!(
            out,
            "Flight: {} with direction {} and total production line length {:.3} km",
            flight.flight_id, flight.direction, km
        );
    }
    let _ = writeln!(out, "Total of all lengths: {total:.3} km");
    out
}

/// Length of every ordered line and the total.
pub fn volume_report(lines: &[OrderedLine]) -> String {
    let mut out = String::from("Survey volume:\n");
    for line in lines {
        let _ = writeln!(out, "Line {}: {:.3} km", line.id, line.length_km());
    }
    let total: f64 = lines.iter().map(OrderedLine::length_km).sum();
    let _ = writeln!(out, "\nTotal length in km: {total:.3}");
    out
}

/// Boundary area in square kilometers and hectares.
pub fn area_report(boundary: &BoundaryPolygon) -> String {
    format!(
        "Area in km2: {:.3}\nArea in hectares: {:.3}\n",
        boundary.area_km2(),
        boundary.area_hectares()
    )
}

/// Write a report to `path`, replacing any previous content.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| SurveyError::io(path, e))
}
