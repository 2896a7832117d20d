//! Synthetic survey generator for tests and benchmarking.
//!
//! Generates lawn-mower survey blocks flown by several flights, with known
//! line positions, so merging and numbering can be checked against ground
//! truth.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use surveylines::synthetic::{LineOrientation, SurveyScenario};
//!
//! let scenario = SurveyScenario {
//!     line_count: 6,
//!     flight_count: 2,
//!     reflown_lines: 1,
//!     orientation: LineOrientation::NorthSouth,
//!     ..SurveyScenario::default()
//! };
//!
//! let survey = scenario.generate();
//! assert_eq!(survey.flights.len(), 2);
//! assert_eq!(survey.line_positions.len(), 6);
//! ```

use std::f64::consts::PI;

use geo::Coord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::io::trajectory::Flight;
use crate::projection::{LocalEquirectangular, Projection};
use crate::TrajectoryPoint;

/// Axis the survey lines run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrientation {
    NorthSouth,
    EastWest,
}

/// Layout of a synthetic survey block.
#[derive(Debug, Clone)]
pub struct SurveyScenario {
    /// South-west corner of the block in meters.
    pub origin: Coord<f64>,
    /// Number of parallel survey lines.
    pub line_count: usize,
    /// Length of each line in meters.
    pub line_length: f64,
    /// Distance between neighbouring lines in meters.
    pub line_spacing: f64,
    /// Distance between consecutive fixes in meters.
    pub point_spacing: f64,
    pub orientation: LineOrientation,
    /// Number of flights the block is split into.
    pub flight_count: usize,
    /// Lines each flight re-flies from the end of the previous one.
    pub reflown_lines: usize,
    /// Lateral GPS noise standard deviation in meters.
    pub noise_sigma: f64,
    /// Flying height in meters.
    pub altitude: f64,
    /// When set, output is longitude/latitude around this origin.
    pub geographic_origin: Option<Coord<f64>>,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SurveyScenario {
    fn default() -> Self {
        Self {
            origin: Coord { x: 500_000.0, y: 2_000_000.0 },
            line_count: 10,
            line_length: 1_000.0,
            line_spacing: 100.0,
            point_spacing: 10.0,
            orientation: LineOrientation::NorthSouth,
            flight_count: 1,
            reflown_lines: 0,
            noise_sigma: 0.0,
            altitude: 1_200.0,
            geographic_origin: None,
            seed: 42,
        }
    }
}

/// A generated survey with its ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticSurvey {
    pub flights: Vec<Flight>,
    /// Cross-track position of every distinct line, ascending.
    pub line_positions: Vec<f64>,
    /// Total fixes across all flights.
    pub total_points: usize,
}

impl SurveyScenario {
    /// A block split across three flights that each re-fly one line.
    pub fn three_flights() -> Self {
        Self {
            line_count: 9,
            flight_count: 3,
            reflown_lines: 1,
            ..Self::default()
        }
    }

    /// A large block for benchmarks.
    pub fn large_block() -> Self {
        Self {
            line_count: 60,
            line_length: 5_000.0,
            flight_count: 6,
            reflown_lines: 1,
            noise_sigma: 0.05,
            ..Self::default()
        }
    }

    /// Lines covered by flight `index`, as a half-open range of line indices.
    pub fn flight_lines(&self, index: usize) -> std::ops::Range<usize> {
        let flights = self.flight_count.max(1);
        let per_flight = self.line_count.div_ceil(flights);
        let start = (index * per_flight).saturating_sub(if index > 0 { self.reflown_lines } else { 0 });
        let end = ((index + 1) * per_flight).min(self.line_count);
        start.min(end)..end
    }

    /// Map block-local (cross-track, along-track) meters to output coordinates.
    fn place(&self, cross: f64, along: f64) -> Coord<f64> {
        let local = match self.orientation {
            LineOrientation::NorthSouth => Coord { x: cross, y: along },
            LineOrientation::EastWest => Coord { x: along, y: cross },
        };
        match self.geographic_origin {
            Some(origin) => LocalEquirectangular::new(origin).unproject(local),
            None => Coord {
                x: self.origin.x + local.x,
                y: self.origin.y + local.y,
            },
        }
    }

    fn line_fixes(&self, line: usize, reverse: bool) -> Vec<(f64, f64)> {
        let cross = line as f64 * self.line_spacing;
        let steps = (self.line_length / self.point_spacing).round().max(1.0) as usize;
        let mut fixes: Vec<(f64, f64)> = (0..=steps)
            .map(|i| (cross, i as f64 * self.line_length / steps as f64))
            .collect();
        if reverse {
            fixes.reverse();
        }
        fixes
    }

    /// Half-circle turn from the end of one line to the start of the next.
    fn turn_fixes(&self, from_line: usize, at_top: bool) -> Vec<(f64, f64)> {
        let radius = self.line_spacing / 2.0;
        let center_cross = from_line as f64 * self.line_spacing + radius;
        let steps = ((PI * radius) / self.point_spacing).ceil().max(2.0) as usize;
        (1..steps)
            .map(|k| {
                let theta = PI * k as f64 / steps as f64;
                let cross = center_cross - radius * theta.cos();
                let offset = radius * theta.sin();
                let along = if at_top {
                    self.line_length + offset
                } else {
                    -offset
                };
                (cross, along)
            })
            .collect()
    }

    /// Generate every flight of the scenario.
    pub fn generate(&self) -> SyntheticSurvey {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut flights = Vec::with_capacity(self.flight_count);

        for f in 0..self.flight_count.max(1) {
            let range = self.flight_lines(f);
            let mut fixes: Vec<(f64, f64)> = Vec::new();
            for (n, line) in range.clone().enumerate() {
                // Lines alternate direction within a flight
                let reverse = n % 2 == 1;
                fixes.extend(self.line_fixes(line, reverse));
                if line + 1 < range.end {
                    fixes.extend(self.turn_fixes(line, !reverse));
                }
            }

            let points = fixes
                .into_iter()
                .map(|(cross, along)| {
                    let cross = cross + gaussian(&mut rng) * self.noise_sigma;
                    let c = self.place(cross, along);
                    TrajectoryPoint::new(c.x, c.y, self.altitude)
                })
                .collect();
            flights.push(Flight::new(format!("flight_{:02}", f + 1), points));
        }

        let line_positions = (0..self.line_count)
            .map(|i| i as f64 * self.line_spacing)
            .collect();
        let total_points = flights.iter().map(|f| f.points.len()).sum();

        SyntheticSurvey {
            flights,
            line_positions,
            total_points,
        }
    }
}

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
