//! Whitespace-delimited trajectory logs.
//!
//! One row per GNSS fix. Column positions are 0-based and configurable since
//! the logs come from several receivers with different layouts.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::geo_utils::round_to;
use crate::TrajectoryPoint;

/// Column layout and cleanup applied while reading a trajectory file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// 0-based column holding X (easting or longitude). Default: 2
    pub x_column: usize,
    /// 0-based column holding Y (northing or latitude). Default: 3
    pub y_column: usize,
    /// 0-based column holding Z (height). Default: 4
    pub z_column: usize,
    /// Leading rows dropped before parsing. Default: 0
    pub skip_rows: usize,
    /// Rows with fewer fields fail the file. Default: 5
    pub min_columns: usize,
    /// Decimal places kept on X. Default: 9
    pub round_x_decimals: Option<u32>,
    /// Decimal places kept on Y. Default: 6
    pub round_y_decimals: Option<u32>,
    /// Drop exact duplicate (x, y, z) rows, keeping the first. Default: true
    pub dedup: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            x_column: 2,
            y_column: 3,
            z_column: 4,
            skip_rows: 0,
            min_columns: 5,
            round_x_decimals: Some(9),
            round_y_decimals: Some(6),
            dedup: true,
        }
    }
}

impl ReaderConfig {
    fn required_columns(&self) -> usize {
        self.min_columns
            .max(self.x_column + 1)
            .max(self.y_column + 1)
            .max(self.z_column + 1)
    }
}

/// One flight's cleaned trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub id: String,
    pub points: Vec<TrajectoryPoint>,
}

impl Flight {
    pub fn new(id: impl Into<String>, points: Vec<TrajectoryPoint>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }
}

fn point_key(p: &TrajectoryPoint) -> (u64, u64, u64) {
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits())
}

/// Parse a trajectory from any buffered reader.
///
/// `source` is only used in error messages.
pub fn parse_trajectory<R: BufRead>(
    source: &Path,
    reader: R,
    config: &ReaderConfig,
) -> Result<Vec<TrajectoryPoint>> {
    let required = config.required_columns();
    let mut points = Vec::new();
    let mut seen = HashSet::new();
    let mut dropped_below_ground = 0usize;
    let mut duplicates = 0usize;

    for (idx, line) in reader.lines().enumerate().skip(config.skip_rows) {
        let line = line.map_err(|e| SurveyError::io(source, e))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < required {
            return Err(SurveyError::MissingColumn {
                path: source.to_path_buf(),
                column: required - 1,
                found: fields.len(),
            });
        }

        let parse = |column: usize| -> Result<f64> {
            fields[column].parse::<f64>().map_err(|_| SurveyError::Parse {
                path: source.to_path_buf(),
                line: idx + 1,
                message: format!("column {column}: '{}' is not a number", fields[column]),
            })
        };
        let mut x = parse(config.x_column)?;
        let mut y = parse(config.y_column)?;
        let z = parse(config.z_column)?;

        if z < 0.0 {
            dropped_below_ground += 1;
            continue;
        }
        if let Some(d) = config.round_x_decimals {
            x = round_to(x, d);
        }
        if let Some(d) = config.round_y_decimals {
            y = round_to(y, d);
        }

        let point = TrajectoryPoint::new(x, y, z);
        if !point.is_valid() {
            return Err(SurveyError::Parse {
                path: source.to_path_buf(),
                line: idx + 1,
                message: "non-finite coordinate".to_string(),
            });
        }
        if config.dedup && !seen.insert(point_key(&point)) {
            duplicates += 1;
            continue;
        }
        points.push(point);
    }

    debug!(
        "[Reader] {}: {} points ({} below ground, {} duplicates dropped)",
        source.display(),
        points.len(),
        dropped_below_ground,
        duplicates
    );
    Ok(points)
}

/// Read a trajectory file. The flight id is the file stem.
pub fn read_trajectory(path: &Path, config: &ReaderConfig) -> Result<Flight> {
    let file = File::open(path).map_err(|e| SurveyError::io(path, e))?;
    let points = parse_trajectory(path, BufReader::new(file), config)?;
    Ok(Flight::new(flight_id(path), points))
}

/// Flight id for a trajectory path (file stem).
pub fn flight_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Recursively find `<prefix>*.txt` files under `root`, sorted by path.
pub fn discover_flights(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| SurveyError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SurveyError::io(&dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("[Reader] Skipping non UTF-8 file name {}", path.display());
                continue;
            };
            if name.starts_with(prefix) && name.ends_with(".txt") {
                found.push(path);
            }
        }
    }

    found.sort();
    debug!(
        "[Reader] Found {} trajectory files under {}",
        found.len(),
        root.display()
    );
    Ok(found)
}
