//! File collaborators around the core algorithms.
//!
//! - [`trajectory`] reads whitespace-delimited GNSS logs
//! - [`export`] writes GeoJSON layers and KML documents
//! - [`report`] formats the plain-text length and area reports
//! - [`cameras`] rewrites camera event logs

pub mod cameras;
pub mod export;
pub mod report;
pub mod trajectory;

pub use cameras::{rename_camera_events, rename_camera_log};
pub use trajectory::{discover_flights, parse_trajectory, read_trajectory, Flight, ReaderConfig};
