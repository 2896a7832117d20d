//! Tests for pipeline module

use std::fs;
use std::path::PathBuf;

use geo::Coord;
use surveylines::io::export::{extreme_points_geojson, lines_geojson, segments_geojson};
use surveylines::io::report::flight_report;
use surveylines::io::Flight;
use surveylines::{
    assemble_network, process_flights, run_survey, AtomicProgressTracker, DirectionLabel,
    ExclusionSet, ExtremeRole, LocalEquirectangular, NoopProgress, PointKey, Projection,
    ReferenceFrame, SurveyConfig, SurveyError, SurveyProgress, TrajectoryPoint,
};
use tempfile::TempDir;

/// Lawn-mower flight over N-S lines at the given X positions, y = 0..1000,
/// with a diagonal connector between lines.
///
/// Each leg overshoots the block by one fix before turning. That fix heads
/// into the connector and is dropped, so every segment spans exactly 0..1000.
fn lawn_mower(line_xs: &[f64]) -> Vec<TrajectoryPoint> {
    let mut points = Vec::new();
    for (n, &x) in line_xs.iter().enumerate() {
        let ys: Vec<f64> = (0..=100).map(|i| i as f64 * 10.0).collect();
        let ys: Vec<f64> = if n % 2 == 0 { ys } else { ys.into_iter().rev().collect() };
        points.extend(ys.into_iter().map(|y| TrajectoryPoint::new(x, y, 1200.0)));
        if n + 1 < line_xs.len() {
            let (overshoot, turn) = if n % 2 == 0 { (1010.0, 1030.0) } else { (-10.0, -30.0) };
            points.push(TrajectoryPoint::new(x, overshoot, 1200.0));
            points.push(TrajectoryPoint::new(x + 50.0, turn, 1200.0));
        }
    }
    points
}

/// The same flights in longitude/latitude around (-99, 19).
fn geographic_flights() -> Vec<Flight> {
    let local = LocalEquirectangular::new(Coord { x: -99.0, y: 19.0 });
    three_flights()
        .into_iter()
        .map(|f| {
            let points = f
                .points
                .iter()
                .map(|p| {
                    let c = local.unproject(p.coord());
                    TrajectoryPoint::new(c.x, c.y, p.z)
                })
                .collect();
            Flight::new(f.id, points)
        })
        .collect()
}

/// Three flights; the second and third each re-fly the last line of the
/// flight before.
fn three_flights() -> Vec<Flight> {
    vec![
        Flight::new("v1", lawn_mower(&[0.0, 100.0, 200.0])),
        Flight::new("v2", lawn_mower(&[200.0, 300.0, 400.0])),
        Flight::new("v3", lawn_mower(&[400.0, 500.0, 600.0])),
    ]
}

fn projected_config() -> SurveyConfig {
    SurveyConfig {
        frame: ReferenceFrame::Projected { epsg: Some(32614) },
        ..SurveyConfig::default()
    }
}

#[test]
fn test_three_flight_deduplication() {
    let config = projected_config();
    let batch = process_flights(&three_flights(), &config, &NoopProgress).unwrap();
    assert_eq!(batch.summary.processed, vec!["v1", "v2", "v3"]);
    assert_eq!(batch.segments().count(), 9);

    let network = assemble_network(&batch, &config);
    assert_eq!(network.lines.len(), 7);

    let naive: f64 = batch.segments().map(|s| s.length()).sum();
    let merged: f64 = network.lines.iter().map(|l| l.line.length).sum();
    assert!(merged <= naive);

    let reflown: Vec<_> = network
        .lines
        .iter()
        .filter(|l| l.line.segment_count == 2)
        .collect();
    assert_eq!(reflown.len(), 2);
    for line in reflown {
        assert_eq!(line.line.source_flights.len(), 2);
        assert!((line.line.length - 1000.0).abs() < 1e-6);
    }
}

#[test]
fn test_network_numbering_and_products() {
    let config = projected_config();
    let batch = process_flights(&three_flights(), &config, &NoopProgress).unwrap();
    let network = assemble_network(&batch, &config);

    let xs: Vec<f64> = network.lines.iter().map(|l| l.centroid.x).collect();
    assert_eq!(xs, vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0]);
    assert_eq!(
        network.lines.iter().map(|l| l.id).collect::<Vec<_>>(),
        (1..=7).collect::<Vec<u32>>()
    );
    assert!(network.lines.iter().all(|l| *l.direction() == DirectionLabel::NorthSouth));

    assert_eq!(network.extreme_points.len(), 14);
    assert_eq!(network.straight_lines.len(), 7);
    assert!(network.frame.local.is_none());
}

#[test]
fn test_boundary_walks_maxima_then_minima_back() {
    let config = projected_config();
    let batch = process_flights(&three_flights(), &config, &NoopProgress).unwrap();
    let network = assemble_network(&batch, &config);
    let boundary = network.boundary.as_ref().unwrap();

    // West to east along the north edge, then east to west along the south
    let walk: Vec<(u32, ExtremeRole)> = boundary
        .vertices
        .iter()
        .map(|p| (p.line_id, p.role))
        .collect();
    let mut expected: Vec<(u32, ExtremeRole)> =
        (1..=7).map(|id| (id, ExtremeRole::Max)).collect();
    expected.extend((1..=7).rev().map(|id| (id, ExtremeRole::Min)));
    assert_eq!(walk, expected);

    assert!((boundary.area() - 600_000.0).abs() < 1e-6);
    assert!((boundary.area_hectares() - 60.0).abs() < 1e-9);
}

#[test]
fn test_exclusions_from_config() {
    let mut config = projected_config();
    config.perimeter.exclude = vec!["7:max".parse::<PointKey>().unwrap()];
    let batch = process_flights(&three_flights(), &config, &NoopProgress).unwrap();
    let network = assemble_network(&batch, &config);
    let boundary = network.boundary.unwrap();
    assert_eq!(boundary.vertices.len(), 13);
}

#[test]
fn test_drop_unmerged_policy() {
    let mut config = projected_config();
    config.merge.drop_unmerged = vec![DirectionLabel::NorthSouth];
    let batch = process_flights(&three_flights(), &config, &NoopProgress).unwrap();
    let network = assemble_network(&batch, &config);
    assert_eq!(network.lines.len(), 2);
    assert_eq!(network.lines[0].id, 1);
}

#[test]
fn test_geographic_batch_is_projected() {
    let config = SurveyConfig::default();
    assert!(config.frame.is_geographic());
    let batch = process_flights(&geographic_flights(), &config, &NoopProgress).unwrap();
    let network = assemble_network(&batch, &config);

    assert!(network.frame.local.is_some());
    assert_eq!(network.frame, batch.frame);
    assert_eq!(network.lines.len(), 7);
    let total = network.total_length_km();
    assert!((total - 7.0).abs() < 1e-3, "total {total}");

    let boundary = network.boundary.as_ref().unwrap();
    assert!((boundary.area_hectares() - 60.0).abs() < 0.1);

    let first = network.projection().unproject(network.lines[0].line.geometry.0[0].0[0]);
    assert!((first.x - -99.0).abs() < 1e-9 && (first.y - 19.0).abs() < 1e-9);
}

#[test]
fn test_geographic_flight_lengths_are_metric() {
    let batch =
        process_flights(&geographic_flights(), &SurveyConfig::default(), &NoopProgress).unwrap();

    for flight in &batch.flights {
        let km = batch.flight_length_km(flight);
        assert!((km - 3.0).abs() < 1e-3, "{}: {km}", flight.flight_id);
    }
    assert!((batch.total_length_km() - 9.0).abs() < 1e-3);

    let report = flight_report(&batch.flights, &batch.frame);
    assert!(report
        .contains("Flight: v1 with direction N-S and total production line length 3.000 km"));
    assert!(report.ends_with("Total of all lengths: 9.000 km\n"));

    let layer = segments_geojson(&batch.flights[0].segments, &batch.frame);
    assert_eq!(layer["features"][0]["properties"]["long_km"], 1.0);
    // Per-flight layers keep the input coordinates
    let first = &layer["features"][0]["geometry"]["coordinates"][0];
    assert_eq!(first[0].as_f64(), Some(batch.flights[0].segments[0].geometry.0[0].x));
}

#[test]
fn test_geographic_products_are_written_in_degrees() {
    let config = SurveyConfig::default();
    let batch = process_flights(&geographic_flights(), &config, &NoopProgress).unwrap();
    let network = assemble_network(&batch, &config);

    let lines = lines_geojson(&network.lines, &network.frame);
    assert_eq!(lines["crs"]["properties"]["name"], "urn:ogc:def:crs:OGC:1.3:CRS84");
    let first = &lines["features"][0]["geometry"]["coordinates"][0][0];
    let (lon, lat) = (first[0].as_f64().unwrap(), first[1].as_f64().unwrap());
    assert!((lon - -99.0).abs() < 1e-9, "lon {lon}");
    assert!((lat - 19.0).abs() < 1e-9, "lat {lat}");

    let points =
        extreme_points_geojson(&network.extreme_points, &ExclusionSet::new(), &network.frame);
    for feature in points["features"].as_array().unwrap() {
        let lon = feature["geometry"]["coordinates"][0].as_f64().unwrap();
        assert!(lon > -99.001 && lon < -98.99, "lon {lon}");
    }
}

#[test]
fn test_flight_outcomes_are_summarized() {
    let flights = vec![
        Flight::new("good", lawn_mower(&[0.0, 100.0])),
        Flight::new("stationary", vec![TrajectoryPoint::new(1.0, 1.0, 10.0); 5]),
        Flight::new("single", vec![TrajectoryPoint::new(1.0, 1.0, 10.0)]),
    ];
    let batch = process_flights(&flights, &projected_config(), &NoopProgress).unwrap();
    assert_eq!(batch.summary.processed, vec!["good"]);
    // Too few points is no output, not a failure
    assert_eq!(batch.summary.empty, vec!["stationary", "single"]);
    assert!(batch.summary.failed.is_empty());
    assert_eq!(batch.summary.total(), 3);
    assert_eq!(batch.flights.len(), 3);
    assert!(batch.flights[2].is_empty());
}

#[test]
fn test_progress_is_reported() {
    let tracker = AtomicProgressTracker::new();
    let flights = three_flights();
    process_flights(&flights, &projected_config(), &tracker).unwrap();
    assert_eq!(tracker.current_phase(), "segmenting");
    assert_eq!(tracker.total(), 3);
    assert_eq!(tracker.completed(), 3);
}

#[test]
fn test_cancellation_stops_the_batch() {
    let tracker = AtomicProgressTracker::new();
    tracker.cancel();
    assert!(tracker.is_cancelled());
    let result = process_flights(&three_flights(), &projected_config(), &tracker);
    assert!(matches!(result, Err(SurveyError::Cancelled)));
}

fn write_flight(dir: &TempDir, name: &str, points: &[TrajectoryPoint]) -> PathBuf {
    let path = dir.path().join(name);
    let text: String = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} 0 {:.3} {:.3} {:.2}\n", i, p.x, p.y, p.z))
        .collect();
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_run_survey_from_files() {
    let dir = TempDir::new().unwrap();
    let mut paths: Vec<PathBuf> = three_flights()
        .iter()
        .map(|f| write_flight(&dir, &format!("{}.txt", f.id), &f.points))
        .collect();
    let broken = dir.path().join("v4.txt");
    fs::write(&broken, "0 0 1.0 not-a-number 3.0\n").unwrap();
    paths.push(broken);
    let grounded = dir.path().join("v5.txt");
    fs::write(&grounded, "0 0 1.0 2.0 -1.0\n0 0 1.0 3.0 -2.0\n").unwrap();
    paths.push(grounded);

    let result = run_survey(&paths, &projected_config(), &NoopProgress).unwrap();
    assert_eq!(result.batch.summary.processed.len(), 3);
    assert_eq!(result.batch.summary.failed.len(), 1);
    assert_eq!(result.batch.summary.failed[0].0, "v4");
    assert_eq!(result.batch.summary.empty, vec!["v5"]);
    assert_eq!(result.network.lines.len(), 7);
}

#[test]
fn test_run_survey_without_inputs() {
    let result = run_survey(&[], &SurveyConfig::default(), &NoopProgress);
    assert!(matches!(result, Err(SurveyError::NoInputFiles)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_flight(&dir, "v1.txt", &lawn_mower(&[0.0]));
    let mut config = projected_config();
    config.merge.tolerance = f64::NAN;
    let result = run_survey(&[path], &config, &NoopProgress);
    assert!(matches!(result, Err(SurveyError::Config(_))));
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("survey.json");
    fs::write(
        &path,
        r#"{
            "frame": "EPSG:32614",
            "merge": { "tolerance": 15.0, "drop_unmerged": ["E-W"] },
            "perimeter": { "exclude": [{ "line_id": 4, "role": "max" }] }
        }"#,
    )
    .unwrap();

    let config = SurveyConfig::load(&path).unwrap();
    assert_eq!(config.frame, ReferenceFrame::Projected { epsg: Some(32614) });
    assert_eq!(config.merge.tolerance, 15.0);
    assert_eq!(config.merge.drop_unmerged, vec![DirectionLabel::EastWest]);
    assert_eq!(config.perimeter.exclude.len(), 1);
    assert_eq!(config.segment.run_discard_divisor, 3);
    assert_eq!(config.reader.x_column, 2);

    fs::write(&path, r#"{ "frame": "not a frame" }"#).unwrap();
    assert!(SurveyConfig::load(&path).is_err());
}
