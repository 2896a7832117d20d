//! Tests for perimeter module

use geo::{Coord, LineString, MultiLineString};
use surveylines::{
    build_boundary, collect_extreme_points, extreme_points, order_lines, select_in_rect,
    straighten_lines, Bounds, DirectionLabel, ExclusionSet, ExtremeRole, MergedLine, OrderedLine,
    PerimeterConfig, PointKey,
};

fn merged(group_id: u32, direction: DirectionLabel, coords: &[(f64, f64)]) -> MergedLine {
    let ls: LineString<f64> = coords.iter().map(|&(x, y)| Coord { x, y }).collect();
    MergedLine {
        group_id,
        direction,
        geometry: MultiLineString::new(vec![ls]),
        length: 0.0,
        segment_count: 1,
        source_flights: Vec::new(),
    }
}

/// Three N-S lines at x = 0, 100, 200 spanning y = 0..1000.
fn block() -> Vec<OrderedLine> {
    order_lines(vec![
        merged(1, DirectionLabel::NorthSouth, &[(0.0, 0.0), (0.0, 1000.0)]),
        merged(2, DirectionLabel::NorthSouth, &[(100.0, 1000.0), (100.0, 0.0)]),
        merged(3, DirectionLabel::NorthSouth, &[(200.0, 0.0), (200.0, 1000.0)]),
    ])
}

fn c(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

#[test]
fn test_north_south_extremes_use_y() {
    let lines = block();
    let [max, min] = extreme_points(&lines[1]).unwrap();
    assert_eq!(max.role, ExtremeRole::Max);
    assert_eq!(max.coord, c(100.0, 1000.0));
    assert_eq!(min.coord, c(100.0, 0.0));
    assert_eq!(max.line_id, 2);
}

#[test]
fn test_east_west_extremes_use_x() {
    let lines = order_lines(vec![merged(
        1,
        DirectionLabel::EastWest,
        &[(50.0, 10.0), (0.0, 12.0), (300.0, 11.0), (120.0, 10.0)],
    )]);
    let [max, min] = extreme_points(&lines[0]).unwrap();
    assert_eq!(max.coord, c(300.0, 11.0));
    assert_eq!(min.coord, c(0.0, 12.0));
}

#[test]
fn test_extreme_ties_take_first_occurrence() {
    let lines = order_lines(vec![merged(
        1,
        DirectionLabel::Unknown,
        &[(0.0, 0.0), (0.0, 100.0), (5.0, 100.0), (5.0, 0.0)],
    )]);
    let [max, min] = extreme_points(&lines[0]).unwrap();
    assert_eq!(max.coord, c(0.0, 100.0));
    assert_eq!(min.coord, c(0.0, 0.0));
}

#[test]
fn test_collect_extreme_points_max_before_min() {
    let points = collect_extreme_points(&block());
    assert_eq!(points.len(), 6);
    for pair in points.chunks(2) {
        assert_eq!(pair[0].role, ExtremeRole::Max);
        assert_eq!(pair[1].role, ExtremeRole::Min);
        assert_eq!(pair[0].line_id, pair[1].line_id);
    }
}

#[test]
fn test_boundary_walk_visits_max_then_min() {
    let points = collect_extreme_points(&block());
    let boundary = build_boundary(&points, &ExclusionSet::new()).unwrap();

    let walk: Vec<Coord<f64>> = boundary.vertices.iter().map(|p| p.coord).collect();
    assert_eq!(
        walk,
        vec![
            c(0.0, 1000.0),
            c(100.0, 1000.0),
            c(200.0, 1000.0),
            c(200.0, 0.0),
            c(100.0, 0.0),
            c(0.0, 0.0),
        ]
    );

    let ring = boundary.ring();
    assert_eq!(ring.0.first(), ring.0.last());
    assert_eq!(ring.0.len(), 7);

    assert!((boundary.area() - 200_000.0).abs() < 1e-6);
    assert!((boundary.area_hectares() - 20.0).abs() < 1e-9);
    assert!((boundary.area_km2() - 0.2).abs() < 1e-12);
}

#[test]
fn test_staggered_line_ends_cross_the_ring() {
    // The walk never backtracks, so a ragged southern edge folds the ring
    let lines = order_lines(vec![
        merged(1, DirectionLabel::NorthSouth, &[(0.0, 0.0), (0.0, 990.0)]),
        merged(2, DirectionLabel::NorthSouth, &[(100.0, 10.0), (100.0, 1000.0)]),
        merged(3, DirectionLabel::NorthSouth, &[(200.0, 0.0), (200.0, 1000.0)]),
    ]);
    let boundary = build_boundary(&collect_extreme_points(&lines), &ExclusionSet::new()).unwrap();

    let walk: Vec<Coord<f64>> = boundary.vertices.iter().map(|p| p.coord).collect();
    assert_eq!(
        walk,
        vec![
            c(0.0, 990.0),
            c(100.0, 1000.0),
            c(200.0, 1000.0),
            c(100.0, 10.0),
            // Equidistant from (100, 10); the first line wins
            c(0.0, 0.0),
            c(200.0, 0.0),
        ]
    );
    assert!((boundary.area() - 49_500.0).abs() < 1e-6);
}

#[test]
fn test_excluded_points_are_skipped() {
    let points = collect_extreme_points(&block());
    let exclude: ExclusionSet = [PointKey {
        line_id: 3,
        role: ExtremeRole::Max,
    }]
    .into_iter()
    .collect();
    let boundary = build_boundary(&points, &exclude).unwrap();

    assert_eq!(boundary.vertices.len(), 5);
    assert!(boundary
        .vertices
        .iter()
        .all(|p| !(p.line_id == 3 && p.role == ExtremeRole::Max)));
    assert_eq!(boundary.vertices[0].coord, c(0.0, 1000.0));
}

#[test]
fn test_boundary_requires_a_max_point() {
    let points = collect_extreme_points(&block());
    let exclude: ExclusionSet = (1..=3)
        .map(|line_id| PointKey {
            line_id,
            role: ExtremeRole::Max,
        })
        .collect();
    assert!(build_boundary(&points, &exclude).is_none());
}

#[test]
fn test_boundary_requires_three_points() {
    let lines = order_lines(vec![merged(
        1,
        DirectionLabel::NorthSouth,
        &[(0.0, 0.0), (0.0, 100.0)],
    )]);
    let points = collect_extreme_points(&lines);
    assert_eq!(points.len(), 2);
    assert!(build_boundary(&points, &ExclusionSet::new()).is_none());
    assert!(build_boundary(&[], &ExclusionSet::new()).is_none());
}

#[test]
fn test_select_in_rect() {
    let points = collect_extreme_points(&block());
    let rect = Bounds {
        min_x: -10.0,
        max_x: 150.0,
        min_y: 900.0,
        max_y: 1100.0,
    };
    let keys = select_in_rect(&points, &rect);
    assert_eq!(
        keys,
        vec![
            PointKey {
                line_id: 1,
                role: ExtremeRole::Max
            },
            PointKey {
                line_id: 2,
                role: ExtremeRole::Max
            },
        ]
    );
}

#[test]
fn test_point_key_parsing() {
    let key: PointKey = "12:max".parse().unwrap();
    assert_eq!(key.line_id, 12);
    assert_eq!(key.role, ExtremeRole::Max);
    assert_eq!(key.to_string(), "12:max");
    assert_eq!(" 3 : MIN ".parse::<PointKey>().unwrap().role, ExtremeRole::Min);

    assert!("12".parse::<PointKey>().is_err());
    assert!("x:max".parse::<PointKey>().is_err());
    assert!("4:middle".parse::<PointKey>().is_err());
}

#[test]
fn test_perimeter_config_exclusions() {
    let config: PerimeterConfig =
        serde_json::from_str(r#"{"exclude": [{"line_id": 2, "role": "min"}]}"#).unwrap();
    let set = config.exclusion_set();
    assert!(set.contains(&PointKey {
        line_id: 2,
        role: ExtremeRole::Min
    }));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_straighten_lines() {
    let lines = order_lines(vec![merged(
        1,
        DirectionLabel::NorthSouth,
        &[(0.0, 0.0), (3.0, 50.0), (0.0, 100.0)],
    )]);
    let straight = straighten_lines(&lines);
    assert_eq!(straight.len(), 1);
    assert_eq!(straight[0].line.start, c(0.0, 100.0));
    assert_eq!(straight[0].line.end, c(0.0, 0.0));
    assert!((straight[0].length() - 100.0).abs() < 1e-12);
}
