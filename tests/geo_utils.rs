//! Tests for geo_utils module

use geo::Coord;
use surveylines::geo_utils::*;
use surveylines::Bounds;

fn c(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

#[test]
fn test_planar_distance() {
    assert_eq!(planar_distance(&c(0.0, 0.0), &c(3.0, 4.0)), 5.0);
    assert_eq!(planar_distance_2(&c(0.0, 0.0), &c(3.0, 4.0)), 25.0);
    assert_eq!(planar_distance(&c(1.0, 1.0), &c(1.0, 1.0)), 0.0);
}

#[test]
fn test_line_string_needs_two_points() {
    assert!(line_string(vec![c(0.0, 0.0)]).is_none());
    assert_eq!(line_string(vec![c(0.0, 0.0), c(1.0, 1.0)]).unwrap().0.len(), 2);
}

#[test]
fn test_first_extremes() {
    let coords = vec![c(0.0, 5.0), c(1.0, 9.0), c(2.0, 9.0), c(3.0, 1.0), c(4.0, 1.0)];
    assert_eq!(first_max_by(&coords, |p| p.y), Some(1));
    assert_eq!(first_min_by(&coords, |p| p.y), Some(3));
    assert_eq!(first_max_by(&[], |p: &Coord<f64>| p.y), None);
}

#[test]
fn test_round_to() {
    assert_eq!(round_to(1.234_567_89, 6), 1.234_568);
    assert_eq!(round_to(-2.5, 0), -3.0);
}

#[test]
fn test_bounds() {
    let coords = vec![c(5.0, -2.0), c(-1.0, 4.0), c(3.0, 0.0)];
    let bounds = Bounds::from_coords(&coords).unwrap();
    assert_eq!(bounds.min_x, -1.0);
    assert_eq!(bounds.max_x, 5.0);
    assert_eq!(bounds.min_y, -2.0);
    assert_eq!(bounds.max_y, 4.0);
    assert_eq!(bounds.center(), c(2.0, 1.0));
    assert!(bounds.contains(&c(5.0, 4.0)));
    assert!(!bounds.contains(&c(5.1, 4.0)));
    assert!(Bounds::from_coords(&[]).is_none());
}
