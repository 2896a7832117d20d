//! Planar geometry utilities.
//!
//! All functions assume a linear-unit (projected) working frame. Degree-based
//! coordinates must be reprojected before distances mean anything.

use geo::{Coord, LineString};

/// Euclidean distance between two coordinates.
#[inline]
pub fn planar_distance(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Squared Euclidean distance (for R-tree comparisons).
#[inline]
pub fn planar_distance_2(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Build a line string, returning `None` for fewer than two coordinates.
pub fn line_string(coords: Vec<Coord<f64>>) -> Option<LineString<f64>> {
    if coords.len() < 2 {
        return None;
    }
    Some(LineString::new(coords))
}

/// Index of the first coordinate maximizing `key`.
pub fn first_max_by<F>(coords: &[Coord<f64>], key: F) -> Option<usize>
where
    F: Fn(&Coord<f64>) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in coords.iter().enumerate() {
        let k = key(c);
        match best {
            Some((_, bk)) if k <= bk => {}
            _ => best = Some((i, k)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first coordinate minimizing `key`.
pub fn first_min_by<F>(coords: &[Coord<f64>], key: F) -> Option<usize>
where
    F: Fn(&Coord<f64>) -> f64,
{
    first_max_by(coords, |c| -key(c))
}

/// Round to a fixed number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
