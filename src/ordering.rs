//! Deterministic numbering of merged lines.
//!
//! N-S lines are numbered west to east (ascending centroid X), then E-W lines
//! north to south (descending centroid Y), then every other label south to
//! north (ascending centroid Y). Ids are dense and start at 1.

use std::cmp::Ordering;

use geo::Coord;

use crate::{DirectionLabel, MergedLine, OrderedLine};

/// Numbering group of a direction label.
fn group_rank(direction: &DirectionLabel) -> u8 {
    match direction {
        DirectionLabel::NorthSouth => 0,
        DirectionLabel::EastWest => 1,
        _ => 2,
    }
}

/// Primary and secondary sort keys for a centroid.
fn sort_keys(direction: &DirectionLabel, c: &Coord<f64>) -> (f64, f64) {
    match direction {
        DirectionLabel::NorthSouth => (c.x, c.y),
        DirectionLabel::EastWest => (-c.y, c.x),
        _ => (c.y, c.x),
    }
}

fn compare(a: &(Coord<f64>, MergedLine), b: &(Coord<f64>, MergedLine)) -> Ordering {
    let (ca, la) = a;
    let (cb, lb) = b;
    let (pa, sa) = sort_keys(&la.direction, ca);
    let (pb, sb) = sort_keys(&lb.direction, cb);

    group_rank(&la.direction)
        .cmp(&group_rank(&lb.direction))
        .then(pa.total_cmp(&pb))
        .then(sa.total_cmp(&sb))
        .then(la.length.total_cmp(&lb.length))
        .then_with(|| {
            let fa = la.coords().next().map(|c| (c.x, c.y));
            let fb = lb.coords().next().map(|c| (c.x, c.y));
            match (fa, fb) {
                (Some((xa, ya)), Some((xb, yb))) => xa.total_cmp(&xb).then(ya.total_cmp(&yb)),
                _ => fa.is_some().cmp(&fb.is_some()),
            }
        })
}

/// Assign sequence ids to merged lines.
///
/// The result does not depend on the order of `lines`.
pub fn order_lines(lines: Vec<MergedLine>) -> Vec<OrderedLine> {
    let mut keyed: Vec<(Coord<f64>, MergedLine)> = lines
        .into_iter()
        .map(|line| {
            let centroid = line
                .centroid()
                .or_else(|| line.coords().next().copied())
                .unwrap_or(Coord { x: 0.0, y: 0.0 });
            (centroid, line)
        })
        .collect();

    keyed.sort_by(compare);

    keyed
        .into_iter()
        .enumerate()
        .map(|(i, (centroid, line))| OrderedLine {
            id: i as u32 + 1,
            centroid,
            line,
        })
        .collect()
}
