//! Geometric union of line strings.
//!
//! Edges lying on the same supporting line are projected onto it and their
//! intervals unioned, so re-flown stretches count once. The surviving edges
//! are then chained through degree-2 nodes back into line strings.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use geo::{Coord, LineString, MultiLineString};

/// Angular resolution for grouping collinear edges (radians).
const ANGLE_RESOLUTION: f64 = 1e-9;
/// Offset resolution for grouping collinear edges (working units).
const OFFSET_RESOLUTION: f64 = 1e-6;
/// Gap below which two collinear intervals are treated as touching.
const OVERLAP_EPSILON: f64 = 1e-9;

type NodeKey = (u64, u64);

fn node_key(c: &Coord<f64>) -> NodeKey {
    // + 0.0 folds -0.0 into 0.0
    ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits())
}

/// Edges sharing one supporting line, projected on its direction.
struct Family {
    ux: f64,
    uy: f64,
    edges: Vec<(Coord<f64>, Coord<f64>)>,
}

/// Union all input lines into a single multi-line geometry.
pub fn dissolve_lines<'a, I>(lines: I) -> MultiLineString<f64>
where
    I: IntoIterator<Item = &'a LineString<f64>>,
{
    let edges: Vec<(Coord<f64>, Coord<f64>)> = lines
        .into_iter()
        .flat_map(|ls| ls.lines())
        .filter(|l| l.start != l.end)
        .map(|l| (l.start, l.end))
        .collect();

    let Some(&(origin, _)) = edges.first() else {
        return MultiLineString::new(Vec::new());
    };

    let merged = merge_collinear(&edges, origin);
    MultiLineString::new(chain_edges(&merged))
}

/// Union overlapping or touching intervals of collinear edges.
fn merge_collinear(
    edges: &[(Coord<f64>, Coord<f64>)],
    origin: Coord<f64>,
) -> Vec<(Coord<f64>, Coord<f64>)> {
    let mut families: BTreeMap<(i64, i64), Family> = BTreeMap::new();

    for &(p, q) in edges {
        // Canonical orientation: increasing x, or increasing y when vertical
        let (a, b) = if q.x > p.x || (q.x == p.x && q.y > p.y) {
            (p, q)
        } else {
            (q, p)
        };
        let len = (b.x - a.x).hypot(b.y - a.y);
        let ux = (b.x - a.x) / len;
        let uy = (b.y - a.y) / len;
        let angle = uy.atan2(ux);
        let offset = -uy * (a.x - origin.x) + ux * (a.y - origin.y);
        let key = (
            (angle / ANGLE_RESOLUTION).round() as i64,
            (offset / OFFSET_RESOLUTION).round() as i64,
        );
        families
            .entry(key)
            .or_insert_with(|| Family {
                ux,
                uy,
                edges: Vec::new(),
            })
            .edges
            .push((a, b));
    }

    let mut out = Vec::new();
    for family in families.into_values() {
        let project = |c: &Coord<f64>| family.ux * (c.x - origin.x) + family.uy * (c.y - origin.y);

        // (t_start, t_end, start, end)
        let mut spans: Vec<(f64, f64, Coord<f64>, Coord<f64>)> = family
            .edges
            .iter()
            .map(|(a, b)| (project(a), project(b), *a, *b))
            .collect();
        spans.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)));

        let mut current = spans[0];
        for span in spans.into_iter().skip(1) {
            if span.0 <= current.1 + OVERLAP_EPSILON {
                if span.1.partial_cmp(&current.1) == Some(Ordering::Greater) {
                    current.1 = span.1;
                    current.3 = span.3;
                }
            } else {
                out.push((current.2, current.3));
                current = span;
            }
        }
        out.push((current.2, current.3));
    }
    out
}

/// Chain edges into line strings, breaking at nodes whose degree is not 2.
fn chain_edges(edges: &[(Coord<f64>, Coord<f64>)]) -> Vec<LineString<f64>> {
    let mut incident: HashMap<NodeKey, Vec<usize>> = HashMap::new();
    for (i, (a, b)) in edges.iter().enumerate() {
        incident.entry(node_key(a)).or_default().push(i);
        incident.entry(node_key(b)).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut lines = Vec::new();

    // Open chains start at endpoints and junctions
    for i in 0..edges.len() {
        for start in [edges[i].0, edges[i].1] {
            let starts = &incident[&node_key(&start)];
            if starts.len() == 2 {
                continue;
            }
            for &e in starts {
                if !used[e] {
                    lines.push(walk(edges, &incident, &mut used, start, e));
                }
            }
        }
    }

    // Whatever is left forms closed rings
    for i in 0..edges.len() {
        if !used[i] {
            lines.push(walk(edges, &incident, &mut used, edges[i].0, i));
        }
    }

    lines
}

fn walk(
    edges: &[(Coord<f64>, Coord<f64>)],
    incident: &HashMap<NodeKey, Vec<usize>>,
    used: &mut [bool],
    start: Coord<f64>,
    first: usize,
) -> LineString<f64> {
    let mut coords = vec![start];
    let mut node = start;
    let mut edge = first;

    loop {
        used[edge] = true;
        let (a, b) = edges[edge];
        let next = if node_key(&a) == node_key(&node) { b } else { a };
        coords.push(next);
        node = next;

        let around = &incident[&node_key(&node)];
        if around.len() != 2 {
            break;
        }
        match around.iter().find(|&&e| !used[e]) {
            Some(&e) => edge = e,
            None => break,
        }
    }

    LineString::new(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, Euclidean, Length};

    #[test]
    fn test_overlapping_collinear_lines_count_once() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 100.0)];
        let b = line_string![(x: 0.0, y: 50.0), (x: 0.0, y: 150.0)];
        let merged = dissolve_lines([&a, &b]);
        assert_eq!(merged.0.len(), 1);
        assert!((Euclidean.length(&merged) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_with_bend_is_chained() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)];
        let merged = dissolve_lines([&a]);
        assert_eq!(merged.0.len(), 1);
        assert_eq!(merged.0[0].0.len(), 3);
    }

    #[test]
    fn test_disjoint_lines_stay_apart() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0)];
        let b = line_string![(x: 5.0, y: 0.0), (x: 5.0, y: 10.0)];
        let merged = dissolve_lines([&a, &b]);
        assert_eq!(merged.0.len(), 2);
        assert!((Euclidean.length(&merged) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let merged = dissolve_lines(std::iter::empty::<&LineString<f64>>());
        assert!(merged.0.is_empty());
    }
}
