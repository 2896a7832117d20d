//! R-tree indexed segment endpoints and proximity queries.

use geo::Coord;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo_utils::planar_distance_2;
use crate::LineSegment;

/// A segment endpoint tagged with the owning segment's index.
#[derive(Debug, Clone, Copy)]
pub struct IndexedEndpoint {
    pub segment: usize,
    pub x: f64,
    pub y: f64,
}

impl RTreeObject for IndexedEndpoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedEndpoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        planar_distance_2(&Coord { x: self.x, y: self.y }, &Coord { x: point[0], y: point[1] })
    }
}

/// Build an R-tree over the start and end points of the selected segments.
pub fn build_endpoint_rtree(segments: &[LineSegment], members: &[usize]) -> RTree<IndexedEndpoint> {
    let endpoints: Vec<IndexedEndpoint> = members
        .iter()
        .filter_map(|&idx| segments[idx].endpoints().map(|ends| (idx, ends)))
        .flat_map(|(idx, ends)| {
            ends.into_iter().map(move |c| IndexedEndpoint {
                segment: idx,
                x: c.x,
                y: c.y,
            })
        })
        .collect();
    RTree::bulk_load(endpoints)
}

/// Segments with an endpoint within `tolerance` of `point` (inclusive).
pub fn segments_near<'a>(
    tree: &'a RTree<IndexedEndpoint>,
    point: &Coord<f64>,
    tolerance: f64,
) -> impl Iterator<Item = usize> + 'a {
    tree.locate_within_distance([point.x, point.y], tolerance * tolerance)
        .map(|e| e.segment)
}
