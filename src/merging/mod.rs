//! # Cross-Flight Merging
//!
//! Groups segments from every flight into physical survey lines.
//!
//! ## Algorithm
//! 1. Partition segments by direction label
//! 2. Index every segment endpoint in an R-tree
//! 3. For each endpoint, query neighbors within the tolerance and union the
//!    owning segments (Union-Find keyed by segment index)
//! 4. Dissolve each component's geometry and recompute its length
//!
//! The tolerance is a distance in working-frame units, so segments must be in
//! a projected frame before merging.

mod dissolve;
mod rtree;

use std::collections::BTreeMap;

use geo::{Euclidean, Length};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::union_find::UnionFind;
use crate::{DirectionLabel, LineSegment, MergedLine};

pub use dissolve::dissolve_lines;
pub use rtree::{build_endpoint_rtree, segments_near, IndexedEndpoint};

/// Configuration for cross-flight merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Maximum endpoint distance for two segments to be the same line
    /// (inclusive). Default: 10.0 working-frame units
    pub tolerance: f64,

    /// Direction labels whose unmerged (singleton) lines are discarded.
    /// Default: empty, keep everything
    pub drop_unmerged: Vec<DirectionLabel>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            drop_unmerged: Vec::new(),
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SurveyError::Config(format!(
                "merge tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// A connected component of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCluster {
    /// Dense 1-based id, ordered by each cluster's lowest segment index
    pub group_id: u32,
    pub direction: DirectionLabel,
    /// Indices into the input slice, ascending
    pub members: Vec<usize>,
}

/// Find connected components of segments under endpoint proximity.
pub fn cluster_segments(segments: &[LineSegment], config: &MergeConfig) -> Vec<SegmentCluster> {
    let mut by_direction: BTreeMap<&DirectionLabel, Vec<usize>> = BTreeMap::new();
    for (idx, segment) in segments.iter().enumerate() {
        by_direction.entry(&segment.direction).or_default().push(idx);
    }

    let mut components: Vec<(DirectionLabel, Vec<usize>)> = Vec::new();

    for (direction, members) in by_direction {
        let tree = build_endpoint_rtree(segments, &members);

        let mut uf = UnionFind::with_capacity(members.len());
        for &idx in &members {
            uf.make_set(idx);
        }

        for &idx in &members {
            let Some(ends) = segments[idx].endpoints() else {
                continue;
            };
            for end in &ends {
                for other in segments_near(&tree, end, config.tolerance) {
                    if other != idx {
                        uf.union(&idx, &other);
                    }
                }
            }
        }

        let groups = uf.groups();
        debug!(
            "[Merger] {}: {} segments in {} components",
            direction,
            members.len(),
            groups.len()
        );
        components.extend(groups.into_values().map(|m| (direction.clone(), m)));
    }

    components.sort_by_key(|(_, members)| members[0]);
    components
        .into_iter()
        .enumerate()
        .map(|(i, (direction, members))| SegmentCluster {
            group_id: i as u32 + 1,
            direction,
            members,
        })
        .collect()
}

/// Cluster segments and dissolve each component into one merged line.
pub fn merge_segments(segments: &[LineSegment], config: &MergeConfig) -> Vec<MergedLine> {
    let clusters = cluster_segments(segments, config);

    let merged: Vec<MergedLine> = clusters
        .into_iter()
        .map(|cluster| {
            let geometry = dissolve_lines(cluster.members.iter().map(|&i| &segments[i].geometry));
            let length = Euclidean.length(&geometry);

            let mut source_flights: Vec<String> = cluster
                .members
                .iter()
                .map(|&i| segments[i].flight_id.clone())
                .collect();
            source_flights.sort();
            source_flights.dedup();

            MergedLine {
                group_id: cluster.group_id,
                direction: cluster.direction,
                geometry,
                length,
                segment_count: cluster.members.len(),
                source_flights,
            }
        })
        .collect();

    info!(
        "[Merger] {} segments merged into {} lines",
        segments.len(),
        merged.len()
    );
    merged
}

/// Drop singleton lines for the given direction labels.
pub fn discard_unmerged(lines: Vec<MergedLine>, directions: &[DirectionLabel]) -> Vec<MergedLine> {
    if directions.is_empty() {
        return lines;
    }
    let before = lines.len();
    let kept: Vec<MergedLine> = lines
        .into_iter()
        .filter(|l| !(l.is_singleton() && directions.contains(&l.direction)))
        .collect();
    if kept.len() < before {
        info!("[Merger] Discarded {} unmerged lines", before - kept.len());
    }
    kept
}
