//! Nearest-vertex index.
//!
//! An R-tree (via `rstar`) over Web Mercator vertex coordinates, bulk-loaded
//! once per graph and discarded with it.  Mercator is conformal, so the
//! tree's nearest candidate is the true nearest vertex except in near-ties;
//! candidates within [`TIE_MARGIN`] of the first are re-ranked by haversine
//! distance, which is also the distance reported to callers.
//!
//! Mercator `x` jumps by a full world width at the antimeridian.  When the
//! seam is closer to the query than the best candidate, the query is repeated
//! one world width over so vertices on the far side are found.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use rn_core::{GeoPoint, MERCATOR_HALF_WIDTH_M, VertexId};

use crate::network::RoadGraph;

/// Relative Mercator-distance margin within which candidates are re-ranked.
const TIE_MARGIN: f64 = 0.01;

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct VertexEntry {
    point: [f64; 2], // Web Mercator [x, y]
    id:    VertexId,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Snap results ──────────────────────────────────────────────────────────────

/// A query point resolved to a graph vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snap {
    pub vertex:     VertexId,
    /// Haversine metres from the query point to the vertex.
    pub distance_m: f64,
}

/// Why a point could not be snapped.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SnapError {
    /// The graph has no vertices.
    Empty,
    /// The nearest vertex is beyond the allowed distance.
    TooFar { nearest: Snap },
}

impl SnapError {
    /// Distance to the nearest vertex, if there is one.
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            SnapError::Empty => None,
            SnapError::TooFar { nearest } => Some(nearest.distance_m),
        }
    }
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

/// Nearest-vertex lookups over one [`RoadGraph`] generation.
pub struct SpatialIndex {
    tree:   RTree<VertexEntry>,
    points: Vec<GeoPoint>,
}

impl SpatialIndex {
    /// Bulk-load the tree: O(V log V).
    pub fn build(graph: &RoadGraph) -> Self {
        let entries: Vec<VertexEntry> = graph
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| VertexEntry {
                point: v.point.to_web_mercator(),
                id:    VertexId(i as u32),
            })
            .collect();

        Self {
            tree:   RTree::bulk_load(entries),
            points: graph.vertices.iter().map(|v| v.point).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest vertex to `pos`.  `None` only if the graph is empty.
    pub fn nearest(&self, pos: GeoPoint) -> Option<Snap> {
        let query = pos.to_web_mercator();
        let (mut best, reach_d2) = self.nearest_from(query, pos)?;

        if let Some(shifted) = seam_shift(query, reach_d2) {
            if let Some((alt, _)) = self.nearest_from(shifted, pos) {
                if closer(alt, best) {
                    best = alt;
                }
            }
        }
        Some(best)
    }

    /// Nearest vertex, rejected if farther than `max_distance_m`.
    pub fn snap(&self, pos: GeoPoint, max_distance_m: f64) -> Result<Snap, SnapError> {
        let nearest = self.nearest(pos).ok_or(SnapError::Empty)?;
        if nearest.distance_m > max_distance_m {
            return Err(SnapError::TooFar { nearest });
        }
        Ok(nearest)
    }

    /// Up to `k` vertices in ascending haversine distance.
    pub fn k_nearest(&self, pos: GeoPoint, k: usize) -> Vec<Snap> {
        if k == 0 {
            return Vec::new();
        }
        let query = pos.to_web_mercator();
        let mut found: Vec<(VertexId, f64)> = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&query)
            .take(k)
            .map(|(e, d2)| (e.id, d2))
            .collect();

        // Fewer than `k` hits means every vertex is already in hand.
        if found.len() == k {
            let reach_d2 = found[k - 1].1;
            if let Some(shifted) = seam_shift(query, reach_d2) {
                found.extend(
                    self.tree
                        .nearest_neighbor_iter_with_distance_2(&shifted)
                        .take(k)
                        .map(|(e, d2)| (e.id, d2)),
                );
            }
        }

        let mut snaps: Vec<Snap> = found.into_iter().map(|(id, _)| self.snap_of(id, pos)).collect();
        snaps.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m).then(a.vertex.cmp(&b.vertex)));
        snaps.dedup_by_key(|s| s.vertex);
        snaps.truncate(k);
        snaps
    }

    /// Best candidate around one Mercator query point, plus the squared
    /// Mercator radius that was searched.
    fn nearest_from(&self, query: [f64; 2], pos: GeoPoint) -> Option<(Snap, f64)> {
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);

        let (first, first_d2) = candidates.next()?;
        let limit_d2 = first_d2 * (1.0 + TIE_MARGIN).powi(2);

        let mut best = self.snap_of(first.id, pos);
        for (entry, d2) in candidates {
            if d2 > limit_d2 {
                break;
            }
            let alt = self.snap_of(entry.id, pos);
            if closer(alt, best) {
                best = alt;
            }
        }
        Some((best, limit_d2))
    }

    fn snap_of(&self, vertex: VertexId, pos: GeoPoint) -> Snap {
        Snap { vertex, distance_m: self.points[vertex.index()].distance_m(pos) }
    }
}

/// The query moved one world width across the antimeridian, if the seam lies
/// within `reach_d2` (squared Mercator metres) of it.
fn seam_shift(query: [f64; 2], reach_d2: f64) -> Option<[f64; 2]> {
    let gap = MERCATOR_HALF_WIDTH_M - query[0].abs();
    if gap * gap > reach_d2 {
        return None;
    }
    let width = 2.0 * MERCATOR_HALF_WIDTH_M;
    Some([query[0] - width.copysign(query[0]), query[1]])
}

fn closer(a: Snap, b: Snap) -> bool {
    a.distance_m < b.distance_m || (a.distance_m == b.distance_m && a.vertex < b.vertex)
}
