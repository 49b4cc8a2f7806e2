//! Topology builder: raw segments → [`RoadGraph`].
//!
//! # Pipeline
//!
//! ```text
//! add_segment(s)
//!   ① repair     Geometry → single LineString (or InvalidGeometryError)
//!   ② direction  resolve one-way attributes; reverse Backward segments
//!   ③ vertices   exact-coordinate lookup of both endpoints, allocate on miss
//! build()
//!   ④ cost       planar length + CostModel for every edge (Rayon with `parallel`)
//!   ⑤ adjacency  RoadGraph::from_parts derives CSR tables and components
//! ```
//!
//! Endpoints merge only when their coordinates are bit-for-bit equal.  No
//! tolerance snapping is done; geometric cleanup belongs upstream.
//!
//! # Geometry repair
//!
//! | Input                               | Outcome                                     |
//! |-------------------------------------|---------------------------------------------|
//! | `LineString`, `Line`                | accepted                                    |
//! | `MultiLineString` chaining end→start| parts merged into one line (repaired)       |
//! | `MultiLineString` otherwise         | longest part kept (repaired)                |
//! | consecutive repeated points         | removed (repaired)                          |
//! | crossing / touching itself          | loop cut out at the crossing (repaired)     |
//! | overlapping itself                  | dropped: `CollinearOverlap`                 |
//! | start == end                        | dropped: `ClosedRing`                       |
//! | < 2 distinct points                 | dropped: `TooFewPoints`                     |
//! | any other geometry type             | dropped: `NotALine`                         |

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Coord, Geometry, Line, LineString, MultiLineString};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use rn_core::{GeoPoint, OnewayPrecedence, RoutingConfig, VertexId, planar_length_m};

use crate::cost::CostModel;
use crate::error::{GeometryIssue, InvalidGeometryError};
use crate::network::{Edge, RoadGraph, Vertex};
use crate::segment::{Direction, Segment};
use crate::GraphResult;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ── Build output ──────────────────────────────────────────────────────────────

/// Per-build statistics and the list of rejected segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Segments that became edges.
    pub accepted: usize,
    /// Accepted segments whose geometry had to be repaired first.
    pub repaired: usize,
    /// Accepted segments that are one-way.
    pub oneway:   usize,
    /// Rejected segments, in input order.
    pub dropped:  Vec<InvalidGeometryError>,
}

/// A freshly built graph and the report of how it was built.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph:  RoadGraph,
    pub report: BuildReport,
}

// ── TopologyBuilder ───────────────────────────────────────────────────────────

/// An accepted segment waiting for its cost.
struct PendingEdge {
    source:    VertexId,
    target:    VertexId,
    geometry:  LineString<f64>,
    direction: Direction,
    class:     Option<String>,
    source_id: Option<i64>,
}

/// Accumulate segments, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use geo::line_string;
/// use rn_graph::{Segment, TopologyBuilder};
///
/// let mut b = TopologyBuilder::default();
/// b.add_segment(Segment::new(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 0.001)]));
/// b.add_segment(Segment::new(line_string![(x: 0.0, y: 0.001), (x: 0.001, y: 0.001)]));
/// let out = b.build();
/// assert_eq!(out.graph.vertex_count(), 3); // shared endpoint merged
/// assert_eq!(out.graph.edge_count(), 2);
/// ```
pub struct TopologyBuilder {
    cost:       CostModel,
    precedence: OnewayPrecedence,
    vertex_ids: FxHashMap<(u64, u64), VertexId>,
    vertices:   Vec<Vertex>,
    pending:    Vec<PendingEdge>,
    report:     BuildReport,
    seen:       usize,
}

impl TopologyBuilder {
    pub fn new(cost: CostModel, precedence: OnewayPrecedence) -> Self {
        Self {
            cost,
            precedence,
            vertex_ids: FxHashMap::default(),
            vertices:   Vec::new(),
            pending:    Vec::new(),
            report:     BuildReport::default(),
            seen:       0,
        }
    }

    /// Builder configured from the `speeds` and `oneway` sections.
    pub fn from_config(config: &RoutingConfig) -> GraphResult<Self> {
        let cost = CostModel::new(config.speeds.clone())?;
        Ok(Self::new(cost, config.oneway.precedence))
    }

    /// Validate, repair, and bind one segment.
    ///
    /// An unusable geometry is recorded in the report and skipped; it never
    /// fails the batch.
    pub fn add_segment(&mut self, segment: Segment) {
        let index = self.seen;
        self.seen += 1;

        let (mut line, repaired) = match repair_geometry(&segment.geometry) {
            Ok(ok) => ok,
            Err(issue) => {
                let err = InvalidGeometryError { index, source_id: segment.source_id, issue };
                debug!("{err}");
                self.report.dropped.push(err);
                return;
            }
        };

        let mut direction = segment.direction(self.precedence);
        if direction == Direction::Backward {
            line.0.reverse();
            direction = Direction::Forward;
        }

        // repair_geometry guarantees at least two points.
        let first = GeoPoint::from(line.0[0]);
        let last = GeoPoint::from(line.0[line.0.len() - 1]);
        let source = self.vertex_for(first);
        let target = self.vertex_for(last);

        self.report.accepted += 1;
        self.report.repaired += usize::from(repaired);
        self.report.oneway += usize::from(direction.is_oneway());

        self.pending.push(PendingEdge {
            source,
            target,
            geometry: line,
            direction,
            class: segment.class,
            source_id: segment.source_id,
        });
    }

    pub fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) {
        for s in segments {
            self.add_segment(s);
        }
    }

    /// Number of vertices allocated so far.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Cost every pending edge and produce the immutable graph.
    ///
    /// Time complexity: O(P) for costing (P = total points) + O(V + E) for
    /// the adjacency tables.
    pub fn build(self) -> BuildOutput {
        let cost = &self.cost;

        #[cfg(feature = "parallel")]
        let edges: Vec<Edge> = self.pending.into_par_iter().map(|p| cost_edge(cost, p)).collect();
        #[cfg(not(feature = "parallel"))]
        let edges: Vec<Edge> = self.pending.into_iter().map(|p| cost_edge(cost, p)).collect();

        let graph = RoadGraph::from_parts(self.vertices, edges);
        let report = self.report;

        if !report.dropped.is_empty() {
            warn!(
                "{} of {} segments dropped for invalid geometry",
                report.dropped.len(),
                self.seen
            );
        }
        info!(
            "built road graph: {} vertices, {} edges ({} one-way, {} repaired), {} components",
            graph.vertex_count(),
            graph.edge_count(),
            report.oneway,
            report.repaired,
            graph.component_count()
        );

        BuildOutput { graph, report }
    }

    fn vertex_for(&mut self, point: GeoPoint) -> VertexId {
        let vertices = &mut self.vertices;
        *self.vertex_ids.entry(point.bits()).or_insert_with(|| {
            let id = VertexId(vertices.len() as u32);
            vertices.push(Vertex { point });
            id
        })
    }
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new(CostModel::default(), OnewayPrecedence::default())
    }
}

/// Build a graph from a complete segment batch.
pub fn build_graph(
    config: &RoutingConfig,
    segments: impl IntoIterator<Item = Segment>,
) -> GraphResult<BuildOutput> {
    let mut builder = TopologyBuilder::from_config(config)?;
    builder.extend(segments);
    Ok(builder.build())
}

fn cost_edge(model: &CostModel, p: PendingEdge) -> Edge {
    let length_m = planar_length_m(&p.geometry);
    let cost = model.costs(length_m, p.class.as_deref(), p.direction);
    Edge {
        source:         p.source,
        target:         p.target,
        geometry:       p.geometry,
        length_m,
        cost_s:         cost.forward_s,
        reverse_cost_s: cost.reverse_s,
        class:          p.class,
        source_id:      p.source_id,
    }
}

// ── Geometry repair ───────────────────────────────────────────────────────────

/// Reduce `geometry` to one simple line.  The flag is `true` if anything
/// had to change.
pub fn repair_geometry(geometry: &Geometry<f64>) -> Result<(LineString<f64>, bool), GeometryIssue> {
    let (line, mut repaired) = match geometry {
        Geometry::LineString(ls) => (ls.clone(), false),
        Geometry::Line(l) => (LineString::from(vec![l.start, l.end]), false),
        Geometry::MultiLineString(mls) => representative_line(mls),
        Geometry::Point(_) => return Err(GeometryIssue::NotALine("Point")),
        Geometry::MultiPoint(_) => return Err(GeometryIssue::NotALine("MultiPoint")),
        Geometry::Polygon(_) => return Err(GeometryIssue::NotALine("Polygon")),
        Geometry::MultiPolygon(_) => return Err(GeometryIssue::NotALine("MultiPolygon")),
        Geometry::GeometryCollection(_) => return Err(GeometryIssue::NotALine("GeometryCollection")),
        Geometry::Rect(_) => return Err(GeometryIssue::NotALine("Rect")),
        Geometry::Triangle(_) => return Err(GeometryIssue::NotALine("Triangle")),
    };

    let mut coords = line.0;
    if coords.iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
        return Err(GeometryIssue::NonFinite);
    }

    let before = coords.len();
    coords.dedup();
    repaired |= coords.len() != before;

    if coords.len() < 2 {
        return Err(GeometryIssue::TooFewPoints);
    }
    if coords[0] == coords[coords.len() - 1] {
        return Err(GeometryIssue::ClosedRing);
    }

    repaired |= cut_loops(&mut coords)?;
    Ok((LineString::new(coords), repaired))
}

/// Merge parts that chain end → start; otherwise keep the longest part.
fn representative_line(mls: &MultiLineString<f64>) -> (LineString<f64>, bool) {
    let mut parts: Vec<&LineString<f64>> = mls.0.iter().filter(|p| !p.0.is_empty()).collect();
    match parts.len() {
        0 => return (LineString::new(Vec::new()), false),
        1 => return (parts[0].clone(), false),
        _ => {}
    }

    let mut merged: Vec<Coord<f64>> = parts.remove(0).0.clone();
    while !parts.is_empty() {
        let tail = merged[merged.len() - 1];
        let head = merged[0];
        if let Some(i) = parts.iter().position(|p| p.0[0] == tail) {
            merged.extend_from_slice(&parts.remove(i).0[1..]);
        } else if let Some(i) = parts.iter().position(|p| p.0[p.0.len() - 1] == head) {
            let mut front = parts.remove(i).0.clone();
            front.pop();
            front.extend_from_slice(&merged);
            merged = front;
        } else {
            break;
        }
    }

    if parts.is_empty() {
        return (LineString::new(merged), true);
    }

    let longest = mls
        .0
        .iter()
        .max_by(|a, b| planar_length_m(a).total_cmp(&planar_length_m(b)))
        .cloned()
        .unwrap_or_else(|| LineString::new(Vec::new()));
    (longest, true)
}

/// Remove self-intersections by cutting each loop out at its crossing point.
///
/// Endpoints never move.  Every cut removes at least one point, so the loop
/// terminates.
fn cut_loops(coords: &mut Vec<Coord<f64>>) -> Result<bool, GeometryIssue> {
    let mut repaired = false;

    'scan: loop {
        let n = coords.len();
        for i in 1..n.saturating_sub(1) {
            let later = Line::new(coords[i], coords[i + 1]);
            for j in 0..i {
                let earlier = Line::new(coords[j], coords[j + 1]);
                let adjacent = j + 1 == i;

                let crossing = match line_intersection(earlier, later) {
                    None => continue,
                    Some(LineIntersection::SinglePoint { intersection, .. }) => intersection,
                    Some(LineIntersection::Collinear { intersection }) => {
                        if intersection.start != intersection.end {
                            return Err(GeometryIssue::CollinearOverlap);
                        }
                        intersection.start
                    }
                };

                // Consecutive segments always meet at their shared point.
                if adjacent {
                    continue;
                }

                let mut cut: Vec<Coord<f64>> = Vec::with_capacity(n);
                cut.extend_from_slice(&coords[..=j]);
                cut.push(crossing);
                cut.extend_from_slice(&coords[i + 1..]);
                cut.dedup();
                *coords = cut;
                repaired = true;
                continue 'scan;
            }
        }
        return Ok(repaired);
    }
}
