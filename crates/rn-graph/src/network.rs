//! Immutable road graph: vertex and edge arenas plus derived adjacency.
//!
//! # Data layout
//!
//! Vertices and edges are stored in two contiguous arenas indexed by
//! `VertexId` / `EdgeId`.  Three **Compressed Sparse Row (CSR)** tables are
//! derived once, at construction:
//!
//! ```text
//! outgoing(v) = out_edges[ out_start[v] .. out_start[v+1] ]   edges with source == v
//! incoming(v) = in_edges [ in_start[v]  .. in_start[v+1]  ]   edges with target == v
//! arcs(v)     = arcs     [ arc_start[v] .. arc_start[v+1] ]   traversable moves out of v
//! ```
//!
//! `arcs` is what the path engine walks: one arc per usable direction of each
//! edge, so a two-way edge appears twice (once from each end) and a one-way
//! edge once.  Within a vertex, arcs keep edge insertion order, which makes
//! searches deterministic for a fixed input.
//!
//! Weakly connected components are labelled at construction as well.

use geo::LineString;

use rn_core::{EdgeId, GeoPoint, VertexId};

use crate::cost::EdgeCost;

/// A deduplicated endpoint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub point: GeoPoint,
}

/// One street segment bound to its endpoint vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub source:         VertexId,
    pub target:         VertexId,
    /// Lon/lat geometry, digitised source → target.
    pub geometry:       LineString<f64>,
    /// Planar-projected length in metres.
    pub length_m:       f64,
    /// Seconds to traverse source → target.
    pub cost_s:         f64,
    /// Seconds to traverse target → source, or
    /// [`REVERSE_SENTINEL`](crate::REVERSE_SENTINEL).
    pub reverse_cost_s: f64,
    pub class:          Option<String>,
    pub source_id:      Option<i64>,
}

impl Edge {
    #[inline]
    pub fn cost(&self) -> EdgeCost {
        EdgeCost { forward_s: self.cost_s, reverse_s: self.reverse_cost_s }
    }
}

/// A traversable move out of a vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchArc {
    pub edge:    EdgeId,
    /// Vertex reached by taking the arc.
    pub head:    VertexId,
    pub cost_s:  f64,
    /// `true` if the edge is taken source → target.
    pub forward: bool,
}

/// Directed, cost-weighted road graph.
///
/// Built by [`TopologyBuilder`](crate::TopologyBuilder) and immutable
/// afterwards; share it behind an `Arc`.
#[derive(Clone, Debug)]
pub struct RoadGraph {
    /// Indexed by `VertexId`.
    pub vertices: Vec<Vertex>,
    /// Indexed by `EdgeId`.
    pub edges:    Vec<Edge>,

    out_start: Vec<u32>,
    out_edges: Vec<EdgeId>,
    in_start:  Vec<u32>,
    in_edges:  Vec<EdgeId>,
    arc_start: Vec<u32>,
    arcs:      Vec<SearchArc>,

    component:       Vec<u32>,
    component_count: usize,
}

impl RoadGraph {
    /// A graph with no vertices or edges.  Every snap against it fails.
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    /// Assemble a graph and derive its adjacency.
    ///
    /// Every edge's `source` and `target` must index into `vertices`.
    pub(crate) fn from_parts(vertices: Vec<Vertex>, edges: Vec<Edge>) -> Self {
        let n = vertices.len();
        debug_assert!(edges.iter().all(|e| e.source.index() < n && e.target.index() < n));

        let (out_start, out_edges) =
            csr(n, edges.iter().enumerate().map(|(i, e)| (e.source, edge_id(i))));
        let (in_start, in_edges) =
            csr(n, edges.iter().enumerate().map(|(i, e)| (e.target, edge_id(i))));

        let moves = edges.iter().enumerate().flat_map(|(i, e)| {
            let cost = e.cost();
            let fwd = cost.forward_usable().then(|| {
                (e.source, SearchArc { edge: edge_id(i), head: e.target, cost_s: cost.forward_s, forward: true })
            });
            let rev = cost.reverse_usable().then(|| {
                (e.target, SearchArc { edge: edge_id(i), head: e.source, cost_s: cost.reverse_s, forward: false })
            });
            fwd.into_iter().chain(rev)
        });
        let (arc_start, arcs) = csr(n, moves);

        let (component, component_count) = label_components(n, &edges);

        Self {
            vertices,
            edges,
            out_start,
            out_edges,
            in_start,
            in_edges,
            arc_start,
            arcs,
            component,
            component_count,
        }
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        v.index() < self.vertices.len()
    }

    #[inline]
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v.index()]
    }

    #[inline]
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.index()]
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    /// Edges whose source is `v`, regardless of usability.
    pub fn outgoing(&self, v: VertexId) -> &[EdgeId] {
        &self.out_edges[range(&self.out_start, v)]
    }

    /// Edges whose target is `v`, regardless of usability.
    pub fn incoming(&self, v: VertexId) -> &[EdgeId] {
        &self.in_edges[range(&self.in_start, v)]
    }

    /// Traversable moves out of `v`, in both edge orientations.
    #[inline]
    pub fn arcs(&self, v: VertexId) -> &[SearchArc] {
        &self.arcs[range(&self.arc_start, v)]
    }

    // ── Components ────────────────────────────────────────────────────────

    /// Number of weakly connected components (isolated vertices count).
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Component label of `v`, dense in `0..component_count()`.
    pub fn component_of(&self, v: VertexId) -> u32 {
        self.component[v.index()]
    }

    /// `true` if `a` and `b` are joined by usable edges ignoring direction.
    /// A route can only exist when this holds.
    pub fn same_component(&self, a: VertexId, b: VertexId) -> bool {
        self.component_of(a) == self.component_of(b)
    }

    /// Sizes of all components, largest first.
    pub fn component_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.component_count];
        for &c in &self.component {
            sizes[c as usize] += 1;
        }
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }
}

// ── Construction helpers ──────────────────────────────────────────────────────

#[inline]
fn edge_id(i: usize) -> EdgeId {
    EdgeId(i as u32)
}

#[inline]
fn range(start: &[u32], v: VertexId) -> std::ops::Range<usize> {
    start[v.index()] as usize..start[v.index() + 1] as usize
}

/// Counting-sort `(row, item)` pairs into CSR form, stable within a row.
fn csr<T: Copy>(rows: usize, pairs: impl Iterator<Item = (VertexId, T)> + Clone) -> (Vec<u32>, Vec<T>) {
    let mut start = vec![0u32; rows + 1];
    for (row, _) in pairs.clone() {
        start[row.index() + 1] += 1;
    }
    for i in 1..=rows {
        start[i] += start[i - 1];
    }

    let mut fill = start.clone();
    let mut items: Vec<Option<T>> = vec![None; start[rows] as usize];
    for (row, item) in pairs {
        let slot = &mut fill[row.index()];
        items[*slot as usize] = Some(item);
        *slot += 1;
    }
    (start, items.into_iter().flatten().collect())
}

/// Union-find over usable edges; returns dense labels and their count.
fn label_components(n: usize, edges: &[Edge]) -> (Vec<u32>, usize) {
    let mut parent: Vec<u32> = (0..n as u32).collect();

    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            parent[x as usize] = parent[parent[x as usize] as usize];
            x = parent[x as usize];
        }
        x
    }

    for e in edges {
        let cost = e.cost();
        if !(cost.forward_usable() || cost.reverse_usable()) {
            continue;
        }
        let a = find(&mut parent, e.source.0);
        let b = find(&mut parent, e.target.0);
        if a != b {
            parent[a.max(b) as usize] = a.min(b);
        }
    }

    let mut label = vec![u32::MAX; n];
    let mut count = 0u32;
    let mut component = Vec::with_capacity(n);
    for v in 0..n as u32 {
        let root = find(&mut parent, v) as usize;
        if label[root] == u32::MAX {
            label[root] = count;
            count += 1;
        }
        component.push(label[root]);
    }
    (component, count as usize)
}
