//! Path engine: routing trait and the default Dijkstra implementation.
//!
//! # Search states
//!
//! ```text
//! unvisited ──relax──▶ frontier (queued, tentative cost) ──pop──▶ settled (final)
//! ```
//!
//! The source starts settled at cost 0.  The search ends successfully when
//! the target is settled and fails with [`GraphError::NoRoute`] when the
//! queue drains first.  Only arcs derived from usable edge directions are
//! walked (see [`RoadGraph::arcs`]), so one-way edges are never taken
//! backwards.
//!
//! # Budget
//!
//! [`SearchBudget`] bounds the number of settled vertices and, optionally,
//! wall-clock time.  Deadline and cancellation are checked every
//! [`CHECK_INTERVAL`] settles, which are the only suspension points.
//!
//! # Ties
//!
//! Equal aggregate costs are broken by the lower `VertexId`, and arcs are
//! relaxed in edge insertion order.  The chosen path is deterministic for a
//! fixed graph but no particular shape is promised among equal-cost paths.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Instant;

use rn_core::{EdgeId, SearchConfig, VertexId};

use crate::network::{RoadGraph, SearchArc};
use crate::GraphError;

/// Settles between deadline / cancellation checks.
pub const CHECK_INTERVAL: usize = 256;

// ── Route ─────────────────────────────────────────────────────────────────────

/// One traversed edge of a route.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouteStep {
    pub edge:       EdgeId,
    pub from:       VertexId,
    pub to:         VertexId,
    /// Cost of this edge in the direction taken, seconds.
    pub cost_s:     f64,
    /// Cumulative cost up to and including this edge, seconds.
    pub agg_cost_s: f64,
    /// `true` if the edge was taken source → target.
    pub forward:    bool,
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Edges in travel order.  Empty when source == target.
    pub steps:        Vec<RouteStep>,
    pub total_cost_s: f64,
}

impl Route {
    pub fn trivial() -> Self {
        Self { steps: Vec::new(), total_cost_s: 0.0 }
    }

    /// `true` if the source and target are the same vertex.
    pub fn is_trivial(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.steps.iter().map(|s| s.edge)
    }

    /// Vertex sequence including both ends.  Empty for a trivial route.
    pub fn vertices(&self) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = self.steps.iter().map(|s| s.from).collect();
        if let Some(last) = self.steps.last() {
            out.push(last.to);
        }
        out
    }

    /// Sum of edge lengths in metres.
    pub fn length_m(&self, graph: &RoadGraph) -> f64 {
        self.steps.iter().map(|s| graph.edge(s.edge).length_m).sum()
    }
}

// ── Budget ────────────────────────────────────────────────────────────────────

/// Limits on a single search.
#[derive(Clone, Debug)]
pub struct SearchBudget {
    pub max_settled: usize,
    pub deadline:    Option<Instant>,
    /// Set from another thread to abandon the search.
    pub cancel:      Option<Arc<AtomicBool>>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self { max_settled: usize::MAX, deadline: None, cancel: None }
    }

    /// Budget starting now, from the `search` config section.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            max_settled: config.max_settled,
            deadline:    config.max_duration().map(|d| Instant::now() + d),
            cancel:      None,
        }
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn interrupted(&self, settled: usize) -> Option<GraphError> {
        if self.cancel.as_ref().is_some_and(|c| c.load(AtomicOrdering::Relaxed)) {
            return Some(GraphError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(GraphError::BudgetExceeded { settled });
        }
        None
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable path engine.
///
/// Implementations must be `Send + Sync`: one router serves every
/// concurrent query against a shared, immutable graph.
pub trait Router: Send + Sync {
    /// Least-cost route from `from` to `to`.
    ///
    /// `from == to` yields an empty route with cost 0, not an error.
    fn route(
        &self,
        graph: &RoadGraph,
        from: VertexId,
        to: VertexId,
        budget: &SearchBudget,
    ) -> Result<Route, GraphError>;
}

/// Directed Dijkstra over [`RoadGraph::arcs`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        from: VertexId,
        to: VertexId,
        budget: &SearchBudget,
    ) -> Result<Route, GraphError> {
        dijkstra(graph, from, to, budget)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost:   f64,
    vertex: VertexId,
}

impl Eq for State {}

// Min-heap by cost, then by vertex id (reversed from standard BinaryHeap).
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a vertex was reached.
#[derive(Copy, Clone)]
struct Reached {
    tail: VertexId,
    arc:  SearchArc,
}

fn dijkstra(
    graph: &RoadGraph,
    from: VertexId,
    to: VertexId,
    budget: &SearchBudget,
) -> Result<Route, GraphError> {
    for v in [from, to] {
        if !graph.contains(v) {
            return Err(GraphError::VertexNotFound(v));
        }
    }
    if from == to {
        return Ok(Route::trivial());
    }

    let n = graph.vertex_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut settled = vec![false; n];
    let mut prev: Vec<Option<Reached>> = vec![None; n];
    let mut settled_count = 0usize;

    dist[from.index()] = 0.0;
    let mut heap = BinaryHeap::new();
    heap.push(State { cost: 0.0, vertex: from });

    while let Some(State { cost, vertex }) = heap.pop() {
        // Skip stale heap entries.
        if settled[vertex.index()] {
            continue;
        }
        settled[vertex.index()] = true;
        settled_count += 1;

        if vertex == to {
            return Ok(reconstruct(&prev, &dist, to));
        }
        if settled_count >= budget.max_settled {
            return Err(GraphError::BudgetExceeded { settled: settled_count });
        }
        if settled_count % CHECK_INTERVAL == 0 {
            if let Some(err) = budget.interrupted(settled_count) {
                return Err(err);
            }
        }

        for arc in graph.arcs(vertex) {
            let head = arc.head.index();
            if settled[head] {
                continue;
            }
            let next = cost + arc.cost_s;
            if next < dist[head] {
                dist[head] = next;
                prev[head] = Some(Reached { tail: vertex, arc: *arc });
                heap.push(State { cost: next, vertex: arc.head });
            }
        }
    }

    Err(GraphError::NoRoute { from, to })
}

fn reconstruct(prev: &[Option<Reached>], dist: &[f64], to: VertexId) -> Route {
    let mut steps = Vec::new();
    let mut cur = to;
    while let Some(reached) = prev[cur.index()] {
        steps.push(RouteStep {
            edge:       reached.arc.edge,
            from:       reached.tail,
            to:         cur,
            cost_s:     reached.arc.cost_s,
            agg_cost_s: dist[cur.index()],
            forward:    reached.arc.forward,
        });
        cur = reached.tail;
    }
    steps.reverse();
    Route { steps, total_cost_s: dist[to.index()] }
}
