//! The Route Query Service.
//!
//! # Query pipeline
//!
//! ```text
//! route(request)
//!   ① validate   four coordinates present, finite, in range
//!   ② load       Arc of the current snapshot, held to the end of the query
//!   ③ snap       both points; either beyond max_distance_m → PointUnroutable
//!   ④ component  different weak components → NoRouteFound without searching
//!   ⑤ search     Router under the configured SearchBudget
//!   ⑥ respond    RouteResponse built from the route and the same snapshot
//! ```
//!
//! # Rebuilds
//!
//! A rebuild constructs the next graph and index off to the side, then
//! swaps the snapshot in one atomic step.  Rebuilds are serialized by a
//! mutex; queries never take it.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Instant, UNIX_EPOCH};

use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;

use rn_core::RoutingConfig;
use rn_graph::{
    BuildReport, DijkstraRouter, GraphResult, RoadGraph, Router, SearchBudget, Segment, Snap,
    SnapError, TopologyBuilder,
};

use crate::error::{RouteError, RouteResult};
use crate::query::RouteRequest;
use crate::response::RouteResponse;
use crate::snapshot::{GraphSnapshot, SnapshotStore};

/// Result of [`RouteService::rebuild`].
#[derive(Debug, Clone)]
pub struct Rebuilt {
    /// Generation this rebuild installed.
    pub generation: u64,
    pub report:     BuildReport,
}

/// Shared route service.  Wrap in an `Arc` and call from any thread.
pub struct RouteService<R: Router = DijkstraRouter> {
    config:     RoutingConfig,
    router:     R,
    store:      SnapshotStore,
    /// Last installed generation; held for the whole of a rebuild.
    generation: Mutex<u64>,
}

impl RouteService<DijkstraRouter> {
    /// A service with an empty graph.  Fails if `config` is invalid.
    pub fn new(config: RoutingConfig) -> GraphResult<Self> {
        Self::with_router(config, DijkstraRouter)
    }
}

impl<R: Router> RouteService<R> {
    pub fn with_router(config: RoutingConfig, router: R) -> GraphResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            router,
            store: SnapshotStore::default(),
            generation: Mutex::new(0),
        })
    }

    /// Install an already built graph before the service is shared.
    pub fn with_graph(self, graph: RoadGraph) -> Self {
        self.install(graph);
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.store.load()
    }

    /// Build a new graph from `segments` and make it current.
    ///
    /// Queries running during the rebuild finish against the previous
    /// snapshot.  Invalid segments are reported, not fatal.
    pub fn rebuild(&self, segments: impl IntoIterator<Item = Segment>) -> GraphResult<Rebuilt> {
        let mut generation = self.generation.lock();
        let started = Instant::now();

        let mut builder = TopologyBuilder::from_config(&self.config)?;
        builder.extend(segments);
        let output = builder.build();

        *generation += 1;
        let next = GraphSnapshot::new(output.graph, *generation);
        let previous = self.store.replace(next);
        info!(
            "graph generation {} installed in {:.1?} (replaced generation {})",
            *generation,
            started.elapsed(),
            previous.generation
        );
        Ok(Rebuilt { generation: *generation, report: output.report })
    }

    /// Make `graph` current and return its generation.
    pub fn install(&self, graph: RoadGraph) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.store.replace(GraphSnapshot::new(graph, *generation));
        info!("graph generation {} installed", *generation);
        *generation
    }

    /// Answer one route query.
    ///
    /// `cancel`, when set from another thread, abandons the search with
    /// `RouteTimeout`.
    pub fn route(
        &self,
        request: &RouteRequest,
        cancel: Option<Arc<AtomicBool>>,
    ) -> RouteResult<RouteResponse> {
        let (start_point, end_point) = request.validate()?;
        let snapshot = self.store.load();
        let max_distance_m = self.config.snap.max_distance_m;

        let start_snap = snapshot.index.snap(start_point, max_distance_m);
        let end_snap = snapshot.index.snap(end_point, max_distance_m);
        let (start, end) = match (start_snap, end_snap) {
            (Ok(s), Ok(e)) => (s, e),
            (s, e) => {
                return Err(RouteError::PointUnroutable {
                    start_distance_m: measured(&s),
                    end_distance_m: measured(&e),
                    max_distance_m,
                });
            }
        };

        let graph = &snapshot.graph;
        if !graph.same_component(start.vertex, end.vertex) {
            debug!("{} and {} lie in different components", start.vertex, end.vertex);
            return Err(RouteError::NoRouteFound { start_vertex: start.vertex, end_vertex: end.vertex });
        }

        let mut budget = SearchBudget::from_config(&self.config.search);
        if let Some(flag) = cancel {
            budget = budget.with_cancel(flag);
        }

        let started = Instant::now();
        let route = self.router.route(graph, start.vertex, end.vertex, &budget)?;
        debug!(
            "route {} → {}: {} edges, {:.1} s, searched in {:.1?}",
            start.vertex,
            end.vertex,
            route.steps.len(),
            route.total_cost_s,
            started.elapsed()
        );

        Ok(RouteResponse::from_route(graph, &route, start, end))
    }

    pub fn health(&self) -> HealthReport {
        let snapshot = self.store.load();
        let graph = &snapshot.graph;
        HealthReport {
            status:     if graph.is_empty() { "empty" } else { "healthy" },
            generation: snapshot.generation,
            vertices:   graph.vertex_count(),
            edges:      graph.edge_count(),
            components: graph.component_count(),
            built_at:   snapshot
                .built_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        }
    }
}

/// Snapshot summary for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `healthy`, or `empty` while no graph with vertices is installed.
    pub status:     &'static str,
    pub generation: u64,
    pub vertices:   usize,
    pub edges:      usize,
    pub components: usize,
    /// Unix seconds.
    pub built_at:   u64,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn measured(snap: &Result<Snap, SnapError>) -> Option<f64> {
    match snap {
        Ok(s) => Some(s.distance_m),
        Err(e) => e.distance_m(),
    }
}
