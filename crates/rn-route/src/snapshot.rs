//! Immutable graph generations and their atomic hand-over.
//!
//! ```text
//!   query ──load()──▶ Arc<GraphSnapshot gen N> ─── held until the query ends
//!                         ▲
//!   rebuild ──replace()───┘ swaps in gen N+1; gen N is freed with its last reader
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwap;

use rn_graph::{RoadGraph, SpatialIndex};

/// One graph generation and the spatial index built over it.
pub struct GraphSnapshot {
    pub graph:      RoadGraph,
    pub index:      SpatialIndex,
    /// 0 for the initial empty snapshot, then 1, 2, … per installed build.
    pub generation: u64,
    pub built_at:   SystemTime,
}

impl GraphSnapshot {
    pub fn new(graph: RoadGraph, generation: u64) -> Self {
        let index = SpatialIndex::build(&graph);
        Self { graph, index, generation, built_at: SystemTime::now() }
    }

    /// Generation 0: no vertices, so every snap fails.
    pub fn empty() -> Self {
        Self::new(RoadGraph::empty(), 0)
    }
}

/// Lock-free holder of the current snapshot.
pub struct SnapshotStore {
    current: ArcSwap<GraphSnapshot>,
}

impl SnapshotStore {
    pub fn new(initial: GraphSnapshot) -> Self {
        Self { current: ArcSwap::from_pointee(initial) }
    }

    /// The current snapshot.  Stays valid for as long as the caller holds it,
    /// even across later replacements.
    #[inline]
    pub fn load(&self) -> Arc<GraphSnapshot> {
        self.current.load_full()
    }

    /// Install `next` and return the snapshot it replaced.
    pub fn replace(&self, next: GraphSnapshot) -> Arc<GraphSnapshot> {
        self.current.swap(Arc::new(next))
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(GraphSnapshot::empty())
    }
}
