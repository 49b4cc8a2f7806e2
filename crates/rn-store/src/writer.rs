//! The `GraphWriter` trait implemented by all storage backends.

use rn_graph::RoadGraph;

use crate::StoreResult;

/// Trait implemented by the CSV and SQLite writers.
///
/// A writer holds one graph: call [`write_graph`](Self::write_graph) once,
/// then [`finish`](Self::finish).
pub trait GraphWriter {
    /// Write every vertex with its degree.
    fn write_vertices(&mut self, graph: &RoadGraph) -> StoreResult<()>;

    /// Write every edge with its costs and geometry.
    fn write_ways(&mut self, graph: &RoadGraph) -> StoreResult<()>;

    fn write_graph(&mut self, graph: &RoadGraph) -> StoreResult<()> {
        self.write_vertices(graph)?;
        self.write_ways(graph)
    }

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> StoreResult<()>;
}
