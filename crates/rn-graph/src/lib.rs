//! `rn-graph`: road topology, cost model, spatial index, and path engine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`segment`]  | `Segment` input records, `Direction`, one-way resolution      |
//! | [`cost`]     | `CostModel`, `EdgeCost`, `REVERSE_SENTINEL`                   |
//! | [`topology`] | `TopologyBuilder`, geometry repair, `BuildReport`             |
//! | [`network`]  | `RoadGraph` arenas + CSR adjacency, components                |
//! | [`spatial`]  | `SpatialIndex` (R-tree), `Snap`, `SnapError`                  |
//! | [`router`]   | `Router` trait, `DijkstraRouter`, `Route`, `SearchBudget`     |
//! | [`loader`]   | GeoJSON and CSV/WKT segment loaders                           |
//! | [`error`]    | `GraphError`, `InvalidGeometryError`, `GraphResult<T>`        |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Costs edges on Rayon's thread pool during `build()`.       |

pub mod cost;
pub mod error;
pub mod loader;
pub mod network;
pub mod router;
pub mod segment;
pub mod spatial;
pub mod topology;


pub use cost::{CostModel, EdgeCost, REVERSE_SENTINEL};
pub use error::{GeometryIssue, GraphError, GraphResult, InvalidGeometryError};
pub use loader::{load_csv, load_csv_reader, load_geojson, load_geojson_reader, load_segments};
pub use network::{Edge, RoadGraph, SearchArc, Vertex};
pub use router::{DijkstraRouter, Route, RouteStep, Router, SearchBudget};
pub use segment::{Direction, Segment, resolve_direction};
pub use spatial::{Snap, SnapError, SpatialIndex};
pub use topology::{BuildOutput, BuildReport, TopologyBuilder, build_graph, repair_geometry};
