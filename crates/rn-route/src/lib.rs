//! `rn-route`: the Route Query Service.
//!
//! Answers "fastest route from A to B" against the current road graph and
//! lets a new graph be built and swapped in while queries keep running.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`service`]  | `RouteService` (query pipeline, rebuilds), `HealthReport`  |
//! | [`snapshot`] | `GraphSnapshot`, `SnapshotStore` (atomic swap)             |
//! | [`query`]    | `RouteRequest`, `RawRouteQuery`                            |
//! | [`response`] | `RouteResponse`, `RouteFeature` (GeoJSON document)         |
//! | [`error`]    | `RouteError` taxonomy and `ErrorBody`                      |
//!
//! # Usage
//!
//! ```rust,ignore
//! use rn_core::{GeoPoint, RoutingConfig};
//! use rn_route::{RouteRequest, RouteService};
//!
//! let service = RouteService::new(RoutingConfig::default())?;
//! service.rebuild(rn_graph::load_segments(path)?)?;
//!
//! let request = RouteRequest::new(GeoPoint::new(106.70, 10.77), GeoPoint::new(106.72, 10.78));
//! let response = service.route(&request, None)?;
//! println!("{}", serde_json::to_string(&response)?);
//! ```

pub mod error;
pub mod query;
pub mod response;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use error::{ErrorBody, RouteError, RouteResult};
pub use query::{RawRouteQuery, RouteRequest};
pub use response::{RouteFeature, RouteResponse};
pub use service::{HealthReport, Rebuilt, RouteService};
pub use snapshot::{GraphSnapshot, SnapshotStore};
