//! `rn-core`: foundational types for the `roadnet` routing workspace.
//!
//! Every other `rn-*` crate depends on this one.  It has no `rn-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`ids`]    | `VertexId`, `EdgeId`                                       |
//! | [`point`]  | `GeoPoint`, haversine, Web Mercator, planar line length    |
//! | [`config`] | `RoutingConfig` and its sections, TOML loading             |
//! | [`error`]  | `CoreError`, `CoreResult`                                  |

pub mod config;
pub mod error;
pub mod point;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{OnewayConfig, OnewayPrecedence, RoutingConfig, SearchConfig, SnapConfig, SpeedConfig};
pub use error::{CoreError, CoreResult};
pub use point::{EARTH_RADIUS_M, GeoPoint, MERCATOR_HALF_WIDTH_M, planar_length_m, wrap_lon_delta};
pub use ids::{EdgeId, VertexId};
