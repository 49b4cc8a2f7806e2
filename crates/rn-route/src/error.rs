//! Query-time error taxonomy and its response document.
//!
//! | Variant             | `code()`              | Meaning                                   |
//! |---------------------|-----------------------|-------------------------------------------|
//! | `MissingParameter`  | `MISSING_PARAMETER`   | a coordinate was not supplied             |
//! | `InvalidCoordinate` | `INVALID_COORDINATE`  | not a number, non-finite, or out of range |
//! | `PointUnroutable`   | `POINT_UNROUTABLE`    | nearest vertex beyond the snap threshold  |
//! | `NoRouteFound`      | `NO_ROUTE_FOUND`      | target unreachable from source            |
//! | `RouteTimeout`      | `ROUTE_TIMEOUT`       | search budget exhausted or abandoned      |
//! | `Internal`          | `INTERNAL_ERROR`      | anything else; details are only logged    |
//!
//! None of these touch the shared graph: a failed query leaves the current
//! snapshot exactly as it was.

use serde::Serialize;
use thiserror::Error;

use rn_core::VertexId;
use rn_graph::GraphError;

/// Why a single route query failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("missing parameter `{name}`")]
    MissingParameter { name: &'static str },

    #[error("invalid coordinate `{name}`: {value}")]
    InvalidCoordinate { name: &'static str, value: String },

    /// Either query point is too far from the network.  Both measured
    /// distances are carried; a distance is `None` only when the graph has
    /// no vertices at all.
    #[error("points too far from road network (max {max_distance_m} m)")]
    PointUnroutable {
        start_distance_m: Option<f64>,
        end_distance_m:   Option<f64>,
        max_distance_m:   f64,
    },

    #[error("no route found from {start_vertex} to {end_vertex}")]
    NoRouteFound { start_vertex: VertexId, end_vertex: VertexId },

    #[error("route search exceeded its budget")]
    RouteTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type RouteResult<T> = Result<T, RouteError>;

impl RouteError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "MISSING_PARAMETER",
            Self::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            Self::PointUnroutable { .. } => "POINT_UNROUTABLE",
            Self::NoRouteFound { .. } => "NO_ROUTE_FOUND",
            Self::RouteTimeout => "ROUTE_TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The document returned to the client.  `Internal` details are replaced
    /// by a generic message.
    pub fn body(&self) -> ErrorBody {
        let error = match self {
            Self::Internal(_) => "internal error".to_owned(),
            other => other.to_string(),
        };
        let mut body = ErrorBody {
            error,
            code: self.code(),
            start_distance_m: None,
            end_distance_m: None,
            max_distance_m: None,
            hint: None,
        };
        if let Self::PointUnroutable { start_distance_m, end_distance_m, max_distance_m } = self {
            body.start_distance_m = start_distance_m.map(round_1);
            body.end_distance_m = end_distance_m.map(round_1);
            body.max_distance_m = Some(*max_distance_m);
            body.hint = Some("your coordinates may be outside the loaded map area");
        }
        body
    }
}

impl From<GraphError> for RouteError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::NoRoute { from, to } => Self::NoRouteFound { start_vertex: from, end_vertex: to },
            GraphError::BudgetExceeded { .. } | GraphError::Cancelled => Self::RouteTimeout,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// JSON error document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code:  &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

fn round_1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
