//! Graph-subsystem error types.

use thiserror::Error;

use rn_core::{CoreError, VertexId};

/// Errors produced by `rn-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: VertexId, to: VertexId },

    #[error("search budget exhausted after settling {settled} vertices")]
    BudgetExceeded { settled: usize },

    #[error("search cancelled")]
    Cancelled,

    #[error("vertex {0} not found in graph")]
    VertexNotFound(VertexId),

    #[error("segment load error: {0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Why a segment's geometry was rejected by the topology builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryIssue {
    /// Not a (multi-)line geometry; carries the geometry kind.
    NotALine(&'static str),
    /// Fewer than two distinct points after removing repeats.
    TooFewPoints,
    /// Start and end coincide, so the edge would be a self-loop.
    ClosedRing,
    /// Parts of the line run over each other; no single representative line.
    CollinearOverlap,
    /// A coordinate is NaN or infinite.
    NonFinite,
}

impl std::fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotALine(kind) => write!(f, "expected a line, got {kind}"),
            Self::TooFewPoints => f.write_str("fewer than two distinct points"),
            Self::ClosedRing => f.write_str("closed ring"),
            Self::CollinearOverlap => f.write_str("self-overlapping line"),
            Self::NonFinite => f.write_str("non-finite coordinate"),
        }
    }
}

/// A segment dropped during a build.  Recorded in the
/// [`BuildReport`](crate::BuildReport); never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("segment #{index} (source id {source_id:?}) dropped: {issue}")]
pub struct InvalidGeometryError {
    /// Position of the segment in the build input.
    pub index:     usize,
    pub source_id: Option<i64>,
    pub issue:     GeometryIssue,
}
