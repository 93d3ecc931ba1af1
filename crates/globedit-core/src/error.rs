//! Error types for the geometry engine, the editor facade and persistence.

use crate::entities::{GlobId, NodeId};
use thiserror::Error;

/// Geometry errors.
///
/// None of these are fatal: callers degrade the affected glob to "no outline"
/// and keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("tangent construction is impossible for the given circles and handles")]
    Degenerate,
    #[error("glob {0} has no computed geometry")]
    GeometryUnavailable(GlobId),
}

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors surfaced by the editor facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("a session is already active")]
    SessionActive,
    #[error("no session is active")]
    NoSession,
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    #[error("glob {0} does not exist")]
    MissingGlob(GlobId),
    #[error("nothing to do")]
    NothingToDo,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Document load/save errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
