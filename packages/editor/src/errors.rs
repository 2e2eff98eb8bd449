//! Error types for the editor

use quill_schema::Path;
use thiserror::Error;

/// Failure of a single host mutation primitive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("No node at {0}")]
    PathNotFound(Path),

    #[error("Node at {0} is not an element")]
    NotAnElement(Path),

    #[error("Node at {0} is not text")]
    NotText(Path),

    #[error("Invalid mark '{key}' at {path}: marks are booleans or strings")]
    InvalidMark { path: Path, key: String },

    #[error("Host rejected operation: {0}")]
    Rejected(String),
}

/// A batch that cannot be ordered safely
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("{kind} at {path} targets a node beneath {destroyed}, which the batch removes or replaces")]
    BeneathDestroyed {
        kind: &'static str,
        path: Path,
        destroyed: Path,
    },

    #[error("Node at {0} is removed twice in one batch")]
    DuplicateRemove(Path),
}
