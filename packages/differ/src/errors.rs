//! Error types for the differ

use quill_schema::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("Malformed table at {path}: child {index} is not a table-row")]
    MalformedTable { path: Path, index: usize },

    #[error("Tree nesting exceeds {limit} levels at {path}")]
    DepthExceeded { path: Path, limit: usize },
}
