use serde::{Deserialize, Serialize};

/// Ingestion defaults. Per-call [`IngestOptions`](crate::IngestOptions)
/// override individual values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestConfig {
    /// Sources up to this many bytes are parsed in one piece
    pub chunk_size: usize,
    /// Top-level nodes reconciled per cooperative step
    pub batch_size: usize,
    pub use_cooperative_yield: bool,
    /// Literal chunk separator; blank lines when unset
    pub separator: Option<String>,
    /// Stamp parsed nodes with a content hash and mark them settled
    pub seal_nodes: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5000,
            batch_size: 50,
            use_cooperative_yield: true,
            separator: None,
            seal_nodes: false,
        }
    }
}
