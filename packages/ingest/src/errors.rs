use crate::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Failed to parse chunk {chunk}: {source}")]
    Parse {
        chunk: usize,
        #[source]
        source: ParseError,
    },

    #[error("Ingestion cancelled")]
    Cancelled,

    #[error("Frame scheduler dropped a pending callback")]
    SchedulerDropped,
}

impl IngestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }
}
