//! # quill-ingest
//!
//! Markdown ingestion for quill documents.
//!
//! - [`splitter`]: fence-safe chunking of large sources
//! - [`commonmark`]: `pulldown-cmark` backed parser and serializer
//! - [`scheduler`]: frame/idle schedulers used between cooperative batches
//! - [`ingest`]: the [`ChunkedIngestionScheduler`] that ties them to a
//!   [`Reconciler`](quill_editor::Reconciler)

pub mod commonmark;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod parser;
pub mod scheduler;
pub mod splitter;

pub use commonmark::CommonMarkCodec;
pub use config::IngestConfig;
pub use errors::IngestError;
pub use ingest::{
    ChunkedIngestionScheduler, IngestMode, IngestOptions, IngestReport, Ingestion,
    ProgressCallback,
};
pub use parser::{MarkdownParser, MarkdownSerializer, ParseError};
pub use scheduler::{FrameCallback, FrameScheduler, ManualScheduler, TokioScheduler};
pub use splitter::{split_markdown, Separator};
