//! # Quill Editor
//!
//! Applies reconciliation batches to a live document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ differ: target + live → Vec<Operation>      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: order + apply through HostEditor    │
//! │  - OperationExecutor: plan, execute, report │
//! │  - Reconciler: full pipeline with fallback  │
//! │  - TextSearchEngine: leaf search/replace    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: insert_at / remove_at / set_* (live)  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quill_editor::{MemoryEditor, Reconciler};
//! use quill_schema::Node;
//!
//! let mut live = MemoryEditor::new(vec![Node::paragraph("draft")]);
//! let report = Reconciler::default().reconcile(&mut live, &[Node::paragraph("final")]);
//! ```

pub mod errors;
pub mod executor;
pub mod host;
pub mod memory;
pub mod reconcile;
pub mod search;

pub use errors::{HostError, PlanError};
pub use executor::{ApplyReport, DiagnosticSink, OperationExecutor, TracingSink};
pub use host::HostEditor;
pub use memory::MemoryEditor;
pub use reconcile::{ReconcileMode, ReconcileReport, Reconciler};
pub use search::{FindOptions, SearchMatch, SearchOptions, TextSearchEngine};
