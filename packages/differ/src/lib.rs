//! # Quill Differ
//!
//! Computes the operations that reconcile a live document with a freshly
//! produced target document.
//!
//! ## Pipeline
//!
//! ```text
//! target forest ─► NodeClassifier::filter ─► DiffEngine::diff(target, live)
//!                                                   │
//!                                                   ▼
//!                                          Vec<Operation> (unordered batch)
//! ```
//!
//! Ordering and application of the batch belong to the editor crate.

pub mod classifier;
pub mod config;
pub mod differ;
pub mod errors;
pub mod table;

#[cfg(test)]
mod tests_table;

pub use classifier::NodeClassifier;
pub use config::DiffConfig;
pub use differ::DiffEngine;
pub use errors::DiffError;
