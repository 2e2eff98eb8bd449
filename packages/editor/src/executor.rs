//! # Operation Executor
//!
//! Orders a diff batch and applies it through the host primitives.
//!
//! ## Ordering
//!
//! 1. Priority, descending
//! 2. Kind: Remove → Replace → Update → Text → Insert
//! 3. Removes among themselves: path descending, so earlier siblings keep
//!    their indices
//!
//! The sort is stable, so anything else keeps its emission order.
//!
//! ## Failure Model
//!
//! A batch that cannot be ordered safely is rejected up front with a
//! [`PlanError`]; the caller decides how to recover. Once a batch is running,
//! individual failures never stop it: a path that no longer resolves counts
//! as skipped, and a primitive that errors is reported to the
//! [`DiagnosticSink`] and counted as failed.

use crate::{HostEditor, HostError, PlanError};
use quill_schema::{Operation, OperationKind, Path};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument};

/// Receives per-operation failures that the executor swallows
pub trait DiagnosticSink {
    fn operation_failed(&self, operation: &Operation, error: &HostError);
}

/// Default sink: one `error!` event per failure
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn operation_failed(&self, operation: &Operation, error: &HostError) {
        error!(
            kind = operation.kind().name(),
            path = %operation.path(),
            %error,
            "Operation failed, skipping"
        );
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    /// Target path vanished before the operation ran
    pub skipped: usize,
    pub failed: usize,
}

impl ApplyReport {
    pub fn merge(&mut self, other: ApplyReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub struct OperationExecutor {
    sink: Box<dyn DiagnosticSink>,
}

impl Default for OperationExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationExecutor {
    pub fn new() -> Self {
        Self {
            sink: Box::new(TracingSink),
        }
    }

    pub fn with_sink(sink: Box<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Validate and order a batch
    pub fn plan(&self, mut operations: Vec<Operation>) -> Result<Vec<Operation>, PlanError> {
        let mut removed = HashSet::new();
        let mut destroyed = HashSet::new();
        for op in &operations {
            match op.kind() {
                OperationKind::Remove => {
                    if !removed.insert(op.path().clone()) {
                        return Err(PlanError::DuplicateRemove(op.path().clone()));
                    }
                    destroyed.insert(op.path().clone());
                }
                OperationKind::Replace => {
                    destroyed.insert(op.path().clone());
                }
                _ => {}
            }
        }

        if !destroyed.is_empty() {
            for op in &operations {
                if let Some(ancestor) = destroyed_ancestor(op.path(), &destroyed) {
                    return Err(PlanError::BeneathDestroyed {
                        kind: op.kind().name(),
                        path: op.path().clone(),
                        destroyed: ancestor,
                    });
                }
            }
        }

        operations.sort_by(execution_order);
        Ok(operations)
    }

    /// Plan, then execute
    #[instrument(skip_all, fields(operations = operations.len()))]
    pub fn apply<H: HostEditor + ?Sized>(
        &self,
        operations: Vec<Operation>,
        host: &mut H,
    ) -> Result<ApplyReport, PlanError> {
        let planned = self.plan(operations)?;
        let report = self.execute(&planned, host);

        info!(
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "Batch applied"
        );
        Ok(report)
    }

    /// Run operations in the given order without planning
    pub fn execute<H: HostEditor + ?Sized>(
        &self,
        operations: &[Operation],
        host: &mut H,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        for op in operations {
            let needs_existing = !matches!(op, Operation::Insert { .. });
            if needs_existing && host.node_at(op.path()).is_none() {
                debug!(kind = op.kind().name(), path = %op.path(), "Stale path, skipping");
                report.skipped += 1;
                continue;
            }

            match apply_one(op, host) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    self.sink.operation_failed(op, &err);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn apply_one<H: HostEditor + ?Sized>(op: &Operation, host: &mut H) -> Result<(), HostError> {
    match op {
        Operation::Insert { path, node, .. } => host.insert_at(path, node.clone()),
        Operation::Remove { path, .. } => host.remove_at(path),
        Operation::Update {
            path, properties, ..
        } => host.set_properties(path, properties),
        Operation::Replace { path, node, .. } => {
            // Insert first so a rejected node leaves the old one in place
            let displaced = match (path.parent(), path.last()) {
                (Some(parent), Some(index)) => parent.child(index + 1),
                _ => return Err(HostError::PathNotFound(path.clone())),
            };
            host.insert_at(path, node.clone())?;
            host.remove_at(&displaced)
        }
        Operation::Text { path, text, .. } => host.set_text(path, text),
    }
}

fn execution_order(a: &Operation, b: &Operation) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| a.kind().rank().cmp(&b.kind().rank()))
        .then_with(|| match (a, b) {
            (Operation::Remove { .. }, Operation::Remove { .. }) => b.path().cmp(a.path()),
            _ => Ordering::Equal,
        })
}

fn destroyed_ancestor(path: &Path, destroyed: &HashSet<Path>) -> Option<Path> {
    let mut current = path.parent();
    while let Some(ancestor) = current {
        if ancestor.is_root() {
            return None;
        }
        if destroyed.contains(&ancestor) {
            return Some(ancestor);
        }
        current = ancestor.parent();
    }
    None
}
