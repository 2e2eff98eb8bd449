//! # Reconciler
//!
//! Drives one reconciliation: classify → diff → plan → apply.
//!
//! If the batch cannot be produced (diff error) or ordered (plan error), the
//! live document is rebuilt from scratch instead:
//!
//! ```text
//! remove live[n-1] .. live[1]
//! replace live[0] with an empty placeholder paragraph
//! insert target[0..]
//! remove the placeholder (now after the last target node)
//! ```

use crate::{ApplyReport, HostEditor, OperationExecutor};
use quill_differ::{DiffConfig, DiffEngine, NodeClassifier};
use quill_schema::{Node, Operation, Path};
use serde::Serialize;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileMode {
    /// The diff batch was applied
    Incremental,
    /// The live document was rebuilt wholesale
    FullReplace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub mode: ReconcileMode,
    pub operations: usize,
    pub apply: ApplyReport,
}

#[derive(Default)]
pub struct Reconciler {
    engine: DiffEngine,
    executor: OperationExecutor,
}

impl Reconciler {
    pub fn new(config: DiffConfig) -> Self {
        Self {
            engine: DiffEngine::new(config),
            executor: OperationExecutor::new(),
        }
    }

    pub fn with_executor(mut self, executor: OperationExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Make the live document match `target`
    #[instrument(skip_all, fields(target = target.len()))]
    pub fn reconcile<H: HostEditor + ?Sized>(&self, host: &mut H, target: &[Node]) -> ReconcileReport {
        let mut target = NodeClassifier::filter(target);
        if target.is_empty() {
            target.push(Node::placeholder());
        }

        let ops = match self.engine.diff(&target, host.children()) {
            Ok(ops) => ops,
            Err(err) => {
                warn!(%err, "Diff failed, replacing document");
                return self.replace_all(host, &target);
            }
        };

        let operations = ops.len();
        match self.executor.apply(ops, host) {
            Ok(apply) => ReconcileReport {
                mode: ReconcileMode::Incremental,
                operations,
                apply,
            },
            Err(err) => {
                warn!(%err, "Batch could not be planned, replacing document");
                self.replace_all(host, &target)
            }
        }
    }

    /// Reconcile a pre-filtered batch against the live roots starting at `offset`.
    ///
    /// A batch that fails to diff or plan is written over its window node by
    /// node instead.
    pub fn reconcile_window<H: HostEditor + ?Sized>(
        &self,
        host: &mut H,
        batch: &[Node],
        offset: usize,
    ) -> ReconcileReport {
        let planned = self
            .engine
            .diff_window(batch, host.children(), offset)
            .map_err(|err| err.to_string())
            .and_then(|ops| self.executor.plan(ops).map_err(|err| err.to_string()));

        match planned {
            Ok(ops) => ReconcileReport {
                mode: ReconcileMode::Incremental,
                operations: ops.len(),
                apply: self.executor.execute(&ops, host),
            },
            Err(err) => {
                warn!(%err, offset, "Window could not be diffed, overwriting it");
                let live_len = host.children().len();
                let ops: Vec<Operation> = batch
                    .iter()
                    .enumerate()
                    .map(|(i, node)| {
                        let path = Path::root().child(offset + i);
                        if offset + i < live_len {
                            Operation::Replace {
                                path,
                                node: node.clone(),
                                priority: 0,
                            }
                        } else {
                            Operation::Insert {
                                path,
                                node: node.clone(),
                                priority: 0,
                            }
                        }
                    })
                    .collect();
                ReconcileReport {
                    mode: ReconcileMode::FullReplace,
                    operations: ops.len(),
                    apply: self.executor.execute(&ops, host),
                }
            }
        }
    }

    /// Drop live roots past `len`
    pub fn truncate<H: HostEditor + ?Sized>(&self, host: &mut H, len: usize) -> ApplyReport {
        let ops = self.engine.truncate(host.children(), len);
        self.executor.execute(&ops, host)
    }

    /// Rebuild the live document from `target`
    pub fn replace_all<H: HostEditor + ?Sized>(&self, host: &mut H, target: &[Node]) -> ReconcileReport {
        let live_len = host.children().len();
        let mut ops = Vec::with_capacity(live_len + target.len() + 1);

        for index in (1..live_len).rev() {
            ops.push(Operation::Remove {
                path: Path::root().child(index),
                priority: 0,
            });
        }

        let first = Path::root().child(0);
        if live_len > 0 {
            ops.push(Operation::Replace {
                path: first,
                node: Node::placeholder(),
                priority: 0,
            });
        } else {
            ops.push(Operation::Insert {
                path: first,
                node: Node::placeholder(),
                priority: 0,
            });
        }

        for (index, node) in target.iter().enumerate() {
            ops.push(Operation::Insert {
                path: Path::root().child(index),
                node: node.clone(),
                priority: 0,
            });
        }
        if !target.is_empty() {
            ops.push(Operation::Remove {
                path: Path::root().child(target.len()),
                priority: 0,
            });
        }

        ReconcileReport {
            mode: ReconcileMode::FullReplace,
            operations: ops.len(),
            apply: self.executor.execute(&ops, host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryEditor;
    use serde_json::json;

    #[test]
    fn test_incremental_reconcile() {
        let mut host = MemoryEditor::new(vec![
            Node::paragraph("a"),
            Node::paragraph("b"),
            Node::paragraph("c"),
        ]);
        let target = vec![Node::paragraph("a"), Node::paragraph("B")];

        let report = Reconciler::default().reconcile(&mut host, &target);
        assert_eq!(report.mode, ReconcileMode::Incremental);
        assert_eq!(host.children(), target.as_slice());
    }

    #[test]
    fn test_invalid_target_nodes_filtered() {
        let mut host = MemoryEditor::new(vec![Node::paragraph("x")]);
        let target: Vec<Node> = serde_json::from_value(json!([
            { "type": "p", "children": [] },
            { "type": "paragraph", "children": [{ "text": "valid" }] }
        ]))
        .unwrap();

        Reconciler::default().reconcile(&mut host, &target);
        assert_eq!(host.children(), &[Node::paragraph("valid")]);
    }

    #[test]
    fn test_empty_target_leaves_placeholder() {
        let mut host = MemoryEditor::new(vec![Node::paragraph("a"), Node::paragraph("b")]);
        Reconciler::default().reconcile(&mut host, &[]);
        assert_eq!(host.children(), &[Node::placeholder()]);
    }

    #[test]
    fn test_malformed_table_falls_back_to_full_replace() {
        let broken = Node::element("table", vec![Node::paragraph("stray")]);
        let mut host = MemoryEditor::new(vec![
            Node::element(
                "table",
                vec![Node::element("table-row", vec![Node::element("table-cell", vec![Node::text("a")])])],
            ),
            Node::paragraph("tail"),
        ]);
        let target = vec![broken.clone(), Node::paragraph("after")];

        let report = Reconciler::default().reconcile(&mut host, &target);
        assert_eq!(report.mode, ReconcileMode::FullReplace);
        assert_eq!(report.apply.failed, 0);
        assert_eq!(host.children(), target.as_slice());
    }

    #[test]
    fn test_replace_all_from_empty_live() {
        let mut host = MemoryEditor::default();
        let target = vec![Node::paragraph("one"), Node::paragraph("two")];

        Reconciler::default().replace_all(&mut host, &target);
        assert_eq!(host.children(), target.as_slice());
    }

    #[test]
    fn test_windowed_reconcile_and_truncate() {
        let reconciler = Reconciler::default();
        let mut host = MemoryEditor::new(vec![
            Node::paragraph("a"),
            Node::paragraph("b"),
            Node::paragraph("c"),
            Node::paragraph("d"),
        ]);

        reconciler.reconcile_window(&mut host, &[Node::paragraph("A")], 0);
        reconciler.reconcile_window(&mut host, &[Node::paragraph("b")], 1);
        reconciler.truncate(&mut host, 2);

        assert_eq!(host.children(), &[Node::paragraph("A"), Node::paragraph("b")]);
    }
}
