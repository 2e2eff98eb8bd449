//! Property-based invariant tests for diff + apply.
//!
//! 1. Round-trip: applying diff(T, L) to L yields T.
//! 2. Applying the batch never produces a failed operation.
//! 3. A second reconcile after the first is a no-op.
//! 4. Tables with arbitrary row/cell churn round-trip.

use proptest::prelude::*;
use quill_differ::DiffEngine;
use quill_editor::{HostEditor, MemoryEditor, OperationExecutor, ReconcileMode, Reconciler};
use quill_schema::{Mark, Node};

// ── Helpers ─────────────────────────────────────────────────────────────

fn leaf() -> impl Strategy<Value = Node> {
    ("[a-d ]{0,5}", 0u8..3).prop_map(|(content, mark)| match mark {
        1 => Node::text(content).with_mark("bold", Mark::Flag(true)),
        2 => Node::text(content).with_mark("url", Mark::Label("https://q".to_string())),
        _ => Node::text(content),
    })
}

fn block() -> impl Strategy<Value = Node> {
    let kind = prop_oneof![Just("paragraph"), Just("heading"), Just("blockquote")];
    leaf().prop_recursive(3, 20, 3, move |inner| {
        (kind.clone(), proptest::collection::vec(inner, 1..4), any::<bool>()).prop_map(
            |(kind, children, centered)| {
                let node = Node::element(kind, children);
                if centered {
                    node.with_attr("align", "center")
                } else {
                    node
                }
            },
        )
    })
}

fn table() -> impl Strategy<Value = Node> {
    let cell = "[a-c]{0,3}"
        .prop_map(|text| Node::element("table-cell", vec![Node::text(text)]));
    let row = proptest::collection::vec(cell, 1..4)
        .prop_map(|cells| Node::element("table-row", cells));
    proptest::collection::vec(row, 0..6).prop_map(|rows| Node::element("table", rows))
}

fn forest() -> impl Strategy<Value = Vec<Node>> {
    proptest::collection::vec(prop_oneof![4 => block(), 1 => table()], 0..6)
}

fn apply_diff(target: &[Node], live: Vec<Node>) -> (MemoryEditor, usize) {
    let mut host = MemoryEditor::new(live);
    let ops = DiffEngine::default().diff(target, host.children()).unwrap();
    let report = OperationExecutor::new().apply(ops, &mut host).unwrap();
    (host, report.failed + report.skipped)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round-trip and 2. no failures
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn applying_diff_reaches_target(target in forest(), live in forest()) {
        let (host, problems) = apply_diff(&target, live);
        prop_assert_eq!(host.children(), target.as_slice());
        prop_assert_eq!(problems, 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Reconcile is idempotent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn second_reconcile_is_a_no_op(target in forest(), live in forest()) {
        let reconciler = Reconciler::default();
        let mut host = MemoryEditor::new(live);

        reconciler.reconcile(&mut host, &target);
        let snapshot = host.clone();
        let second = reconciler.reconcile(&mut host, &target);

        prop_assert_eq!(second.mode, ReconcileMode::Incremental);
        prop_assert_eq!(second.operations, 0);
        prop_assert_eq!(host, snapshot);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Table churn
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tables_round_trip(target in table(), live in table()) {
        let target = vec![target];
        let (host, problems) = apply_diff(&target, vec![live]);
        prop_assert_eq!(host.children(), target.as_slice());
        prop_assert_eq!(problems, 0);
    }
}
