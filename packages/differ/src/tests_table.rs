use crate::{DiffConfig, DiffEngine, DiffError};
use quill_schema::{Node, Operation, Path};
use serde_json::json;

fn cell(text: &str) -> Node {
    Node::element("table-cell", vec![Node::text(text)])
}

fn row(cells: &[&str]) -> Node {
    Node::element("table-row", cells.iter().map(|text| cell(text)).collect())
}

fn table(rows: &[&[&str]]) -> Node {
    Node::element("table", rows.iter().map(|cells| row(cells)).collect())
}

fn summary(ops: &[Operation]) -> Vec<String> {
    ops.iter()
        .map(|op| format!("{} {}", op.kind().name(), op.path()))
        .collect()
}

#[test]
fn test_large_row_delta_replaces_whole_table() {
    let target = vec![table(&[&["a"], &["b"], &["c"], &["d"]])];
    let live = vec![table(&[&["a"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["replace [0]"]);
}

#[test]
fn test_threshold_is_configurable() {
    let target = vec![table(&[&["a"], &["b"], &["c"], &["d"]])];
    let live = vec![table(&[&["a"]])];

    let engine = DiffEngine::new(DiffConfig {
        table_row_replace_threshold: 3,
        ..DiffConfig::default()
    });
    let ops = engine.diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["insert [0, 1]", "insert [0, 2]", "insert [0, 3]"]);
}

#[test]
fn test_single_row_added() {
    let target = vec![table(&[&["a", "b"], &["c", "d"], &["e", "f"]])];
    let live = vec![table(&[&["a", "b"], &["c", "d"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["insert [0, 2]"]);
}

#[test]
fn test_rows_removed_from_tail() {
    let target = vec![table(&[&["a", "b"]])];
    let live = vec![table(&[&["a", "b"], &["c", "d"], &["e", "f"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["remove [0, 2]", "remove [0, 1]"]);
}

#[test]
fn test_row_attribute_update() {
    let target = vec![Node::element("table", vec![row(&["a"]).with_attr("align", "center")])];
    let live = vec![table(&[&["a"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    match &ops[..] {
        [Operation::Update { path, properties, .. }] => {
            assert_eq!(path, &Path::from(vec![0, 0]));
            assert_eq!(properties.changed.get("align"), Some(&Some(json!("center"))));
        }
        other => panic!("Expected row update, got {:?}", other),
    }
}

#[test]
fn test_table_attribute_update_precedes_rows() {
    let target = vec![table(&[&["x"]]).with_attr("bordered", true)];
    let live = vec![table(&[&["y"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["update [0]", "text [0, 0, 0, 0]"]);
}

#[test]
fn test_cells_inserted_and_removed_at_row_tail() {
    let grown = DiffEngine::default()
        .diff(&[table(&[&["x", "y", "z"]])], &[table(&[&["x", "y"]])])
        .unwrap();
    assert_eq!(summary(&grown), vec!["insert [0, 0, 2]"]);

    let shrunk = DiffEngine::default()
        .diff(&[table(&[&["x"]])], &[table(&[&["x", "y", "z"]])])
        .unwrap();
    assert_eq!(summary(&shrunk), vec!["remove [0, 0, 2]", "remove [0, 0, 1]"]);
}

#[test]
fn test_blank_cells_skip_comparison() {
    let target = vec![table(&[&["", "a"]])];
    let live = vec![table(&[&["", "b"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["text [0, 0, 1, 0]"]);
}

#[test]
fn test_blank_cells_with_different_attributes_still_compared() {
    let target = vec![Node::element(
        "table",
        vec![Node::element("table-row", vec![cell("").with_attr("align", "right")])],
    )];
    let live = vec![table(&[&[""]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["update [0, 0, 0]"]);
}

#[test]
fn test_ragged_rows_tolerated() {
    let target = vec![table(&[&["a", "b"], &["c"]])];
    let live = vec![table(&[&["a"], &["c", "d"]])];

    let ops = DiffEngine::default().diff(&target, &live).unwrap();
    assert_eq!(summary(&ops), vec!["insert [0, 0, 1]", "remove [0, 1, 1]"]);
}

#[test]
fn test_non_row_child_is_malformed() {
    let broken = Node::element("table", vec![row(&["a"]), Node::paragraph("stray")]);
    let live = vec![table(&[&["a"], &["b"]])];

    let result = DiffEngine::default().diff(&[broken], &live);
    assert_eq!(
        result,
        Err(DiffError::MalformedTable {
            path: Path::from(vec![0]),
            index: 1,
        })
    );
}

#[test]
fn test_malformed_live_table_also_rejected() {
    let live = vec![Node::element("table", vec![Node::text("loose")])];
    let result = DiffEngine::default().diff(&[table(&[&["a"]])], &live);
    assert!(matches!(result, Err(DiffError::MalformedTable { index: 0, .. })));
}
