use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quill_differ::DiffEngine;
use quill_schema::Node;

fn document(blocks: usize, edited_every: usize) -> Vec<Node> {
    (0..blocks)
        .map(|i| {
            let text = if edited_every > 0 && i % edited_every == 0 {
                format!("Paragraph {} (edited)", i)
            } else {
                format!("Paragraph {}", i)
            };
            Node::paragraph(text)
        })
        .collect()
}

fn table(rows: usize, cols: usize, seed: &str) -> Node {
    Node::element(
        "table",
        (0..rows)
            .map(|r| {
                Node::element(
                    "table-row",
                    (0..cols)
                        .map(|c| {
                            Node::element("table-cell", vec![Node::text(format!("{}{}:{}", seed, r, c))])
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

fn diff_identical_document(c: &mut Criterion) {
    let live = document(1000, 0);
    let target = live.clone();
    let engine = DiffEngine::default();

    c.bench_function("diff_identical_1000_blocks", |b| {
        b.iter(|| engine.diff(black_box(&target), black_box(&live)))
    });
}

fn diff_sparse_edits(c: &mut Criterion) {
    let live = document(1000, 0);
    let target = document(1000, 10);
    let engine = DiffEngine::default();

    c.bench_function("diff_sparse_edits_1000_blocks", |b| {
        b.iter(|| engine.diff(black_box(&target), black_box(&live)))
    });
}

fn diff_sealed_document(c: &mut Criterion) {
    let live: Vec<Node> = document(1000, 0).into_iter().map(Node::sealed).collect();
    let target = live.clone();
    let engine = DiffEngine::default();

    c.bench_function("diff_sealed_1000_blocks", |b| {
        b.iter(|| engine.diff(black_box(&target), black_box(&live)))
    });
}

fn diff_table(c: &mut Criterion) {
    let live = vec![table(50, 8, "a")];
    let target = vec![table(51, 8, "b")];
    let engine = DiffEngine::default();

    c.bench_function("diff_table_50x8", |b| {
        b.iter(|| engine.diff(black_box(&target), black_box(&live)))
    });
}

criterion_group!(
    benches,
    diff_identical_document,
    diff_sparse_edits,
    diff_sealed_document,
    diff_table
);
criterion_main!(benches);
