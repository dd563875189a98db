use applique_applier::{Applier, DomRange, Marker, Position};
use applique_dom::{DomTree, NodeId, TagStyleOracle};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn build_document(paragraphs: usize) -> (DomTree, Vec<NodeId>) {
    let mut tree = DomTree::new("div");
    let mut leaves = Vec::new();
    for i in 0..paragraphs {
        let p = tree.create_element("p");
        let t = tree.create_text(&format!("paragraph {i} with some body text"));
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t).unwrap();
        leaves.push(t);
    }
    (tree, leaves)
}

fn new_applier() -> Applier {
    Applier::new(
        Marker::new("mark").with_class("hl"),
        Box::new(TagStyleOracle::default()),
    )
}

fn apply_and_undo_span(c: &mut Criterion) {
    c.bench_function("apply_and_undo_span", |b| {
        b.iter(|| {
            let (mut tree, leaves) = build_document(20);
            let applier = new_applier();
            let mut range = DomRange::new(
                Position::new(leaves[2], 3),
                Position::new(leaves[12], 10),
            );
            applier
                .apply_to_range(&mut tree, &mut range, &mut [])
                .unwrap();
            applier
                .undo_to_range(&mut tree, &mut range, &mut [])
                .unwrap();
            black_box(tree)
        })
    });
}

fn applied_state_query(c: &mut Criterion) {
    let (mut tree, leaves) = build_document(20);
    let applier = new_applier();
    let mut range = DomRange::new(Position::new(leaves[2], 3), Position::new(leaves[12], 10));
    applier
        .apply_to_range(&mut tree, &mut range, &mut [])
        .unwrap();

    c.bench_function("is_applied_to_range", |b| {
        b.iter(|| black_box(applier.is_applied_to_range(&tree, &range)))
    });
}

criterion_group!(benches, apply_and_undo_span, applied_state_query);
criterion_main!(benches);
