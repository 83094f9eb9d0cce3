// Example: diffing two scroll windows of the same list.
use rangecache::{ListDiffKind, list_diff, list_diff_keyed};

#[derive(Clone, Debug, PartialEq)]
struct Row {
    id: u32,
    label: &'static str,
}

fn main() {
    let data: Vec<u32> = (0..100).collect();

    // Scrolling from [10, 20) to [15, 25).
    let changes = list_diff(&data[10..20], &data[15..25], 10, 15);
    for c in &changes {
        println!("{:?} #{} -> {}", c.kind, c.index, c.item);
    }

    let old = [Row { id: 1, label: "a" }, Row { id: 2, label: "b" }];
    let new = [Row { id: 1, label: "A" }, Row { id: 3, label: "c" }];
    let changes = list_diff_keyed(&old, &new, 0, 0, |a, b| a.id == b.id);
    let updates = changes
        .iter()
        .filter(|c| c.kind == ListDiffKind::Update)
        .count();
    println!("keyed: {} changes, {updates} update(s)", changes.len());
    for c in changes {
        println!("  {:?} #{} {:?}", c.kind, c.index, c.item);
    }
}
