use crate::*;

use alloc::vec;
use alloc::vec::Vec;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + ((self.next_u64() >> 11) % span) as usize
    }

    fn gen_range(&mut self, universe: usize) -> Range {
        let a = self.gen_range_usize(0, universe + 1);
        let b = self.gen_range_usize(0, universe + 1);
        Range::new(a.min(b), a.max(b))
    }

    fn gen_list(&mut self, universe: usize) -> RangeList {
        let n = self.gen_range_usize(0, 6);
        (0..n).map(|_| self.gen_range(universe)).collect()
    }
}

const UNIVERSE: usize = 64;

fn coverage(list: &RangeList) -> Vec<bool> {
    let mut out = vec![false; UNIVERSE];
    for r in list {
        for i in r.indexes() {
            out[i] = true;
        }
    }
    out
}

fn assert_normalized(list: &RangeList) {
    for r in list {
        assert!(!r.is_empty(), "empty member in {list:?}");
    }
    for pair in list.ranges().windows(2) {
        assert!(
            pair[0].end < pair[1].begin,
            "members overlap or touch in {list:?}"
        );
    }
}

#[test]
fn range_basics() {
    let r = Range::new(3, 8);
    assert_eq!(r.len(), 5);
    assert!(!r.is_empty());
    assert!(r.contains_index(3));
    assert!(!r.contains_index(8));
    assert!(r.contains(&Range::new(4, 8)));
    assert!(!r.contains(&Range::new(2, 4)));
    assert!(r.contains(&Range::new(100, 100)));

    assert!(Range::new(5, 5).is_empty());
    assert_eq!(Range::new(5, 5).len(), 0);
    assert_eq!(Range::empty(), Range::new(0, 0));
    assert_eq!(Range::with_len(10, 5), Range::new(10, 15));
    assert_eq!(Range::from(2..4), Range::new(2, 4));
    assert_eq!(core::ops::Range::from(Range::new(2, 4)), 2..4);
}

#[test]
fn range_overlap_is_strict() {
    let a = Range::new(0, 5);
    let b = Range::new(5, 10);
    assert!(!a.is_overlap(&b));
    assert!(a.touches(&b));
    assert!(a.is_overlap(&Range::new(4, 6)));
    assert!(!a.touches(&Range::new(6, 8)));
    assert_eq!(a.intersection(&b), None);
    assert_eq!(a.intersection(&Range::new(3, 9)), Some(Range::new(3, 5)));
}

#[test]
fn range_merge_is_bounding_interval() {
    assert_eq!(Range::new(0, 5).merge(&Range::new(3, 10)), Range::new(0, 10));
    // Disjoint inputs include the gap.
    assert_eq!(Range::new(0, 2).merge(&Range::new(8, 10)), Range::new(0, 10));
}

#[test]
fn range_diff_cases() {
    // Partial overlap: both ends stick out.
    assert_eq!(
        Range::new(0, 10).diff(&Range::new(5, 15)),
        RangeList::from_ranges([Range::new(0, 5), Range::new(10, 15)])
    );
    // Containment: one side only.
    assert_eq!(
        Range::new(0, 10).diff(&Range::new(0, 4)),
        RangeList::from(Range::new(4, 10))
    );
    // Identical: nothing left.
    assert!(Range::new(2, 6).diff(&Range::new(2, 6)).is_empty());
    // Disjoint: both inputs as they are.
    assert_eq!(
        Range::new(0, 2).diff(&Range::new(5, 7)).ranges(),
        &[Range::new(0, 2), Range::new(5, 7)]
    );
}

#[test]
fn range_clamp_and_shift() {
    assert_eq!(Range::new(90, 120).clamp_end(100), Range::new(90, 100));
    assert_eq!(Range::new(110, 120).clamp_end(100), Range::new(100, 100));
    assert_eq!(Range::new(1, 3).shift(10), Range::new(11, 13));
}

#[test]
fn range_merge_bounds_both_inputs_randomized() {
    let mut rng = Lcg::new(7);
    for _ in 0..2_000 {
        let a = rng.gen_range(UNIVERSE);
        let b = rng.gen_range(UNIVERSE);
        if a.is_empty() || b.is_empty() {
            continue;
        }
        let m = a.merge(&b);
        assert!(m.contains_index(a.begin));
        assert!(m.contains_index(b.end - 1));
        assert!(m.contains(&a) && m.contains(&b));
    }
}

#[test]
fn range_diff_plus_intersection_rebuilds_merge_randomized() {
    let mut rng = Lcg::new(11);
    for _ in 0..2_000 {
        let a = rng.gen_range(UNIVERSE);
        let b = rng.gen_range(UNIVERSE);
        let Some(common) = a.intersection(&b) else {
            continue;
        };
        let diff = a.diff(&b);
        // No index is duplicated: the diff never covers the intersection.
        assert!(diff.iter().all(|r| !r.is_overlap(&common)));
        let rebuilt = diff.merge_range(common);
        assert_eq!(rebuilt, RangeList::from(a.merge(&b)));
        assert_eq!(rebuilt.covered_len(), a.merge(&b).len());
    }
}

#[test]
fn range_list_insert_coalesces_adjacent_and_overlapping() {
    let mut list = RangeList::new();
    list.insert(Range::new(10, 20));
    list.insert(Range::new(0, 5));
    list.insert(Range::new(5, 10));
    assert_eq!(list.ranges(), &[Range::new(0, 20)]);

    list.insert(Range::new(30, 40));
    list.insert(Range::new(25, 25));
    assert_eq!(list.ranges(), &[Range::new(0, 20), Range::new(30, 40)]);

    list.insert(Range::new(15, 35));
    assert_eq!(list.ranges(), &[Range::new(0, 40)]);
}

#[test]
fn range_list_ignores_inverted_ranges() {
    let list = RangeList::from_ranges([Range::new(9, 3), Range::new(1, 2)]);
    assert_eq!(list.ranges(), &[Range::new(1, 2)]);
}

#[test]
fn range_list_merge_is_maximally_reduced_randomized() {
    let mut rng = Lcg::new(23);
    for _ in 0..1_000 {
        let a = rng.gen_list(UNIVERSE);
        let b = rng.gen_list(UNIVERSE);
        let merged = a.merge(&b);
        assert_normalized(&merged);

        let expected: Vec<bool> = coverage(&a)
            .iter()
            .zip(coverage(&b))
            .map(|(x, y)| *x || y)
            .collect();
        assert_eq!(coverage(&merged), expected);

        // Iteration order does not matter.
        assert_eq!(merged, b.merge(&a));
    }
}

#[test]
fn range_list_merge_all_folds_every_list() {
    let a = RangeList::from(Range::new(0, 3));
    let b = RangeList::from(Range::new(3, 6));
    let c = RangeList::from(Range::new(10, 12));
    let merged = RangeList::new().merge_all([&a, &b, &c]);
    assert_eq!(merged.ranges(), &[Range::new(0, 6), Range::new(10, 12)]);
}

#[test]
fn range_list_diff_is_symmetric_difference_randomized() {
    let mut rng = Lcg::new(31);
    for _ in 0..1_000 {
        let a = rng.gen_list(UNIVERSE);
        let b = rng.gen_list(UNIVERSE);
        let diff = a.diff(&b);
        assert_normalized(&diff);

        let expected: Vec<bool> = coverage(&a)
            .iter()
            .zip(coverage(&b))
            .map(|(x, y)| *x != y)
            .collect();
        assert_eq!(coverage(&diff), expected);
    }
}

#[test]
fn range_list_filling_the_diff_covers_the_target_randomized() {
    let mut rng = Lcg::new(43);
    for _ in 0..1_000 {
        let a = rng.gen_list(UNIVERSE);
        let b = rng.gen_list(UNIVERSE);
        assert!(a.merge(&a.diff(&b)).contains_list(&b));
    }
}

#[test]
fn range_list_missing_reports_uncached_gaps() {
    let cached = RangeList::from_ranges([Range::new(0, 10), Range::new(20, 30)]);
    assert_eq!(
        cached.missing(Range::new(5, 25)).ranges(),
        &[Range::new(10, 20)]
    );
    assert_eq!(
        cached.missing(Range::new(5, 40)).ranges(),
        &[Range::new(10, 20), Range::new(30, 40)]
    );
    assert_eq!(cached.missing(Range::new(5, 40)).span(), Range::new(10, 40));
    assert!(cached.missing(Range::new(2, 8)).is_empty());
    assert_eq!(
        cached.merge_range(Range::new(5, 25)).diff(&cached),
        cached.missing(Range::new(5, 25))
    );
}

#[test]
fn range_list_contains_requires_full_enclosure() {
    let list = RangeList::from_ranges([Range::new(0, 10), Range::new(20, 30)]);
    assert!(list.contains(&Range::new(2, 8)));
    assert!(list.contains(&Range::new(20, 30)));
    assert!(!list.contains(&Range::new(5, 25)));
    assert!(!list.contains(&Range::new(8, 12)));
    assert!(list.contains(&Range::new(15, 15)));
    assert!(list.contains_index(29));
    assert!(!list.contains_index(10));
    assert!(list.contains_list(&RangeList::from_ranges([
        Range::new(1, 2),
        Range::new(21, 22)
    ])));
    assert!(!RangeList::new().contains(&Range::new(0, 1)));
}

#[test]
fn range_list_span() {
    assert_eq!(RangeList::new().span(), Range::new(0, 0));
    let list = RangeList::from_ranges([Range::new(20, 30), Range::new(2, 4)]);
    assert_eq!(list.span(), Range::new(2, 30));
    assert_eq!(list.covered_len(), 12);
}

#[derive(Clone, Debug, PartialEq)]
struct Row {
    id: u32,
    label: &'static str,
}

fn row(id: u32, label: &'static str) -> Row {
    Row { id, label }
}

fn same_id(a: &Row, b: &Row) -> bool {
    a.id == b.id
}

#[test]
fn list_diff_empty_old_creates_in_index_order() {
    let d = list_diff(&[], &['a', 'b', 'c'], 0, 0);
    assert_eq!(d.len(), 3);
    for (i, item) in d.iter().enumerate() {
        assert_eq!(item.kind, ListDiffKind::Create);
        assert_eq!(item.index, i);
    }
    assert_eq!(d[1].item, 'b');
}

#[test]
fn list_diff_empty_new_deletes_everything() {
    let d = list_diff(&['a', 'b', 'c'], &[], 0, 0);
    assert_eq!(d.len(), 3);
    assert!(d.iter().all(|x| x.kind == ListDiffKind::Delete));
    assert_eq!(d[2].item, 'c');
}

#[test]
fn list_diff_identical_windows_produce_nothing() {
    assert!(list_diff(&[1, 2, 3], &[1, 2, 3], 4, 4).is_empty());
    assert!(list_diff::<u8>(&[], &[], 0, 9).is_empty());
}

#[test]
fn list_diff_by_reports_unequal_slots_as_updates() {
    let old = [row(1, "a"), row(2, "b")];
    let new = [row(1, "a"), row(9, "x")];
    let d = list_diff_by(&old, &new, 0, 0, |a, b| a == b);
    assert_eq!(
        d,
        vec![ListDiffItem {
            kind: ListDiffKind::Update,
            item: row(9, "x"),
            index: 1
        }]
    );
}

#[test]
fn list_diff_keyed_replaces_records_with_a_different_id() {
    let old = [row(1, "a"), row(2, "b")];
    let new = [row(1, "a"), row(9, "x")];
    let d = list_diff_keyed(&old, &new, 0, 0, same_id);
    assert_eq!(
        d,
        vec![
            ListDiffItem {
                kind: ListDiffKind::Delete,
                item: row(2, "b"),
                index: 1
            },
            ListDiffItem {
                kind: ListDiffKind::Create,
                item: row(9, "x"),
                index: 1
            },
        ]
    );
}

#[test]
fn list_diff_keyed_updates_same_record_with_new_value() {
    let old = [row(1, "a"), row(2, "b")];
    let new = [row(1, "a"), row(2, "renamed")];
    let d = list_diff_keyed(&old, &new, 0, 0, same_id);
    assert_eq!(d.len(), 1);
    assert_eq!(d[0].kind, ListDiffKind::Update);
    assert_eq!(d[0].item.label, "renamed");
    assert!(list_diff_keyed(&old, &old, 0, 0, same_id).is_empty());
}

#[test]
fn list_diff_shifted_windows_use_absolute_indexes() {
    // Window [10, 13) scrolls to [12, 15).
    let old = [10, 11, 12];
    let new = [12, 13, 14];
    let d = list_diff(&old, &new, 10, 12);
    let kinds: Vec<(ListDiffKind, usize, i32)> =
        d.iter().map(|x| (x.kind, x.index, x.item)).collect();
    assert_eq!(
        kinds,
        vec![
            (ListDiffKind::Delete, 10, 10),
            (ListDiffKind::Delete, 11, 11),
            (ListDiffKind::Create, 13, 13),
            (ListDiffKind::Create, 14, 14),
        ]
    );
}

#[test]
fn list_diff_disjoint_windows() {
    let d = list_diff(&['a', 'b'], &['x'], 0, 50);
    assert_eq!(d.len(), 3);
    assert_eq!((d[0].kind, d[0].index), (ListDiffKind::Delete, 0));
    assert_eq!((d[1].kind, d[1].index), (ListDiffKind::Delete, 1));
    assert_eq!((d[2].kind, d[2].index), (ListDiffKind::Create, 50));
}

#[test]
fn list_diff_sorts_by_kind_then_index() {
    let old = [1, 2, 3, 4];
    let new = [9, 2, 7];
    let d = list_diff(&old, &new, 0, 1);
    // Absolute: old 0..4 = [1,2,3,4], new 1..4 = [9,2,7].
    let got: Vec<(ListDiffKind, usize)> = d.iter().map(|x| (x.kind, x.index)).collect();
    assert_eq!(
        got,
        vec![
            (ListDiffKind::Delete, 0),
            (ListDiffKind::Update, 1),
            (ListDiffKind::Update, 2),
            (ListDiffKind::Update, 3),
        ]
    );
    assert!(ListDiffKind::Delete < ListDiffKind::Update);
    assert!(ListDiffKind::Update < ListDiffKind::Create);
}

#[test]
fn list_diff_sparse_treats_holes_as_absent() {
    let old = [Some(row(1, "a")), None, Some(row(3, "c"))];
    let new = [Some(row(1, "a")), Some(row(2, "b")), None];
    let d = list_diff_sparse_keyed(&old, &new, 0, 0, same_id);
    assert_eq!(d.len(), 2);
    assert_eq!((d[0].kind, d[0].index), (ListDiffKind::Delete, 2));
    assert_eq!(d[0].item.id, 3);
    assert_eq!((d[1].kind, d[1].index), (ListDiffKind::Create, 1));

    let all_holes: [Option<Row>; 2] = [None, None];
    assert!(list_diff_sparse_keyed(&all_holes, &all_holes, 0, 0, same_id).is_empty());
}

#[test]
fn list_diff_item_map_keeps_position() {
    let d = list_diff(&[], &[5u32], 0, 3).remove(0).map(|v| v * 2);
    assert_eq!(d.item, 10);
    assert_eq!(d.index, 3);
    assert_eq!(d.kind, ListDiffKind::Create);
}

#[test]
fn list_diff_far_apart_windows_skip_the_gap() {
    let far = usize::MAX / 2;
    let d = list_diff(&[1, 2, 3], &[7, 8, 9], 0, far);
    let got: Vec<(ListDiffKind, usize)> = d.iter().map(|x| (x.kind, x.index)).collect();
    assert_eq!(
        got,
        vec![
            (ListDiffKind::Delete, 0),
            (ListDiffKind::Delete, 1),
            (ListDiffKind::Delete, 2),
            (ListDiffKind::Create, far),
            (ListDiffKind::Create, far + 1),
            (ListDiffKind::Create, far + 2),
        ]
    );

    // Jumping backwards is just as cheap.
    let back = list_diff(&[7, 8, 9], &[1, 2, 3], far, 0);
    assert_eq!(back.len(), 6);
    assert_eq!((back[3].kind, back[3].index), (ListDiffKind::Create, 0));
}

#[test]
fn list_diff_new_window_around_old_keeps_index_order() {
    // new [0, 6) encloses old [2, 4).
    let d = list_diff(&[2, 3], &[0, 1, 2, 3, 4, 5], 2, 0);
    let got: Vec<usize> = d.iter().map(|x| x.index).collect();
    assert_eq!(got, vec![0, 1, 4, 5]);
    assert!(d.iter().all(|x| x.kind == ListDiffKind::Create));

    // new [8, 12) starts before old [10, 14).
    let d = list_diff(&[10, 11, 12, 13], &[8, 9, 10, 11], 10, 8);
    let got: Vec<(ListDiffKind, usize)> = d.iter().map(|x| (x.kind, x.index)).collect();
    assert_eq!(
        got,
        vec![
            (ListDiffKind::Delete, 12),
            (ListDiffKind::Delete, 13),
            (ListDiffKind::Create, 8),
            (ListDiffKind::Create, 9),
        ]
    );
}
