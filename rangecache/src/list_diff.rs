use alloc::vec::Vec;
use core::cmp;

use crate::Range;

/// The kind of a [`ListDiffItem`].
///
/// The ordering is significant: diffs are sorted by kind, so deletions always come before updates
/// and updates before creations. View updaters rely on this to mutate a live list without index
/// collisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ListDiffKind {
    Delete = 1,
    Update = 2,
    Create = 3,
}

/// A single change at an absolute index.
///
/// `Delete` carries the old item, `Update` and `Create` carry the new one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListDiffItem<T> {
    pub kind: ListDiffKind,
    pub item: T,
    pub index: usize,
}

impl<T> ListDiffItem<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ListDiffItem<U> {
        ListDiffItem {
            kind: self.kind,
            item: f(self.item),
            index: self.index,
        }
    }
}

trait Window<T> {
    fn len(&self) -> usize;
    fn at(&self, i: usize) -> Option<&T>;
}

struct Dense<'a, T>(&'a [T]);

struct Sparse<'a, T>(&'a [Option<T>]);

impl<T> Window<T> for Dense<'_, T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn at(&self, i: usize) -> Option<&T> {
        self.0.get(i)
    }
}

impl<T> Window<T> for Sparse<'_, T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn at(&self, i: usize) -> Option<&T> {
        self.0.get(i).and_then(Option::as_ref)
    }
}

/// How two items occupying the same absolute index relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Same,
    Changed,
    Replaced,
}

/// Diffs two windows of an index-addressed sequence using `PartialEq`.
///
/// `old_begin` / `new_begin` are the absolute offsets of the first element of each window; the
/// returned indexes are absolute as well. See [`list_diff_by`] for the full contract.
pub fn list_diff<T: Clone + PartialEq>(
    old: &[T],
    new: &[T],
    old_begin: usize,
    new_begin: usize,
) -> Vec<ListDiffItem<T>> {
    list_diff_by(old, new, old_begin, new_begin, |a: &T, b: &T| a == b)
}

/// Diffs two windows of an index-addressed sequence with a custom equality predicate.
///
/// Both windows are aligned on the union of their absolute spans. For each absolute index:
/// - present only in `old` yields `Delete` (old item),
/// - present only in `new` yields `Create` (new item),
/// - present in both but not `is_eq` yields `Update` (new item),
/// - otherwise nothing.
///
/// The result is stable-sorted by [`ListDiffKind`]; entries of the same kind stay in ascending
/// index order.
pub fn list_diff_by<T: Clone>(
    old: &[T],
    new: &[T],
    old_begin: usize,
    new_begin: usize,
    mut is_eq: impl FnMut(&T, &T) -> bool,
) -> Vec<ListDiffItem<T>> {
    diff_windows(&Dense(old), &Dense(new), old_begin, new_begin, |a, b| {
        if is_eq(a, b) { Slot::Same } else { Slot::Changed }
    })
}

/// Identity-aware diff.
///
/// `same_identity` decides whether two items are the same record (typically by id). When a slot
/// holds a different record than before, the result carries a `Delete` of the old record and a
/// `Create` of the new one at that index. `Update` is reserved for the same record whose value
/// changed (`PartialEq`).
pub fn list_diff_keyed<T: Clone + PartialEq>(
    old: &[T],
    new: &[T],
    old_begin: usize,
    new_begin: usize,
    same_identity: impl FnMut(&T, &T) -> bool,
) -> Vec<ListDiffItem<T>> {
    diff_windows(&Dense(old), &Dense(new), old_begin, new_begin, keyed(same_identity))
}

/// Same as [`list_diff_keyed`] for windows with holes: `None` slots count as absent.
pub fn list_diff_sparse_keyed<T: Clone + PartialEq>(
    old: &[Option<T>],
    new: &[Option<T>],
    old_begin: usize,
    new_begin: usize,
    same_identity: impl FnMut(&T, &T) -> bool,
) -> Vec<ListDiffItem<T>> {
    diff_windows(&Sparse(old), &Sparse(new), old_begin, new_begin, keyed(same_identity))
}

fn keyed<T: PartialEq>(
    mut same_identity: impl FnMut(&T, &T) -> bool,
) -> impl FnMut(&T, &T) -> Slot {
    move |a, b| {
        if !same_identity(a, b) {
            Slot::Replaced
        } else if a != b {
            Slot::Changed
        } else {
            Slot::Same
        }
    }
}

fn diff_windows<T, W>(
    old: &W,
    new: &W,
    old_begin: usize,
    new_begin: usize,
    mut compare: impl FnMut(&T, &T) -> Slot,
) -> Vec<ListDiffItem<T>>
where
    T: Clone,
    W: Window<T>,
{
    let old_range = Range::with_len(old_begin, old.len());
    let new_range = Range::with_len(new_begin, new.len());
    if old_range.is_empty() && new_range.is_empty() {
        return Vec::new();
    }
    // Visit only indexes inside a window, in ascending order: the part of `new` before `old`,
    // `old` itself, then the part of `new` after it.
    let head = Range::new(new_range.begin, cmp::min(new_range.end, old_range.begin));
    let tail = Range::new(cmp::max(new_range.begin, old_range.end), new_range.end);

    let mut out = Vec::new();
    let mut push = |kind, item: &T, index| {
        out.push(ListDiffItem {
            kind,
            item: item.clone(),
            index,
        })
    };
    for index in head
        .indexes()
        .chain(old_range.indexes())
        .chain(tail.indexes())
    {
        let before = if old_range.contains_index(index) {
            old.at(index - old_begin)
        } else {
            None
        };
        let after = if new_range.contains_index(index) {
            new.at(index - new_begin)
        } else {
            None
        };

        match (before, after) {
            (Some(prev), None) => push(ListDiffKind::Delete, prev, index),
            (None, Some(next)) => push(ListDiffKind::Create, next, index),
            (Some(prev), Some(next)) => match compare(prev, next) {
                Slot::Same => {}
                Slot::Changed => push(ListDiffKind::Update, next, index),
                Slot::Replaced => {
                    push(ListDiffKind::Delete, prev, index);
                    push(ListDiffKind::Create, next, index);
                }
            },
            (None, None) => {}
        }
    }

    rtrace!(
        old_begin,
        old_len = old_range.len(),
        new_begin,
        new_len = new_range.len(),
        changes = out.len(),
        "list_diff"
    );

    out.sort_by_key(|d| d.kind);
    out
}
