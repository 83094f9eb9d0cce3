//! Interval algebra and windowed list diffing for lazily fetched collections.
//!
//! For the caching/paging engine built on top of these primitives, see the
//! `rangecache-storage` crate.
//!
//! This crate focuses on the pure algorithms behind virtualized grids and selects backed by
//! partially cached data:
//! - [`Range`]: an immutable half-open index interval.
//! - [`RangeList`]: a normalized set of disjoint ranges with merge, diff and containment queries.
//! - [`list_diff`] and friends: the minimal create/update/delete set between two windows of an
//!   index-addressed sequence, expressed in absolute indexes.
//!
//! It is UI-agnostic and allocation-light; nothing here fails or panics on degenerate input.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod list_diff;
mod range;
mod range_list;

#[cfg(test)]
mod tests;

pub use list_diff::{
    ListDiffItem, ListDiffKind, list_diff, list_diff_by, list_diff_keyed, list_diff_sparse_keyed,
};
pub use range::Range;
pub use range_list::RangeList;
