use core::cmp;
use core::fmt;

use crate::RangeList;

/// A half-open interval `[begin, end)` over item indexes.
///
/// Ranges are plain values: every operation returns a new `Range` (or [`RangeList`]) and never
/// fails. A range with `begin >= end` is empty and means "nothing selected".
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub begin: usize,
    pub end: usize, // exclusive
}

impl Range {
    pub const fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// The zero value `[0, 0)`.
    pub const fn empty() -> Self {
        Self { begin: 0, end: 0 }
    }

    pub fn with_len(begin: usize, len: usize) -> Self {
        Self {
            begin,
            end: begin.saturating_add(len),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.begin <= index && index < self.end
    }

    /// Full enclosure test. An empty range is enclosed by every range.
    pub fn contains(&self, other: &Range) -> bool {
        other.is_empty() || (self.begin <= other.begin && other.end <= self.end)
    }

    /// Returns `true` when both ranges share at least one index.
    ///
    /// Ranges that only touch at a boundary (`[0, 5)` and `[5, 10)`) do not overlap.
    pub fn is_overlap(&self, other: &Range) -> bool {
        cmp::max(self.begin, other.begin) < cmp::min(self.end, other.end)
    }

    /// Returns `true` when the ranges overlap or are directly adjacent.
    ///
    /// This is the coalescing test used by [`RangeList`] normalization.
    pub fn touches(&self, other: &Range) -> bool {
        cmp::max(self.begin, other.begin) <= cmp::min(self.end, other.end)
    }

    pub fn intersection(&self, other: &Range) -> Option<Range> {
        if !self.is_overlap(other) {
            return None;
        }
        Some(Range {
            begin: cmp::max(self.begin, other.begin),
            end: cmp::min(self.end, other.end),
        })
    }

    /// Returns the bounding interval of both ranges.
    ///
    /// The inputs do not need to overlap: for disjoint ranges the gap between them is included.
    /// Check [`Self::is_overlap`] first when exact union semantics matter.
    pub fn merge(&self, other: &Range) -> Range {
        Range {
            begin: cmp::min(self.begin, other.begin),
            end: cmp::max(self.end, other.end),
        }
    }

    /// Symmetric difference of two ranges as 0, 1 or 2 non-empty sub-ranges.
    ///
    /// Non-overlapping inputs are returned as they are.
    pub fn diff(&self, other: &Range) -> RangeList {
        if !self.is_overlap(other) {
            return RangeList::from_ranges([*self, *other]);
        }
        let head = Range::new(
            cmp::min(self.begin, other.begin),
            cmp::max(self.begin, other.begin),
        );
        let tail = Range::new(
            cmp::min(self.end, other.end),
            cmp::max(self.end, other.end),
        );
        RangeList::from_ranges([head, tail])
    }

    /// Caps `end` at `limit`. `begin` is capped too so the result never inverts.
    pub fn clamp_end(&self, limit: usize) -> Range {
        Range {
            begin: cmp::min(self.begin, limit),
            end: cmp::min(self.end, limit),
        }
    }

    pub fn shift(&self, offset: usize) -> Range {
        Range {
            begin: self.begin.saturating_add(offset),
            end: self.end.saturating_add(offset),
        }
    }

    pub fn indexes(&self) -> core::ops::Range<usize> {
        self.begin..cmp::max(self.begin, self.end)
    }
}

impl From<core::ops::Range<usize>> for Range {
    fn from(r: core::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for core::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.indexes()
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}
