use alloc::vec::Vec;
use core::fmt;

use crate::Range;

/// A sorted set of disjoint [`Range`]s describing partial coverage of an index space.
///
/// The list is kept normalized at all times:
/// - members are sorted by `begin`,
/// - empty members are dropped,
/// - overlapping or adjacent members are coalesced into one.
///
/// Because of this, two lists with the same coverage compare equal.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Range>", into = "Vec<Range>"))]
pub struct RangeList {
    ranges: Vec<Range>,
}

impl RangeList {
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn from_ranges(ranges: impl IntoIterator<Item = Range>) -> Self {
        let mut list = Self::new();
        for r in ranges {
            list.insert(r);
        }
        list
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    /// Number of disjoint members.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of indexes covered by the list.
    pub fn covered_len(&self) -> usize {
        self.ranges.iter().map(Range::len).sum()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Inserts a range in place, coalescing it with every member it overlaps or touches.
    pub fn insert(&mut self, range: Range) {
        if range.is_empty() {
            if range.begin > range.end {
                rwarn!(
                    begin = range.begin,
                    end = range.end,
                    "RangeList: ignoring inverted range"
                );
            }
            return;
        }

        // First member that could touch: end >= range.begin.
        let lo = self.ranges.partition_point(|r| r.end < range.begin);
        // One past the last member that could touch: begin <= range.end.
        let hi = self.ranges.partition_point(|r| r.begin <= range.end);

        let merged = if lo < hi {
            Range::new(
                self.ranges[lo].begin.min(range.begin),
                self.ranges[hi - 1].end.max(range.end),
            )
        } else {
            range
        };

        self.ranges.splice(lo..hi, [merged]);
    }

    /// Union of `self` and `other`.
    pub fn merge(&self, other: &RangeList) -> RangeList {
        let mut out = self.clone();
        for r in &other.ranges {
            out.insert(*r);
        }
        out
    }

    pub fn merge_range(&self, range: Range) -> RangeList {
        let mut out = self.clone();
        out.insert(range);
        out
    }

    /// Union of `self` and every list in `others`.
    pub fn merge_all<'a>(&self, others: impl IntoIterator<Item = &'a RangeList>) -> RangeList {
        let mut out = self.clone();
        for list in others {
            for r in &list.ranges {
                out.insert(*r);
            }
        }
        out
    }

    /// Indexes covered by `self` but not by `other`.
    pub fn subtract(&self, other: &RangeList) -> RangeList {
        let mut out = Vec::new();
        for r in &self.ranges {
            let mut cursor = r.begin;
            let start = other.ranges.partition_point(|o| o.end <= r.begin);
            for o in &other.ranges[start..] {
                if o.begin >= r.end {
                    break;
                }
                if o.begin > cursor {
                    out.push(Range::new(cursor, o.begin));
                }
                cursor = cursor.max(o.end);
                if cursor >= r.end {
                    break;
                }
            }
            if cursor < r.end {
                out.push(Range::new(cursor, r.end));
            }
        }
        // Pieces of distinct members never touch, so `out` is already normalized.
        RangeList { ranges: out }
    }

    /// Symmetric difference: indexes covered by exactly one of the two lists.
    ///
    /// Members of `other` that `self` does not cover at all pass through unchanged, and so do
    /// members of `self` that `other` does not touch. For the "what part of `r` is not cached
    /// yet" question use `cached.merge_range(r).diff(&cached)` or [`Self::missing`].
    pub fn diff(&self, other: &RangeList) -> RangeList {
        let mut out = self.subtract(other);
        for r in other.subtract(self).ranges {
            out.insert(r);
        }
        out
    }

    /// The parts of `range` that are not covered by `self`.
    pub fn missing(&self, range: Range) -> RangeList {
        self.merge_range(range).diff(self)
    }

    /// Full enclosure test: `range` must lie inside a single member.
    pub fn contains(&self, range: &Range) -> bool {
        if range.is_empty() {
            return true;
        }
        let idx = self.ranges.partition_point(|r| r.begin <= range.begin);
        if idx == 0 {
            return false;
        }
        self.ranges[idx - 1].contains(range)
    }

    pub fn contains_list(&self, other: &RangeList) -> bool {
        other.ranges.iter().all(|r| self.contains(r))
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.contains(&Range::new(index, index.saturating_add(1)))
    }

    /// The smallest single range covering every member, or `[0, 0)` when empty.
    pub fn span(&self) -> Range {
        match (self.ranges.first(), self.ranges.last()) {
            (Some(first), Some(last)) => Range::new(first.begin, last.end),
            _ => Range::empty(),
        }
    }
}

impl From<Range> for RangeList {
    fn from(range: Range) -> Self {
        Self::from_ranges([range])
    }
}

impl From<Vec<Range>> for RangeList {
    fn from(ranges: Vec<Range>) -> Self {
        Self::from_ranges(ranges)
    }
}

impl From<RangeList> for Vec<Range> {
    fn from(list: RangeList) -> Self {
        list.ranges
    }
}

impl FromIterator<Range> for RangeList {
    fn from_iter<I: IntoIterator<Item = Range>>(iter: I) -> Self {
        Self::from_ranges(iter)
    }
}

impl<'a> IntoIterator for &'a RangeList {
    type Item = &'a Range;
    type IntoIter = core::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl fmt::Debug for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ranges.iter()).finish()
    }
}
