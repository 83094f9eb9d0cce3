use rangecache::Range;

use crate::{Filter, Sorter};

/// Configuration for [`crate::DataStorage`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StorageOptions {
    /// Minimum fetch size. Smaller gaps are widened to this many items (read-ahead).
    pub items_per_request: usize,

    /// The initial window, replayed to `items()` subscribers before any `get_range` call.
    pub range: Range,

    /// Initial filter passed verbatim to the source.
    pub filter: Filter,

    /// Initial sort order passed verbatim to the source.
    pub sorter: Sorter,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            items_per_request: 30,
            range: Range::empty(),
            filter: Filter::new(),
            sorter: Sorter::new(),
        }
    }
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items_per_request(mut self, items_per_request: usize) -> Self {
        self.items_per_request = items_per_request;
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sorter(mut self, sorter: Sorter) -> Self {
        self.sorter = sorter;
        self
    }
}
