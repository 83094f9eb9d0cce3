//! Caching, paging and request coalescing on top of the `rangecache` primitives.
//!
//! The `rangecache` crate is pure algorithms. This crate provides the stateful engine that backs
//! virtualized grids and selects with lazily fetched data:
//!
//! - [`DataSource`]: the contract a transport implements (`search`/`get`/`get_position`/...).
//! - [`MemorySource`]: a static in-memory source with filtering and sorting.
//! - [`DataStorage`]: a sparse index → record cache that turns window requests into as few
//!   `search` calls as possible and publishes diffed window snapshots.
//!
//! Everything here is single-threaded and executor-agnostic: futures are `!Send` and can be driven
//! by `futures::executor`, a UI event loop, or any local task set.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod error;
mod model;
mod options;
mod query;
mod source;
mod storage;


pub use error::{Error, Result, SourceError};
pub use model::{Id, Model, Value, same_id};
pub use options::StorageOptions;
pub use query::{Criterion, Filter, SortDirection, Sorter};
pub use source::{DataSource, MemorySource, Page};
pub use storage::{DataStorage, EventStream, ItemsStream, ItemsWithChanges, StorageEvent};

pub use rangecache::{ListDiffItem, ListDiffKind, Range, RangeList};
