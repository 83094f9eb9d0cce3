use std::cell::{Cell, RefCell};
use std::future::Future;

use rangecache::Range;

use crate::{Filter, Id, Model, SourceError, Sorter};

/// One page of search results.
///
/// `total` is the number of records matching the filter, when the source knows it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<M> {
    pub items: Vec<M>,
    pub total: Option<usize>,
}

impl<M> Page<M> {
    pub fn new(items: Vec<M>) -> Self {
        Self { items, total: None }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

/// A fetchable, filterable, sortable provider of records.
///
/// Transports (RPC clients, static arrays, ...) implement this; [`crate::DataStorage`] only ever
/// calls `search`, `get` and `get_position` on the read path.
pub trait DataSource: 'static {
    type Model: Model;

    /// Returns the records at `range` (absolute indexes under `filter`/`sorter`).
    ///
    /// Returning fewer items than `range.len()` is allowed and means the data ends early.
    fn search(
        &self,
        filter: &Filter,
        sorter: &Sorter,
        range: Range,
    ) -> impl Future<Output = Result<Page<Self::Model>, SourceError>>;

    fn get(&self, id: &Id) -> impl Future<Output = Result<Self::Model, SourceError>>;

    /// Absolute index of `id` under `filter`/`sorter`, or `None` when it does not match.
    fn get_position(
        &self,
        filter: &Filter,
        sorter: &Sorter,
        id: &Id,
    ) -> impl Future<Output = Result<Option<usize>, SourceError>>;

    fn save(&self, model: Self::Model) -> impl Future<Output = Result<Self::Model, SourceError>>;

    fn delete(&self, id: &Id) -> impl Future<Output = Result<bool, SourceError>>;
}

/// A static in-memory [`DataSource`].
#[derive(Debug)]
pub struct MemorySource<M> {
    rows: RefCell<Vec<M>>,
    search_count: Cell<usize>,
}

impl<M: Model> MemorySource<M> {
    pub fn new(rows: impl IntoIterator<Item = M>) -> Self {
        Self {
            rows: RefCell::new(rows.into_iter().collect()),
            search_count: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    /// Number of `search` calls served so far.
    pub fn search_count(&self) -> usize {
        self.search_count.get()
    }

    fn matching(&self, filter: &Filter, sorter: &Sorter) -> Result<Vec<M>, SourceError> {
        filter.validate()?;
        let mut rows: Vec<M> = self
            .rows
            .borrow()
            .iter()
            .filter(|m| filter.matches(*m))
            .cloned()
            .collect();
        if !sorter.is_empty() {
            rows.sort_by(|a, b| sorter.compare(a, b));
        }
        Ok(rows)
    }
}

impl<M: Model> DataSource for MemorySource<M> {
    type Model = M;

    async fn search(
        &self,
        filter: &Filter,
        sorter: &Sorter,
        range: Range,
    ) -> Result<Page<M>, SourceError> {
        self.search_count.set(self.search_count.get() + 1);
        let rows = self.matching(filter, sorter)?;
        let total = rows.len();
        let window = range.clamp_end(total);
        Ok(Page::new(rows[window.indexes()].to_vec()).with_total(total))
    }

    async fn get(&self, id: &Id) -> Result<M, SourceError> {
        self.rows
            .borrow()
            .iter()
            .find(|m| m.id() == *id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.clone()))
    }

    async fn get_position(
        &self,
        filter: &Filter,
        sorter: &Sorter,
        id: &Id,
    ) -> Result<Option<usize>, SourceError> {
        let rows = self.matching(filter, sorter)?;
        Ok(rows.iter().position(|m| m.id() == *id))
    }

    async fn save(&self, model: M) -> Result<M, SourceError> {
        let mut rows = self.rows.borrow_mut();
        let id = model.id();
        match rows.iter_mut().find(|m| m.id() == id) {
            Some(slot) => *slot = model.clone(),
            None => rows.push(model.clone()),
        }
        Ok(model)
    }

    async fn delete(&self, id: &Id) -> Result<bool, SourceError> {
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|m| m.id() != *id);
        Ok(rows.len() != before)
    }
}
