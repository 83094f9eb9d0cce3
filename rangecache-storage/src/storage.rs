use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt};
use rangecache::{ListDiffItem, Range, RangeList, list_diff_sparse_keyed};

use crate::{
    DataSource, Error, Filter, Id, Model, Page, Result, SourceError, Sorter, StorageOptions,
    same_id,
};

/// A window snapshot plus the changes since the previously published window.
///
/// `items[i]` is the record at absolute index `range.begin + i`, or `None` when that index is not
/// loaded (past the end of the data, or a short read).
#[derive(Clone, Debug, PartialEq)]
pub struct ItemsWithChanges<M> {
    pub range: Range,
    pub items: Vec<Option<M>>,
    pub changes: Vec<ListDiffItem<M>>,
}

impl<M> ItemsWithChanges<M> {
    /// Iterates over the loaded records with their absolute indexes.
    pub fn loaded(&self) -> impl Iterator<Item = (usize, &M)> {
        let begin = self.range.begin;
        self.items
            .iter()
            .enumerate()
            .filter_map(move |(i, m)| m.as_ref().map(|m| (begin + i, m)))
    }
}

/// Storage-level notifications, delivered through [`DataStorage::events`].
#[derive(Clone, Debug, PartialEq)]
pub enum StorageEvent {
    /// The cache was wiped; indexes from before this point are meaningless.
    Reset,
    FilterChanged(Filter),
    SorterChanged(Sorter),
    TotalChanged(Option<usize>),
}

/// Stream of window updates. The first element replays the current window.
pub type ItemsStream<M> = UnboundedReceiver<ItemsWithChanges<M>>;

pub type EventStream = UnboundedReceiver<StorageEvent>;

type SharedFetch = Shared<LocalBoxFuture<'static, Result<()>>>;

struct Pending {
    id: u64,
    range: Range,
    fetch: SharedFetch,
}

enum Step {
    Ready,
    Wait(u64, SharedFetch),
    Fetch(u64, SharedFetch),
}

/// A request's handle on a pending fetch.
///
/// When the last request waiting on an undriven fetch goes away before it completes, the
/// pending entry is withdrawn so it stops shadowing later requests.
struct Attached<M> {
    id: u64,
    fetch: SharedFetch,
    state: Weak<RefCell<State<M>>>,
}

impl<M> Future for Attached<M> {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.fetch).poll(cx)
    }
}

impl<M> Drop for Attached<M> {
    fn drop(&mut self) {
        // `None` once this handle saw the result.
        if self.fetch.strong_count() != Some(2) || self.fetch.peek().is_some() {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let Ok(mut state) = state.try_borrow_mut() else {
            return;
        };
        // The other handle is the pending entry's own.
        if state.pending.iter().any(|p| p.id == self.id) {
            sdebug!(id = self.id, "withdrawing abandoned fetch");
            state.pending.retain(|p| p.id != self.id);
        }
    }
}

struct State<M> {
    options: StorageOptions,
    filter: Filter,
    sorter: Sorter,

    cache: BTreeMap<usize, M>,
    cached_ranges: RangeList,
    total: Option<usize>,
    last_index: usize,
    pending: Vec<Pending>,

    // Last published window, the base for the next diff.
    range: Range,
    view: Vec<Option<M>>,

    generation: u64,
    next_request: u64,
    disposed: bool,

    item_subscribers: Vec<UnboundedSender<ItemsWithChanges<M>>>,
    event_subscribers: Vec<UnboundedSender<StorageEvent>>,
}

impl<M: Model> State<M> {
    fn slice(&self, range: Range) -> Vec<Option<M>> {
        range
            .indexes()
            .map(|i| self.cache.get(&i).cloned())
            .collect()
    }

    fn emit_event(&mut self, event: StorageEvent) {
        self.event_subscribers
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    fn publish(&mut self, range: Range) -> ItemsWithChanges<M> {
        let items = self.slice(range);
        let changes =
            list_diff_sparse_keyed(&self.view, &items, self.range.begin, range.begin, same_id);
        self.range = range;
        self.view = items.clone();

        let snapshot = ItemsWithChanges {
            range,
            items,
            changes,
        };
        self.item_subscribers
            .retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
        snapshot
    }

    fn replay(&self) -> ItemsWithChanges<M> {
        ItemsWithChanges {
            range: self.range,
            items: self.view.clone(),
            changes: list_diff_sparse_keyed(&[], &self.view, 0, self.range.begin, same_id),
        }
    }

    fn set_total(&mut self, total: usize) {
        if self.total == Some(total) {
            return;
        }
        self.total = Some(total);
        self.emit_event(StorageEvent::TotalChanged(self.total));
    }

    fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.cache.clear();
        self.cached_ranges.clear();
        self.pending.clear();
        self.last_index = 0;
        let had_total = self.total.take().is_some();
        sdebug!(generation = self.generation, "DataStorage::reset");

        self.emit_event(StorageEvent::Reset);
        if had_total {
            self.emit_event(StorageEvent::TotalChanged(None));
        }
        // Subscribers see the old window disappear.
        let range = self.range;
        self.publish(range);
    }

    /// Decides what `range` needs: nothing, an in-flight fetch, or a new one.
    fn plan<S>(&mut self, storage: &DataStorage<S>, range: Range) -> Result<Step>
    where
        S: DataSource<Model = M>,
    {
        if self.disposed {
            return Err(Error::Disposed);
        }
        let wanted = match self.total {
            Some(total) => range.clamp_end(total),
            None => range,
        };
        let gap = self.cached_ranges.missing(wanted).span();
        if gap.is_empty() {
            strace!(range = %range, "cache hit");
            return Ok(Step::Ready);
        }

        if let Some(p) = self.pending.iter().find(|p| p.range.is_overlap(&gap)) {
            strace!(range = %range, pending = %p.range, "joining in-flight fetch");
            return Ok(Step::Wait(p.id, p.fetch.clone()));
        }

        let mut fetch_range = if gap.len() < self.options.items_per_request {
            Range::with_len(gap.begin, self.options.items_per_request)
        } else {
            gap
        };
        if let Some(total) = self.total {
            fetch_range = fetch_range.clamp_end(total);
        }
        // Read-ahead must stop where another in-flight fetch begins.
        if let Some(next) = self
            .pending
            .iter()
            .map(|p| p.range.begin)
            .filter(|&b| b >= gap.end && b < fetch_range.end)
            .min()
        {
            fetch_range.end = next;
        }

        let id = self.next_request;
        self.next_request = self.next_request.wrapping_add(1);
        sdebug!(
            id,
            range = %range,
            fetch = %fetch_range,
            generation = self.generation,
            "issuing search"
        );
        let fetch = storage.fetch(
            id,
            self.generation,
            fetch_range,
            self.filter.clone(),
            self.sorter.clone(),
        );
        self.pending.push(Pending {
            id,
            range: fetch_range,
            fetch: fetch.clone(),
        });
        Ok(Step::Fetch(id, fetch))
    }

    fn finish(
        &mut self,
        id: u64,
        generation: u64,
        range: Range,
        result: std::result::Result<Page<M>, SourceError>,
    ) -> Result<()> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        if generation != self.generation {
            sdebug!(id, generation, current = self.generation, "dropping stale fetch");
            return Ok(());
        }
        self.pending.retain(|p| p.id != id);

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                swarn!(id, range = %range, error = %err, "search failed");
                return Err(err.into());
            }
        };

        let loaded = Range::with_len(range.begin, page.items.len());
        for (i, item) in page.items.into_iter().enumerate() {
            self.cache.insert(range.begin + i, item);
        }
        self.cached_ranges.insert(loaded);
        self.last_index = self.last_index.max(loaded.end);

        match page.total {
            Some(total) => self.set_total(total),
            None if loaded.len() < range.len() => {
                swarn!(
                    id,
                    requested = range.len(),
                    returned = loaded.len(),
                    "short read, assuming end of data"
                );
                self.set_total(loaded.end);
            }
            None => {}
        }
        strace!(id, loaded = %loaded, "fetch applied");
        Ok(())
    }
}

/// A caching, paging view over a [`DataSource`].
///
/// The storage keeps a sparse index → record cache plus the [`RangeList`] of cached spans, turns
/// window requests into as few `search` calls as possible, and publishes diffed window snapshots.
///
/// It is single-threaded: handles are cheap `Rc` clones, and all futures are `!Send`. No executor
/// is required beyond whatever polls the returned futures.
///
/// A filter or sorter change wipes the cache, because indexes mean something else afterwards.
/// Fetches that were in flight at that point are dropped when they complete.
pub struct DataStorage<S: DataSource> {
    source: Rc<S>,
    state: Rc<RefCell<State<S::Model>>>,
    spawner: Option<Rc<dyn LocalSpawn>>,
}

impl<S: DataSource> Clone for DataStorage<S> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            state: Rc::clone(&self.state),
            spawner: self.spawner.clone(),
        }
    }
}

impl<S: DataSource> DataStorage<S> {
    pub fn new(source: S, options: StorageOptions) -> Self {
        Self::with_shared_source(Rc::new(source), options)
    }

    pub fn with_shared_source(source: Rc<S>, options: StorageOptions) -> Self {
        sdebug!(
            items_per_request = options.items_per_request,
            range = %options.range,
            "DataStorage::new"
        );
        let state = State {
            filter: options.filter.clone(),
            sorter: options.sorter.clone(),
            cache: BTreeMap::new(),
            cached_ranges: RangeList::new(),
            total: None,
            last_index: 0,
            pending: Vec::new(),
            range: options.range,
            view: vec![None; options.range.len()],
            generation: 0,
            next_request: 0,
            disposed: false,
            item_subscribers: Vec::new(),
            event_subscribers: Vec::new(),
            options,
        };
        Self {
            source,
            state: Rc::new(RefCell::new(state)),
            spawner: None,
        }
    }

    /// Drives every fetch on `spawner` in addition to the requests awaiting it.
    ///
    /// With a spawner, a fetch whose requests were all dropped (the window scrolled away) still
    /// completes and lands in the cache. Without one, such a fetch is abandoned and its span is
    /// fetched again on the next request.
    pub fn with_spawner(mut self, spawner: impl LocalSpawn + 'static) -> Self {
        self.spawner = Some(Rc::new(spawner));
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> StorageOptions {
        self.state.borrow().options.clone()
    }

    pub fn set_items_per_request(&self, items_per_request: usize) {
        self.state.borrow_mut().options.items_per_request = items_per_request;
    }

    /// Loads `range` and publishes it as the current window.
    ///
    /// Cached ranges resolve on the first poll without calling the source. Otherwise the
    /// uncached part of `range` is fetched as one contiguous span (widened to
    /// `items_per_request`), or the request joins an in-flight fetch that overlaps it.
    ///
    /// A failed fetch leaves the cache untouched and fails every request attached to it; the
    /// next request for the same span retries.
    pub fn get_range(
        &self,
        range: Range,
    ) -> impl Future<Output = Result<ItemsWithChanges<S::Model>>> + use<S> {
        let this = self.clone();
        async move { this.load(range).await }
    }

    async fn load(&self, range: Range) -> Result<ItemsWithChanges<S::Model>> {
        loop {
            let (step, generation) = {
                let mut state = self.state.borrow_mut();
                let step = state.plan(self, range)?;
                (step, state.generation)
            };
            match step {
                Step::Ready => break,
                // Re-plan afterwards: the joined fetch may not cover all of `range`.
                Step::Wait(id, fetch) => self.attach(id, fetch).await?,
                Step::Fetch(id, fetch) => {
                    self.attach(id, fetch).await?;
                    if self.state.borrow().generation == generation {
                        break;
                    }
                }
            }
        }

        let mut state = self.state.borrow_mut();
        if state.disposed {
            return Err(Error::Disposed);
        }
        Ok(state.publish(range))
    }

    fn attach(&self, id: u64, fetch: SharedFetch) -> Attached<S::Model> {
        Attached {
            id,
            fetch,
            state: Rc::downgrade(&self.state),
        }
    }

    fn fetch(
        &self,
        id: u64,
        generation: u64,
        range: Range,
        filter: Filter,
        sorter: Sorter,
    ) -> SharedFetch {
        let source = Rc::clone(&self.source);
        let state: Weak<RefCell<State<S::Model>>> = Rc::downgrade(&self.state);
        let fetch = async move {
            let result = source.search(&filter, &sorter, range).await;
            let Some(state) = state.upgrade() else {
                return Err(Error::Disposed);
            };
            let mut state = state.borrow_mut();
            state.finish(id, generation, range, result)
        }
        .boxed_local()
        .shared();

        if let Some(spawner) = &self.spawner {
            if let Err(err) = spawner.spawn_local(fetch.clone().map(|_| ())) {
                swarn!(id, error = %err, "could not spawn fetch driver");
            }
        }
        fetch
    }

    /// Absolute index of `id` under the current filter and sorter.
    ///
    /// Answered from the cache when possible, otherwise delegated to the source.
    pub fn get_position(&self, id: Id) -> impl Future<Output = Result<Option<usize>>> + use<S> {
        let source = Rc::clone(&self.source);
        let lookup = {
            let state = self.state.borrow();
            if state.disposed {
                Err(Error::Disposed)
            } else {
                let cached = state
                    .cache
                    .iter()
                    .find(|(_, m)| m.id() == id)
                    .map(|(i, _)| *i);
                Ok((cached, state.filter.clone(), state.sorter.clone()))
            }
        };
        async move {
            let (cached, filter, sorter) = lookup?;
            if cached.is_some() {
                return Ok(cached);
            }
            Ok(source.get_position(&filter, &sorter, &id).await?)
        }
    }

    /// Fetches a single record, from the cache when it is loaded.
    pub fn get(&self, id: Id) -> impl Future<Output = Result<S::Model>> + use<S> {
        let source = Rc::clone(&self.source);
        let lookup = {
            let state = self.state.borrow();
            if state.disposed {
                Err(Error::Disposed)
            } else {
                Ok(state.cache.values().find(|m| m.id() == id).cloned())
            }
        };
        async move {
            if let Some(model) = lookup? {
                return Ok(model);
            }
            Ok(source.get(&id).await?)
        }
    }

    /// Wipes the cache and orphans in-flight fetches.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        state.reset();
    }

    pub fn filter(&self) -> Filter {
        self.state.borrow().filter.clone()
    }

    /// Replaces the filter. Returns `false` (and keeps the cache) when it is equal to the
    /// current one.
    pub fn set_filter(&self, filter: Filter) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disposed || state.filter == filter {
            return false;
        }
        state.filter = filter.clone();
        state.emit_event(StorageEvent::FilterChanged(filter));
        state.reset();
        true
    }

    pub fn update_filter(&self, f: impl FnOnce(Filter) -> Filter) -> bool {
        let next = f(self.filter());
        self.set_filter(next)
    }

    pub fn sorter(&self) -> Sorter {
        self.state.borrow().sorter.clone()
    }

    /// Replaces the sort order. Returns `false` (and keeps the cache) when it is equal to the
    /// current one.
    pub fn set_sorter(&self, sorter: Sorter) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disposed || state.sorter == sorter {
            return false;
        }
        state.sorter = sorter.clone();
        state.emit_event(StorageEvent::SorterChanged(sorter));
        state.reset();
        true
    }

    /// Subscribes to window updates. The current window is replayed first.
    pub fn items(&self) -> ItemsStream<S::Model> {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return rx;
        }
        if tx.unbounded_send(state.replay()).is_ok() {
            state.item_subscribers.push(tx);
        }
        rx
    }

    pub fn events(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.state.borrow_mut();
        if !state.disposed {
            state.event_subscribers.push(tx);
        }
        rx
    }

    /// Closes every subscriber stream and stops all cache activity.
    ///
    /// In-flight fetches may still complete; their results are discarded.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        sdebug!(pending = state.pending.len(), "DataStorage::dispose");
        state.disposed = true;
        state.generation = state.generation.wrapping_add(1);
        state.pending.clear();
        state.cache.clear();
        state.cached_ranges.clear();
        state.view.clear();
        state.item_subscribers.clear();
        state.event_subscribers.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// The cached record at `index`, if loaded.
    pub fn item(&self, index: usize) -> Option<S::Model> {
        self.state.borrow().cache.get(&index).cloned()
    }

    /// The cached contents of `range`, without fetching.
    pub fn slice(&self, range: Range) -> Vec<Option<S::Model>> {
        self.state.borrow().slice(range)
    }

    /// The last published window.
    pub fn range(&self) -> Range {
        self.state.borrow().range
    }

    pub fn total(&self) -> Option<usize> {
        self.state.borrow().total
    }

    /// One past the highest index known to hold data.
    pub fn last_index(&self) -> usize {
        self.state.borrow().last_index
    }

    pub fn cached_ranges(&self) -> RangeList {
        self.state.borrow().cached_ranges.clone()
    }

    pub fn pending_ranges(&self) -> Vec<Range> {
        self.state.borrow().pending.iter().map(|p| p.range).collect()
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }
}

impl<S: DataSource> fmt::Debug for DataStorage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DataStorage")
            .field("range", &state.range)
            .field("cached_ranges", &state.cached_ranges)
            .field("total", &state.total)
            .field("last_index", &state.last_index)
            .field("pending", &state.pending.len())
            .field("generation", &state.generation)
            .field("disposed", &state.disposed)
            .field("spawner", &self.spawner.is_some())
            .finish_non_exhaustive()
    }
}
