// Example: overlapping window requests share one in-flight search.
use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use rangecache_storage::{
    DataSource, DataStorage, Filter, Id, MemorySource, Model, Page, Range, SourceError, Sorter,
    StorageEvent, StorageOptions,
};

#[derive(Clone, Debug, PartialEq)]
struct Item(i64);

impl Model for Item {
    fn id(&self) -> Id {
        Id::Int(self.0)
    }
}

/// Holds every search until `release` is called, like a slow network.
struct Slow {
    inner: MemorySource<Item>,
    gates: RefCell<Vec<oneshot::Sender<()>>>,
}

impl Slow {
    fn release(&self) {
        for gate in self.gates.borrow_mut().drain(..) {
            let _ = gate.send(());
        }
    }
}

impl DataSource for Slow {
    type Model = Item;

    async fn search(
        &self,
        filter: &Filter,
        sorter: &Sorter,
        range: Range,
    ) -> Result<Page<Item>, SourceError> {
        println!("search {range}");
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push(tx);
        rx.await
            .map_err(|_| SourceError::transport("cancelled"))?;
        self.inner.search(filter, sorter, range).await
    }

    async fn get(&self, id: &Id) -> Result<Item, SourceError> {
        self.inner.get(id).await
    }

    async fn get_position(
        &self,
        filter: &Filter,
        sorter: &Sorter,
        id: &Id,
    ) -> Result<Option<usize>, SourceError> {
        self.inner.get_position(filter, sorter, id).await
    }

    async fn save(&self, model: Item) -> Result<Item, SourceError> {
        self.inner.save(model).await
    }

    async fn delete(&self, id: &Id) -> Result<bool, SourceError> {
        self.inner.delete(id).await
    }
}

fn main() {
    let source = Rc::new(Slow {
        inner: MemorySource::new((0..500).map(Item)),
        gates: RefCell::new(Vec::new()),
    });
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    // Fetches keep running even if every window that asked for them is dropped.
    let storage = DataStorage::with_shared_source(Rc::clone(&source), StorageOptions::new())
        .with_spawner(spawner.clone());

    let mut events = storage.events();
    spawner
        .spawn_local(async move {
            while let Some(event) = events.next().await {
                if let StorageEvent::TotalChanged(total) = event {
                    println!("total -> {total:?}");
                }
            }
        })
        .unwrap();

    for window in [Range::new(100, 120), Range::new(105, 115), Range::new(110, 125)] {
        let request = storage.get_range(window);
        spawner
            .spawn_local(async move {
                match request.await {
                    Ok(page) => println!("{window}: {} loaded", page.loaded().count()),
                    Err(err) => println!("{window}: {err}"),
                }
            })
            .unwrap();
    }

    pool.run_until_stalled();
    println!("pending={:?}", storage.pending_ranges());
    source.release();
    pool.run_until_stalled();
    println!("cached={:?}", storage.cached_ranges());

    storage.dispose();
    pool.run();
}
