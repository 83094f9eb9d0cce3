// Example: paging through an in-memory source with read-ahead and a filter change.
use futures::executor::block_on;
use rangecache_storage::{
    Criterion, DataStorage, Id, MemorySource, Model, Range, StorageOptions, Value,
};

#[derive(Clone, Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
    active: bool,
}

impl Model for User {
    fn id(&self) -> Id {
        Id::Int(self.id)
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name.as_str())),
            "active" => Some(Value::Bool(self.active)),
            _ => None,
        }
    }
}

fn main() -> Result<(), rangecache_storage::Error> {
    let users = (0..1_000).map(|i| User {
        id: i,
        name: format!("user {i}"),
        active: i % 4 != 0,
    });
    let storage = DataStorage::new(
        MemorySource::new(users),
        StorageOptions::new().with_items_per_request(50),
    );

    let page = block_on(storage.get_range(Range::new(0, 20)))?;
    println!(
        "window={} changes={} searches={} cached={:?} total={:?}",
        page.range,
        page.changes.len(),
        storage.source().search_count(),
        storage.cached_ranges(),
        storage.total()
    );

    // Served from the read-ahead.
    let page = block_on(storage.get_range(Range::new(10, 30)))?;
    println!(
        "window={} changes={} searches={}",
        page.range,
        page.changes.len(),
        storage.source().search_count()
    );

    storage.update_filter(|f| f.with("active", Criterion::Eq(Value::Bool(false))));
    let page = block_on(storage.get_range(Range::new(0, 5)))?;
    let ids: Vec<i64> = page.loaded().map(|(_, u)| u.id).collect();
    println!("inactive ids={ids:?} total={:?}", storage.total());
    Ok(())
}
