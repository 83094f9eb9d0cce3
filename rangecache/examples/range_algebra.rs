// Example: tracking loaded spans and finding what is still missing.
use rangecache::{Range, RangeList};

fn main() {
    let mut loaded = RangeList::new();
    loaded.insert(Range::new(0, 30));
    loaded.insert(Range::new(60, 90));
    loaded.insert(Range::new(30, 40)); // touches [0, 30): coalesced
    println!("loaded={loaded:?} covered={}", loaded.covered_len());

    let want = Range::new(20, 80);
    let missing = loaded.missing(want);
    println!("want={want} missing={missing:?} fetch_span={}", missing.span());

    let a = Range::new(0, 10);
    let b = Range::new(5, 20);
    println!("{a} overlaps {b}: {}", a.is_overlap(&b));
    println!("{a} merge {b} = {}", a.merge(&b));
    println!("{a} diff {b} = {:?}", a.diff(&b));
    println!("{a} & {b} = {:?}", a.intersection(&b));
}
