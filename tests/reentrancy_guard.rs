// Reentrancy through user code.
//
// The map calls `Hash`, `Eq`, `Clone`, `Default` and `Drop` while a bucket
// is being scanned or linked. Reaching back into the same map from there
// panics in debug builds; outside those windows user code is free to use it.
use erased_collections::UnorderedMap;
use std::cell::Cell;
use std::hash::{Hash, Hasher};

type Map = UnorderedMap<Key, i32>;

thread_local! {
    static MAP: Cell<*const Map> = const { Cell::new(std::ptr::null()) };
}

// Key whose `Hash` looks itself up in the registered map.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Key(u32);

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let m = MAP.with(|c| c.get());
        if !m.is_null() && self.0 != u32::MAX {
            // Attempt to re-enter the same map while it hashes.
            let _ = unsafe { (*m).contains_key(&Key(u32::MAX)) };
        }
        self.0.hash(state);
    }
}

// Test: plain use with no reentry.
#[test]
fn sequential_calls_are_fine() {
    let mut m: Map = UnorderedMap::with_buckets(4);
    m.insert(Key(1), 1);
    assert_eq!(m.at(&Key(1)), Ok(&1));
    assert!(m.remove(&Key(1)));
}

// Test: reentry from `Hash` during a lookup.
// Verifies: debug builds panic and the map stays usable afterwards.
#[cfg(debug_assertions)]
#[test]
fn reentrancy_panics_in_debug() {
    let mut m: Map = UnorderedMap::with_buckets(4);
    m.insert(Key(1), 1);
    MAP.with(|c| c.set(&m as *const _));
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m.count(&Key(1))));
    MAP.with(|c| c.set(std::ptr::null()));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    assert_eq!(m.count(&Key(1)), 1);
}

// Test: the same reentry is not checked in release builds.
#[cfg(not(debug_assertions))]
#[test]
fn reentrancy_noop_in_release() {
    let mut m: Map = UnorderedMap::with_buckets(4);
    m.insert(Key(1), 1);
    MAP.with(|c| c.set(&m as *const _));
    let n = m.count(&Key(1));
    MAP.with(|c| c.set(std::ptr::null()));
    assert_eq!(n, 1);
}
