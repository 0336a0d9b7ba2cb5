//! erased-collections: a vector, a forward list and a chained hash map
//! built once over untyped storage and shared by every element type.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one compiled engine per container. The engines never see a
//!   concrete type; they move bytes around in `element_size()` strides and
//!   route every lifecycle operation through a capability object.
//! - Layers:
//!   - Capabilities (`ErasedAllocator`, `ErasedHasher`,
//!     `ErasedComparator`): object-safe traits over `NonNull<u8>`. The
//!     typed implementations (`TypedAllocator`, `TypedHasher`,
//!     `PairKeyEq`, `ValueEq`) are the only code that knows `T`.
//!   - Engines: `DynamicArray` (one block, one owned allocator),
//!     `SinglyLinkedList` (one element block per node, allocator lent by
//!     the owner), `HashTable` (fixed array of list buckets sharing one
//!     owned allocator, plus an owned hasher and comparator).
//!   - Typed façades: `Vector`, `ForwardList`, `UnorderedMap` cast the
//!     engines' addresses back to `&T` and hand out slices and iterators.
//!
//! Constraints
//! - Single-threaded: containers are `!Send`/`!Sync`.
//! - Stored types are `'static` (capabilities are boxed trait objects).
//! - Fixed bucket count: no rehashing, ever.
//! - Only `at` reports errors (`OutOfRange`); other bad arguments are
//!   preconditions. Those that would address memory outside a block
//!   panic instead.
//!
//! Moves are relocations
//! - `construct_move` is a bitwise relocation that ends the source's
//!   lifetime, so engines never destruct a moved-from slot. Growth only
//!   relocates, which keeps move-only element types usable.
//!
//! Construction paths
//! - `TypedAllocator::new` erases relocation and destruction. Default,
//!   copy and pair-default construction are opted into with
//!   `with_default`, `with_copy` and `with_pair_default`, and reported by
//!   `capabilities()`.
//! - Missing copy path: `construct_copy` panics. Missing default path:
//!   `construct` is a silent no-op at the engine level; the façades check
//!   the capability before reaching it.
//!
//! Reentrancy policy
//! - `HashTable` carries a debug-only guard around every operation that
//!   runs user code (`Hash`, `Eq`, `Clone`, `Default`, `Drop`) while a
//!   bucket is being scanned or linked. Re-entering the same table from
//!   that code panics in debug builds; release builds compile it away.
//!
//! Logging
//! - Through the `log` facade: `trace!` on array reallocation and table
//!   clear, `debug!` on table construction. The crate never installs a
//!   logger.

pub mod dynamic_array;
pub mod erased_allocator;
pub mod erased_hash;
mod error;
pub mod forward_list;
pub mod hash_table;
mod hash_table_proptest;
pub mod linked_list;
mod reentrancy;
mod slot_block;
pub mod unordered_map;
pub mod vector;

pub use dynamic_array::{grow_capacity, DynamicArray};
pub use erased_allocator::{AllocPolicy, Capabilities, DefaultAlloc, ErasedAllocator, TypedAllocator};
pub use erased_hash::{EqualTo, ErasedComparator, ErasedHasher, KeyEqual, PairKeyEq, TypedHasher, ValueEq};
pub use error::OutOfRange;
pub use forward_list::ForwardList;
pub use hash_table::{HashTable, TableIter};
pub use linked_list::{ListIter, SinglyLinkedList};
pub use unordered_map::{UnorderedMap, DEFAULT_BUCKET_COUNT};
pub use vector::Vector;
