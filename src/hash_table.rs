//! HashTable: the unordered_map engine.
//!
//! A fixed array of `SinglyLinkedList` buckets sharing one owned
//! `ErasedAllocator`, plus an owned `ErasedHasher` (over the key) and
//! `ErasedComparator` (stored element against a bare key). The bucket
//! count is set at construction and never changes; there is no rehashing,
//! so long chains are the caller's concern.
//!
//! Layout of a full traversal: ascending bucket index, then newest entry
//! first within a bucket.
//!
//! Entry points that take untyped key or element addresses are `unsafe`:
//! keys must be live values of the hasher's key type, and elements live
//! values of the allocator's element type.

use crate::erased_allocator::ErasedAllocator;
use crate::erased_hash::{ErasedComparator, ErasedHasher};
use crate::error::OutOfRange;
use crate::linked_list::{ListIter, SinglyLinkedList};
use crate::reentrancy::DebugReentrancy;
use core::fmt;
use core::mem;
use core::ptr::NonNull;

/// Position in a table: a bucket index plus a node in that bucket.
///
/// End is `{bucket: bucket_count, node: end}`. Two positions are equal when
/// they name the same node.
#[derive(Copy, Clone, Debug)]
pub struct TableIter {
    bucket: usize,
    node: ListIter,
}

impl TableIter {
    #[inline]
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_end()
    }

    /// Element address, `None` at end.
    ///
    /// # Safety
    /// The entry must not have been removed since this position was taken.
    #[inline]
    pub unsafe fn get(&self) -> Option<NonNull<u8>> {
        unsafe { self.node.get() }
    }
}

impl PartialEq for TableIter {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for TableIter {}

pub struct HashTable {
    buckets: Box<[SinglyLinkedList]>,
    alloc: Box<dyn ErasedAllocator>,
    hasher: Box<dyn ErasedHasher>,
    cmp: Box<dyn ErasedComparator>,
    len: usize,
    reentrancy: DebugReentrancy,
}

fn empty_buckets(n: usize) -> Box<[SinglyLinkedList]> {
    (0..n).map(|_| SinglyLinkedList::new()).collect()
}

impl HashTable {
    /// # Panics
    /// If `num_buckets` is zero.
    pub fn new(
        num_buckets: usize,
        alloc: Box<dyn ErasedAllocator>,
        hasher: Box<dyn ErasedHasher>,
        cmp: Box<dyn ErasedComparator>,
    ) -> Self {
        assert!(num_buckets > 0, "HashTable needs at least one bucket");
        log::debug!(
            "HashTable<{}>: {} buckets",
            alloc.element_type_name(),
            num_buckets
        );
        Self {
            buckets: empty_buckets(num_buckets),
            alloc,
            hasher,
            cmp,
            len: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries chained in bucket `i`; walks the chain.
    ///
    /// # Panics
    /// If `i >= bucket_count()`.
    pub fn bucket_size(&self, i: usize) -> usize {
        self.buckets[i].len()
    }

    pub fn allocator(&self) -> &dyn ErasedAllocator {
        &*self.alloc
    }

    unsafe fn bucket_of(&self, key: NonNull<u8>) -> usize {
        let hash = unsafe { self.hasher.hash(key) };
        (hash % self.buckets.len() as u64) as usize
    }

    unsafe fn locate(&self, key: NonNull<u8>) -> TableIter {
        let bucket = unsafe { self.bucket_of(key) };
        let node = unsafe { self.buckets[bucket].find(key, &*self.cmp) };
        if node.is_end() {
            self.end()
        } else {
            TableIter { bucket, node }
        }
    }

    /// Position of the entry whose key equals `*key`, or end.
    ///
    /// # Safety
    /// `key` must be a live key.
    pub unsafe fn find(&self, key: NonNull<u8>) -> TableIter {
        let _g = self.reentrancy.enter("find");
        unsafe { self.locate(key) }
    }

    /// 0 or 1.
    ///
    /// # Safety
    /// `key` must be a live key.
    pub unsafe fn count(&self, key: NonNull<u8>) -> usize {
        let _g = self.reentrancy.enter("count");
        usize::from(!unsafe { self.locate(key) }.is_end())
    }

    /// Element address of the entry for `*key`.
    ///
    /// # Safety
    /// `key` must be a live key.
    pub unsafe fn at(&self, key: NonNull<u8>) -> Result<NonNull<u8>, OutOfRange> {
        let _g = self.reentrancy.enter("at");
        unsafe { self.locate(key).get() }.ok_or(OutOfRange::MissingKey)
    }

    /// Copy `*element` into the table unless `*key` is already present.
    /// Returns the position of the entry for the key and whether it was
    /// inserted.
    ///
    /// # Safety
    /// `key` must be a live key equal to the key portion of the live
    /// element `element`.
    pub unsafe fn insert_copy(&mut self, key: NonNull<u8>, element: NonNull<u8>) -> (TableIter, bool) {
        let (it, _, inserted) = unsafe {
            self.insert_with(key, "insert_copy", |a, slot| a.construct_copy(slot, element))
        };
        (it, inserted)
    }

    /// Like `insert_copy`, relocating `*element` instead. When the key is
    /// already present nothing is moved and the caller still owns `*element`.
    ///
    /// # Safety
    /// As for `insert_copy`; when inserted, the element slot is raw afterwards.
    pub unsafe fn insert_move(&mut self, key: NonNull<u8>, element: NonNull<u8>) -> (TableIter, bool) {
        let (it, _, inserted) = unsafe {
            self.insert_with(key, "insert_move", |a, slot| a.construct_move(slot, element))
        };
        (it, inserted)
    }

    /// Element address for `*key`, inserting `(key, default)` first when
    /// absent. The new pair is built directly in its bucket node.
    ///
    /// # Safety
    /// `key` must be a live key, and the allocator must wrap a pair type
    /// erased with a pair-default path.
    pub unsafe fn get_or_insert_default(&mut self, key: NonNull<u8>) -> NonNull<u8> {
        let (_, data, _) = unsafe {
            self.insert_with(key, "get_or_insert_default", |a, slot| {
                a.construct_pair_copy_default(slot, key)
            })
        };
        data
    }

    unsafe fn insert_with<F>(
        &mut self,
        key: NonNull<u8>,
        op: &'static str,
        init: F,
    ) -> (TableIter, NonNull<u8>, bool)
    where
        F: FnOnce(&dyn ErasedAllocator, NonNull<u8>),
    {
        let _g = self.reentrancy.enter(op);
        let bucket = unsafe { self.bucket_of(key) };
        let found = unsafe { self.buckets[bucket].find(key, &*self.cmp) };
        if let Some(data) = unsafe { found.get() } {
            return (TableIter { bucket, node: found }, data, false);
        }
        let node = unsafe { self.buckets[bucket].push_front_with(&mut *self.alloc, init) };
        self.len += 1;
        let data = unsafe { node.get() }.expect("freshly linked node must hold an element");
        (TableIter { bucket, node }, data, true)
    }

    /// Remove the entry for `*key`; returns whether one existed.
    ///
    /// # Safety
    /// `key` must be a live key.
    pub unsafe fn remove(&mut self, key: NonNull<u8>) -> bool {
        let _g = self.reentrancy.enter("remove");
        let bucket = unsafe { self.bucket_of(key) };
        let removed =
            unsafe { self.buckets[bucket].remove_first(&mut *self.alloc, key, &*self.cmp) };
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn first_from(&self, start: usize) -> TableIter {
        for (bucket, list) in self.buckets.iter().enumerate().skip(start) {
            let node = list.begin();
            if !node.is_end() {
                return TableIter { bucket, node };
            }
        }
        self.end()
    }

    pub fn begin(&self) -> TableIter {
        self.first_from(0)
    }

    pub fn end(&self) -> TableIter {
        TableIter {
            bucket: self.buckets.len(),
            node: ListIter::END,
        }
    }

    /// Next position in traversal order: along the chain, then on to the
    /// next non-empty bucket. End stays end.
    ///
    /// # Safety
    /// `it` must be a live position in this table.
    pub unsafe fn advance(&self, it: TableIter) -> TableIter {
        if it.is_end() {
            return self.end();
        }
        let next = unsafe { it.node.next() };
        if next.is_end() {
            self.first_from(it.bucket + 1)
        } else {
            TableIter {
                bucket: it.bucket,
                node: next,
            }
        }
    }

    /// Element addresses in traversal order.
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            table: self,
            pos: self.begin(),
            remaining: self.len,
        }
    }

    /// Destruct every entry; the bucket array is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        log::trace!(
            "HashTable<{}>: clearing {} entries",
            self.alloc.element_type_name(),
            self.len
        );
        // Detach every chain before running any destructor: a panicking
        // drop leaks the remaining entries but leaves an empty table.
        let detached: Vec<SinglyLinkedList> = self
            .buckets
            .iter_mut()
            .map(|b| mem::replace(b, SinglyLinkedList::new()))
            .collect();
        self.len = 0;
        for mut chain in detached {
            // SAFETY: every node was built through `self.alloc`.
            unsafe { chain.clear(&mut *self.alloc) };
        }
    }
}

impl Clone for HashTable {
    /// Deep copy: same bucket count, each chain copied in order, with
    /// cloned capabilities.
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter("clone");
        let mut alloc = self.alloc.clone_box();
        let mut buckets = empty_buckets(self.buckets.len());
        for (dst, src) in buckets.iter_mut().zip(self.buckets.iter()) {
            unsafe { dst.copy_from(&mut *alloc, src) };
        }
        Self {
            buckets,
            alloc,
            hasher: self.hasher.clone_box(),
            cmp: self.cmp.clone_box(),
            len: self.len,
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl Drop for HashTable {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("element", &self.alloc.element_type_name())
            .field("len", &self.len)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

/// Element addresses of a table in traversal order.
pub struct Entries<'a> {
    table: &'a HashTable,
    pos: TableIter,
    remaining: usize,
}

impl Iterator for Entries<'_> {
    type Item = NonNull<u8>;

    fn next(&mut self) -> Option<NonNull<u8>> {
        // SAFETY: the table is borrowed, so `pos` stays live.
        let data = unsafe { self.pos.get() }?;
        self.pos = unsafe { self.table.advance(self.pos) };
        self.remaining -= 1;
        Some(data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}
