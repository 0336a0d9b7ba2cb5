//! `UnorderedMap<K, V, S, E, A>`: typed wrapper over `HashTable`.
//!
//! Entries are stored as `(K, V)` pairs. The hasher sees the bare key; the
//! comparator compares a stored pair's key against a bare probe key.

use crate::erased_allocator::{AllocPolicy, DefaultAlloc, TypedAllocator};
use crate::erased_hash::{EqualTo, KeyEqual, PairKeyEq, TypedHasher};
use crate::error::OutOfRange;
use crate::hash_table::{self, HashTable};
use core::any::type_name;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ptr::NonNull;
use hashbrown::hash_map::DefaultHashBuilder;

/// Bucket count used by `new` and `with_hasher`.
pub const DEFAULT_BUCKET_COUNT: usize = 100;

pub struct UnorderedMap<K, V, S = DefaultHashBuilder, E = EqualTo, A = DefaultAlloc<(K, V)>> {
    table: HashTable,
    _marker: PhantomData<((K, V), fn() -> (S, E, A))>,
}

fn key_addr<K>(key: &K) -> NonNull<u8> {
    NonNull::from(key).cast()
}

unsafe fn pair_ref<'a, K, V>(p: NonNull<u8>) -> &'a (K, V) {
    unsafe { p.cast::<(K, V)>().as_ref() }
}

unsafe fn pair_mut<'a, K, V>(p: NonNull<u8>) -> &'a mut (K, V) {
    unsafe { p.cast::<(K, V)>().as_mut() }
}

impl<K, V> UnorderedMap<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + Default + 'static,
{
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    /// # Panics
    /// If `num_buckets` is zero.
    pub fn with_buckets(num_buckets: usize) -> Self {
        Self::from_parts(
            num_buckets,
            DefaultHashBuilder::default(),
            EqualTo,
            TypedAllocator::new(DefaultAlloc::<(K, V)>::new())
                .with_copy()
                .with_pair_default(),
        )
    }
}

impl<K, V, S> UnorderedMap<K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + Default + 'static,
    S: BuildHasher + Clone + 'static,
{
    pub fn with_hasher(num_buckets: usize, hasher: S) -> Self {
        Self::from_parts(
            num_buckets,
            hasher,
            EqualTo,
            TypedAllocator::new(DefaultAlloc::<(K, V)>::new())
                .with_copy()
                .with_pair_default(),
        )
    }
}

impl<K, V, S, E, A> UnorderedMap<K, V, S, E, A>
where
    K: Hash + 'static,
    V: 'static,
    S: BuildHasher + Clone + 'static,
    E: KeyEqual<K>,
    A: AllocPolicy<Value = (K, V)>,
{
    /// Build from explicit policies. Operations needing a construction path
    /// the allocator lacks panic.
    pub fn from_parts(num_buckets: usize, hasher: S, eq: E, alloc: TypedAllocator<A>) -> Self {
        Self {
            table: HashTable::new(
                num_buckets,
                Box::new(alloc),
                Box::new(TypedHasher::<K, S>::new(hasher)),
                Box::new(PairKeyEq::<K, V, E>::new(eq)),
            ),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.table.bucket_size(bucket)
    }

    /// Insert `(key, value)` unless `key` is present. Returns the value now
    /// stored for `key` and whether the insert happened; on a duplicate the
    /// given pair is dropped and the stored value is untouched.
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        let mut pair = ManuallyDrop::new((key, value));
        let (it, inserted) = unsafe {
            self.table
                .insert_move(key_addr(&pair.0), NonNull::from(&mut *pair).cast())
        };
        if !inserted {
            // Not moved: still ours to drop.
            unsafe { ManuallyDrop::drop(&mut pair) };
        }
        let entry = unsafe { it.get() }.expect("insert yields a live entry");
        (unsafe { &mut pair_mut::<K, V>(entry).1 }, inserted)
    }

    /// Like `insert`, cloning the pair through the allocator's copy path.
    pub fn insert_copy(&mut self, entry: &(K, V)) -> (&mut V, bool) {
        let (it, inserted) = unsafe {
            self.table
                .insert_copy(key_addr(&entry.0), NonNull::from(entry).cast())
        };
        let stored = unsafe { it.get() }.expect("insert yields a live entry");
        (unsafe { &mut pair_mut::<K, V>(stored).1 }, inserted)
    }

    pub fn at(&self, key: &K) -> Result<&V, OutOfRange> {
        let p = unsafe { self.table.at(key_addr(key)) }?;
        Ok(unsafe { &pair_ref::<K, V>(p).1 })
    }

    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, OutOfRange> {
        let p = unsafe { self.table.at(key_addr(key)) }?;
        Ok(unsafe { &mut pair_mut::<K, V>(p).1 })
    }

    /// The value for `key`, inserting a clone of `key` with a default value
    /// first when absent.
    pub fn get_or_insert_default(&mut self, key: &K) -> &mut V {
        assert!(
            self.table.allocator().capabilities().pair_default,
            "({}, {}) was erased without a pair-default path",
            type_name::<K>(),
            type_name::<V>()
        );
        let p = unsafe { self.table.get_or_insert_default(key_addr(key)) };
        unsafe { &mut pair_mut::<K, V>(p).1 }
    }

    pub fn find(&self, key: &K) -> Option<(&K, &V)> {
        let it = unsafe { self.table.find(key_addr(key)) };
        unsafe { it.get() }.map(|p| {
            let (k, v) = unsafe { pair_ref::<K, V>(p) };
            (k, v)
        })
    }

    /// 0 or 1.
    pub fn count(&self, key: &K) -> usize {
        unsafe { self.table.count(key_addr(key)) }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.count(key) == 1
    }

    /// Drop the entry for `key`; returns whether there was one.
    pub fn remove(&mut self, key: &K) -> bool {
        unsafe { self.table.remove(key_addr(key)) }
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Entries in ascending bucket order, newest first within a bucket.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
            _marker: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for UnorderedMap<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + Default + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, E, A> Clone for UnorderedMap<K, V, S, E, A>
where
    K: Clone + 'static,
    V: Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, S, E, A> fmt::Debug for UnorderedMap<K, V, S, E, A>
where
    K: fmt::Debug + 'static,
    V: fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.table.iter().map(|p| {
            let (k, v) = unsafe { pair_ref::<K, V>(p) };
            (k, v)
        });
        f.debug_map().entries(entries).finish()
    }
}

pub struct Iter<'a, K, V> {
    inner: hash_table::Entries<'a>,
    _marker: PhantomData<&'a (K, V)>,
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = unsafe { pair_ref::<K, V>(self.inner.next()?) };
        Some((k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Iter<'a, K, V> {}

pub struct IterMut<'a, K, V> {
    inner: hash_table::Entries<'a>,
    _marker: PhantomData<&'a mut (K, V)>,
}

impl<'a, K: 'a, V: 'a> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // Each entry is yielded once; keys stay shared so hashing is unaffected.
        let (k, v) = unsafe { pair_mut::<K, V>(self.inner.next()?) };
        Some((&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for IterMut<'a, K, V> {}

impl<'a, K, V, S, E, A> IntoIterator for &'a UnorderedMap<K, V, S, E, A>
where
    K: Hash + 'static,
    V: 'static,
    S: BuildHasher + Clone + 'static,
    E: KeyEqual<K>,
    A: AllocPolicy<Value = (K, V)>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: a duplicate insert drops the offered pair and keeps the
    /// stored value.
    #[test]
    fn duplicate_insert_keeps_first_value() {
        let mut m: UnorderedMap<String, String> = UnorderedMap::with_buckets(4);
        let (_, inserted) = m.insert("k".into(), "first".into());
        assert!(inserted);
        let (v, inserted) = m.insert("k".into(), "second".into());
        assert!(!inserted);
        assert_eq!(v, "first");
        assert_eq!(m.len(), 1);
    }

    /// Invariant: get_or_insert_default is a read on hit and a default
    /// insert on miss; the last write wins.
    #[test]
    fn get_or_insert_default_last_write_wins() {
        let mut m: UnorderedMap<i32, i32> = UnorderedMap::new();
        assert_eq!(m.bucket_count(), DEFAULT_BUCKET_COUNT);
        assert_eq!(*m.get_or_insert_default(&3), 0);
        *m.get_or_insert_default(&3) = 7;
        *m.get_or_insert_default(&3) = 8;
        assert_eq!(m.at(&3), Ok(&8));
        assert_eq!(m.count(&3), 1);
    }

    /// Invariant: a map without a pair-default path refuses operator[] rather
    /// than handing out an unbuilt entry.
    #[test]
    #[should_panic(expected = "pair-default")]
    fn get_or_insert_default_requires_capability() {
        let mut m: UnorderedMap<i32, i32> = UnorderedMap::from_parts(
            8,
            DefaultHashBuilder::default(),
            EqualTo,
            TypedAllocator::new(DefaultAlloc::new()),
        );
        m.get_or_insert_default(&1);
    }

    /// Invariant: custom key equality drives both lookup and duplicate detection.
    #[test]
    fn custom_key_equality() {
        #[derive(Clone)]
        struct ModTen;
        impl KeyEqual<u32> for ModTen {
            fn eq(&self, a: &u32, b: &u32) -> bool {
                a % 10 == b % 10
            }
        }
        // One bucket, so equality alone decides.
        let mut m: UnorderedMap<u32, &'static str, _, ModTen> = UnorderedMap::from_parts(
            1,
            DefaultHashBuilder::default(),
            ModTen,
            TypedAllocator::new(DefaultAlloc::<(u32, &str)>::new()).with_copy(),
        );
        assert!(m.insert(1, "one").1);
        assert!(!m.insert(11, "eleven").1);
        assert_eq!(m.find(&21), Some((&1, &"one")));
    }

    /// Invariant: iter_mut writes through to the stored values.
    #[test]
    fn iter_mut_updates_values() {
        let mut m: UnorderedMap<i32, i32> = UnorderedMap::with_buckets(3);
        for k in 0..5 {
            m.insert(k, k);
        }
        for (_, v) in m.iter_mut() {
            *v *= 10;
        }
        let mut got: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
        got.sort();
        assert_eq!(got, vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40)]);
        assert_eq!(m.iter().len(), 5);
    }
}
