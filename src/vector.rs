//! `Vector<T, A>`: typed wrapper over `DynamicArray`.
//!
//! Every call forwards the address of a `T` (or a temporary holding one) to
//! the erased engine and casts the addresses it hands back. Values passed
//! by value are moved in; values passed by reference are copied through
//! the allocator's copy path.

use crate::dynamic_array::DynamicArray;
use crate::erased_allocator::{AllocPolicy, DefaultAlloc, ErasedAllocator, TypedAllocator};
use crate::error::OutOfRange;
use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::{Index, IndexMut, Range};
use core::ptr::NonNull;
use core::slice;

pub struct Vector<T, A = DefaultAlloc<T>> {
    raw: DynamicArray,
    _marker: PhantomData<(T, fn() -> A)>,
}

fn addr<T>(value: &T) -> NonNull<u8> {
    NonNull::from(value).cast()
}

impl<T: Clone + Default + 'static> Vector<T> {
    pub fn new() -> Self {
        Self::with_policy(DefaultAlloc::new())
    }

    /// `count` default values; capacity is exactly `count`.
    pub fn with_len(count: usize) -> Self {
        Self::from_raw(unsafe { DynamicArray::with_len(count, Self::erase_policy(DefaultAlloc::new())) })
    }

    /// `count` clones of `value`; capacity is exactly `count`.
    pub fn from_elem(count: usize, value: &T) -> Self {
        Self::from_raw(unsafe {
            DynamicArray::with_copies(count, addr(value), Self::erase_policy(DefaultAlloc::new()))
        })
    }
}

impl<T, A> Vector<T, A>
where
    T: Clone + Default + 'static,
    A: AllocPolicy<Value = T>,
{
    pub fn with_policy(policy: A) -> Self {
        Self::from_raw(DynamicArray::new(Self::erase_policy(policy)))
    }

    fn erase_policy(policy: A) -> Box<dyn ErasedAllocator> {
        Box::new(TypedAllocator::new(policy).with_default().with_copy())
    }
}

impl<T: 'static, A: AllocPolicy<Value = T>> Vector<T, A> {
    /// Build over an explicit capability. Operations needing a construction
    /// path the capability lacks panic.
    pub fn from_allocator(alloc: TypedAllocator<A>) -> Self {
        Self::from_raw(DynamicArray::new(Box::new(alloc)))
    }

    fn from_raw(raw: DynamicArray) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    fn require_default(&self) {
        assert!(
            self.raw.allocator().capabilities().default,
            "{} was erased without a default path",
            type_name::<T>()
        );
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    fn data(&self) -> NonNull<T> {
        self.raw.data().map_or(NonNull::dangling(), NonNull::cast)
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [0, len) are live, aligned `T`s in one block.
        unsafe { slice::from_raw_parts(self.data().as_ptr(), self.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data().as_ptr(), self.len()) }
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub fn at(&self, index: usize) -> Result<&T, OutOfRange> {
        self.raw.at(index).map(|p| unsafe { p.cast::<T>().as_ref() })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRange> {
        self.raw.at(index).map(|p| unsafe { p.cast::<T>().as_mut() })
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn back(&self) -> Option<&T> {
        self.raw.back().map(|p| unsafe { p.cast::<T>().as_ref() })
    }

    pub fn push_back(&mut self, value: T) {
        let mut value = ManuallyDrop::new(value);
        unsafe { self.raw.push_back_move(NonNull::from(&mut *value).cast()) }
    }

    pub fn push_back_copy(&mut self, value: &T) {
        unsafe { self.raw.push_back_copy(addr(value)) }
    }

    /// Build the value with `make`, move it to the back and return it.
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        self.push_back(make());
        let last = self.raw.back().expect("push_back leaves a last element");
        unsafe { last.cast::<T>().as_mut() }
    }

    /// Build the value with `make` and move it in before `index`; returns
    /// the new element.
    pub fn emplace<F: FnOnce() -> T>(&mut self, index: usize, make: F) -> &mut T {
        let mut value = ManuallyDrop::new(make());
        let slot = unsafe { self.raw.insert_move(index, NonNull::from(&mut *value).cast()) };
        unsafe { slot.cast::<T>().as_mut() }
    }

    /// Insert before `index`; returns `index`.
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        let mut value = ManuallyDrop::new(value);
        unsafe { self.raw.insert_move(index, NonNull::from(&mut *value).cast()) };
        index
    }

    pub fn insert_copy(&mut self, index: usize, value: &T) -> usize {
        unsafe { self.raw.insert_copy(index, addr(value)) };
        index
    }

    /// Insert clones of `values` before `index`, one element at a time.
    /// Returns the index just past the last inserted element.
    pub fn insert_slice(&mut self, index: usize, values: &[T]) -> usize {
        let first = NonNull::from(values).cast::<u8>();
        unsafe { self.raw.insert_range_copy(index, first, values.len()) }
    }

    /// Drop the element at `index`; returns the index now holding its successor.
    pub fn erase(&mut self, index: usize) -> usize {
        self.raw.erase(index)
    }

    pub fn erase_range(&mut self, range: Range<usize>) -> usize {
        self.raw.erase_range(range.start, range.end)
    }

    /// # Panics
    /// If the vector is empty.
    pub fn pop_back(&mut self) {
        self.raw.pop_back();
    }

    /// Grow with default values or truncate.
    pub fn resize(&mut self, count: usize) {
        if count > self.len() {
            self.require_default();
        }
        unsafe { self.raw.resize(count) }
    }

    /// Grow with clones of `value` or truncate.
    pub fn resize_with_value(&mut self, count: usize, value: &T) {
        unsafe { self.raw.resize_copy(count, addr(value)) }
    }

    pub fn reserve(&mut self, count: usize) {
        self.raw.reserve(count);
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Replace the contents with `count` clones of `value`.
    pub fn assign(&mut self, count: usize, value: &T) {
        unsafe { self.raw.assign(count, addr(value)) }
    }

    /// Replace the contents with clones of `values`.
    pub fn assign_slice(&mut self, values: &[T]) {
        self.clear();
        self.insert_slice(0, values);
    }

    /// Exchange contents; each allocator travels with its block.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.raw, &mut other.raw);
    }

    /// Move the contents out, leaving this vector empty with capacity 0.
    pub fn take(&mut self) -> Self {
        Self::from_raw(self.raw.take())
    }
}

impl<T: Clone + Default + 'static> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static, A: AllocPolicy<Value = T>> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.raw.clone_from(&source.raw);
    }
}

impl<T: PartialEq + 'static, A: AllocPolicy<Value = T>> PartialEq for Vector<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug + 'static, A: AllocPolicy<Value = T>> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: 'static, A: AllocPolicy<Value = T>> Index<usize> for Vector<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: 'static, A: AllocPolicy<Value = T>> IndexMut<usize> for Vector<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: 'static, A: AllocPolicy<Value = T>> Extend<T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T: Clone + Default + 'static> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<'a, T: 'static, A: AllocPolicy<Value = T>> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: move-only element types grow through relocation alone.
    #[test]
    fn move_only_elements_survive_growth() {
        struct MoveOnly(Box<i32>);
        let mut v: Vector<MoveOnly> =
            Vector::from_allocator(TypedAllocator::new(DefaultAlloc::new()));
        for i in 0..20 {
            v.push_back(MoveOnly(Box::new(i)));
        }
        v.insert(0, MoveOnly(Box::new(-1)));
        v.erase(5);
        let got: Vec<i32> = v.iter().map(|m| *m.0).collect();
        let mut want: Vec<i32> = (-1..20).collect();
        want.remove(5);
        assert_eq!(got, want);
    }

    /// Invariant: growing without a default path fails loudly instead of
    /// exposing uninitialized slots.
    #[test]
    #[should_panic(expected = "without a default path")]
    fn resize_without_default_panics() {
        let mut v: Vector<String> =
            Vector::from_allocator(TypedAllocator::new(DefaultAlloc::<String>::new()).with_copy());
        v.resize(3);
    }

    /// Invariant: shrinking never needs a default path.
    #[test]
    fn shrink_without_default_is_fine() {
        let mut v: Vector<String> =
            Vector::from_allocator(TypedAllocator::new(DefaultAlloc::<String>::new()).with_copy());
        v.resize_with_value(3, &"x".to_string());
        v.resize(1);
        assert_eq!(v.as_slice(), ["x".to_string()]);
    }

    /// Invariant: an empty vector exposes an empty slice without allocating.
    #[test]
    fn empty_slices() {
        let mut v: Vector<u64> = Vector::new();
        assert!(v.as_slice().is_empty());
        assert!(v.as_mut_slice().is_empty());
        assert_eq!(v.capacity(), 0);
        assert!(v.front().is_none() && v.back().is_none());
    }

    /// Invariant: emplace_back returns the element it placed.
    #[test]
    fn emplace_back_returns_new_element() {
        let mut v: Vector<String> = Vector::new();
        v.emplace_back(|| "a".into()).push('b');
        assert_eq!(v[0], "ab");
    }
}
