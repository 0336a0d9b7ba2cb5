//! `ForwardList<T, A>`: typed wrapper over `SinglyLinkedList`.
//!
//! The wrapper owns the allocator capability and lends it to the engine on
//! every node operation.

use crate::erased_allocator::{AllocPolicy, DefaultAlloc, TypedAllocator};
use crate::erased_hash::{EqualTo, ValueEq};
use crate::linked_list::{self, ListIter, SinglyLinkedList};
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ptr::NonNull;

pub struct ForwardList<T, A: AllocPolicy<Value = T> = DefaultAlloc<T>> {
    alloc: TypedAllocator<A>,
    list: SinglyLinkedList,
    _marker: PhantomData<T>,
}

impl<T: Clone + Default + 'static> ForwardList<T> {
    pub fn new() -> Self {
        Self::with_policy(DefaultAlloc::new())
    }

    /// `count` default values.
    pub fn with_len(count: usize) -> Self {
        let mut alloc = TypedAllocator::new(DefaultAlloc::<T>::new())
            .with_default()
            .with_copy();
        let list = unsafe { SinglyLinkedList::with_len(&mut alloc, count) };
        Self {
            alloc,
            list,
            _marker: PhantomData,
        }
    }
}

impl<T, A> ForwardList<T, A>
where
    T: Clone + Default + 'static,
    A: AllocPolicy<Value = T>,
{
    pub fn with_policy(policy: A) -> Self {
        Self::from_allocator(TypedAllocator::new(policy).with_default().with_copy())
    }
}

impl<T: 'static, A: AllocPolicy<Value = T>> ForwardList<T, A> {
    pub fn from_allocator(alloc: TypedAllocator<A>) -> Self {
        Self {
            alloc,
            list: SinglyLinkedList::new(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Walks the list.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn front(&self) -> Option<&T> {
        self.list.front().map(|p| unsafe { p.cast::<T>().as_ref() })
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.list.front().map(|p| unsafe { p.cast::<T>().as_mut() })
    }

    pub fn push_front(&mut self, value: T) {
        let mut value = ManuallyDrop::new(value);
        unsafe {
            self.list
                .push_front_move(&mut self.alloc, NonNull::from(&mut *value).cast())
        };
    }

    pub fn push_front_copy(&mut self, value: &T) {
        unsafe {
            self.list
                .push_front_copy(&mut self.alloc, NonNull::from(value).cast())
        };
    }

    /// # Panics
    /// If the list is empty.
    pub fn pop_front(&mut self) {
        unsafe { self.list.pop_front(&mut self.alloc) }
    }

    /// Drop the element following the one at `index`.
    ///
    /// # Panics
    /// If there is no element at `index + 1`.
    pub fn erase_after(&mut self, index: usize) {
        let mut pos = self.list.begin();
        for _ in 0..index {
            pos = unsafe { pos.next() };
        }
        assert!(
            !pos.is_end(),
            "erase_after position {index} past the end of the list"
        );
        unsafe { self.list.erase_after(&mut self.alloc, pos) };
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let cmp = ValueEq::<T, _>::new(EqualTo);
        let hit: ListIter = unsafe { self.list.find(NonNull::from(value).cast(), &cmp) };
        !hit.is_end()
    }

    pub fn clear(&mut self) {
        unsafe { self.list.clear(&mut self.alloc) }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.list.iter(),
            _marker: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            inner: self.list.iter(),
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + Default + 'static> Default for ForwardList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static, A: AllocPolicy<Value = T>> Clone for ForwardList<T, A> {
    fn clone(&self) -> Self {
        let mut alloc = self.alloc.clone();
        let mut list = SinglyLinkedList::new();
        unsafe { list.copy_from(&mut alloc, &self.list) };
        Self {
            alloc,
            list,
            _marker: PhantomData,
        }
    }
}

impl<T, A: AllocPolicy<Value = T>> Drop for ForwardList<T, A> {
    fn drop(&mut self) {
        unsafe { self.list.clear(&mut self.alloc) }
    }
}

impl<T: fmt::Debug + 'static, A: AllocPolicy<Value = T>> fmt::Debug for ForwardList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T> {
    inner: linked_list::Iter<'a>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: 'a> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|p| unsafe { p.cast::<T>().as_ref() })
    }
}

pub struct IterMut<'a, T> {
    inner: linked_list::Iter<'a>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T: 'a> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        // Each node is yielded once, so the borrows are disjoint.
        self.inner.next().map(|p| unsafe { p.cast::<T>().as_mut() })
    }
}

impl<'a, T: 'static, A: AllocPolicy<Value = T>> IntoIterator for &'a ForwardList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: contains scans with `==` and erase_after unlinks the successor.
    #[test]
    fn contains_and_erase_after() {
        let mut l: ForwardList<i32> = ForwardList::new();
        for v in [4, 3, 2, 1] {
            l.push_front(v);
        }
        assert!(l.contains(&3));
        l.erase_after(1);
        assert!(!l.contains(&3));
        assert_eq!(l.iter().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
    }

    #[test]
    #[should_panic(expected = "past the end")]
    fn erase_after_past_end_panics() {
        let mut l: ForwardList<i32> = ForwardList::new();
        l.push_front(1);
        l.erase_after(3);
    }

    /// Invariant: iter_mut edits in place.
    #[test]
    fn iter_mut_edits() {
        let mut l: ForwardList<i32> = ForwardList::with_len(3);
        for (i, v) in l.iter_mut().enumerate() {
            *v = i as i32 * 2;
        }
        assert_eq!(l.iter().copied().collect::<Vec<_>>(), vec![0, 2, 4]);
        *l.front_mut().unwrap() = 9;
        assert_eq!(l.front(), Some(&9));
    }

    /// Invariant: a move-only list works from an explicit capability.
    #[test]
    fn move_only_from_allocator() {
        let mut l: ForwardList<Box<u8>> =
            ForwardList::from_allocator(TypedAllocator::new(DefaultAlloc::new()));
        l.push_front(Box::new(1));
        l.push_front(Box::new(2));
        l.pop_front();
        assert_eq!(l.len(), 1);
        assert_eq!(**l.front().unwrap(), 1);
    }
}
