//! SinglyLinkedList: the forward_list engine and the hash-table bucket.
//!
//! Each node owns one element block obtained from `allocate(1)` plus a
//! `next` link. The list does not own an allocator: every operation that
//! builds or frees a node borrows the capability from whoever owns it (the
//! typed `ForwardList`, or the `HashTable` for all of its buckets). That
//! capability must be the same one, or a clone of the one, that built the
//! existing nodes, which is why those operations are `unsafe`.
//!
//! A list must be cleared through its allocator before it is dropped.

use crate::erased_allocator::ErasedAllocator;
use crate::erased_hash::ErasedComparator;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

struct Node {
    next: Option<NonNull<Node>>,
    data: NonNull<u8>,
}

/// A position in a list: a node address, or end.
///
/// Positions carry no borrow. Dereferencing or advancing one whose node has
/// since been erased is undefined; hence `get` and `next` are `unsafe`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ListIter {
    node: Option<NonNull<Node>>,
}

impl ListIter {
    pub const END: ListIter = ListIter { node: None };

    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Element address of the node, `None` at end.
    ///
    /// # Safety
    /// The node must still be linked into a live list.
    #[inline]
    pub unsafe fn get(&self) -> Option<NonNull<u8>> {
        self.node.map(|n| unsafe { n.as_ref() }.data)
    }

    /// The following position; end stays end.
    ///
    /// # Safety
    /// As for `get`.
    #[inline]
    pub unsafe fn next(&self) -> ListIter {
        ListIter {
            node: self.node.and_then(|n| unsafe { n.as_ref() }.next),
        }
    }
}

pub struct SinglyLinkedList {
    head: Option<NonNull<Node>>,
    _nosend: PhantomData<*mut ()>,
}

impl SinglyLinkedList {
    pub const fn new() -> Self {
        Self {
            head: None,
            _nosend: PhantomData,
        }
    }

    /// `count` default-constructed elements.
    ///
    /// # Safety
    /// The element type must have a default path.
    pub unsafe fn with_len(alloc: &mut dyn ErasedAllocator, count: usize) -> Self {
        let mut list = Self::new();
        for _ in 0..count {
            unsafe { list.push_front_default(alloc) };
        }
        list
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Node count; walks the chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[inline]
    pub fn begin(&self) -> ListIter {
        ListIter { node: self.head }
    }

    #[inline]
    pub fn end(&self) -> ListIter {
        ListIter::END
    }

    pub fn front(&self) -> Option<NonNull<u8>> {
        // SAFETY: the head node belongs to this list.
        unsafe { self.begin().get() }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            node: self.head,
            _list: PhantomData,
        }
    }

    /// Allocate an element block, let `init` construct into it, then link
    /// the node at the front.
    ///
    /// # Safety
    /// `alloc` must be the capability the list's nodes come from, and
    /// `init` must leave a live element in the slot it is given.
    pub unsafe fn push_front_with<F>(&mut self, alloc: &mut dyn ErasedAllocator, init: F) -> ListIter
    where
        F: FnOnce(&dyn ErasedAllocator, NonNull<u8>),
    {
        let data = alloc.allocate(1);
        init(&*alloc, data);
        let node = Box::new(Node {
            next: self.head,
            data,
        });
        let node = NonNull::from(Box::leak(node));
        self.head = Some(node);
        ListIter { node: self.head }
    }

    /// # Safety
    /// As for `push_front_with`; `src` must hold a live element.
    pub unsafe fn push_front_copy(
        &mut self,
        alloc: &mut dyn ErasedAllocator,
        src: NonNull<u8>,
    ) -> ListIter {
        unsafe { self.push_front_with(alloc, |a, slot| a.construct_copy(slot, src)) }
    }

    /// The source slot is raw afterwards.
    ///
    /// # Safety
    /// As for `push_front_with`; `src` must hold a live element.
    pub unsafe fn push_front_move(
        &mut self,
        alloc: &mut dyn ErasedAllocator,
        src: NonNull<u8>,
    ) -> ListIter {
        unsafe { self.push_front_with(alloc, |a, slot| a.construct_move(slot, src)) }
    }

    /// # Safety
    /// As for `push_front_with`; the element type must have a default path.
    pub unsafe fn push_front_default(&mut self, alloc: &mut dyn ErasedAllocator) -> ListIter {
        unsafe { self.push_front_with(alloc, |a, slot| a.construct(slot)) }
    }

    /// Destruct and free the head node.
    ///
    /// # Safety
    /// `alloc` must be the capability the list's nodes come from.
    ///
    /// # Panics
    /// If the list is empty.
    pub unsafe fn pop_front(&mut self, alloc: &mut dyn ErasedAllocator) {
        let head = self.head.expect("pop_front on an empty SinglyLinkedList");
        self.head = unsafe { head.as_ref() }.next;
        unsafe { free_node(alloc, head) };
    }

    /// Unlink and free the node after `pos`; returns the position that now
    /// follows `pos`.
    ///
    /// # Safety
    /// `pos` must be a node of this list and `alloc` the capability its
    /// nodes come from.
    ///
    /// # Panics
    /// If `pos` is end or has no successor.
    pub unsafe fn erase_after(&mut self, alloc: &mut dyn ErasedAllocator, pos: ListIter) -> ListIter {
        let prev = unsafe { &mut *pos.node.expect("erase_after at end").as_ptr() };
        let victim = prev.next.expect("erase_after with no successor");
        prev.next = unsafe { victim.as_ref() }.next;
        unsafe { free_node(alloc, victim) };
        ListIter { node: prev.next }
    }

    /// First element equal to `probe` under `cmp`, or end.
    ///
    /// # Safety
    /// `probe` must be a live value of the type `cmp` probes with.
    pub unsafe fn find(&self, probe: NonNull<u8>, cmp: &dyn ErasedComparator) -> ListIter {
        let mut it = self.begin();
        while let Some(node) = it.node {
            let data = unsafe { node.as_ref() }.data;
            if unsafe { cmp.compare_eq(data, probe) } {
                return it;
            }
            it = unsafe { it.next() };
        }
        ListIter::END
    }

    /// Unlink and free the first element equal to `probe`. Returns whether
    /// one was found.
    ///
    /// # Safety
    /// As for `find` and `pop_front`.
    pub unsafe fn remove_first(
        &mut self,
        alloc: &mut dyn ErasedAllocator,
        probe: NonNull<u8>,
        cmp: &dyn ErasedComparator,
    ) -> bool {
        let mut link: *mut Option<NonNull<Node>> = &mut self.head;
        unsafe {
            while let Some(node) = *link {
                if cmp.compare_eq(node.as_ref().data, probe) {
                    *link = node.as_ref().next;
                    free_node(alloc, node);
                    return true;
                }
                link = &mut (*node.as_ptr()).next;
            }
        }
        false
    }

    /// Free every node.
    ///
    /// # Safety
    /// `alloc` must be the capability the list's nodes come from.
    pub unsafe fn clear(&mut self, alloc: &mut dyn ErasedAllocator) {
        let mut cur = self.head.take();
        while let Some(node) = cur {
            cur = unsafe { node.as_ref() }.next;
            unsafe { free_node(alloc, node) };
        }
    }

    /// Replace the contents with copies of `source`'s elements, same order.
    ///
    /// # Safety
    /// `alloc` must be the capability this list's nodes come from and must
    /// be able to copy `source`'s elements.
    pub unsafe fn copy_from(&mut self, alloc: &mut dyn ErasedAllocator, source: &SinglyLinkedList) {
        unsafe { self.clear(alloc) };
        let mut link: *mut Option<NonNull<Node>> = &mut self.head;
        for src in source.iter() {
            let data = alloc.allocate(1);
            unsafe { alloc.construct_copy(data, src) };
            let node = NonNull::from(Box::leak(Box::new(Node { next: None, data })));
            unsafe {
                *link = Some(node);
                link = &mut (*node.as_ptr()).next;
            }
        }
    }
}

unsafe fn free_node(alloc: &mut dyn ErasedAllocator, node: NonNull<Node>) {
    let node = unsafe { Box::from_raw(node.as_ptr()) };
    unsafe {
        alloc.destruct(node.data);
        alloc.deallocate(node.data, 1);
    }
}

impl Default for SinglyLinkedList {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SinglyLinkedList {
    fn drop(&mut self) {
        // Nodes can only be freed through their allocator; the owner clears.
        debug_assert!(
            self.head.is_none() || std::thread::panicking(),
            "SinglyLinkedList dropped with live nodes"
        );
    }
}

impl fmt::Debug for SinglyLinkedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Element addresses, front to back.
pub struct Iter<'a> {
    node: Option<NonNull<Node>>,
    _list: PhantomData<&'a SinglyLinkedList>,
}

impl Iterator for Iter<'_> {
    type Item = NonNull<u8>;

    fn next(&mut self) -> Option<NonNull<u8>> {
        let node = self.node?;
        // SAFETY: the list is borrowed for 'a, so its nodes stay linked.
        let node = unsafe { node.as_ref() };
        self.node = node.next;
        Some(node.data)
    }
}
