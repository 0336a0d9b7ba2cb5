//! DynamicArray: the vector engine.
//!
//! One contiguous block plus one owned `ErasedAllocator`. Slots `[0, len)`
//! hold live elements, `[len, capacity)` are raw. Every element operation
//! goes through the allocator capability; the engine itself only knows
//! `element_size` and slot indices.
//!
//! Positions are slot indices. Operations taking untyped source addresses
//! are `unsafe`: the source must hold a live element of the erased type and
//! must not live inside this array unless stated otherwise.

use crate::erased_allocator::ErasedAllocator;
use crate::error::OutOfRange;
use crate::slot_block::SlotBlock;
use core::fmt;
use core::mem;
use core::ptr::NonNull;

/// Additive step of the growth policy; guarantees growth from capacity 0.
pub const GROWTH_STEP: usize = 3;

/// Capacity after one growth step: `floor(capacity * 1.4) + 3`.
#[inline]
pub fn grow_capacity(capacity: usize) -> usize {
    // floor(1.4c) == c + floor(2c / 5), split to keep 2c from overflowing.
    capacity + (capacity / 5) * 2 + (capacity % 5) * 2 / 5 + GROWTH_STEP
}

/// How a raw slot gets its element.
#[derive(Copy, Clone)]
enum Fill {
    Default,
    Copy(NonNull<u8>),
    Move(NonNull<u8>),
}

impl Fill {
    unsafe fn write(self, alloc: &dyn ErasedAllocator, slot: NonNull<u8>) {
        match self {
            Fill::Default => unsafe { alloc.construct(slot) },
            Fill::Copy(src) => unsafe { alloc.construct_copy(slot, src) },
            Fill::Move(src) => unsafe { alloc.construct_move(slot, src) },
        }
    }
}

pub struct DynamicArray {
    alloc: Box<dyn ErasedAllocator>,
    block: SlotBlock,
    len: usize,
}

impl DynamicArray {
    pub fn new(alloc: Box<dyn ErasedAllocator>) -> Self {
        let block = SlotBlock::empty(alloc.element_size());
        Self {
            alloc,
            block,
            len: 0,
        }
    }

    /// `count` default-constructed elements; capacity is exactly `count`.
    ///
    /// # Safety
    /// The element type must have been erased with a default path, or the
    /// slots stay uninitialized while counted as live.
    pub unsafe fn with_len(count: usize, alloc: Box<dyn ErasedAllocator>) -> Self {
        unsafe { Self::filled(count, Fill::Default, alloc) }
    }

    /// `count` copies of `*src`; capacity is exactly `count`.
    ///
    /// # Safety
    /// `src` must hold a live element of the erased type.
    pub unsafe fn with_copies(
        count: usize,
        src: NonNull<u8>,
        alloc: Box<dyn ErasedAllocator>,
    ) -> Self {
        unsafe { Self::filled(count, Fill::Copy(src), alloc) }
    }

    unsafe fn filled(count: usize, fill: Fill, mut alloc: Box<dyn ErasedAllocator>) -> Self {
        let block = SlotBlock::allocate(&mut *alloc, count);
        let mut this = Self {
            alloc,
            block,
            len: 0,
        };
        for i in 0..count {
            unsafe { fill.write(&*this.alloc, this.block.slot(i)) };
            this.len += 1;
        }
        this
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
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.alloc.element_size()
    }

    pub fn allocator(&self) -> &dyn ErasedAllocator {
        &*self.alloc
    }

    /// Start of the block; `None` until something was allocated.
    #[inline]
    pub fn data(&self) -> Option<NonNull<u8>> {
        self.block.base()
    }

    /// Address of the live element at `index`.
    pub fn at(&self, index: usize) -> Result<NonNull<u8>, OutOfRange> {
        if index >= self.len {
            return Err(OutOfRange::Index {
                index,
                len: self.len,
            });
        }
        Ok(self.block.slot(index))
    }

    pub fn back(&self) -> Option<NonNull<u8>> {
        self.len.checked_sub(1).map(|i| self.block.slot(i))
    }

    /// Grow the block to at least `count` slots. Never shrinks.
    pub fn reserve(&mut self, count: usize) {
        if count > self.block.capacity() {
            self.reallocate(count);
        }
    }

    /// Relocate every live element into a fresh block of `capacity` slots.
    fn reallocate(&mut self, capacity: usize) {
        log::trace!(
            "DynamicArray<{}>: reallocating {} -> {} slots",
            self.alloc.element_type_name(),
            self.block.capacity(),
            capacity
        );
        let fresh = SlotBlock::allocate(&mut *self.alloc, capacity);
        for i in 0..self.len {
            // SAFETY: [0, len) is live in the old block; fresh slots are raw.
            unsafe { self.alloc.construct_move(fresh.slot(i), self.block.slot(i)) };
        }
        let old = mem::replace(&mut self.block, fresh);
        // SAFETY: every live element was relocated out of `old`.
        unsafe { old.release(&mut *self.alloc) };
    }

    fn grow_if_full(&mut self) {
        if self.len == self.block.capacity() {
            self.reallocate(grow_capacity(self.block.capacity()));
        }
    }

    /// # Safety
    /// `src` must hold a live element and must not point into this array.
    pub unsafe fn push_back_copy(&mut self, src: NonNull<u8>) {
        unsafe { self.push_back(Fill::Copy(src)) }
    }

    /// The source slot is raw afterwards.
    ///
    /// # Safety
    /// `src` must hold a live element and must not point into this array.
    pub unsafe fn push_back_move(&mut self, src: NonNull<u8>) {
        unsafe { self.push_back(Fill::Move(src)) }
    }

    unsafe fn push_back(&mut self, fill: Fill) {
        self.grow_if_full();
        unsafe { fill.write(&*self.alloc, self.block.slot(self.len)) };
        self.len += 1;
    }

    /// Destruct the last element.
    ///
    /// # Panics
    /// If the array is empty.
    pub fn pop_back(&mut self) {
        assert!(self.len > 0, "pop_back on an empty DynamicArray");
        self.truncate(self.len - 1);
    }

    /// Destruct every element; capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    fn truncate(&mut self, count: usize) {
        let old = self.len;
        if count >= old {
            return;
        }
        // Shorten first: a panicking destructor leaks the rest instead of
        // leaving dropped slots counted as live.
        self.len = count;
        for i in count..old {
            unsafe { self.alloc.destruct(self.block.slot(i)) };
        }
    }

    /// Grow with default-constructed elements or shrink by destructing the
    /// tail. Capacity grows to exactly `count` when needed and never shrinks.
    ///
    /// # Safety
    /// When growing, the element type must have a default path.
    pub unsafe fn resize(&mut self, count: usize) {
        unsafe { self.resize_with(count, Fill::Default) }
    }

    /// Like `resize`, filling new slots with copies of `*src`.
    ///
    /// # Safety
    /// `src` must hold a live element and must not point into this array.
    pub unsafe fn resize_copy(&mut self, count: usize, src: NonNull<u8>) {
        unsafe { self.resize_with(count, Fill::Copy(src)) }
    }

    unsafe fn resize_with(&mut self, count: usize, fill: Fill) {
        self.reserve(count);
        self.truncate(count);
        while self.len < count {
            unsafe { fill.write(&*self.alloc, self.block.slot(self.len)) };
            self.len += 1;
        }
    }

    /// Insert a copy of `*src` before `index`; returns the new element's address.
    ///
    /// # Safety
    /// `src` must hold a live element and must not point into this array.
    pub unsafe fn insert_copy(&mut self, index: usize, src: NonNull<u8>) -> NonNull<u8> {
        unsafe { self.insert_with(index, Fill::Copy(src)) }
    }

    /// # Safety
    /// `src` must hold a live element and must not point into this array.
    /// The source slot is raw afterwards.
    pub unsafe fn insert_move(&mut self, index: usize, src: NonNull<u8>) -> NonNull<u8> {
        unsafe { self.insert_with(index, Fill::Move(src)) }
    }

    unsafe fn insert_with(&mut self, index: usize, fill: Fill) -> NonNull<u8> {
        let len = self.len;
        assert!(index <= len, "insert position {index} past length {len}");

        if len < self.block.capacity() {
            // Shift [index, len) one slot toward the back, last element first.
            // The tail is uncounted until the new element is in place.
            self.len = index;
            for i in (index..len).rev() {
                unsafe {
                    self.alloc
                        .construct_move(self.block.slot(i + 1), self.block.slot(i))
                };
            }
            let slot = self.block.slot(index);
            unsafe { fill.write(&*self.alloc, slot) };
            self.len = len + 1;
            return slot;
        }

        let capacity = grow_capacity(self.block.capacity());
        log::trace!(
            "DynamicArray<{}>: reallocating {} -> {} slots for insert",
            self.alloc.element_type_name(),
            self.block.capacity(),
            capacity
        );
        let fresh = SlotBlock::allocate(&mut *self.alloc, capacity);
        let slot = fresh.slot(index);
        // Build the new element before touching the old block.
        unsafe { fill.write(&*self.alloc, slot) };
        for i in 0..index {
            unsafe { self.alloc.construct_move(fresh.slot(i), self.block.slot(i)) };
        }
        for i in index..len {
            unsafe { self.alloc.construct_move(fresh.slot(i + 1), self.block.slot(i)) };
        }
        let old = mem::replace(&mut self.block, fresh);
        unsafe { old.release(&mut *self.alloc) };
        self.len = len + 1;
        slot
    }

    /// Insert copies of the `count` consecutive elements starting at
    /// `first`, one element at a time. Returns the index just past the last
    /// inserted element.
    ///
    /// # Safety
    /// `first` must address `count` live, consecutive elements of the
    /// erased type outside this array.
    pub unsafe fn insert_range_copy(
        &mut self,
        index: usize,
        first: NonNull<u8>,
        count: usize,
    ) -> usize {
        let stride = self.element_size();
        let mut at = index;
        for k in 0..count {
            unsafe {
                self.insert_copy(at, first.add(k * stride));
            }
            at += 1;
        }
        at
    }

    /// Destruct the element at `index` and close the gap. Returns the index
    /// of the element that now occupies the erased position.
    pub fn erase(&mut self, index: usize) -> usize {
        self.erase_range(index, index + 1)
    }

    /// Destruct `[first, last)` and shift the tail left.
    ///
    /// # Panics
    /// If the range is not within `[0, len)`.
    pub fn erase_range(&mut self, first: usize, last: usize) -> usize {
        let len = self.len;
        assert!(
            first <= last && last <= len,
            "erase range {first}..{last} outside length {len}"
        );
        let removed = last - first;
        if removed == 0 {
            return first;
        }
        self.len = first;
        for i in first..last {
            unsafe { self.alloc.destruct(self.block.slot(i)) };
        }
        for i in last..len {
            unsafe {
                self.alloc
                    .construct_move(self.block.slot(i - removed), self.block.slot(i))
            };
        }
        self.len = len - removed;
        first
    }

    /// Replace the contents with `count` copies of `*src`.
    ///
    /// Within capacity the storage is reused. Otherwise a fresh array is
    /// built first (so `src` is read before anything is destroyed) and then
    /// replaces this one in a single assignment.
    ///
    /// # Safety
    /// `src` must hold a live element; it must not point into this array
    /// when `count <= capacity`.
    pub unsafe fn assign(&mut self, count: usize, src: NonNull<u8>) {
        if count <= self.block.capacity() {
            self.clear();
            for i in 0..count {
                unsafe { self.alloc.construct_copy(self.block.slot(i), src) };
                self.len += 1;
            }
        } else {
            let fresh = unsafe { Self::with_copies(count, src, self.alloc.clone_box()) };
            *self = fresh;
        }
    }

    /// Exchange blocks and lengths; allocators stay where they are.
    ///
    /// # Safety
    /// Each allocator must be able to release the other's block, as with
    /// stateless policies over the same element type.
    ///
    /// # Panics
    /// If the element sizes differ.
    pub unsafe fn swap(&mut self, other: &mut DynamicArray) {
        assert_eq!(
            self.element_size(),
            other.element_size(),
            "swap between arrays of different element sizes"
        );
        mem::swap(&mut self.block, &mut other.block);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Move the contents out, leaving this array empty with capacity 0 and
    /// a clone of its allocator.
    pub fn take(&mut self) -> DynamicArray {
        let fresh = self.alloc.clone_box();
        let alloc = mem::replace(&mut self.alloc, fresh);
        let block = mem::replace(&mut self.block, SlotBlock::empty(alloc.element_size()));
        DynamicArray {
            alloc,
            block,
            len: mem::take(&mut self.len),
        }
    }
}

impl Clone for DynamicArray {
    /// Deep copy with an independent allocator; capacity equals length.
    fn clone(&self) -> Self {
        let mut alloc = self.alloc.clone_box();
        let block = SlotBlock::allocate(&mut *alloc, self.len);
        let mut out = Self {
            alloc,
            block,
            len: 0,
        };
        for i in 0..self.len {
            unsafe {
                out.alloc
                    .construct_copy(out.block.slot(i), self.block.slot(i))
            };
            out.len += 1;
        }
        out
    }

    fn clone_from(&mut self, source: &Self) {
        debug_assert_eq!(self.element_size(), source.element_size());
        self.clear();
        self.reserve(source.len);
        for i in 0..source.len {
            unsafe {
                self.alloc
                    .construct_copy(self.block.slot(i), source.block.slot(i))
            };
            self.len += 1;
        }
    }
}

impl Drop for DynamicArray {
    fn drop(&mut self) {
        self.clear();
        let block = mem::replace(&mut self.block, SlotBlock::empty(0));
        // SAFETY: the block came from this allocator and holds no live elements.
        unsafe { block.release(&mut *self.alloc) };
    }
}

impl fmt::Debug for DynamicArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicArray")
            .field("element", &self.alloc.element_type_name())
            .field("len", &self.len)
            .field("capacity", &self.block.capacity())
            .finish()
    }
}
