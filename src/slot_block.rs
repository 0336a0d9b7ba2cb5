//! Length-checked view of one raw allocation as `capacity` fixed-size slots.

use crate::erased_allocator::ErasedAllocator;
use core::ptr::NonNull;

/// One block from an `ErasedAllocator`, addressed by slot index.
///
/// Slot addresses are `base + index * stride`; an index at or past
/// `capacity` panics instead of producing an out-of-block address. The
/// block does not track which slots are live; its owner does.
#[derive(Debug)]
pub(crate) struct SlotBlock {
    base: NonNull<u8>,
    capacity: usize,
    stride: usize,
}

impl SlotBlock {
    /// The zero-capacity block; nothing was allocated for it.
    pub(crate) fn empty(stride: usize) -> Self {
        Self {
            base: NonNull::dangling(),
            capacity: 0,
            stride,
        }
    }

    pub(crate) fn allocate(alloc: &mut dyn ErasedAllocator, capacity: usize) -> Self {
        let stride = alloc.element_size();
        if capacity == 0 {
            return Self::empty(stride);
        }
        Self {
            base: alloc.allocate(capacity),
            capacity,
            stride,
        }
    }

    /// Hand the block back to the allocator.
    ///
    /// # Safety
    /// `alloc` must be the capability (or a clone of it) that allocated the
    /// block, and no slot may still hold a live element.
    pub(crate) unsafe fn release(self, alloc: &mut dyn ErasedAllocator) {
        if self.capacity != 0 {
            unsafe { alloc.deallocate(self.base, self.capacity) }
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Base address, or `None` when nothing was allocated.
    #[inline]
    pub(crate) fn base(&self) -> Option<NonNull<u8>> {
        (self.capacity != 0).then_some(self.base)
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> NonNull<u8> {
        assert!(
            index < self.capacity,
            "slot {index} outside block of {} slots",
            self.capacity
        );
        // SAFETY: index < capacity, so the offset stays inside the allocation.
        unsafe { self.base.add(index * self.stride) }
    }
}
