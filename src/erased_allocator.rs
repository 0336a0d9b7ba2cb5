//! Allocation capability: the only place that knows the element type.
//!
//! Engines hold a `Box<dyn ErasedAllocator>` and reach every element
//! through it: raw blocks sized in element units, placement construction
//! (default, copy, move), destruction and `element_size()` for offset
//! arithmetic. `TypedAllocator` is the one implementation; it wraps a
//! statically-typed `AllocPolicy` and records which construction paths
//! the element type was erased with.
//!
//! Moves are relocations. `construct_move` ends the lifetime of the
//! source, so callers never `destruct` a moved-from slot.

use core::alloc::Layout;
use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use core::mem::size_of;
use core::ptr::{self, NonNull};
use std::alloc;

/// Statically-typed allocation policy supplied by the caller.
///
/// Only raw storage: no construction is implied by `allocate`.
///
/// # Safety
/// `allocate(n)` must return a block valid for reads and writes of `n`
/// values and aligned for `Self::Value`, which `deallocate(p, n)` on this
/// policy or any of its clones can release. The engines write elements
/// through that block without further checks.
pub unsafe trait AllocPolicy: Clone + 'static {
    type Value: 'static;

    /// Allocate room for `n` values.
    fn allocate(&mut self, n: usize) -> NonNull<Self::Value>;

    /// Release a block obtained from `allocate(n)`.
    ///
    /// # Safety
    /// `p` must come from `allocate(n)` on this policy or a clone of it,
    /// and must not be released twice.
    unsafe fn deallocate(&mut self, p: NonNull<Self::Value>, n: usize);
}

/// Global-allocator policy.
pub struct DefaultAlloc<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultAlloc<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn layout(n: usize) -> Layout {
        Layout::array::<T>(n).expect("capacity overflow")
    }
}

impl<T> Clone for DefaultAlloc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DefaultAlloc<T> {}

impl<T> Default for DefaultAlloc<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DefaultAlloc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultAlloc<{}>", type_name::<T>())
    }
}

// SAFETY: blocks come from the global allocator with `Layout::array::<T>(n)`,
// and zero-sized layouts get a dangling, aligned pointer that is never freed.
unsafe impl<T: 'static> AllocPolicy for DefaultAlloc<T> {
    type Value = T;

    fn allocate(&mut self, n: usize) -> NonNull<T> {
        let layout = Self::layout(n);
        if layout.size() == 0 {
            return NonNull::dangling();
        }
        // SAFETY: layout has non-zero size.
        let p = unsafe { alloc::alloc(layout) };
        NonNull::new(p.cast::<T>()).unwrap_or_else(|| alloc::handle_alloc_error(layout))
    }

    unsafe fn deallocate(&mut self, p: NonNull<T>, n: usize) {
        let layout = Self::layout(n);
        if layout.size() != 0 {
            // SAFETY: caller guarantees `p` came from `allocate(n)`, which used this layout.
            unsafe { alloc::dealloc(p.as_ptr().cast(), layout) }
        }
    }
}

/// Construction paths an erased element type was given.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Capabilities {
    /// `construct` builds a default value (otherwise it is a no-op).
    pub default: bool,
    /// `construct_copy` is available (otherwise it panics).
    pub copy: bool,
    /// `construct_pair_copy_default` is available (otherwise it is a no-op).
    pub pair_default: bool,
}

/// Type-erased allocation and lifecycle capability.
///
/// All addresses are untyped. Every block must be released through the
/// capability instance that allocated it, or a `clone_box` of it.
pub trait ErasedAllocator {
    /// Independent copy carrying its own policy state.
    fn clone_box(&self) -> Box<dyn ErasedAllocator>;

    /// Raw block for `n` elements; nothing is constructed.
    fn allocate(&mut self, n: usize) -> NonNull<u8>;

    /// # Safety
    /// `p` must come from `allocate(n)` on this capability or a clone, and
    /// every element in it must already be destructed or moved out.
    unsafe fn deallocate(&mut self, p: NonNull<u8>, n: usize);

    /// Default-construct in place. A no-op when the element type was
    /// erased without a default path: the slot stays uninitialized.
    ///
    /// # Safety
    /// `p` must be a raw, suitably aligned slot for one element.
    unsafe fn construct(&self, p: NonNull<u8>);

    /// Copy-construct `*src` into `p`.
    ///
    /// # Panics
    /// If the element type was erased without a copy path.
    ///
    /// # Safety
    /// `p` must be a raw slot; `src` must hold a live element.
    unsafe fn construct_copy(&self, p: NonNull<u8>, src: NonNull<u8>);

    /// Relocate `*src` into `p`. The source slot is raw afterwards.
    ///
    /// # Safety
    /// `p` must be a raw slot; `src` must hold a live element and must not
    /// overlap `p`.
    unsafe fn construct_move(&self, p: NonNull<u8>, src: NonNull<u8>);

    /// Build a `(key.clone(), V::default())` pair in place from a bare key.
    /// A no-op unless the capability wraps a pair type erased with
    /// `with_pair_default`.
    ///
    /// # Safety
    /// `pos` must be a raw slot; `key` must point at a live key of the
    /// pair's first type.
    unsafe fn construct_pair_copy_default(&self, pos: NonNull<u8>, key: NonNull<u8>) {
        let _ = (pos, key);
    }

    /// # Safety
    /// `p` must hold a live element; it is raw afterwards.
    unsafe fn destruct(&self, p: NonNull<u8>);

    /// Size in bytes of one element; drives all offset arithmetic.
    fn element_size(&self) -> usize;

    fn capabilities(&self) -> Capabilities;

    /// Name of the concrete element type, for diagnostics.
    fn element_type_name(&self) -> &'static str;
}

type DefaultFn = unsafe fn(NonNull<u8>);
type CopyFn = unsafe fn(NonNull<u8>, NonNull<u8>);

/// The capability wrapping a concrete `AllocPolicy`.
///
/// `new` erases relocation and destruction only; the builder methods add
/// the construction paths whose trait bounds the element type meets.
pub struct TypedAllocator<A: AllocPolicy> {
    policy: A,
    default_fn: Option<DefaultFn>,
    copy_fn: Option<CopyFn>,
    pair_default_fn: Option<CopyFn>,
}

impl<A: AllocPolicy> TypedAllocator<A> {
    pub fn new(policy: A) -> Self {
        Self {
            policy,
            default_fn: None,
            copy_fn: None,
            pair_default_fn: None,
        }
    }

    pub fn policy(&self) -> &A {
        &self.policy
    }

    fn typed(p: NonNull<u8>) -> *mut A::Value {
        p.cast::<A::Value>().as_ptr()
    }
}

impl<A> TypedAllocator<A>
where
    A: AllocPolicy,
    A::Value: Default,
{
    pub fn with_default(mut self) -> Self {
        self.default_fn = Some(default_in_place::<A::Value>);
        self
    }
}

impl<A> TypedAllocator<A>
where
    A: AllocPolicy,
    A::Value: Clone,
{
    pub fn with_copy(mut self) -> Self {
        self.copy_fn = Some(clone_in_place::<A::Value>);
        self
    }
}

impl<K, V, A> TypedAllocator<A>
where
    K: Clone + 'static,
    V: Default + 'static,
    A: AllocPolicy<Value = (K, V)>,
{
    pub fn with_pair_default(mut self) -> Self {
        self.pair_default_fn = Some(pair_from_key::<K, V>);
        self
    }
}

impl<A: AllocPolicy> Clone for TypedAllocator<A> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            default_fn: self.default_fn,
            copy_fn: self.copy_fn,
            pair_default_fn: self.pair_default_fn,
        }
    }
}

impl<A: AllocPolicy> fmt::Debug for TypedAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAllocator")
            .field("element", &type_name::<A::Value>())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl<A: AllocPolicy> ErasedAllocator for TypedAllocator<A> {
    fn clone_box(&self) -> Box<dyn ErasedAllocator> {
        Box::new(self.clone())
    }

    fn allocate(&mut self, n: usize) -> NonNull<u8> {
        self.policy.allocate(n).cast()
    }

    unsafe fn deallocate(&mut self, p: NonNull<u8>, n: usize) {
        unsafe { self.policy.deallocate(p.cast(), n) }
    }

    unsafe fn construct(&self, p: NonNull<u8>) {
        if let Some(f) = self.default_fn {
            unsafe { f(p) }
        }
    }

    unsafe fn construct_copy(&self, p: NonNull<u8>, src: NonNull<u8>) {
        match self.copy_fn {
            Some(f) => unsafe { f(p, src) },
            None => panic!(
                "{} was erased without a copy path",
                type_name::<A::Value>()
            ),
        }
    }

    unsafe fn construct_move(&self, p: NonNull<u8>, src: NonNull<u8>) {
        // SAFETY: caller guarantees a live source and a raw, non-overlapping target.
        unsafe { ptr::copy_nonoverlapping(Self::typed(src), Self::typed(p), 1) }
    }

    unsafe fn construct_pair_copy_default(&self, pos: NonNull<u8>, key: NonNull<u8>) {
        if let Some(f) = self.pair_default_fn {
            unsafe { f(pos, key) }
        }
    }

    unsafe fn destruct(&self, p: NonNull<u8>) {
        unsafe { ptr::drop_in_place(Self::typed(p)) }
    }

    fn element_size(&self) -> usize {
        size_of::<A::Value>()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            default: self.default_fn.is_some(),
            copy: self.copy_fn.is_some(),
            pair_default: self.pair_default_fn.is_some(),
        }
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<A::Value>()
    }
}

unsafe fn default_in_place<T: Default>(p: NonNull<u8>) {
    unsafe { p.cast::<T>().as_ptr().write(T::default()) }
}

unsafe fn clone_in_place<T: Clone>(p: NonNull<u8>, src: NonNull<u8>) {
    let value = unsafe { src.cast::<T>().as_ref() }.clone();
    unsafe { p.cast::<T>().as_ptr().write(value) }
}

unsafe fn pair_from_key<K: Clone, V: Default>(p: NonNull<u8>, key: NonNull<u8>) {
    let key = unsafe { key.cast::<K>().as_ref() }.clone();
    unsafe { p.cast::<(K, V)>().as_ptr().write((key, V::default())) }
}
