//! Hashing and equality capabilities over untyped key addresses.

use core::any::type_name;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Hashes an opaque key address.
pub trait ErasedHasher {
    fn clone_box(&self) -> Box<dyn ErasedHasher>;

    /// # Safety
    /// `key` must point at a live key of the erased key type.
    unsafe fn hash(&self, key: NonNull<u8>) -> u64;
}

/// Equality between a stored element and a probe.
///
/// For maps the element is a `(K, V)` pair and the probe a bare `K`; only
/// the key portion takes part in the comparison.
pub trait ErasedComparator {
    fn clone_box(&self) -> Box<dyn ErasedComparator>;

    /// # Safety
    /// `element` must hold a live element and `probe` a live probe value of
    /// the types the comparator was erased with.
    unsafe fn compare_eq(&self, element: NonNull<u8>, probe: NonNull<u8>) -> bool;
}

/// Key equality policy.
pub trait KeyEqual<K: ?Sized>: Clone + 'static {
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// `==` as a key-equality policy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EqualTo;

impl<K: ?Sized + PartialEq> KeyEqual<K> for EqualTo {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// `ErasedHasher` over a `BuildHasher`.
pub struct TypedHasher<K, S> {
    build: S,
    _key: PhantomData<fn(&K)>,
}

impl<K, S> TypedHasher<K, S> {
    pub fn new(build: S) -> Self {
        Self {
            build,
            _key: PhantomData,
        }
    }
}

impl<K, S: Clone> Clone for TypedHasher<K, S> {
    fn clone(&self) -> Self {
        Self::new(self.build.clone())
    }
}

impl<K, S> fmt::Debug for TypedHasher<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedHasher<{}>", type_name::<K>())
    }
}

impl<K, S> ErasedHasher for TypedHasher<K, S>
where
    K: Hash + 'static,
    S: BuildHasher + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn ErasedHasher> {
        Box::new(self.clone())
    }

    unsafe fn hash(&self, key: NonNull<u8>) -> u64 {
        let key = unsafe { key.cast::<K>().as_ref() };
        self.build.hash_one(key)
    }
}

/// Compares the key of a stored `(K, V)` against a bare `K`.
pub struct PairKeyEq<K, V, E> {
    eq: E,
    _pair: PhantomData<fn(&K, &V)>,
}

impl<K, V, E> PairKeyEq<K, V, E> {
    pub fn new(eq: E) -> Self {
        Self {
            eq,
            _pair: PhantomData,
        }
    }
}

impl<K, V, E: Clone> Clone for PairKeyEq<K, V, E> {
    fn clone(&self) -> Self {
        Self::new(self.eq.clone())
    }
}

impl<K, V, E> fmt::Debug for PairKeyEq<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairKeyEq<{}, {}>", type_name::<K>(), type_name::<V>())
    }
}

impl<K, V, E> ErasedComparator for PairKeyEq<K, V, E>
where
    K: 'static,
    V: 'static,
    E: KeyEqual<K>,
{
    fn clone_box(&self) -> Box<dyn ErasedComparator> {
        Box::new(self.clone())
    }

    unsafe fn compare_eq(&self, element: NonNull<u8>, probe: NonNull<u8>) -> bool {
        let (stored, _) = unsafe { element.cast::<(K, V)>().as_ref() };
        let probe = unsafe { probe.cast::<K>().as_ref() };
        self.eq.eq(stored, probe)
    }
}

/// Compares two whole elements of the same type.
pub struct ValueEq<T, E> {
    eq: E,
    _value: PhantomData<fn(&T)>,
}

impl<T, E> ValueEq<T, E> {
    pub fn new(eq: E) -> Self {
        Self {
            eq,
            _value: PhantomData,
        }
    }
}

impl<T, E: Clone> Clone for ValueEq<T, E> {
    fn clone(&self) -> Self {
        Self::new(self.eq.clone())
    }
}

impl<T, E> fmt::Debug for ValueEq<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueEq<{}>", type_name::<T>())
    }
}

impl<T, E> ErasedComparator for ValueEq<T, E>
where
    T: 'static,
    E: KeyEqual<T>,
{
    fn clone_box(&self) -> Box<dyn ErasedComparator> {
        Box::new(self.clone())
    }

    unsafe fn compare_eq(&self, element: NonNull<u8>, probe: NonNull<u8>) -> bool {
        let (a, b) = unsafe { (element.cast::<T>().as_ref(), probe.cast::<T>().as_ref()) };
        self.eq.eq(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    fn addr<T>(v: &T) -> NonNull<u8> {
        NonNull::from(v).cast()
    }

    /// Invariant: the erased hasher agrees with the wrapped `BuildHasher`,
    /// and its clone hashes identically.
    #[test]
    fn hasher_matches_build_hasher() {
        let build = RandomState::new();
        let h = TypedHasher::<String, _>::new(build.clone());
        let key = String::from("abc");
        let erased = unsafe { h.hash(addr(&key)) };
        assert_eq!(erased, build.hash_one(&key));
        let c = h.clone_box();
        assert_eq!(unsafe { c.hash(addr(&key)) }, erased);
    }

    /// Invariant: pair comparison looks only at the key portion.
    #[test]
    fn pair_key_eq_ignores_value() {
        let cmp = PairKeyEq::<i32, String, EqualTo>::new(EqualTo);
        let stored = (5, String::from("five"));
        assert!(unsafe { cmp.compare_eq(addr(&stored), addr(&5)) });
        assert!(!unsafe { cmp.compare_eq(addr(&stored), addr(&6)) });
    }

    /// Invariant: custom equality policies are honored through the erasure.
    #[test]
    fn custom_key_equal_policy() {
        #[derive(Clone)]
        struct CaseInsensitive;
        impl KeyEqual<String> for CaseInsensitive {
            fn eq(&self, a: &String, b: &String) -> bool {
                a.eq_ignore_ascii_case(b)
            }
        }
        let cmp = ValueEq::<String, _>::new(CaseInsensitive);
        let a = String::from("Key");
        let b = String::from("kEY");
        assert!(unsafe { cmp.compare_eq(addr(&a), addr(&b)) });
        let boxed = cmp.clone_box();
        assert!(unsafe { boxed.compare_eq(addr(&b), addr(&a)) });
    }
}
