#![cfg(test)]

// Property tests for the map kept inside the crate so they can reach the
// engine's iteration order directly.

use crate::unordered_map::UnorderedMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Subscript(usize, i32),
    Remove(usize),
    Find(usize),
    At(usize),
    Clone,
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=7, proptest::collection::vec("[a-z]{0,4}", 1..=8)).prop_flat_map(|(buckets, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Subscript(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            2 => idx.clone().prop_map(OpI::At),
            1 => Just(OpI::Clone),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (buckets, pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` never overwrites; it reports whether the key was new.
// - `get_or_insert_default` writes are visible to every later read (last write wins).
// - `remove`/`find`/`at`/`count` parity with the model, `count` in {0, 1}.
// - Iteration yields each live entry once, grouped by ascending bucket.
// - Clones are independent of later mutation; `len` parity after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((buckets, pool, ops) in arb_scenario()) {
        let mut sut: UnorderedMap<String, i32> = UnorderedMap::with_buckets(buckets);
        let mut model: HashMap<String, i32> = HashMap::new();
        let mut snapshots: Vec<(UnorderedMap<String, i32>, HashMap<String, i32>)> = Vec::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i].clone();
                    let already = model.contains_key(&k);
                    let (stored, inserted) = sut.insert(k.clone(), v);
                    prop_assert_eq!(inserted, !already);
                    let expected = *model.entry(k).or_insert(v);
                    prop_assert_eq!(*stored, expected);
                }
                OpI::Subscript(i, v) => {
                    let k = &pool[i];
                    *sut.get_or_insert_default(k) = v;
                    model.insert(k.clone(), v);
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.remove(k), model.remove(k).is_some());
                }
                OpI::Find(i) => {
                    let k = &pool[i];
                    let found = sut.find(k).map(|(kk, vv)| (kk.clone(), *vv));
                    prop_assert_eq!(found, model.get(k).map(|v| (k.clone(), *v)));
                    prop_assert_eq!(sut.count(k), usize::from(model.contains_key(k)));
                }
                OpI::At(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.at(k).ok().copied(), model.get(k).copied());
                }
                OpI::Clone => {
                    snapshots.push((sut.clone(), model.clone()));
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.iter().count(), 0);
                }
                OpI::Iterate => {
                    let seen: BTreeMap<String, i32> =
                        sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(seen.len(), sut.len(), "each entry exactly once");
                    let want: BTreeMap<String, i32> =
                        model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(seen, want);
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            let chained: usize = (0..sut.bucket_count()).map(|b| sut.bucket_size(b)).sum();
            prop_assert_eq!(chained, sut.len(), "len equals the sum of chain lengths");
        }

        for (snap, want) in snapshots {
            let got: BTreeMap<String, i32> = snap.iter().map(|(k, v)| (k.clone(), *v)).collect();
            let want: BTreeMap<String, i32> = want.into_iter().collect();
            prop_assert_eq!(got, want, "snapshot unaffected by later mutation");
        }
    }
}

// Property: traversal order is bucket-major; within a bucket the newest key
// comes first. Checked against the engine's own bucket indices.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_traversal_is_bucket_major(keys in proptest::collection::vec(0u16..200, 0..80), buckets in 1usize..9) {
        use crate::hash_table::HashTable;
        use crate::erased_allocator::{DefaultAlloc, TypedAllocator};
        use crate::erased_hash::{EqualTo, PairKeyEq, TypedHasher};
        use core::ptr::NonNull;

        let mut t = HashTable::new(
            buckets,
            Box::new(TypedAllocator::new(DefaultAlloc::<(u16, u32)>::new()).with_copy()),
            Box::new(TypedHasher::<u16, _>::new(std::collections::hash_map::RandomState::new())),
            Box::new(PairKeyEq::<u16, u32, _>::new(EqualTo)),
        );
        let mut order = 0u32;
        for k in &keys {
            let pair = (*k, order);
            let inserted = unsafe { t.insert_copy(NonNull::from(&pair.0).cast(), NonNull::from(&pair).cast()) }.1;
            if inserted {
                order += 1;
            }
        }

        let mut pos = t.begin();
        let mut last: Option<(usize, u32)> = None;
        let mut steps = 0;
        while pos != t.end() {
            let (_, stamp) = unsafe { *pos.get().unwrap().cast::<(u16, u32)>().as_ptr() };
            if let Some((bucket, prev_stamp)) = last {
                prop_assert!(bucket <= pos.bucket());
                if bucket == pos.bucket() {
                    prop_assert!(stamp < prev_stamp, "newest first within a bucket");
                }
            }
            last = Some((pos.bucket(), stamp));
            pos = unsafe { t.advance(pos) };
            steps += 1;
        }
        prop_assert_eq!(steps, t.len());
        prop_assert_eq!(t.len() as u32, order);
    }
}
