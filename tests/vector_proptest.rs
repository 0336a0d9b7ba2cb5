use erased_collections::{grow_capacity, Vector};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(i16),
    Insert(usize, i16),
    InsertSlice(usize, Vec<i16>),
    Erase(usize),
    EraseRange(usize, usize),
    Pop,
    Resize(usize),
    ResizeWith(usize, i16),
    Assign(usize, i16),
    Reserve(usize),
    Clear,
    CloneCheck,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        6 => any::<i16>().prop_map(Op::Push),
        3 => (any::<usize>(), any::<i16>()).prop_map(|(i, v)| Op::Insert(i, v)),
        1 => (any::<usize>(), proptest::collection::vec(any::<i16>(), 0..5))
            .prop_map(|(i, vs)| Op::InsertSlice(i, vs)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => Just(Op::Pop),
        1 => (0usize..40).prop_map(Op::Resize),
        1 => (0usize..40, any::<i16>()).prop_map(|(n, v)| Op::ResizeWith(n, v)),
        1 => (0usize..40, any::<i16>()).prop_map(|(n, v)| Op::Assign(n, v)),
        1 => (0usize..64).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
        1 => Just(Op::CloneCheck),
    ];
    proptest::collection::vec(op, 1..80)
}

// Property: state-machine equivalence against Vec.
// Invariants exercised across random operation sequences:
// - Contents and length match the model after every operation.
// - len <= capacity; capacity never shrinks except through `take`.
// - A push that grows moves capacity to exactly floor(c * 1.4) + 3.
// - Clones equal the original and stay independent.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_vec(ops in arb_ops()) {
        let mut sut: Vector<i16> = Vector::new();
        let mut model: Vec<i16> = Vec::new();

        for op in ops {
            let cap_before = sut.capacity();
            match op {
                Op::Push(v) => {
                    sut.push_back(v);
                    model.push(v);
                    if cap_before == model.len() - 1 {
                        prop_assert_eq!(sut.capacity(), grow_capacity(cap_before));
                    } else {
                        prop_assert_eq!(sut.capacity(), cap_before);
                    }
                }
                Op::Insert(i, v) => {
                    let i = i % (model.len() + 1);
                    let at = sut.insert(i, v);
                    model.insert(i, v);
                    prop_assert_eq!(at, i);
                }
                Op::InsertSlice(i, vs) => {
                    let i = i % (model.len() + 1);
                    let past = sut.insert_slice(i, &vs);
                    prop_assert_eq!(past, i + vs.len());
                    model.splice(i..i, vs.iter().copied());
                }
                Op::Erase(i) => {
                    if !model.is_empty() {
                        let i = i % model.len();
                        prop_assert_eq!(sut.erase(i), i);
                        model.remove(i);
                    }
                }
                Op::EraseRange(a, b) => {
                    let a = a % (model.len() + 1);
                    let b = a + b % (model.len() - a + 1);
                    prop_assert_eq!(sut.erase_range(a..b), a);
                    model.drain(a..b);
                }
                Op::Pop => {
                    if model.pop().is_some() {
                        sut.pop_back();
                    }
                }
                Op::Resize(n) => {
                    sut.resize(n);
                    model.resize(n, 0);
                    prop_assert_eq!(sut.capacity(), cap_before.max(n));
                }
                Op::ResizeWith(n, v) => {
                    sut.resize_with_value(n, &v);
                    model.resize(n, v);
                }
                Op::Assign(n, v) => {
                    sut.assign(n, &v);
                    model.clear();
                    model.resize(n, v);
                    prop_assert_eq!(sut.capacity(), cap_before.max(n));
                }
                Op::Reserve(n) => {
                    sut.reserve(n);
                    prop_assert_eq!(sut.capacity(), cap_before.max(n));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
                Op::CloneCheck => {
                    let mut c = sut.clone();
                    prop_assert_eq!(c.as_slice(), model.as_slice());
                    prop_assert_eq!(c.capacity(), c.len());
                    c.push_back(1);
                    prop_assert_eq!(sut.as_slice(), model.as_slice());
                }
            }
            prop_assert_eq!(sut.as_slice(), model.as_slice());
            prop_assert!(sut.len() <= sut.capacity());
            prop_assert!(sut.capacity() >= cap_before);
        }

        let moved = sut.take();
        prop_assert_eq!((sut.len(), sut.capacity()), (0, 0));
        prop_assert_eq!(moved.as_slice(), model.as_slice());
    }
}
