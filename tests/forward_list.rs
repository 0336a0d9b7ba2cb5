// ForwardList integration suite.
//
// Invariants exercised:
// - push_front puts the newest element first.
// - clear drops every element exactly once and empties the list.
// - Clones are deep and keep order.
use erased_collections::ForwardList;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Dummy {
    drops: Rc<Cell<usize>>,
}

impl Drop for Dummy {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

// Test: emptiness follows push_front.
#[test]
fn empty() {
    let mut li: ForwardList<i32> = ForwardList::new();
    assert!(li.is_empty());
    li.push_front(1);
    assert!(!li.is_empty());
}

// Test: iteration visits every element, newest first.
// Verifies: the sum of 4, 3, 2, 1 pushed in order is 10.
#[test]
fn iterator() {
    let mut li: ForwardList<i32> = ForwardList::new();
    for v in 1..=4 {
        li.push_front(v);
    }
    let sum: i32 = li.iter().sum();
    assert_eq!(sum, 10);
    assert_eq!(li.iter().copied().collect::<Vec<_>>(), [4, 3, 2, 1]);
    let mut total = 0;
    for v in &li {
        total += v;
    }
    assert_eq!(total, 10);
}

// Test: clear drops every element.
// Assumes: push_front moves its argument in.
// Verifies: two drops for two elements, and an exhausted iterator.
#[test]
fn clear() {
    let drops = Rc::new(Cell::new(0));
    let mut ld: ForwardList<Dummy> = ForwardList::new();
    ld.push_front(Dummy { drops: drops.clone() });
    ld.push_front(Dummy { drops: drops.clone() });
    assert_eq!(ld.len(), 2);
    assert_eq!(drops.get(), 0);
    ld.clear();
    assert_eq!(ld.len(), 0);
    assert_eq!(drops.get(), 2);
    assert!(ld.iter().next().is_none());
}

// Test: dropping the list drops its elements.
#[test]
fn drop_releases_elements() {
    let drops = Rc::new(Cell::new(0));
    {
        let mut ld: ForwardList<Dummy> = ForwardList::with_len(0);
        for _ in 0..3 {
            ld.push_front(Dummy { drops: drops.clone() });
        }
    }
    assert_eq!(drops.get(), 3);
}

// Test: clone is deep and keeps order.
#[test]
fn clone_is_independent() {
    let mut a: ForwardList<String> = ForwardList::new();
    a.push_front("b".into());
    a.push_front_copy(&"a".to_string());
    let mut b = a.clone();
    b.pop_front();
    b.front_mut().unwrap().push('!');
    assert_eq!(a.iter().cloned().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(b.iter().cloned().collect::<Vec<_>>(), ["b!"]);
    assert_eq!(format!("{a:?}"), r#"["a", "b"]"#);
}

// Test: with_len default-constructs each element.
#[test]
fn with_len_defaults() {
    let li: ForwardList<u8> = ForwardList::with_len(5);
    assert_eq!(li.len(), 5);
    assert!(li.iter().all(|&v| v == 0));
}
