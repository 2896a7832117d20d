//! Tests for union_find module

use surveylines::UnionFind;

#[test]
fn test_basic_operations() {
    let mut uf: UnionFind<usize> = UnionFind::new();

    uf.make_set(1);
    uf.make_set(2);
    uf.make_set(3);

    assert!(!uf.connected(&1, &2));

    uf.union(&1, &2);
    assert!(uf.connected(&1, &2));
    assert!(!uf.connected(&1, &3));
    assert_eq!(uf.len(), 3);
}

#[test]
fn test_path_compression() {
    let mut uf: UnionFind<usize> = UnionFind::new();

    // Create chain: 4 -> 3 -> 2 -> 1
    for i in 1..=4 {
        uf.make_set(i);
    }
    uf.union(&3, &4);
    uf.union(&2, &3);
    uf.union(&1, &2);

    let root = uf.find(&4);
    assert_eq!(root, 1);
    assert_eq!(uf.find(&2), root);
    assert_eq!(uf.find(&3), root);
}

#[test]
fn test_smallest_element_is_representative() {
    let mut uf: UnionFind<usize> = UnionFind::with_capacity(4);
    for i in [9, 4, 7, 2] {
        uf.make_set(i);
    }
    uf.union(&9, &7);
    uf.union(&7, &4);
    assert_eq!(uf.find(&9), 4);
}

#[test]
fn test_groups_are_sorted() {
    let mut uf: UnionFind<String> = UnionFind::new();

    for id in ["d", "b", "c", "a"] {
        uf.make_set(id.to_string());
    }
    uf.union(&"d".to_string(), &"a".to_string());
    uf.union(&"c".to_string(), &"b".to_string());

    let groups = uf.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["a"], vec!["a".to_string(), "d".to_string()]);
    assert_eq!(groups["b"], vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn test_unknown_items_are_their_own_root() {
    let mut uf: UnionFind<usize> = UnionFind::new();
    assert_eq!(uf.find(&42), 42);
    assert!(uf.is_empty());
}

#[test]
fn test_make_set_is_idempotent() {
    let mut uf: UnionFind<usize> = UnionFind::new();
    uf.make_set(1);
    uf.make_set(2);
    uf.union(&1, &2);
    uf.make_set(2);
    assert!(uf.connected(&1, &2));
}
