use super::*;

fn tree_keys<V: Copy>(tree: &ArenaTreeMap<'_, i32, V>) -> Vec<i32> {
    tree.keys().copied().collect()
}

#[test]
fn ordered_after_mixed_inserts() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, ()>::byte_count(7));
    let mut tree: ArenaTreeMap<i32, ()> = ArenaTreeMap::new(&mut buf, 7).unwrap();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        assert_eq!(tree.try_add(key, ()), InsertResult::Success);
        tree.assert_invariants();
    }

    assert_eq!(tree.min(), Some((&1, &())));
    assert_eq!(tree.max(), Some((&9, &())));
    assert_eq!(tree_keys(&tree), [1, 3, 4, 5, 7, 8, 9]);
    assert_eq!(tree.len(), 7);
}

#[test]
fn ascending_and_descending_runs_stay_balanced() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(200));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 200).unwrap();

    for key in 0..100 {
        assert_eq!(tree.try_add(key, -key), InsertResult::Success);
        tree.assert_invariants();
    }
    for key in (100..200).rev() {
        assert_eq!(tree.try_add(key, -key), InsertResult::Success);
        tree.assert_invariants();
    }
    assert_eq!(tree_keys(&tree), (0..200).collect::<Vec<_>>());
    for key in 0..200 {
        assert_eq!(tree.get(&key), Some(&-key));
    }
}

#[test]
fn remove_every_key_in_scattered_order() {
    const N: i32 = 64;
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(N as usize));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, N as usize).unwrap();
    for key in 0..N {
        let _ = tree.try_add(key, key * 10);
    }

    // 37 is coprime with 64, so this visits every key once.
    let mut remaining: Vec<i32> = (0..N).collect();
    for step in 0..N {
        let key = (step * 37) % N;
        assert_eq!(tree.remove(&key), Some(key * 10));
        assert_eq!(tree.remove(&key), None);
        remaining.retain(|&k| k != key);
        tree.assert_invariants();
        assert_eq!(tree_keys(&tree), remaining);
    }
    assert!(tree.is_empty());
    assert_eq!(tree.min(), None);
}

#[test]
fn remove_root_and_inner_nodes() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, ()>::byte_count(7));
    let mut tree: ArenaTreeMap<i32, ()> = ArenaTreeMap::new(&mut buf, 7).unwrap();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        let _ = tree.try_add(key, ());
    }

    assert_eq!(tree.remove_entry(&5), Some((5, ())));
    tree.assert_invariants();
    assert_eq!(tree.remove(&3), Some(()));
    tree.assert_invariants();
    assert_eq!(tree.remove(&6), None);
    tree.assert_invariants();
    assert_eq!(tree_keys(&tree), [1, 4, 7, 8, 9]);
}

#[test]
fn duplicates_and_overwrites() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, char>::byte_count(4));
    let mut tree: ArenaTreeMap<i32, char> = ArenaTreeMap::new(&mut buf, 4).unwrap();
    let _ = tree.try_add(2, 'b');
    let _ = tree.try_add(1, 'a');

    assert_eq!(tree.try_add(2, 'x'), InsertResult::AlreadyExists);
    assert_eq!(tree.get(&2), Some(&'b'));
    assert_eq!(tree.try_insert(2, 'y'), InsertResult::Overwritten);
    assert_eq!(tree.get(&2), Some(&'y'));
    assert_eq!(tree.len(), 2);
    tree.assert_invariants();
}

#[test]
fn full_pool_leaves_tree_untouched() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(3));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 3).unwrap();
    for key in [10, 20, 30] {
        let _ = tree.try_add(key, key);
    }
    let version = tree.version();

    assert_eq!(tree.try_add(40, 40), InsertResult::InsufficientCapacity);
    assert_eq!(tree.try_insert(5, 5), InsertResult::InsufficientCapacity);
    assert_eq!(tree.try_add(20, 0), InsertResult::AlreadyExists);
    assert_eq!(tree.version(), version);
    assert_eq!(tree_keys(&tree), [10, 20, 30]);

    assert_eq!(tree.try_insert(20, 21), InsertResult::Overwritten);
    assert_eq!(tree.get(&20), Some(&21));
    tree.assert_invariants();
}

#[test]
fn removed_node_is_reused() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(2));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 2).unwrap();
    let _ = tree.try_add(1, 1);
    let _ = tree.try_add(2, 2);

    assert_eq!(tree.remove(&1), Some(1));
    assert_eq!(tree.try_add(3, 3), InsertResult::Success);
    assert_eq!(tree.try_add(4, 4), InsertResult::InsufficientCapacity);
    assert_eq!(tree_keys(&tree), [2, 3]);
    tree.assert_invariants();
}

#[test]
fn get_mut_and_lookup() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, u64>::byte_count(4));
    let mut tree: ArenaTreeMap<i32, u64> = ArenaTreeMap::new(&mut buf, 4).unwrap();
    let _ = tree.try_add(-3, 9);

    *tree.get_mut(&-3).unwrap() += 1;
    assert_eq!(tree.get_key_value(&-3), Some((&-3, &10)));
    assert!(tree.contains_key(&-3));
    assert!(!tree.contains_key(&3));
    assert!(tree.get_mut(&3).is_none());
}

#[test]
fn borrowed_str_keys() {
    let mut buf = dirty_buffer(ArenaTreeMap::<&str, u8>::byte_count(3));
    let mut tree: ArenaTreeMap<&str, u8> = ArenaTreeMap::new(&mut buf, 3).unwrap();
    for (value, key) in ["pear", "apple", "fig"].into_iter().enumerate() {
        let _ = tree.try_add(key, value as u8);
    }

    let probe = String::from("fig");
    assert_eq!(tree.get(probe.as_str()), Some(&2));
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), ["apple", "fig", "pear"]);
    assert_eq!(tree.remove("apple"), Some(1));
}

#[test]
fn clear_returns_every_node() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(5));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 5).unwrap();
    for key in 0..5 {
        let _ = tree.try_add(key, key);
    }

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.iter().len(), 0);
    tree.assert_invariants();
    for key in 5..10 {
        assert_eq!(tree.try_add(key, key), InsertResult::Success);
    }
    tree.assert_invariants();
}

#[test]
fn zero_capacity() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(0));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 0).unwrap();

    assert_eq!(tree.try_add(1, 1), InsertResult::InsufficientCapacity);
    assert_eq!(tree.remove(&1), None);
    assert_eq!(tree.max(), None);
}

#[test]
fn iter_is_exact_size_and_ordered() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(6));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 6).unwrap();
    for key in [4, 2, 6, 1, 3, 5] {
        let _ = tree.try_add(key, key * key);
    }

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 6);
    assert_eq!(iter.next(), Some((&1, &1)));
    assert_eq!(iter.len(), 5);
    assert_eq!(tree.values().copied().collect::<Vec<_>>(), [1, 4, 9, 16, 25, 36]);

    let mut total = 0;
    for (_, value) in &tree {
        total += value;
    }
    assert_eq!(total, 91);
}

#[test]
fn cursor_walks_in_order() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, ()>::byte_count(5));
    let mut tree: ArenaTreeMap<i32, ()> = ArenaTreeMap::new(&mut buf, 5).unwrap();
    for key in [30, 10, 50, 20, 40] {
        let _ = tree.try_add(key, ());
    }

    let mut cursor = tree.cursor();
    assert!(cursor.current(&tree).is_none());
    let mut seen = Vec::new();
    while cursor.move_next(&tree) {
        seen.push(*cursor.current(&tree).unwrap().0);
    }
    assert_eq!(seen, [10, 20, 30, 40, 50]);
    assert!(!cursor.move_next(&tree));
}

#[test]
#[should_panic(expected = "container mutated during enumeration")]
fn cursor_after_remove_panics() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, ()>::byte_count(4));
    let mut tree: ArenaTreeMap<i32, ()> = ArenaTreeMap::new(&mut buf, 4).unwrap();
    for key in 0..4 {
        let _ = tree.try_add(key, ());
    }

    let mut cursor = tree.cursor();
    assert!(cursor.move_next(&tree));
    tree.remove(&2);
    cursor.move_next(&tree);
}

#[test]
fn cursor_survives_lookups() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, i32>::byte_count(3));
    let mut tree: ArenaTreeMap<i32, i32> = ArenaTreeMap::new(&mut buf, 3).unwrap();
    for key in 0..3 {
        let _ = tree.try_add(key, key);
    }

    let mut cursor = tree.cursor();
    assert!(cursor.move_next(&tree));
    let _ = tree.get(&2);
    *tree.get_mut(&1).unwrap() = 7;
    assert!(cursor.move_next(&tree));
    assert_eq!(cursor.current(&tree), Some((&1, &7)));
}

#[test]
fn debug_lists_in_key_order() {
    let mut buf = dirty_buffer(ArenaTreeMap::<i32, bool>::byte_count(2));
    let mut tree: ArenaTreeMap<i32, bool> = ArenaTreeMap::new(&mut buf, 2).unwrap();
    let _ = tree.try_add(2, false);
    let _ = tree.try_add(1, true);
    assert_eq!(format!("{tree:?}"), "{1: true, 2: false}");
}

#[test]
#[should_panic(expected = "cursor used with a container other than the one that created it")]
fn cursor_rejects_another_tree_at_the_same_version() {
    let mut buf_a = dirty_buffer(ArenaTreeMap::<u32, u32>::byte_count(4));
    let mut buf_b = dirty_buffer(ArenaTreeMap::<u32, u32>::byte_count(4));
    let mut a: ArenaTreeMap<u32, u32> = ArenaTreeMap::new(&mut buf_a, 4).unwrap();
    let mut b: ArenaTreeMap<u32, u32> = ArenaTreeMap::new(&mut buf_b, 4).unwrap();
    for key in 0..3 {
        let _ = a.try_add(key, key);
    }
    let _ = b.try_add(5, 0);
    let _ = b.try_insert(5, 1);
    let _ = b.try_insert(5, 2);
    assert_eq!(a.version(), b.version());

    let mut cursor = a.cursor();
    for _ in 0..3 {
        assert!(cursor.move_next(&a));
    }
    let _ = cursor.current(&b);
}

#[test]
#[should_panic(expected = "link 2 names a slot this pool never handed out")]
fn cursor_over_a_rebuilt_tree_reads_no_unwritten_node() {
    let mut buf = dirty_buffer(ArenaTreeMap::<u32, u32>::byte_count(4));
    let cursor = {
        let mut a: ArenaTreeMap<u32, u32> = ArenaTreeMap::new(&mut buf, 4).unwrap();
        for key in 0..3 {
            let _ = a.try_add(key, key);
        }
        let mut cursor = a.cursor();
        for _ in 0..3 {
            assert!(cursor.move_next(&a));
        }
        cursor
    };

    // Same arena, same version, only slot 0 written.
    let mut b: ArenaTreeMap<u32, u32> = ArenaTreeMap::new(&mut buf, 4).unwrap();
    let _ = b.try_add(5, 0);
    let _ = b.try_insert(5, 1);
    let _ = b.try_insert(5, 2);
    assert_eq!(cursor.version(), b.version());
    let _ = cursor.current(&b);
}
