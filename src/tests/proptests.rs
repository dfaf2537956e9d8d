use std::collections::{BTreeMap, HashMap, HashSet};

use proptest::prelude::*;

use super::*;

const CAPACITY: usize = 24;

#[derive(Clone, Debug)]
enum Op {
    Add(u16, u32),
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
    Clear,
}

/// Keys drawn from twice the capacity, so containers regularly fill up.
fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u16..(CAPACITY as u16 * 2);
    let op = prop_oneof![
        40 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Add(k, v)),
        15 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.clone().prop_map(Op::Remove),
        14 => key.prop_map(Op::Get),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=400)
}

/// What an insert into a model holding `present`/`len` entries must report.
fn expected_insert(present: bool, len: usize, overwrite: bool) -> InsertResult {
    match (present, overwrite) {
        (true, true) => InsertResult::Overwritten,
        (true, false) => InsertResult::AlreadyExists,
        (false, _) if len == CAPACITY => InsertResult::InsufficientCapacity,
        (false, _) => InsertResult::Success,
    }
}

#[derive(Clone, Debug)]
enum IndexOp {
    Add(u16, u32),
    AddAt(usize, u16, u32),
    Insert(u16, u32),
    Remove(u16),
    RemoveAt(usize),
    SetAt(usize, u16, u32),
}

fn index_ops_strategy() -> impl Strategy<Value = Vec<IndexOp>> {
    let key = 0u16..(CAPACITY as u16 * 2);
    let seed = any::<usize>();
    let op = prop_oneof![
        25 => (key.clone(), any::<u32>()).prop_map(|(k, v)| IndexOp::Add(k, v)),
        20 => (seed.clone(), key.clone(), any::<u32>()).prop_map(|(s, k, v)| IndexOp::AddAt(s, k, v)),
        10 => (key.clone(), any::<u32>()).prop_map(|(k, v)| IndexOp::Insert(k, v)),
        15 => key.clone().prop_map(IndexOp::Remove),
        15 => seed.clone().prop_map(IndexOp::RemoveAt),
        15 => (seed, key, any::<u32>()).prop_map(|(s, k, v)| IndexOp::SetAt(s, k, v)),
    ];
    prop::collection::vec(op, 0..=300)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn hash_map_matches_model(ops in ops_strategy()) {
        let mut buf = dirty_buffer(ArenaHashMap::<u16, u32>::byte_count(CAPACITY));
        let mut map: ArenaHashMap<u16, u32> = ArenaHashMap::new(&mut buf, CAPACITY).unwrap();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Add(k, v) => {
                    let expected = expected_insert(model.contains_key(&k), model.len(), false);
                    prop_assert_eq!(map.try_add(k, v), expected);
                    if expected == InsertResult::Success {
                        model.insert(k, v);
                    }
                }
                Op::Insert(k, v) => {
                    let expected = expected_insert(model.contains_key(&k), model.len(), true);
                    prop_assert_eq!(map.try_insert(k, v), expected);
                    if expected.is_stored() {
                        model.insert(k, v);
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(map.get(&k), model.get(&k));
                }
                Op::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(map.len(), model.len());
            map.assert_consistent();
        }

        let mut got: Vec<(u16, u32)> = map.iter().map(|(&k, &v)| (k, v)).collect();
        let mut expected: Vec<(u16, u32)> = model.into_iter().collect();
        got.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn hash_set_matches_model(ops in ops_strategy()) {
        let mut buf = dirty_buffer(ArenaHashSet::<u16, Collide>::byte_count(CAPACITY));
        let mut set = ArenaHashSet::<u16, Collide>::with_hasher(&mut buf, CAPACITY, Collide).unwrap();
        let mut model: HashSet<u16> = HashSet::new();

        for op in ops {
            match op {
                Op::Add(k, _) | Op::Insert(k, _) => {
                    let expected = expected_insert(model.contains(&k), model.len(), false);
                    prop_assert_eq!(set.try_add(k), expected);
                    if expected == InsertResult::Success {
                        model.insert(k);
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(set.remove(&k), model.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(set.contains(&k), model.contains(&k));
                }
                Op::Clear => {
                    set.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(set.len(), model.len());
            set.assert_consistent();
        }
    }

    #[test]
    fn tree_matches_model(ops in ops_strategy()) {
        let mut buf = dirty_buffer(ArenaTreeMap::<u16, u32>::byte_count(CAPACITY));
        let mut tree: ArenaTreeMap<u16, u32> = ArenaTreeMap::new(&mut buf, CAPACITY).unwrap();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(k, v) => {
                    let expected = expected_insert(model.contains_key(&k), model.len(), false);
                    prop_assert_eq!(tree.try_add(k, v), expected);
                    if expected == InsertResult::Success {
                        model.insert(k, v);
                    }
                }
                Op::Insert(k, v) => {
                    let expected = expected_insert(model.contains_key(&k), model.len(), true);
                    prop_assert_eq!(tree.try_insert(k, v), expected);
                    if expected.is_stored() {
                        model.insert(k, v);
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(tree.remove(&k), model.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(tree.get(&k), model.get(&k));
                }
                Op::Clear => {
                    tree.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(tree.len(), model.len());
            tree.assert_invariants();
            prop_assert_eq!(tree.min(), model.first_key_value());
            prop_assert_eq!(tree.max(), model.last_key_value());
        }

        let got: Vec<(u16, u32)> = tree.iter().map(|(&k, &v)| (k, v)).collect();
        let expected: Vec<(u16, u32)> = model.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn index_map_matches_model(ops in index_ops_strategy()) {
        let mut buf = dirty_buffer(ArenaIndexMap::<u16, u32>::byte_count(CAPACITY));
        let mut map: ArenaIndexMap<u16, u32> = ArenaIndexMap::new(&mut buf, CAPACITY).unwrap();
        let mut model: Vec<(u16, u32)> = Vec::new();

        for op in ops {
            let position_of = |model: &[(u16, u32)], k: u16| model.iter().position(|&(key, _)| key == k);
            match op {
                IndexOp::Add(k, v) => {
                    let expected = expected_insert(position_of(&model, k).is_some(), model.len(), false);
                    prop_assert_eq!(map.try_add(k, v), expected);
                    if expected == InsertResult::Success {
                        model.push((k, v));
                    }
                }
                IndexOp::AddAt(seed, k, v) => {
                    let position = seed % (model.len() + 1);
                    let expected = expected_insert(position_of(&model, k).is_some(), model.len(), false);
                    prop_assert_eq!(map.try_add_at(position, k, v), expected);
                    if expected == InsertResult::Success {
                        model.insert(position, (k, v));
                    }
                }
                IndexOp::Insert(k, v) => {
                    let expected = expected_insert(position_of(&model, k).is_some(), model.len(), true);
                    prop_assert_eq!(map.try_insert(k, v), expected);
                    match position_of(&model, k) {
                        Some(position) => model[position].1 = v,
                        None if expected == InsertResult::Success => model.push((k, v)),
                        None => {}
                    }
                }
                IndexOp::Remove(k) => {
                    let expected = position_of(&model, k).map(|position| model.remove(position).1);
                    prop_assert_eq!(map.remove(&k), expected);
                }
                IndexOp::RemoveAt(seed) => {
                    if !model.is_empty() {
                        let position = seed % model.len();
                        prop_assert_eq!(map.remove_at(position), model.remove(position));
                    }
                }
                IndexOp::SetAt(seed, k, v) => {
                    if !model.is_empty() {
                        let position = seed % model.len();
                        // Skip keys held elsewhere: that is a contract violation.
                        if position_of(&model, k).is_none_or(|at| at == position) {
                            map.set_at(position, k, v);
                            model[position] = (k, v);
                        }
                    }
                }
            }
            prop_assert_eq!(map.len(), model.len());
            map.assert_consistent();
            let got: Vec<(u16, u32)> = map.iter().map(|(&k, &v)| (k, v)).collect();
            prop_assert_eq!(&got, &model);
            for (position, &(k, _)) in model.iter().enumerate() {
                prop_assert_eq!(map.index_of(&k), Some(position));
            }
        }
    }
}
