#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check the
// internal chain/log consistency after every operation.

use crate::hash_table::HashTable;
use hashbrown::HashMap;
use proptest::prelude::*;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn arb_scenario_from(
    pool: impl Strategy<Value = Vec<String>>,
) -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    pool.prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    // Pools large enough to cross several growth boundaries.
    arb_scenario_from(proptest::collection::vec("[a-z]{0,6}", 1..=64))
}

fn arb_colliding_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    // Every single character here has a code congruent to 1 mod 16, so the
    // whole pool lands in bucket 1 while the table is at its initial capacity.
    let colliding = proptest::sample::select(vec!["a", "q", "A", "Q", "1", "!"]);
    arb_scenario_from(proptest::collection::vec(
        colliding.prop_map(str::to_string),
        1..=6,
    ))
}

fn run(pool: Vec<String>, ops: Vec<OpI>) -> Result<(), TestCaseError> {
    let mut sut: HashTable<i32> = HashTable::new();
    let mut model: HashMap<String, i32> = HashMap::new();
    // first-insertion order of live keys
    let mut order: Vec<String> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = &pool[i];
                let prev = sut.insert(k, v).expect("index in range");
                let mprev = model.insert(k.clone(), v);
                prop_assert_eq!(prev, mprev);
                if mprev.is_none() {
                    order.push(k.clone());
                }
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let removed = sut.remove(k).expect("index in range");
                prop_assert_eq!(removed, model.remove(k));
                if removed.is_some() {
                    order.retain(|o| o != k);
                }
                prop_assert!(!sut.contains_key(k).expect("index in range"));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k).expect("index in range"), model.get(k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(&s).expect("index in range");
                prop_assert_eq!(has, model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k).expect("index in range"), model.get_mut(k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Iterate => {
                let keys: Vec<&str> = sut.keys().collect();
                prop_assert_eq!(&keys, &order);
                for (k, v) in sut.entries() {
                    prop_assert_eq!(Some(v), model.get(k));
                }
                let values: Vec<i32> = sut.values().copied().collect();
                let expected: Vec<i32> = order.iter().map(|k| model[k]).collect();
                prop_assert_eq!(values, expected);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                order.clear();
                prop_assert_eq!(sut.capacity(), crate::DEFAULT_CAPACITY);
            }
        }

        // Post-conditions after each op
        sut.assert_consistent();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.keys().len(), order.len());
    }
    Ok(())
}

// Property: State-machine equivalence against hashbrown::HashMap plus an
// explicit order model.
// Invariants exercised across random operation sequences:
// - insert returns the displaced value exactly when the model had one.
// - remove returns the model's value and the key becomes absent.
// - get/contains_key parity with the model.
// - keys() equals first-insertion order; overwrites keep position,
//   remove-then-insert moves to the end.
// - Links, log entries and len agree; every link sits in its hash bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(pool, ops)?;
    }
}

// Property: same state machine with every key colliding at the initial
// capacity, stressing chain head/middle/tail splices.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_colliding_scenario()) {
        run(pool, ops)?;
    }
}
