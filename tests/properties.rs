//! Property tests: random operation sequences are compared against a
//! `BTreeMap` model, and the structural invariants are re-checked after
//! every sequence (child counts match iterated children, counts stay within
//! encoding capacity, prefixes along any path reconstruct the leaf key).

use std::collections::BTreeMap;

use proptest::prelude::*;

use qart::keys::array_key::ArrayKey;
use qart::keys::{KeyTrait, VectorKey};
use qart::{Art, ArtError, Update};

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, u64),
    Upsert(u16, u64),
    Remove(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Narrow key space so sequences actually collide, split, grow, shrink
    // and path-compress.
    prop_oneof![
        (0..2048u16, any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        (0..2048u16, any::<u64>()).prop_map(|(k, v)| Op::Upsert(k, v)),
        (0..2048u16).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn random_ops_match_btreemap(ops in prop::collection::vec(op_strategy(), 1..500)) {
        let tree = Art::<ArrayKey<16>, u64>::new();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let result = tree.insert(k, v);
                    if model.contains_key(&k) {
                        prop_assert_eq!(result, Err(ArtError::KeyExists));
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(k, v);
                    }
                }
                Op::Upsert(k, v) => {
                    let expected = if model.insert(k, v).is_some() {
                        Update::Replaced
                    } else {
                        Update::Inserted
                    };
                    prop_assert_eq!(tree.upsert(k, v).unwrap(), expected);
                }
                Op::Remove(k) => {
                    let result = tree.remove(k);
                    prop_assert_eq!(result.is_ok(), model.remove(&k).is_some());
                }
            }
        }

        tree.assert_invariants();
        prop_assert_eq!(tree.len(), model.len());

        let mut reader = tree.reader();
        let guard = reader.enter();
        for (k, v) in &model {
            prop_assert_eq!(guard.get(*k), Some(v));
        }
        // Ordered iteration returns exactly the model, ascending.
        let got: Vec<(u64, u64)> = guard.iter().map(|(k, v)| (k.to_be_u64(), *v)).collect();
        let want: Vec<(u64, u64)> = model.iter().map(|(k, v)| (u64::from(*k), *v)).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn bounded_scans_match_btreemap(
        keys in prop::collection::btree_set(0..4096u32, 0..300),
        lo in 0..4096u32,
        width in 0..4096u32,
    ) {
        let tree = Art::<ArrayKey<16>, u32>::new();
        for k in &keys {
            tree.insert(*k, *k).unwrap();
        }
        let hi = lo.saturating_add(width);

        let mut reader = tree.reader();
        let guard = reader.enter();
        let lo_key: ArrayKey<16> = lo.into();
        let hi_key: ArrayKey<16> = hi.into();
        let got: Vec<u32> = guard
            .range(lo_key..hi_key)
            .map(|(_, v)| *v)
            .collect();
        let want: Vec<u32> = keys.iter().copied().filter(|k| lo <= *k && *k < hi).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn signed_codec_preserves_order(a in any::<i64>(), b in any::<i64>()) {
        let ka: ArrayKey<16> = a.into();
        let kb: ArrayKey<16> = b.into();
        prop_assert_eq!(a.cmp(&b), ka.as_slice().cmp(kb.as_slice()));
        prop_assert_eq!(ka.to_i64(), a);
    }

    #[test]
    fn unsigned_codec_preserves_order(a in any::<u64>(), b in any::<u64>()) {
        let ka: ArrayKey<16> = a.into();
        let kb: ArrayKey<16> = b.into();
        prop_assert_eq!(a.cmp(&b), ka.as_slice().cmp(kb.as_slice()));
        prop_assert_eq!(ka.to_be_u64(), a);
    }

    #[test]
    fn string_codec_preserves_order_and_prefix_freedom(
        a in "[a-z]{0,12}",
        b in "[a-z]{0,12}",
    ) {
        let ka = VectorKey::new_from_str(&a);
        let kb = VectorKey::new_from_str(&b);
        prop_assert_eq!(a.cmp(&b), ka.as_slice().cmp(kb.as_slice()));
        if a != b {
            prop_assert!(!ka.as_slice().starts_with(kb.as_slice()));
            prop_assert!(!kb.as_slice().starts_with(ka.as_slice()));
        }
    }

    #[test]
    fn insertion_order_does_not_matter(
        mut keys in prop::collection::vec(any::<u32>(), 1..64),
    ) {
        let forward = Art::<ArrayKey<16>, u32>::new();
        for k in &keys {
            let _ = forward.insert(*k, *k);
        }
        keys.reverse();
        let backward = Art::<ArrayKey<16>, u32>::new();
        for k in &keys {
            let _ = backward.insert(*k, *k);
        }

        let mut fr = forward.reader();
        let mut br = backward.reader();
        let fg = fr.enter();
        let bg = br.enter();
        let f: Vec<u32> = fg.iter().map(|(_, v)| *v).collect();
        let b: Vec<u32> = bg.iter().map(|(_, v)| *v).collect();
        prop_assert_eq!(f, b);
        for k in &keys {
            prop_assert_eq!(fg.get(*k), Some(k));
        }
    }
}
