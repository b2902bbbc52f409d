use nightwords_core::{diff, DiffError, DiffOp, Diffable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    id: u32,
    label: String,
}

impl Diffable for Item {
    type Key = u32;

    fn key(&self) -> u32 {
        self.id
    }

    fn same_content(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

fn item(id: u32, label: &str) -> Item {
    Item {
        id,
        label: label.to_string(),
    }
}

fn items(ids: &[u32]) -> Vec<Item> {
    ids.iter().map(|&id| item(id, "v")).collect()
}

fn random_sequence(rng: &mut StdRng) -> Vec<Item> {
    let mut ids: Vec<u32> = (0..30).collect();
    ids.shuffle(rng);
    let len = rng.gen_range(0..=ids.len());
    ids.truncate(len);
    ids.into_iter()
        .map(|id| item(id, if rng.gen_bool(0.2) { "changed" } else { "v" }))
        .collect()
}

fn longest_increasing_len(values: &[usize]) -> usize {
    let mut tails: Vec<usize> = Vec::new();
    for &value in values {
        let pile = tails.partition_point(|&top| top < value);
        if pile == tails.len() {
            tails.push(value);
        } else {
            tails[pile] = value;
        }
    }
    tails.len()
}

#[test]
fn applying_ops_reproduces_new_sequence() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for round in 0..300 {
        let old = random_sequence(&mut rng);
        let new = random_sequence(&mut rng);

        let result = diff(&old, &new).unwrap();
        let mut rows = old.clone();
        result.apply(&mut rows, &new);
        assert_eq!(rows, new, "round {round}");
    }
}

#[test]
fn common_keys_are_never_removed_and_reinserted() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..200 {
        let old = random_sequence(&mut rng);
        let new = random_sequence(&mut rng);
        let old_ids: HashSet<u32> = old.iter().map(|row| row.id).collect();
        let new_ids: HashSet<u32> = new.iter().map(|row| row.id).collect();
        let common = old_ids.intersection(&new_ids).count();

        let counts = diff(&old, &new).unwrap().counts();
        assert_eq!(counts.removed, old.len() - common);
        assert_eq!(counts.inserted, new.len() - common);
    }
}

#[test]
fn move_count_is_minimal() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let old = random_sequence(&mut rng);
        let new = random_sequence(&mut rng);

        // Target positions (in new) of surviving rows, in old order.
        let targets: Vec<usize> = old
            .iter()
            .filter_map(|row| new.iter().position(|candidate| candidate.id == row.id))
            .collect();
        let expected = targets.len() - longest_increasing_len(&targets);

        assert_eq!(diff(&old, &new).unwrap().counts().moved, expected);
    }
}

#[test]
fn content_only_change_is_single_update() {
    let old = vec![item(1, "a"), item(2, "b"), item(3, "c")];
    let new = vec![item(1, "a"), item(2, "B"), item(3, "c")];

    let result = diff(&old, &new).unwrap();
    assert_eq!(result.ops(), &[DiffOp::Update { index: 1 }]);
}

#[test]
fn empty_inputs() {
    let empty: Vec<Item> = Vec::new();
    let three = items(&[1, 2, 3]);

    assert!(diff(&empty, &empty).unwrap().is_empty());
    assert!(diff(&three, &three).unwrap().is_empty());

    let inserts = diff(&empty, &three).unwrap();
    assert_eq!(
        inserts.ops(),
        &[
            DiffOp::Insert { index: 0 },
            DiffOp::Insert { index: 1 },
            DiffOp::Insert { index: 2 },
        ]
    );

    let removes = diff(&three, &empty).unwrap();
    assert_eq!(
        removes.ops(),
        &[
            DiffOp::Remove { at: 2 },
            DiffOp::Remove { at: 1 },
            DiffOp::Remove { at: 0 },
        ]
    );
}

#[test]
fn duplicate_keys_are_rejected() {
    let err = diff(&items(&[1, 2, 1]), &items(&[1])).unwrap_err();
    assert!(matches!(err, DiffError::DuplicateKey { index: 2, .. }));

    let err = diff(&items(&[1]), &items(&[4, 4])).unwrap_err();
    assert!(matches!(err, DiffError::DuplicateKey { index: 1, .. }));
}

#[test]
fn diff_is_deterministic() {
    let old = items(&[5, 1, 4, 2, 3]);
    let new = items(&[1, 2, 3, 4, 6]);

    assert_eq!(diff(&old, &new).unwrap(), diff(&old, &new).unwrap());
}
