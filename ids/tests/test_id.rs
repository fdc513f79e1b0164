#![allow(missing_docs)] // test only
use atpg_ids::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

define_id! {
    pub struct TestId;
}

#[test]
fn index_round_trip_near_bounds() {
    for index in (0..1024).chain(u32::MAX as usize - 1024..=u32::MAX as usize) {
        assert_eq!(TestId::from_id_index(index).id_index(), index);
    }
    assert!(TestId::try_from_id_index(u32::MAX as usize + 1).is_none());
}

#[test]
#[should_panic]
fn from_out_of_range_index_panics() {
    TestId::from_id_index(u32::MAX as usize + 1);
}

#[test]
fn ordering_follows_index() {
    let mut rng = SmallRng::seed_from_u64(1);
    for _ in 0..1000 {
        let a = rng.gen_range(0..1 << 20);
        let b = rng.gen_range(0..1 << 20);
        assert_eq!(
            TestId::from_id_index(a).cmp(&TestId::from_id_index(b)),
            a.cmp(&b)
        );
    }
}

#[test]
fn debug_names_the_type() {
    assert_eq!(format!("{:?}", TestId::from_id_index(7)), "TestId(7)");
}

#[test]
fn id_vec_push_and_index() {
    let mut vec: IdVec<TestId, &str> = IdVec::default();
    let a = vec.push("a");
    let b = vec.push("b");
    assert_eq!(a.id_index(), 0);
    assert_eq!(b.id_index(), 1);
    assert_eq!(vec[b], "b");
    assert_eq!(vec.next_unused_key().id_index(), 2);

    vec[a] = "c";
    let entries: Vec<_> = vec.iter().map(|(key, value)| (key.id_index(), *value)).collect();
    assert_eq!(entries, [(0, "c"), (1, "b")]);
    assert_eq!(vec.keys().len(), 2);
    assert!(vec.get(TestId::from_id_index(2)).is_none());
}

#[test]
fn id_range_iterates_both_ways() {
    let range = IdRange::<TestId>::from_index_range(3..7);
    let forward: Vec<usize> = range.iter().map(Id::id_index).collect();
    let backward: Vec<usize> = range.iter().rev().map(Id::id_index).collect();
    assert_eq!(forward, [3, 4, 5, 6]);
    assert_eq!(backward, [6, 5, 4, 3]);
    assert!(range.contains(TestId::from_id_index(6)));
    assert!(!range.contains(TestId::from_id_index(7)));
    assert_eq!(range.nth(1), Some(TestId::from_id_index(4)));
    assert_eq!(range.nth(4), None);
}
