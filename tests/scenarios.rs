#![cfg(not(any(loom, shuttle)))]

use std::collections::HashMap;
use std::num::NonZeroUsize;

use htab::ConstParams;
use htab::DefaultKeyEqual;
use htab::HTab;
use htab::IdentityHash;
use htab::SingleLane;
use htab::XxHash64;

#[test]
fn test_sentinel_minus_one() {
  let mut table: HTab<i32, i32> = HTab::new(16, -1, -1);

  table.insert(&[(1, 10)], &IdentityHash, &DefaultKeyEqual);
  table.insert(&[(2, 20)], &IdentityHash, &DefaultKeyEqual);
  table.insert(&[(1, 99)], &IdentityHash, &DefaultKeyEqual);

  assert_eq!(table.size(), 2);
  assert_eq!(
    table.find(&[1, 2, 3], &IdentityHash, &DefaultKeyEqual),
    vec![Some(10), Some(20), None],
  );
  assert_eq!(
    table.contains(&[1, 3], &IdentityHash, &DefaultKeyEqual),
    vec![true, false],
  );
}

#[test]
fn test_fill_to_capacity() {
  let mut table: HTab<u32, u32> = HTab::new(4, 0, 0);

  assert_eq!(table.insert(&[(1, 1), (2, 2), (3, 3), (4, 4)], &IdentityHash, &DefaultKeyEqual), 4);
  assert_eq!(
    table.find(&[1, 2, 3, 4], &IdentityHash, &DefaultKeyEqual),
    vec![Some(1), Some(2), Some(3), Some(4)],
  );

  // The table has no empty slot left; inserting a fifth key is not allowed.
  assert_eq!(table.size(), table.capacity());
}

#[test]
fn test_matches_std_hashmap() {
  let mut table: HTab<u64, u64, ConstParams<4, 2>> = HTab::new(1 << 14, u64::MAX, u64::MAX);
  let mut model: HashMap<u64, u64> = HashMap::new();
  let mut state: u64 = 0x2545_F491_4F6C_DD1D;

  for _ in 0..8 {
    let batch: Vec<(u64, u64)> = (0..500)
      .map(|_| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 6000, state % 1000)
      })
      .collect();

    let mut expected: usize = 0;

    for (key, value) in &batch {
      if !model.contains_key(key) {
        expected += 1;
        model.insert(*key, *value);
      }
    }

    let inserted: usize = table.insert(&batch, &XxHash64::with_seed(1), &DefaultKeyEqual);

    assert_eq!(inserted, expected);
    assert_eq!(table.size(), model.len());
  }

  let keys: Vec<u64> = (0..6000).collect();
  let present: Vec<bool> = table.contains(&keys, &XxHash64::with_seed(1), &DefaultKeyEqual);

  for (key, present) in keys.iter().zip(present) {
    assert_eq!(present, model.contains_key(key), "key {key}");
  }
}

#[test]
fn test_single_lane_and_tiled_agree() {
  let pairs: Vec<(u32, u32)> = (1..=3000).map(|key| (key * 31, key)).collect();
  let keys: Vec<u32> = (1..100_000).step_by(7).collect();

  let mut single: HTab<u32, u32, SingleLane> = HTab::new(8192, 0, 0);
  let mut tiled: HTab<u32, u32, ConstParams<16, 8>> = HTab::new(8192, 0, 0);

  single.insert(&pairs, &XxHash64::new(), &DefaultKeyEqual);
  tiled.insert(&pairs, &XxHash64::new(), &DefaultKeyEqual);

  assert_eq!(
    single.find(&keys, &XxHash64::new(), &DefaultKeyEqual),
    tiled.find(&keys, &XxHash64::new(), &DefaultKeyEqual),
  );
}

#[test]
fn test_table_moves_between_threads() {
  let mut table: HTab<u64, u64> =
    HTab::new(256, u64::MAX, u64::MAX).with_workers(NonZeroUsize::new(2).unwrap());

  table.insert(&[(1, 2)], &XxHash64::new(), &DefaultKeyEqual);

  let table: HTab<u64, u64> = std::thread::spawn(move || {
    table.insert(&[(3, 4)], &XxHash64::new(), &DefaultKeyEqual);
    table
  })
  .join()
  .unwrap();

  assert_eq!(table.size(), 2);
  assert_eq!(table.find(&[1, 3], &XxHash64::new(), &DefaultKeyEqual), vec![Some(2), Some(4)]);
}
