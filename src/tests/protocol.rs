use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

use crate::hash::DefaultKeyEqual;
use crate::hash::IdentityHash;
use crate::hash::XxHash64;
use crate::index::SlotIndex;
use crate::params::TileSize;
use crate::public::HTab;
use crate::store::Entry;
use crate::tile::Solo;
use crate::tile::TileScratch;
use crate::view::MapRef;

/// Hashes every key to the same slot.
fn collide(_: &u32) -> u64 {
  3
}

// -----------------------------------------------------------------------------
// Single Lane
// -----------------------------------------------------------------------------

#[test]
fn insert_then_find() {
  let table: HTab<u32, u32> = HTab::new(16, u32::MAX, u32::MAX);
  let view: MapRef<'_, u32, u32> = table.view();

  let (entry, inserted): (Entry<'_, u32, u32>, bool) =
    view.insert(5, 50, &IdentityHash, &DefaultKeyEqual);

  assert!(inserted);
  assert_eq!(entry.key(), 5);
  assert_eq!(entry.value(), 50);
  assert_eq!(entry.index().into_bits(), 5);

  let found: Entry<'_, u32, u32> = view.find(&5, &IdentityHash, &DefaultKeyEqual).unwrap();

  assert_eq!(found, entry);
  assert!(view.contains(&5, &IdentityHash, &DefaultKeyEqual));
  assert!(view.find(&6, &IdentityHash, &DefaultKeyEqual).is_none());
  assert!(!view.contains(&6, &IdentityHash, &DefaultKeyEqual));
}

#[test]
fn duplicate_keeps_first_value() {
  let table: HTab<u32, u32> = HTab::new(16, u32::MAX, u32::MAX);
  let view: MapRef<'_, u32, u32> = table.view();

  let (first, _) = view.insert(9, 1, &IdentityHash, &DefaultKeyEqual);
  let (second, inserted) = view.insert(9, 2, &IdentityHash, &DefaultKeyEqual);

  assert!(!inserted);
  assert_eq!(first, second);
  assert_eq!(second.value(), 1);
}

#[test]
fn collisions_probe_linearly() {
  let table: HTab<u32, u32> = HTab::new(8, 0, 0);
  let view: MapRef<'_, u32, u32> = table.view();

  for key in 1..=4 {
    let (entry, inserted) = view.insert(key, key * 10, &collide, &DefaultKeyEqual);

    assert!(inserted);
    assert_eq!(entry.index().into_bits(), 2 + key as usize);
  }

  for key in 1..=4 {
    let entry: Entry<'_, u32, u32> = view.find(&key, &collide, &DefaultKeyEqual).unwrap();
    assert_eq!(entry.value(), key * 10);
  }

  assert!(view.find(&5, &collide, &DefaultKeyEqual).is_none());
}

#[test]
fn probe_wraps_around() {
  let table: HTab<u32, u32> = HTab::new(4, 0, 0);
  let view: MapRef<'_, u32, u32> = table.view();

  let wrap = |_: &u32| 3_u64;

  let (a, _) = view.insert(1, 1, &wrap, &DefaultKeyEqual);
  let (b, _) = view.insert(2, 2, &wrap, &DefaultKeyEqual);

  assert_eq!(a.index().into_bits(), 3);
  assert_eq!(b.index().into_bits(), 0);
  assert_eq!(view.find(&2, &wrap, &DefaultKeyEqual), Some(b));
}

#[test]
fn custom_equality() {
  let table: HTab<u32, u32> = HTab::new(32, u32::MAX, u32::MAX);
  let view: MapRef<'_, u32, u32> = table.view();

  // Keys compare equal modulo 100.
  let hash = |key: &u32| u64::from(key % 100);
  let equal = |a: &u32, b: &u32| a % 100 == b % 100;

  assert!(view.insert(7, 1, &hash, &equal).1);
  assert!(!view.insert(107, 2, &hash, &equal).1);

  let entry: Entry<'_, u32, u32> = view.find(&207, &hash, &equal).unwrap();

  assert_eq!(entry.key(), 7);
  assert_eq!(entry.value(), 1);
}

#[test]
fn get_by_index() {
  let table: HTab<u64, u64> = HTab::new(64, u64::MAX, u64::MAX);
  let view: MapRef<'_, u64, u64> = table.view();

  let (entry, _) = view.insert(11, 12, &XxHash64::new(), &DefaultKeyEqual);

  assert_eq!(view.get(entry.index()), Some(entry));
  assert_eq!(view.capacity(), 64);
  assert_eq!(view.empty_key_sentinel(), u64::MAX);
  assert_eq!(view.empty_value_sentinel(), u64::MAX);
}

#[test]
fn concurrent_distinct_keys_get_distinct_slots() {
  const THREADS: u32 = 8;
  const PER_THREAD: u32 = 200;

  let table: HTab<u32, u32> = HTab::new(4096, u32::MAX, u32::MAX);
  let view: MapRef<'_, u32, u32> = table.view();
  let barrier: Barrier = Barrier::new(THREADS as usize);

  let indices: Vec<Vec<usize>> = thread::scope(|scope| {
    let handles: Vec<_> = (0..THREADS)
      .map(|thread_id| {
        let barrier: &Barrier = &barrier;

        scope.spawn(move || {
          barrier.wait();

          (0..PER_THREAD)
            .map(|key| {
              let (entry, inserted) =
                view.insert(thread_id * PER_THREAD + key, key, &collide, &DefaultKeyEqual);
              assert!(inserted);
              entry.index().into_bits()
            })
            .collect()
        })
      })
      .collect();

    handles.into_iter().map(|handle| handle.join().unwrap()).collect()
  });

  let unique: HashSet<usize> = indices.into_iter().flatten().collect();

  assert_eq!(unique.len(), (THREADS * PER_THREAD) as usize);
}

#[test]
fn concurrent_same_key_has_one_winner() {
  const THREADS: u32 = 8;

  for round in 0..50 {
    let table: HTab<u32, u32> = HTab::new(16, 0, 0);
    let view: MapRef<'_, u32, u32> = table.view();
    let barrier: Barrier = Barrier::new(THREADS as usize);

    let results: Vec<(usize, bool)> = thread::scope(|scope| {
      let handles: Vec<_> = (1..=THREADS)
        .map(|value| {
          let barrier: &Barrier = &barrier;

          scope.spawn(move || {
            barrier.wait();
            let (entry, inserted) = view.insert(42, value, &IdentityHash, &DefaultKeyEqual);
            (entry.index().into_bits(), inserted)
          })
        })
        .collect();

      handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let winners: usize = results.iter().filter(|(_, inserted)| *inserted).count();
    let slots: HashSet<usize> = results.iter().map(|(index, _)| *index).collect();

    assert_eq!(winners, 1, "round {round}");
    assert_eq!(slots.len(), 1, "round {round}");

    let entry: Entry<'_, u32, u32> = view.find(&42, &IdentityHash, &DefaultKeyEqual).unwrap();

    assert_ne!(entry.value(), 0, "round {round}");
  }
}

// -----------------------------------------------------------------------------
// Cooperative
// -----------------------------------------------------------------------------

#[test]
fn solo_cooperative_matches_single_lane() {
  let table: HTab<u32, u32> = HTab::new(8, 0, 0);
  let view: MapRef<'_, u32, u32> = table.view();

  let (entry, inserted) = view.insert_cooperative(&Solo, 1, 10, &collide, &DefaultKeyEqual);
  assert!(inserted);
  assert_eq!(entry.index().into_bits(), 3);

  let (entry, inserted) = view.insert_cooperative(&Solo, 2, 20, &collide, &DefaultKeyEqual);
  assert!(inserted);
  assert_eq!(entry.index().into_bits(), 4);

  let (entry, inserted) = view.insert_cooperative(&Solo, 1, 30, &collide, &DefaultKeyEqual);
  assert!(!inserted);
  assert_eq!(entry.value(), 10);

  let found: Option<Entry<'_, u32, u32>> =
    view.find_cooperative(&Solo, &2, &collide, &DefaultKeyEqual);

  assert_eq!(found, view.get(SlotIndex::from_bits(4)));
  assert!(view.contains_cooperative(&Solo, &2, &collide, &DefaultKeyEqual));
  assert!(!view.contains_cooperative(&Solo, &3, &collide, &DefaultKeyEqual));
}

#[test]
fn tile_insert_uses_lowest_empty_lane() {
  for lanes in [2, 4, 8] {
    let table: HTab<u32, u32> = HTab::new(32, 0, 0);
    let view: MapRef<'_, u32, u32> = table.view();

    // Slots 3 and 4 are taken by other keys.
    view.insert(100, 1, &collide, &DefaultKeyEqual);
    view.insert(101, 1, &collide, &DefaultKeyEqual);

    let scratch: TileScratch = TileScratch::new(TileSize::new(lanes));

    let results: Vec<(usize, bool)> = thread::scope(|scope| {
      let handles: Vec<_> = (0..scratch.lanes())
        .map(|rank| {
          let scratch: &TileScratch = &scratch;

          scope.spawn(move || {
            let tile = scratch.lane(rank);
            let (entry, inserted) =
              view.insert_cooperative(&tile, 7, 70, &collide, &DefaultKeyEqual);
            (entry.index().into_bits(), inserted)
          })
        })
        .collect();

      handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(results.iter().all(|result| *result == (5, true)), "lanes {lanes}");
    assert_eq!(view.find(&7, &collide, &DefaultKeyEqual).map(|entry| entry.value()), Some(70));
  }
}

#[test]
fn tile_insert_and_lookup_agree_with_single_lane() {
  const KEYS: u32 = 300;

  for lanes in [2_u32, 4, 8, 16] {
    let table: HTab<u32, u32> = HTab::new(1024, u32::MAX, u32::MAX);
    let view: MapRef<'_, u32, u32> = table.view();
    let hash: XxHash64 = XxHash64::with_seed(u64::from(lanes));

    let scratch: TileScratch = TileScratch::new(TileSize::new(lanes as usize));

    thread::scope(|scope| {
      for rank in 0..scratch.lanes() {
        let scratch: &TileScratch = &scratch;
        let hash: &XxHash64 = &hash;

        scope.spawn(move || {
          let tile = scratch.lane(rank);

          for key in 0..KEYS {
            let (entry, inserted) =
              view.insert_cooperative(&tile, key, key + 1, hash, &DefaultKeyEqual);

            assert!(inserted);
            assert_eq!(entry.key(), key);

            let found = view.find_cooperative(&tile, &key, hash, &DefaultKeyEqual);
            assert_eq!(found, Some(entry));
            assert!(!view.contains_cooperative(&tile, &(key + KEYS), hash, &DefaultKeyEqual));
          }
        });
      }
    });

    for key in 0..KEYS {
      let entry: Entry<'_, u32, u32> = view.find(&key, &hash, &DefaultKeyEqual).unwrap();
      assert_eq!(entry.value(), key + 1);
    }
  }
}
