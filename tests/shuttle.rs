#![cfg(shuttle)]

use shuttle::sync::Arc;
use shuttle::thread;
use shuttle::thread::JoinHandle;

use htab::DefaultKeyEqual;
use htab::HTab;
use htab::SlotIndex;
use htab::TileScratch;
use htab::TileSize;

const ITERATIONS: usize = 1000;
const EMPTY: u32 = 0;

type ArcTable = Arc<HTab<u32, u32>>;
type Outcome = JoinHandle<(SlotIndex, bool)>;

/// Sends every key to slot one so that all inserts contend.
fn collide(_: &u32) -> u64 {
  1
}

/// Spawns the lanes of one two-lane tile inserting `key`.
fn spawn_tile_insert(table: &ArcTable, key: u32, value: u32) -> Vec<Outcome> {
  let scratch: Arc<TileScratch> = Arc::new(TileScratch::new(TileSize::new(2)));

  (0..2)
    .map(|rank| {
      let table: ArcTable = ArcTable::clone(table);
      let scratch: Arc<TileScratch> = Arc::clone(&scratch);

      thread::spawn(move || {
        let tile = scratch.lane(rank);
        let (entry, inserted) =
          table.view().insert_cooperative(&tile, key, value, &collide, &DefaultKeyEqual);
        (entry.index(), inserted)
      })
    })
    .collect()
}

fn join_tile(lanes: Vec<Outcome>) -> (SlotIndex, bool) {
  let outcomes: Vec<(SlotIndex, bool)> = lanes.into_iter().map(|lane| lane.join().unwrap()).collect();

  assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]), "lanes disagree");

  outcomes[0]
}

#[test]
fn test_tile_against_single_lane_same_key() {
  shuttle::check_random(
    || {
      let table: ArcTable = Arc::new(HTab::new(8, EMPTY, EMPTY));

      let tile: Vec<Outcome> = spawn_tile_insert(&table, 3, 30);

      let single: Outcome = {
        let table: ArcTable = ArcTable::clone(&table);
        thread::spawn(move || {
          let (entry, inserted) = table.view().insert(3, 31, &collide, &DefaultKeyEqual);
          (entry.index(), inserted)
        })
      };

      let (tile_index, tile_inserted): (SlotIndex, bool) = join_tile(tile);
      let (single_index, single_inserted): (SlotIndex, bool) = single.join().unwrap();

      assert!(tile_inserted != single_inserted, "exactly one insert should win");
      assert_eq!(tile_index, single_index);

      let value: Option<u32> = table
        .view()
        .find(&3, &collide, &DefaultKeyEqual)
        .map(|entry| entry.value());

      assert_eq!(value, Some(if tile_inserted { 30 } else { 31 }));
    },
    ITERATIONS,
  );
}

#[test]
fn test_two_tiles_distinct_keys() {
  shuttle::check_random(
    || {
      let table: ArcTable = Arc::new(HTab::new(8, EMPTY, EMPTY));

      let tile_a: Vec<Outcome> = spawn_tile_insert(&table, 1, 10);
      let tile_b: Vec<Outcome> = spawn_tile_insert(&table, 2, 20);

      let (index_a, inserted_a): (SlotIndex, bool) = join_tile(tile_a);
      let (index_b, inserted_b): (SlotIndex, bool) = join_tile(tile_b);

      assert!(inserted_a);
      assert!(inserted_b);
      assert_ne!(index_a, index_b);

      for (key, value) in [(1, 10), (2, 20)] {
        let found: Option<u32> = table
          .view()
          .find(&key, &collide, &DefaultKeyEqual)
          .map(|entry| entry.value());

        assert_eq!(found, Some(value));
      }
    },
    ITERATIONS,
  );
}

#[test]
fn test_tile_find_during_insert() {
  shuttle::check_random(
    || {
      let table: ArcTable = Arc::new(HTab::new(8, EMPTY, EMPTY));

      table.view().insert(4, 40, &collide, &DefaultKeyEqual);

      let scratch: Arc<TileScratch> = Arc::new(TileScratch::new(TileSize::new(2)));

      let finders: Vec<JoinHandle<Option<u32>>> = (0..2)
        .map(|rank| {
          let table: ArcTable = ArcTable::clone(&table);
          let scratch: Arc<TileScratch> = Arc::clone(&scratch);

          thread::spawn(move || {
            let tile = scratch.lane(rank);
            table
              .view()
              .find_cooperative(&tile, &4, &collide, &DefaultKeyEqual)
              .map(|entry| entry.value())
          })
        })
        .collect();

      let inserter: JoinHandle<bool> = {
        let table: ArcTable = ArcTable::clone(&table);
        thread::spawn(move || table.view().insert(5, 50, &collide, &DefaultKeyEqual).1)
      };

      for finder in finders {
        assert_eq!(finder.join().unwrap(), Some(40));
      }

      assert!(inserter.join().unwrap());
    },
    ITERATIONS,
  );
}
