//! Kernels behind the bulk operations of [`HTab`].
//!
//! [`HTab`]: crate::public::HTab

use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::insert;
use crate::launch::Kernel;
use crate::launch::Scatter;
use crate::lookup;
use crate::store::SlotStore;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering::Relaxed;
use crate::tile::Tile;
use crate::word::Word;

// -----------------------------------------------------------------------------
// Insert
// -----------------------------------------------------------------------------

/// Inserts `pairs[i]` and counts every newly created slot.
pub(crate) struct InsertKernel<'a, K, V, H, E>
where
  K: Word,
  V: Word,
  H: ?Sized,
  E: ?Sized,
{
  pub(crate) store: &'a SlotStore<K, V>,
  pub(crate) pairs: &'a [(K, V)],
  pub(crate) hash: &'a H,
  pub(crate) equal: &'a E,
  pub(crate) successes: &'a AtomicUsize,
}

impl<K, V, H, E> Kernel for InsertKernel<'_, K, V, H, E>
where
  K: Word,
  V: Word,
  H: KeyHash<K> + Sync + ?Sized,
  E: KeyEqual<K> + Sync + ?Sized,
{
  fn run<T>(&self, tile: &T, index: usize)
  where
    T: Tile,
  {
    let (key, value): (K, V) = self.pairs[index];

    let inserted: bool = if tile.size() == 1 {
      insert::insert(self.store, key, value, self.hash, self.equal).1
    } else {
      insert::insert_cooperative(tile, self.store, key, value, self.hash, self.equal).1
    };

    if inserted && tile.rank() == 0 {
      self.successes.fetch_add(1, Relaxed);
    }
  }
}

// -----------------------------------------------------------------------------
// Find
// -----------------------------------------------------------------------------

/// Writes the value of `keys[i]`, or `None`, to position `i`.
pub(crate) struct FindKernel<'a, K, V, H, E>
where
  K: Word,
  V: Word,
  H: ?Sized,
  E: ?Sized,
{
  pub(crate) store: &'a SlotStore<K, V>,
  pub(crate) keys: &'a [K],
  pub(crate) hash: &'a H,
  pub(crate) equal: &'a E,
  pub(crate) output: Scatter<'a, Option<V>>,
}

impl<K, V, H, E> Kernel for FindKernel<'_, K, V, H, E>
where
  K: Word,
  V: Word,
  H: KeyHash<K> + Sync + ?Sized,
  E: KeyEqual<K> + Sync + ?Sized,
{
  fn run<T>(&self, tile: &T, index: usize)
  where
    T: Tile,
  {
    let key: &K = &self.keys[index];

    let found: Option<V> = if tile.size() == 1 {
      lookup::find(self.store, key, self.hash, self.equal)
    } else {
      lookup::find_cooperative(tile, self.store, key, self.hash, self.equal)
    }
    .map(|entry| entry.value());

    if tile.rank() == 0 {
      // SAFETY: Item `index` is claimed by exactly one tile, and only its
      // lane zero writes.
      unsafe {
        self.output.write(index, found);
      }
    }
  }
}

// -----------------------------------------------------------------------------
// Contains
// -----------------------------------------------------------------------------

/// Writes whether `keys[i]` is present to position `i`.
pub(crate) struct ContainsKernel<'a, K, V, H, E>
where
  K: Word,
  V: Word,
  H: ?Sized,
  E: ?Sized,
{
  pub(crate) store: &'a SlotStore<K, V>,
  pub(crate) keys: &'a [K],
  pub(crate) hash: &'a H,
  pub(crate) equal: &'a E,
  pub(crate) output: Scatter<'a, bool>,
}

impl<K, V, H, E> Kernel for ContainsKernel<'_, K, V, H, E>
where
  K: Word,
  V: Word,
  H: KeyHash<K> + Sync + ?Sized,
  E: KeyEqual<K> + Sync + ?Sized,
{
  fn run<T>(&self, tile: &T, index: usize)
  where
    T: Tile,
  {
    let key: &K = &self.keys[index];

    let present: bool = if tile.size() == 1 {
      lookup::contains(self.store, key, self.hash, self.equal)
    } else {
      lookup::contains_cooperative(tile, self.store, key, self.hash, self.equal)
    };

    if tile.rank() == 0 {
      // SAFETY: Item `index` is claimed by exactly one tile, and only its
      // lane zero writes.
      unsafe {
        self.output.write(index, present);
      }
    }
  }
}
