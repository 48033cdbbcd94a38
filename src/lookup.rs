//! The lookup protocol.
//!
//! A lookup follows the same probe sequence as insertion and stops at the
//! first slot holding an equal key or, failing that, at the first empty slot.
//! Lookups only load; they never modify a slot.

use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::probing::ProbeSequence;
use crate::store::Entry;
use crate::store::SlotStore;
use crate::tile::Tile;
use crate::word::Word;

/// Where a probe for a key ended.
enum Probe {
  Found(usize),
  Missing,
}

// -----------------------------------------------------------------------------
// Single-lane Lookup
// -----------------------------------------------------------------------------

#[inline]
fn probe<K, V, H, E>(store: &SlotStore<K, V>, key: &K, hash: &H, equal: &E) -> Probe
where
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  let empty_key: K = store.empty_key();
  let mut sequence: ProbeSequence = ProbeSequence::single(hash.hash(key), store.capacity());

  loop {
    let index: usize = sequence.current();
    let existing: K = store.slot(index).load_key();

    if equal.equal(key, &existing) {
      return Probe::Found(index);
    }

    if existing == empty_key {
      return Probe::Missing;
    }

    sequence.advance();
  }
}

/// Returns the slot holding `key`, if any.
pub(crate) fn find<'map, K, V, H, E>(
  store: &'map SlotStore<K, V>,
  key: &K,
  hash: &H,
  equal: &E,
) -> Option<Entry<'map, K, V>>
where
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  match probe(store, key, hash, equal) {
    Probe::Found(index) => Some(store.entry(index)),
    Probe::Missing => None,
  }
}

/// Returns `true` if some slot holds `key`.
pub(crate) fn contains<K, V, H, E>(store: &SlotStore<K, V>, key: &K, hash: &H, equal: &E) -> bool
where
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  matches!(probe(store, key, hash, equal), Probe::Found(_))
}

// -----------------------------------------------------------------------------
// Cooperative Lookup
// -----------------------------------------------------------------------------

fn probe_cooperative<T, K, V, H, E>(
  tile: &T,
  store: &SlotStore<K, V>,
  key: &K,
  hash: &H,
  equal: &E,
) -> Probe
where
  T: Tile,
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  let empty_key: K = store.empty_key();

  let mut sequence: ProbeSequence =
    ProbeSequence::tiled(hash.hash(key), tile.rank(), tile.size(), store.capacity());

  loop {
    let index: usize = sequence.current();
    let existing: K = store.slot(index).load_key();

    let matches: u32 = tile.ballot(equal.equal(key, &existing));

    if matches != 0 {
      let src: u32 = matches.trailing_zeros();
      return Probe::Found(tile.shfl(index, src));
    }

    if tile.ballot(existing == empty_key) != 0 {
      return Probe::Missing;
    }

    sequence.advance();
  }
}

/// Returns the slot holding `key`, if any, using every lane of `tile`.
///
/// All lanes must pass the same key and strategies, and all lanes return the
/// same result.
pub(crate) fn find_cooperative<'map, T, K, V, H, E>(
  tile: &T,
  store: &'map SlotStore<K, V>,
  key: &K,
  hash: &H,
  equal: &E,
) -> Option<Entry<'map, K, V>>
where
  T: Tile,
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  match probe_cooperative(tile, store, key, hash, equal) {
    Probe::Found(index) => Some(store.entry(index)),
    Probe::Missing => None,
  }
}

/// Returns `true` if some slot holds `key`, using every lane of `tile`.
pub(crate) fn contains_cooperative<T, K, V, H, E>(
  tile: &T,
  store: &SlotStore<K, V>,
  key: &K,
  hash: &H,
  equal: &E,
) -> bool
where
  T: Tile,
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  matches!(probe_cooperative(tile, store, key, hash, equal), Probe::Found(_))
}
