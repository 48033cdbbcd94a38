//! The lock-free insert protocol.
//!
//! A slot is claimed by two independent compare-and-swaps: one moves the key
//! field from the key sentinel to the key, the other moves the value field
//! from the value sentinel to the value. Only the thread whose key CAS wins
//! owns the slot. A thread that wins the value CAS but loses the key CAS puts
//! the value sentinel back, and the owner retries its value CAS until it
//! lands.

use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::probing::ProbeSequence;
use crate::store::Entry;
use crate::store::Slot;
use crate::store::SlotStore;
use crate::sync::Backoff;
use crate::sync::atomic::Ordering::Relaxed;
use crate::tile::Tile;
use crate::word::Word;

// -----------------------------------------------------------------------------
// Attempt Status
// -----------------------------------------------------------------------------

/// Outcome of one attempt to claim a single slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
enum Status {
  /// The key now occupies the slot.
  Success = 0,
  /// The slot was taken by an equal key.
  Duplicate = 1,
  /// The slot was taken by a different key.
  Continue = 2,
}

impl Status {
  #[inline]
  const fn into_usize(self) -> usize {
    self as usize
  }

  #[inline]
  const fn from_usize(value: usize) -> Self {
    match value {
      0 => Self::Success,
      1 => Self::Duplicate,
      _ => Self::Continue,
    }
  }
}

/// Tries to claim the slot at `index` for `key` and `value`.
fn attempt<K, V, E>(store: &SlotStore<K, V>, index: usize, key: K, value: V, equal: &E) -> Status
where
  K: Word,
  V: Word,
  E: KeyEqual<K> + ?Sized,
{
  let slot: &Slot<K, V> = store.slot(index);
  let empty_key: K = store.empty_key();
  let empty_value: V = store.empty_value();

  let key_result: Result<K, K> =
    K::compare_exchange(&slot.key, empty_key, key, Relaxed, Relaxed);
  let value_result: Result<V, V> =
    V::compare_exchange(&slot.value, empty_value, value, Relaxed, Relaxed);

  match key_result {
    Ok(_) => {
      if value_result.is_err() {
        // A losing inserter holds the value field; it restores the sentinel
        // right after its key CAS fails.
        let backoff: Backoff = Backoff::new();

        while V::compare_exchange(&slot.value, empty_value, value, Relaxed, Relaxed).is_err() {
          backoff.snooze();
        }
      }

      Status::Success
    }
    Err(existing) => {
      if value_result.is_ok() {
        V::store(&slot.value, empty_value, Relaxed);
      }

      if equal.equal(&key, &existing) {
        Status::Duplicate
      } else {
        Status::Continue
      }
    }
  }
}

#[inline]
fn debug_assert_not_sentinel<K, V>(store: &SlotStore<K, V>, key: K, value: V)
where
  K: Word,
  V: Word,
{
  debug_assert_ne!(key, store.empty_key(), "inserted key equals the empty key sentinel");
  debug_assert_ne!(value, store.empty_value(), "inserted value equals the empty value sentinel");
}

// -----------------------------------------------------------------------------
// Single-lane Insert
// -----------------------------------------------------------------------------

/// Inserts `key` with `value` using a single lane.
///
/// Returns the slot holding `key` and whether this call created it.
pub(crate) fn insert<'map, K, V, H, E>(
  store: &'map SlotStore<K, V>,
  key: K,
  value: V,
  hash: &H,
  equal: &E,
) -> (Entry<'map, K, V>, bool)
where
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  debug_assert_not_sentinel(store, key, value);

  let mut probe: ProbeSequence = ProbeSequence::single(hash.hash(&key), store.capacity());

  loop {
    let index: usize = probe.current();

    match attempt(store, index, key, value, equal) {
      Status::Success => return (store.entry(index), true),
      Status::Duplicate => return (store.entry(index), false),
      Status::Continue => probe.advance(),
    }
  }
}

// -----------------------------------------------------------------------------
// Cooperative Insert
// -----------------------------------------------------------------------------

/// Inserts `key` with `value` using every lane of `tile`.
///
/// All lanes must pass the same key, value and strategies, and all lanes
/// return the same result.
pub(crate) fn insert_cooperative<'map, T, K, V, H, E>(
  tile: &T,
  store: &'map SlotStore<K, V>,
  key: K,
  value: V,
  hash: &H,
  equal: &E,
) -> (Entry<'map, K, V>, bool)
where
  T: Tile,
  K: Word,
  V: Word,
  H: KeyHash<K> + ?Sized,
  E: KeyEqual<K> + ?Sized,
{
  debug_assert_not_sentinel(store, key, value);

  let empty_key: K = store.empty_key();

  let mut probe: ProbeSequence =
    ProbeSequence::tiled(hash.hash(&key), tile.rank(), tile.size(), store.capacity());

  loop {
    let index: usize = probe.current();
    let existing: K = store.slot(index).load_key();

    let matches: u32 = tile.ballot(equal.equal(&key, &existing));

    if matches != 0 {
      let src: u32 = matches.trailing_zeros();
      let index: usize = tile.shfl(index, src);
      return (store.entry(index), false);
    }

    let empties: u32 = tile.ballot(existing == empty_key);

    if empties == 0 {
      probe.advance();
      continue;
    }

    let src: u32 = empties.trailing_zeros();

    let status: usize = if tile.rank() == src {
      attempt(store, index, key, value, equal).into_usize()
    } else {
      0
    };

    let status: Status = Status::from_usize(tile.shfl(status, src));
    let index: usize = tile.shfl(index, src);

    match status {
      Status::Success => return (store.entry(index), true),
      Status::Duplicate => return (store.entry(index), false),
      // Another key took the slot; reload the same window.
      Status::Continue => {}
    }
  }
}
