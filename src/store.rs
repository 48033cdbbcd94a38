//! Slot storage.
//!
//! A [`SlotStore`] is a fixed array of [`Slot`]s. Each slot holds a key and a
//! value in two independent atomic cells; a slot is empty exactly when its key
//! cell holds the key sentinel.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::mem::MaybeUninit;
use core::num::NonZeroUsize;

use crate::array::Array;
use crate::error::Error;
use crate::index::SlotIndex;
use crate::launch;
use crate::sync::atomic::Ordering::Relaxed;
use crate::word::Word;

// -----------------------------------------------------------------------------
// Slot
// -----------------------------------------------------------------------------

/// One cell of the table: an atomic key next to an atomic value.
#[repr(C)]
pub(crate) struct Slot<K, V>
where
  K: Word,
  V: Word,
{
  pub(crate) key: K::Atom,
  pub(crate) value: V::Atom,
}

impl<K, V> Slot<K, V>
where
  K: Word,
  V: Word,
{
  #[inline]
  fn new(key: K, value: V) -> Self {
    Self {
      key: key.atom(),
      value: value.atom(),
    }
  }

  #[inline]
  pub(crate) fn load_key(&self) -> K {
    K::load(&self.key, Relaxed)
  }

  #[inline]
  pub(crate) fn load_value(&self) -> V {
    V::load(&self.value, Relaxed)
  }
}

// -----------------------------------------------------------------------------
// Slot Store
// -----------------------------------------------------------------------------

/// The fixed array of slots together with the sentinels marking them empty.
pub(crate) struct SlotStore<K, V>
where
  K: Word,
  V: Word,
{
  slots: Array<Slot<K, V>>,
  empty_key: K,
  empty_value: V,
}

impl<K, V> SlotStore<K, V>
where
  K: Word,
  V: Word,
{
  /// Allocates `capacity` slots and sweeps them to the sentinels using up to
  /// `workers` threads.
  pub(crate) fn try_new(
    capacity: usize,
    empty_key: K,
    empty_value: V,
    workers: NonZeroUsize,
  ) -> Result<Self, Error> {
    let Some(length) = NonZeroUsize::new(capacity) else {
      return Err(Error::ZeroCapacity);
    };

    let mut uninit: Array<MaybeUninit<Slot<K, V>>> = Array::try_new_uninit(length)?;

    launch::sweep(uninit.as_mut_slice(), workers, |slot| {
      slot.write(Slot::new(empty_key, empty_value));
    });

    Ok(Self {
      // SAFETY: `sweep` visits every element exactly once.
      slots: unsafe { uninit.assume_init() },
      empty_key,
      empty_value,
    })
  }

  #[inline]
  pub(crate) const fn capacity(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  pub(crate) const fn empty_key(&self) -> K {
    self.empty_key
  }

  #[inline]
  pub(crate) const fn empty_value(&self) -> V {
    self.empty_value
  }

  /// Returns the slot at `index`.
  ///
  /// Probe sequences only yield indices below the capacity; anything else is
  /// a logic error caught by the bounds check.
  #[inline]
  pub(crate) fn slot(&self, index: usize) -> &Slot<K, V> {
    assert!(index < self.capacity(), "slot index out of bounds");

    // SAFETY: Bounds checked above.
    unsafe { self.slots.get_unchecked(index) }
  }

  #[inline]
  pub(crate) fn entry(&self, index: usize) -> Entry<'_, K, V> {
    Entry {
      index: SlotIndex::from_bits(index),
      slot: self.slot(index),
    }
  }

  #[inline]
  pub(crate) fn get(&self, index: SlotIndex) -> Option<Entry<'_, K, V>> {
    if index.into_bits() < self.capacity() {
      Some(self.entry(index.into_bits()))
    } else {
      None
    }
  }

  #[inline]
  pub(crate) fn iter(&self) -> impl Iterator<Item = Entry<'_, K, V>> {
    self
      .slots
      .as_slice()
      .iter()
      .enumerate()
      .map(|(index, slot)| Entry {
        index: SlotIndex::from_bits(index),
        slot,
      })
  }
}

impl<K, V> Debug for SlotStore<K, V>
where
  K: Word,
  V: Word,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_map()
      .entries(
        self
          .iter()
          .filter(|entry| entry.key() != self.empty_key)
          .map(|entry| (entry.key(), entry.value())),
      )
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Entry
// -----------------------------------------------------------------------------

/// A reference to an occupied slot.
///
/// Returned by insertion (the slot that now holds the key) and by `find` (the
/// slot holding the searched key).
///
/// # Transient values
///
/// A key and its value are committed by two separate atomic operations. A
/// concurrent reader may observe a slot whose key is already visible while the
/// value still holds the value sentinel. Once every insert touching the key
/// has returned, [`value()`] reports the final value.
///
/// [`value()`]: Self::value
pub struct Entry<'map, K, V>
where
  K: Word,
  V: Word,
{
  index: SlotIndex,
  slot: &'map Slot<K, V>,
}

impl<K, V> Entry<'_, K, V>
where
  K: Word,
  V: Word,
{
  /// Returns the position of this slot.
  #[inline]
  pub const fn index(&self) -> SlotIndex {
    self.index
  }

  /// Loads the key stored in this slot.
  #[inline]
  pub fn key(&self) -> K {
    self.slot.load_key()
  }

  /// Loads the value stored in this slot.
  ///
  /// See the [type-level documentation](Self#transient-values) for when this
  /// can still return the value sentinel.
  #[inline]
  pub fn value(&self) -> V {
    self.slot.load_value()
  }
}

impl<K, V> Clone for Entry<'_, K, V>
where
  K: Word,
  V: Word,
{
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<K, V> Copy for Entry<'_, K, V>
where
  K: Word,
  V: Word,
{
}

impl<K, V> PartialEq for Entry<'_, K, V>
where
  K: Word,
  V: Word,
{
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.index == other.index
  }
}

impl<K, V> Eq for Entry<'_, K, V>
where
  K: Word,
  V: Word,
{
}

impl<K, V> Debug for Entry<'_, K, V>
where
  K: Word,
  V: Word,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Entry")
      .field("index", &self.index)
      .field("key", &self.key())
      .field("value", &self.value())
      .finish()
  }
}
