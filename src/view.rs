//! Borrowed per-key access to a table.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::index::SlotIndex;
use crate::insert;
use crate::lookup;
use crate::store::Entry;
use crate::store::SlotStore;
use crate::tile::Tile;
use crate::word::Word;

/// A shared view of an [`HTab`] exposing the per-key protocols.
///
/// Bulk operations on [`HTab`] are built from these. A `MapRef` is [`Copy`]
/// and [`Sync`], so callers running their own threads can hand it out and
/// insert or look up keys concurrently. Keys inserted through a view are not
/// counted by [`HTab::size`].
///
/// The cooperative variants must be called by every lane of the tile with the
/// same arguments; each lane receives the same result.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use htab::{DefaultKeyEqual, HTab, MapRef, XxHash64};
///
/// let table: HTab<u64, u64> = HTab::new(1024, u64::MAX, u64::MAX);
/// let view: MapRef<'_, u64, u64> = table.view();
///
/// thread::scope(|scope| {
///   for offset in 0..4_u64 {
///     scope.spawn(move || {
///       for key in (offset..100).step_by(4) {
///         view.insert(key, key * 2, &XxHash64::new(), &DefaultKeyEqual);
///       }
///     });
///   }
/// });
///
/// assert!(view.contains(&42, &XxHash64::new(), &DefaultKeyEqual));
/// assert!(!view.contains(&420, &XxHash64::new(), &DefaultKeyEqual));
/// ```
///
/// [`HTab`]: crate::public::HTab
/// [`HTab::size`]: crate::public::HTab::size
pub struct MapRef<'map, K, V>
where
  K: Word,
  V: Word,
{
  store: &'map SlotStore<K, V>,
}

impl<'map, K, V> MapRef<'map, K, V>
where
  K: Word,
  V: Word,
{
  #[inline]
  pub(crate) const fn new(store: &'map SlotStore<K, V>) -> Self {
    Self { store }
  }

  /// Returns the number of slots.
  #[inline]
  pub const fn capacity(&self) -> usize {
    self.store.capacity()
  }

  /// Returns the key marking an empty slot.
  #[inline]
  pub const fn empty_key_sentinel(&self) -> K {
    self.store.empty_key()
  }

  /// Returns the value held by a slot whose value is not yet written.
  #[inline]
  pub const fn empty_value_sentinel(&self) -> V {
    self.store.empty_value()
  }

  /// Returns the slot at `index`, or [`None`] if it lies outside the table.
  ///
  /// The slot may be empty.
  #[inline]
  pub fn get(&self, index: SlotIndex) -> Option<Entry<'map, K, V>> {
    self.store.get(index)
  }

  // ---------------------------------------------------------------------------
  // Insert
  // ---------------------------------------------------------------------------

  /// Inserts `key` with `value`.
  ///
  /// Returns the slot holding `key` and `true` if this call created it, or the
  /// slot of an equal key and `false` if one was already present. The value of
  /// an existing key is left untouched.
  ///
  /// Neither `key` nor `value` may equal its sentinel. The table must keep at
  /// least one empty slot; inserting into a full table never returns.
  #[inline]
  pub fn insert<H, E>(&self, key: K, value: V, hash: &H, equal: &E) -> (Entry<'map, K, V>, bool)
  where
    H: KeyHash<K> + ?Sized,
    E: KeyEqual<K> + ?Sized,
  {
    insert::insert(self.store, key, value, hash, equal)
  }

  /// Inserts `key` with `value` using every lane of `tile`.
  ///
  /// Same contract as [`insert`](Self::insert).
  #[inline]
  pub fn insert_cooperative<T, H, E>(
    &self,
    tile: &T,
    key: K,
    value: V,
    hash: &H,
    equal: &E,
  ) -> (Entry<'map, K, V>, bool)
  where
    T: Tile,
    H: KeyHash<K> + ?Sized,
    E: KeyEqual<K> + ?Sized,
  {
    insert::insert_cooperative(tile, self.store, key, value, hash, equal)
  }

  // ---------------------------------------------------------------------------
  // Lookup
  // ---------------------------------------------------------------------------

  /// Returns the slot holding `key`, if any.
  ///
  /// See [`Entry`] for when the value of a found slot may still read as the
  /// value sentinel.
  #[inline]
  pub fn find<H, E>(&self, key: &K, hash: &H, equal: &E) -> Option<Entry<'map, K, V>>
  where
    H: KeyHash<K> + ?Sized,
    E: KeyEqual<K> + ?Sized,
  {
    lookup::find(self.store, key, hash, equal)
  }

  /// Returns the slot holding `key`, if any, using every lane of `tile`.
  #[inline]
  pub fn find_cooperative<T, H, E>(
    &self,
    tile: &T,
    key: &K,
    hash: &H,
    equal: &E,
  ) -> Option<Entry<'map, K, V>>
  where
    T: Tile,
    H: KeyHash<K> + ?Sized,
    E: KeyEqual<K> + ?Sized,
  {
    lookup::find_cooperative(tile, self.store, key, hash, equal)
  }

  /// Returns `true` if the table holds `key`.
  #[inline]
  pub fn contains<H, E>(&self, key: &K, hash: &H, equal: &E) -> bool
  where
    H: KeyHash<K> + ?Sized,
    E: KeyEqual<K> + ?Sized,
  {
    lookup::contains(self.store, key, hash, equal)
  }

  /// Returns `true` if the table holds `key`, using every lane of `tile`.
  #[inline]
  pub fn contains_cooperative<T, H, E>(&self, tile: &T, key: &K, hash: &H, equal: &E) -> bool
  where
    T: Tile,
    H: KeyHash<K> + ?Sized,
    E: KeyEqual<K> + ?Sized,
  {
    lookup::contains_cooperative(tile, self.store, key, hash, equal)
  }
}

impl<K, V> Clone for MapRef<'_, K, V>
where
  K: Word,
  V: Word,
{
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<K, V> Copy for MapRef<'_, K, V>
where
  K: Word,
  V: Word,
{
}

impl<K, V> Debug for MapRef<'_, K, V>
where
  K: Word,
  V: Word,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(self.store, f)
  }
}
