use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::mem;
use core::num::NonZeroUsize;

use crossbeam_utils::CachePadded;

use crate::alloc::handle_alloc_error;
use crate::bulk::ContainsKernel;
use crate::bulk::FindKernel;
use crate::bulk::InsertKernel;
use crate::error::Error;
use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::launch;
use crate::launch::Scatter;
use crate::params::DefaultParams;
use crate::params::Params;
use crate::params::ParamsExt;
use crate::store::Slot;
use crate::store::SlotStore;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering::Relaxed;
use crate::view::MapRef;
use crate::word::Word;

/// The load factor above which probe sequences grow long.
///
/// Exceeding it is allowed; bulk inserts log a warning when they would.
pub const MAX_LOAD_FACTOR: f64 = 0.5;

/// A fixed-capacity concurrent hash table with bulk operations.
///
/// `HTab` maps keys of type `K` to values of type `V`, both plain integers
/// with a lock-free atomic counterpart (see [`Word`]). Two reserved values,
/// the *empty key sentinel* and the *empty value sentinel*, mark unused slots
/// and can never be inserted.
///
/// Bulk operations spread a batch over a pool of worker threads and return
/// once the whole batch is processed. Each key is handled by a tile of
/// cooperating lanes whose width is set by `P` (see [`Params`]).
///
/// The capacity is fixed at construction. Keys are never removed.
///
/// See the [crate-level documentation][crate] for an overview.
///
/// # Type Parameters
///
/// - `K`: The key type.
/// - `V`: The value type.
/// - `P`: Launch configuration implementing [`Params`]. Defaults to
///   [`DefaultParams`] (8-lane inserts, 4-lane lookups).
///
/// # Examples
///
/// ```
/// use htab::{DefaultKeyEqual, HTab, IdentityHash};
///
/// let mut table: HTab<i32, i32> = HTab::new(16, -1, -1);
///
/// let pairs: Vec<(i32, i32)> = (0..8).map(|key| (key, key * 10)).collect();
/// assert_eq!(table.insert(&pairs, &IdentityHash, &DefaultKeyEqual), 8);
/// assert_eq!(table.size(), 8);
///
/// let found = table.find(&[0, 3, 7, 8], &IdentityHash, &DefaultKeyEqual);
/// assert_eq!(found, vec![Some(0), Some(30), Some(70), None]);
/// ```
pub struct HTab<K, V, P = DefaultParams>
where
  K: Word,
  V: Word,
  P: Params + ?Sized,
{
  store: SlotStore<K, V>,
  successes: CachePadded<AtomicUsize>,
  size: usize,
  workers: NonZeroUsize,
  marker: PhantomData<fn(P)>,
}

impl<K, V, P> HTab<K, V, P>
where
  K: Word,
  V: Word,
  P: Params + ?Sized,
{
  /// Creates a table with `capacity` slots, all empty.
  ///
  /// # Errors
  ///
  /// Returns [`Error::ZeroCapacity`] if `capacity` is zero,
  /// [`Error::CapacityOverflow`] if the slot array does not fit in the address
  /// space and [`Error::Alloc`] if the allocator fails.
  ///
  /// # Examples
  ///
  /// ```
  /// use htab::{Error, HTab};
  ///
  /// let table: Result<HTab<u32, u32>, Error> = HTab::try_new(0, 0, 0);
  /// assert_eq!(table.unwrap_err(), Error::ZeroCapacity);
  /// ```
  pub fn try_new(capacity: usize, empty_key: K, empty_value: V) -> Result<Self, Error> {
    let workers: NonZeroUsize = launch::default_workers();
    let store: SlotStore<K, V> = SlotStore::try_new(capacity, empty_key, empty_value, workers)?;

    tracing::debug!(
      capacity,
      bytes = capacity * mem::size_of::<Slot<K, V>>(),
      workers = workers.get(),
      "table created",
    );

    Ok(Self {
      store,
      successes: CachePadded::new(AtomicUsize::new(0)),
      size: 0,
      workers,
      marker: PhantomData,
    })
  }

  /// Creates a table with `capacity` slots, all empty.
  ///
  /// # Panics
  ///
  /// Panics if `capacity` is zero or too large. Allocation failure aborts via
  /// [`handle_alloc_error`](std::alloc::handle_alloc_error).
  ///
  /// # Examples
  ///
  /// ```
  /// use htab::HTab;
  ///
  /// let table: HTab<u64, u64> = HTab::new(100, u64::MAX, 0);
  /// assert_eq!(table.capacity(), 100);
  /// assert_eq!(table.size(), 0);
  /// ```
  #[inline]
  pub fn new(capacity: usize, empty_key: K, empty_value: V) -> Self {
    match Self::try_new(capacity, empty_key, empty_value) {
      Ok(this) => this,
      Err(Error::Alloc { layout }) => handle_alloc_error(layout),
      Err(error) => panic!("{error}"),
    }
  }

  /// Sets the number of worker threads used by bulk operations.
  ///
  /// Defaults to the number of threads in the global rayon pool. A tile is
  /// never split, so a bulk call always runs at least one full tile regardless
  /// of this setting.
  #[inline]
  #[must_use]
  pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
    self.workers = workers;
    self
  }

  /// Returns the number of worker threads used by bulk operations.
  #[inline]
  pub const fn workers(&self) -> NonZeroUsize {
    self.workers
  }

  /// Returns the number of slots.
  #[inline]
  pub const fn capacity(&self) -> usize {
    self.store.capacity()
  }

  /// Returns the number of keys added by bulk inserts.
  ///
  /// Keys inserted through a [`MapRef`] are not counted.
  #[inline]
  pub const fn size(&self) -> usize {
    self.size
  }

  /// Returns `size() / capacity()`.
  #[inline]
  pub fn load_factor(&self) -> f64 {
    ratio(self.size, self.capacity())
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

  /// Returns a shared view exposing the per-key protocols.
  #[inline]
  pub const fn view(&self) -> MapRef<'_, K, V> {
    MapRef::new(&self.store)
  }

  // ---------------------------------------------------------------------------
  // Bulk Insert
  // ---------------------------------------------------------------------------

  /// Inserts every pair of `pairs` and returns the number of new keys.
  ///
  /// Pairs whose key is already present, either from an earlier call or
  /// earlier in the same batch, leave the stored value unchanged. Which value
  /// wins among duplicates within one batch is unspecified.
  ///
  /// Neither a key nor a value may equal its sentinel. The table must keep at
  /// least one empty slot: filling it completely and then inserting a new key
  /// never returns. Keep the load factor at or below [`MAX_LOAD_FACTOR`] for
  /// short probe sequences.
  ///
  /// # Examples
  ///
  /// ```
  /// use htab::{DefaultKeyEqual, HTab, XxHash64};
  ///
  /// let mut table: HTab<u64, u64> = HTab::new(64, u64::MAX, u64::MAX);
  ///
  /// assert_eq!(table.insert(&[(1, 1), (2, 2), (1, 3)], &XxHash64::new(), &DefaultKeyEqual), 2);
  /// assert_eq!(table.insert(&[(2, 9), (3, 3)], &XxHash64::new(), &DefaultKeyEqual), 1);
  /// assert_eq!(table.size(), 3);
  /// ```
  pub fn insert<H, E>(&mut self, pairs: &[(K, V)], hash: &H, equal: &E) -> usize
  where
    H: KeyHash<K> + Sync + ?Sized,
    E: KeyEqual<K> + Sync + ?Sized,
  {
    let projected: f64 = ratio(self.size.saturating_add(pairs.len()), self.capacity());

    if projected > MAX_LOAD_FACTOR {
      tracing::warn!(
        size = self.size,
        batch = pairs.len(),
        capacity = self.capacity(),
        projected,
        "insert may exceed the recommended load factor",
      );
    }

    self.successes.store(0, Relaxed);

    let kernel: InsertKernel<'_, K, V, H, E> = InsertKernel {
      store: &self.store,
      pairs,
      hash,
      equal,
      successes: &self.successes,
    };

    launch::launch(&kernel, pairs.len(), P::INSERT_TILE, self.workers);

    let inserted: usize = self.successes.load(Relaxed);

    self.size += inserted;

    tracing::debug!(
      batch = pairs.len(),
      inserted,
      duplicates = pairs.len() - inserted,
      size = self.size,
      lanes = P::INSERT_LANES,
      "bulk insert",
    );

    inserted
  }

  // ---------------------------------------------------------------------------
  // Bulk Lookup
  // ---------------------------------------------------------------------------

  /// Looks up every key of `keys` and returns their values in order.
  ///
  /// # Examples
  ///
  /// ```
  /// use htab::{DefaultKeyEqual, HTab, IdentityHash};
  ///
  /// let mut table: HTab<u32, u32> = HTab::new(32, u32::MAX, u32::MAX);
  /// table.insert(&[(5, 50)], &IdentityHash, &DefaultKeyEqual);
  ///
  /// assert_eq!(table.find(&[5, 6], &IdentityHash, &DefaultKeyEqual), vec![Some(50), None]);
  /// ```
  pub fn find<H, E>(&self, keys: &[K], hash: &H, equal: &E) -> Vec<Option<V>>
  where
    H: KeyHash<K> + Sync + ?Sized,
    E: KeyEqual<K> + Sync + ?Sized,
  {
    let mut output: Vec<Option<V>> = vec![None; keys.len()];
    self.find_into(keys, &mut output, hash, equal);
    output
  }

  /// Looks up every key of `keys`, writing the value of `keys[i]` to
  /// `output[i]`.
  ///
  /// # Panics
  ///
  /// Panics if `keys` and `output` differ in length.
  pub fn find_into<H, E>(&self, keys: &[K], output: &mut [Option<V>], hash: &H, equal: &E)
  where
    H: KeyHash<K> + Sync + ?Sized,
    E: KeyEqual<K> + Sync + ?Sized,
  {
    assert_eq!(keys.len(), output.len(), "find output length mismatch");

    let kernel: FindKernel<'_, K, V, H, E> = FindKernel {
      store: &self.store,
      keys,
      hash,
      equal,
      output: Scatter::new(output),
    };

    launch::launch(&kernel, keys.len(), P::LOOKUP_TILE, self.workers);

    tracing::debug!(batch = keys.len(), lanes = P::LOOKUP_LANES, "bulk find");
  }

  /// Reports, in order, whether each key of `keys` is present.
  ///
  /// # Examples
  ///
  /// ```
  /// use htab::{DefaultKeyEqual, HTab, IdentityHash};
  ///
  /// let mut table: HTab<u32, u32> = HTab::new(32, u32::MAX, u32::MAX);
  /// table.insert(&[(5, 50)], &IdentityHash, &DefaultKeyEqual);
  ///
  /// assert_eq!(table.contains(&[6, 5], &IdentityHash, &DefaultKeyEqual), vec![false, true]);
  /// ```
  pub fn contains<H, E>(&self, keys: &[K], hash: &H, equal: &E) -> Vec<bool>
  where
    H: KeyHash<K> + Sync + ?Sized,
    E: KeyEqual<K> + Sync + ?Sized,
  {
    let mut output: Vec<bool> = vec![false; keys.len()];
    self.contains_into(keys, &mut output, hash, equal);
    output
  }

  /// Reports whether each key of `keys` is present, writing the answer for
  /// `keys[i]` to `output[i]`.
  ///
  /// # Panics
  ///
  /// Panics if `keys` and `output` differ in length.
  pub fn contains_into<H, E>(&self, keys: &[K], output: &mut [bool], hash: &H, equal: &E)
  where
    H: KeyHash<K> + Sync + ?Sized,
    E: KeyEqual<K> + Sync + ?Sized,
  {
    assert_eq!(keys.len(), output.len(), "contains output length mismatch");

    let kernel: ContainsKernel<'_, K, V, H, E> = ContainsKernel {
      store: &self.store,
      keys,
      hash,
      equal,
      output: Scatter::new(output),
    };

    launch::launch(&kernel, keys.len(), P::LOOKUP_TILE, self.workers);

    tracing::debug!(batch = keys.len(), lanes = P::LOOKUP_LANES, "bulk contains");
  }
}

impl<K, V, P> Debug for HTab<K, V, P>
where
  K: Word,
  V: Word,
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("HTab")
      .field("params", &P::debug())
      .field("capacity", &self.capacity())
      .field("size", &self.size)
      .field("workers", &self.workers)
      .field("entries", &self.store)
      .finish()
  }
}

#[allow(clippy::cast_precision_loss)]
#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
  numerator as f64 / denominator as f64
}
