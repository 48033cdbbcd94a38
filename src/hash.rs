//! Caller-supplied hashing and key comparison strategies.
//!
//! Every bulk call and every [`MapRef`] operation takes a [`KeyHash`] and a
//! [`KeyEqual`]. Both must be deterministic and must agree across all calls
//! made against the same table.
//!
//! Plain closures qualify:
//!
//! ```
//! use htab::HTab;
//!
//! let mut table: HTab<u64, u64> = HTab::new(64, u64::MAX, u64::MAX);
//!
//! let hash = |key: &u64| key.wrapping_mul(0x9E37_79B9_7F4A_7C15);
//! let equal = |a: &u64, b: &u64| a == b;
//!
//! table.insert(&[(1, 10), (2, 20)], &hash, &equal);
//! assert_eq!(table.find(&[2], &hash, &equal), vec![Some(20)]);
//! ```
//!
//! [`MapRef`]: crate::view::MapRef

use crate::word::Word;

// -----------------------------------------------------------------------------
// Strategy Traits
// -----------------------------------------------------------------------------

/// Maps a key to a 64-bit hash.
///
/// The probe sequence for a key starts at `hash(key) mod capacity`.
pub trait KeyHash<K>
where
  K: ?Sized,
{
  /// Hashes `key`.
  fn hash(&self, key: &K) -> u64;
}

impl<K, F> KeyHash<K> for F
where
  K: ?Sized,
  F: Fn(&K) -> u64,
{
  #[inline]
  fn hash(&self, key: &K) -> u64 {
    self(key)
  }
}

/// Decides whether two keys are the same key.
///
/// Only ever called with the probed key on the left and the key loaded from a
/// slot on the right. The slot key may be the empty sentinel.
pub trait KeyEqual<K>
where
  K: ?Sized,
{
  /// Returns `true` if `probe` and `stored` denote the same key.
  fn equal(&self, probe: &K, stored: &K) -> bool;
}

impl<K, F> KeyEqual<K> for F
where
  K: ?Sized,
  F: Fn(&K, &K) -> bool,
{
  #[inline]
  fn equal(&self, probe: &K, stored: &K) -> bool {
    self(probe, stored)
  }
}

// -----------------------------------------------------------------------------
// Built-in Strategies
// -----------------------------------------------------------------------------

/// Uses the key itself, widened to 64 bits, as its hash.
///
/// Cheap and collision-free for integer keys, but consecutive keys land in
/// consecutive slots and form long clusters under linear probing.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct IdentityHash;

impl<K> KeyHash<K> for IdentityHash
where
  K: Word,
{
  #[inline]
  fn hash(&self, key: &K) -> u64 {
    key.to_u64()
  }
}

/// Hashes keys with xxh64.
///
/// # Examples
///
/// ```
/// use htab::{KeyHash, XxHash64};
///
/// let hasher: XxHash64 = XxHash64::with_seed(7);
/// assert_eq!(hasher.hash(&42_u32), hasher.hash(&42_u32));
/// ```
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct XxHash64 {
  seed: u64,
}

impl XxHash64 {
  /// Creates a hasher using seed `0`.
  #[inline]
  pub const fn new() -> Self {
    Self::with_seed(0)
  }

  /// Creates a hasher using the given seed.
  #[inline]
  pub const fn with_seed(seed: u64) -> Self {
    Self { seed }
  }

  /// Returns the seed of this hasher.
  #[inline]
  pub const fn seed(&self) -> u64 {
    self.seed
  }
}

impl<K> KeyHash<K> for XxHash64
where
  K: Word,
{
  #[inline]
  fn hash(&self, key: &K) -> u64 {
    xxhash_rust::xxh64::xxh64(&key.to_u64().to_le_bytes(), self.seed)
  }
}

/// Compares keys with [`PartialEq`].
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct DefaultKeyEqual;

impl<K> KeyEqual<K> for DefaultKeyEqual
where
  K: PartialEq + ?Sized,
{
  #[inline]
  fn equal(&self, probe: &K, stored: &K) -> bool {
    probe == stored
  }
}
