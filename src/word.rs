//! Plain key and value types with lock-free atomic counterparts.

use core::fmt::Debug;

use crate::sync::atomic::AtomicI32;
use crate::sync::atomic::AtomicI64;
use crate::sync::atomic::AtomicIsize;
use crate::sync::atomic::AtomicU32;
use crate::sync::atomic::AtomicU64;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering;

/// A type that can be stored in a slot field.
///
/// Every slot field is an independently atomic cell, so keys and values are
/// restricted to types with a native lock-free atomic representation. This
/// trait is sealed and implemented for the fixed-width integers.
pub trait Word: Copy + Eq + Debug + Send + Sync + Sealed + 'static {
  /// The atomic cell holding a `Self`.
  #[doc(hidden)]
  type Atom: Send + Sync;

  #[doc(hidden)]
  fn atom(self) -> Self::Atom;

  #[doc(hidden)]
  fn load(atom: &Self::Atom, order: Ordering) -> Self;

  #[doc(hidden)]
  fn store(atom: &Self::Atom, value: Self, order: Ordering);

  /// Attempts to replace `current` with `new`; on failure returns the value
  /// actually observed in the cell.
  #[doc(hidden)]
  fn compare_exchange(
    atom: &Self::Atom,
    current: Self,
    new: Self,
    success: Ordering,
    failure: Ordering,
  ) -> Result<Self, Self>;

  /// Widens the value to 64 bits for hashing.
  fn to_u64(self) -> u64;
}

mod private {
  pub trait Sealed {}
}

use private::Sealed;

macro_rules! word {
  ($($word:ty => $atom:ty),+ $(,)?) => {
    $(
      impl Sealed for $word {}

      impl Word for $word {
        type Atom = $atom;

        #[inline]
        fn atom(self) -> Self::Atom {
          <$atom>::new(self)
        }

        #[inline]
        fn load(atom: &Self::Atom, order: Ordering) -> Self {
          atom.load(order)
        }

        #[inline]
        fn store(atom: &Self::Atom, value: Self, order: Ordering) {
          atom.store(value, order);
        }

        #[inline]
        fn compare_exchange(
          atom: &Self::Atom,
          current: Self,
          new: Self,
          success: Ordering,
          failure: Ordering,
        ) -> Result<Self, Self> {
          atom.compare_exchange(current, new, success, failure)
        }

        #[allow(
          clippy::cast_lossless,
          clippy::unnecessary_cast,
          reason = "shared across every word width",
        )]
        #[inline]
        fn to_u64(self) -> u64 {
          self as u64
        }
      }
    )+
  };
}

word! {
  i32 => AtomicI32,
  i64 => AtomicI64,
  isize => AtomicIsize,
  u32 => AtomicU32,
  u64 => AtomicU64,
  usize => AtomicUsize,
}
