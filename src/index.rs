//! Slot index type.

use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result;

/// An opaque index identifying a slot in an [`HTab`].
///
/// Returned inside an [`Entry`] by insert and find. A slot never changes
/// owner once occupied, so an index obtained for a key stays valid for the
/// lifetime of the table.
///
/// # Examples
///
/// ```
/// use htab::{HTab, IdentityHash, DefaultKeyEqual};
///
/// let table: HTab<u32, u32> = HTab::new(16, u32::MAX, u32::MAX);
/// let view = table.view();
///
/// let (entry, inserted) = view.insert(7, 70, &IdentityHash, &DefaultKeyEqual);
/// assert!(inserted);
///
/// let found = view.find(&7, &IdentityHash, &DefaultKeyEqual).unwrap();
/// assert_eq!(found.index(), entry.index());
/// ```
///
/// [`HTab`]: crate::public::HTab
/// [`Entry`]: crate::store::Entry
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotIndex {
  bits: usize,
}

impl SlotIndex {
  /// Creates a [`SlotIndex`] from its raw bit representation.
  ///
  /// # Warning
  ///
  /// An arbitrary bit pattern may lie outside the table. Table operations
  /// taking a [`SlotIndex`] return [`None`] for such indices.
  #[inline]
  pub const fn from_bits(bits: usize) -> Self {
    Self { bits }
  }

  /// Returns the raw bit representation of this index.
  ///
  /// This is the position of the slot in the slot array.
  #[inline]
  pub const fn into_bits(self) -> usize {
    self.bits
  }
}

impl Debug for SlotIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&self.bits, f)
  }
}

impl Display for SlotIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(&self.bits, f)
  }
}

impl From<SlotIndex> for usize {
  #[inline]
  fn from(other: SlotIndex) -> Self {
    other.into_bits()
  }
}
