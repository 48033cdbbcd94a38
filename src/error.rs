//! Construction errors.

use crate::alloc::Layout;

/// The error type returned when a table cannot be constructed.
///
/// Every variant is fatal for the table being built; no partially
/// constructed table is ever returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
  /// A table must hold at least one slot.
  #[error("capacity must be non-zero")]
  ZeroCapacity,
  /// The slot array for `capacity` slots exceeds the maximum allocation size.
  #[error("capacity overflow: {capacity} slots cannot be represented")]
  CapacityOverflow {
    /// The requested number of slots.
    capacity: usize,
  },
  /// The allocator could not provide backing storage for the slot array.
  #[error("memory allocation of {} bytes failed", .layout.size())]
  Alloc {
    /// The layout of the failed allocation.
    layout: Layout,
  },
}
