//! Linear probe sequences.

/// Slot indices visited while searching for a key.
///
/// A single lane starts at `hash mod capacity` and advances one slot at a
/// time. A lane of rank `r` in a tile of `t` lanes starts at
/// `(hash + r) mod capacity` and advances `t` slots at a time, so the lanes of
/// a tile cover a window of `t` consecutive slots on every step.
///
/// The sequence wraps at `capacity` and never terminates on its own; callers
/// stop once they find their key or an empty slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ProbeSequence {
  current: usize,
  stride: usize,
  capacity: usize,
}

impl ProbeSequence {
  /// Creates the probe sequence of a single lane.
  #[inline]
  pub(crate) const fn single(hash: u64, capacity: usize) -> Self {
    Self::tiled(hash, 0, 1, capacity)
  }

  /// Creates the probe sequence of lane `rank` in a tile of `lanes` lanes.
  #[inline]
  pub(crate) const fn tiled(hash: u64, rank: u32, lanes: u32, capacity: usize) -> Self {
    debug_assert!(capacity != 0, "probe sequence over an empty table");

    let base: usize = (hash % capacity as u64) as usize;
    let rank: usize = rank as usize % capacity;

    Self {
      current: wrapping_add(base, rank, capacity),
      stride: lanes as usize % capacity,
      capacity,
    }
  }

  /// Returns the slot index this lane currently inspects.
  #[inline]
  pub(crate) const fn current(&self) -> usize {
    self.current
  }

  /// Moves to the next window.
  #[inline]
  pub(crate) const fn advance(&mut self) {
    self.current = wrapping_add(self.current, self.stride, self.capacity);
  }
}

/// Computes `(lhs + rhs) mod capacity` for operands already below `capacity`.
#[inline]
const fn wrapping_add(lhs: usize, rhs: usize, capacity: usize) -> usize {
  let room: usize = capacity - lhs;

  if rhs < room { lhs + rhs } else { rhs - room }
}
