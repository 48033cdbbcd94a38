//! Tiles: small groups of lanes that probe cooperatively.
//!
//! A [`Tile`] offers two collective operations. [`ballot`] gathers one boolean
//! from every lane into a bitmask, and [`shfl`] hands one lane's value to all
//! lanes. Every lane of a tile must call the same sequence of collectives;
//! the cooperative protocols are written so that control flow only diverges
//! after a collective has made a decision uniform across the tile.
//!
//! [`Solo`] is the trivial single-lane tile. [`ThreadTile`] is one lane of a
//! group of threads sharing a [`TileScratch`].
//!
//! [`ballot`]: Tile::ballot
//! [`shfl`]: Tile::shfl

use core::cell::Cell;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crossbeam_utils::CachePadded;

use crate::params::TileSize;
use crate::sync::Backoff;
use crate::sync::atomic::AtomicBool;
use crate::sync::atomic::AtomicU32;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering::AcqRel;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;
use crate::sync::atomic::Ordering::Release;

/// Number of scratch buffers cycled through by consecutive collectives.
///
/// A buffer used by collective `n` is cleared during collective `n + 1` and
/// reused by collective `n + 3`; three buffers keep a lane racing ahead from
/// touching words a slower lane has yet to read.
const BUFFERS: usize = 3;

// -----------------------------------------------------------------------------
// Tile
// -----------------------------------------------------------------------------

/// A fixed group of lanes acting as one logical prober.
pub trait Tile {
  /// The position of this lane within the tile, in `0..size()`.
  fn rank(&self) -> u32;

  /// The number of lanes in the tile.
  fn size(&self) -> u32;

  /// Returns a mask with bit `r` set iff lane `r` passed `true`.
  fn ballot(&self, predicate: bool) -> u32;

  /// Returns the `value` passed by lane `src` to every lane.
  fn shfl(&self, value: usize, src: u32) -> usize;
}

// -----------------------------------------------------------------------------
// Solo
// -----------------------------------------------------------------------------

/// A tile consisting of a single lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Solo;

impl Tile for Solo {
  #[inline]
  fn rank(&self) -> u32 {
    0
  }

  #[inline]
  fn size(&self) -> u32 {
    1
  }

  #[inline]
  fn ballot(&self, predicate: bool) -> u32 {
    u32::from(predicate)
  }

  #[inline]
  fn shfl(&self, value: usize, src: u32) -> usize {
    debug_assert_eq!(src, 0, "Solo::shfl from a lane that does not exist");
    value
  }
}

// -----------------------------------------------------------------------------
// Tile Scratch
// -----------------------------------------------------------------------------

/// Shared state of a thread tile.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use htab::{Tile, TileScratch, TileSize};
///
/// let scratch: TileScratch = TileScratch::new(TileSize::new(2));
///
/// let masks: Vec<u32> = thread::scope(|scope| {
///   let handles: Vec<_> = (0..2)
///     .map(|rank| {
///       let scratch = &scratch;
///       scope.spawn(move || scratch.lane(rank).ballot(rank == 1))
///     })
///     .collect();
///
///   handles.into_iter().map(|handle| handle.join().unwrap()).collect()
/// });
///
/// assert_eq!(masks, vec![0b10, 0b10]);
/// ```
pub struct TileScratch {
  barrier: TileBarrier,
  votes: [CachePadded<AtomicU32>; BUFFERS],
  words: [CachePadded<AtomicUsize>; BUFFERS],
}

impl TileScratch {
  /// Creates the scratch area for a tile of `lanes` lanes.
  pub fn new(lanes: TileSize) -> Self {
    Self {
      barrier: TileBarrier::new(lanes.as_u32()),
      votes: [
        CachePadded::new(AtomicU32::new(0)),
        CachePadded::new(AtomicU32::new(0)),
        CachePadded::new(AtomicU32::new(0)),
      ],
      words: [
        CachePadded::new(AtomicUsize::new(0)),
        CachePadded::new(AtomicUsize::new(0)),
        CachePadded::new(AtomicUsize::new(0)),
      ],
    }
  }

  /// Returns the number of lanes sharing this scratch area.
  #[inline]
  pub fn lanes(&self) -> u32 {
    self.barrier.lanes
  }

  /// Marks the tile as broken, making every lane waiting in a collective, now
  /// or later, panic instead of waiting forever.
  ///
  /// Called when a lane unwinds and will never reach its next collective.
  #[inline]
  pub fn poison(&self) {
    self.barrier.poisoned.store(true, Release);
  }

  /// Returns `true` if [`poison()`] was called.
  ///
  /// [`poison()`]: Self::poison
  #[inline]
  pub fn is_poisoned(&self) -> bool {
    self.barrier.poisoned.load(Acquire)
  }

  /// Returns the handle of lane `rank`.
  ///
  /// Each rank must be claimed by exactly one thread, and every lane must take
  /// part in every collective.
  ///
  /// # Panics
  ///
  /// Panics if `rank` is not below [`lanes()`].
  ///
  /// [`lanes()`]: Self::lanes
  #[inline]
  pub fn lane(&self, rank: u32) -> ThreadTile<'_> {
    assert!(rank < self.lanes(), "lane rank out of range");

    ThreadTile {
      scratch: self,
      rank,
      epoch: Cell::new(0),
    }
  }
}

impl Debug for TileScratch {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TileScratch")
      .field("lanes", &self.lanes())
      .field("poisoned", &self.is_poisoned())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Thread Tile
// -----------------------------------------------------------------------------

/// One lane of a tile whose lanes are threads.
///
/// Collectives block until every lane of the tile has arrived, and panic if
/// the tile is [poisoned](TileScratch::poison) before they do.
pub struct ThreadTile<'scratch> {
  scratch: &'scratch TileScratch,
  rank: u32,
  epoch: Cell<usize>,
}

impl ThreadTile<'_> {
  /// Advances to the next collective and returns the buffer it uses.
  #[inline]
  fn begin(&self) -> usize {
    let epoch: usize = self.epoch.get();
    self.epoch.set(epoch.wrapping_add(1));
    epoch % BUFFERS
  }

  /// Clears the vote word of the previous collective.
  ///
  /// Every lane finished reading it before arriving at the barrier this lane
  /// just passed, and no lane writes it again before the next barrier, which
  /// lane zero only reaches after the store below.
  #[inline]
  fn recycle(&self, buffer: usize) {
    if self.rank == 0 {
      let stale: usize = (buffer + BUFFERS - 1) % BUFFERS;
      self.scratch.votes[stale].store(0, Relaxed);
    }
  }
}

impl Tile for ThreadTile<'_> {
  #[inline]
  fn rank(&self) -> u32 {
    self.rank
  }

  #[inline]
  fn size(&self) -> u32 {
    self.scratch.lanes()
  }

  fn ballot(&self, predicate: bool) -> u32 {
    let buffer: usize = self.begin();

    if predicate {
      self.scratch.votes[buffer].fetch_or(1 << self.rank, Relaxed);
    }

    self.scratch.barrier.wait();

    let mask: u32 = self.scratch.votes[buffer].load(Relaxed);

    self.recycle(buffer);

    mask
  }

  fn shfl(&self, value: usize, src: u32) -> usize {
    debug_assert!(src < self.size(), "shfl from a lane outside the tile");

    let buffer: usize = self.begin();

    if self.rank == src {
      self.scratch.words[buffer].store(value, Relaxed);
    }

    self.scratch.barrier.wait();

    let value: usize = self.scratch.words[buffer].load(Relaxed);

    self.recycle(buffer);

    value
  }
}

impl Debug for ThreadTile<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("ThreadTile")
      .field("rank", &self.rank)
      .field("lanes", &self.size())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Tile Barrier
// -----------------------------------------------------------------------------

/// A reusable spin barrier over a generation counter.
///
/// Waiters panic once the barrier is poisoned.
struct TileBarrier {
  arrived: CachePadded<AtomicU32>,
  generation: CachePadded<AtomicUsize>,
  poisoned: AtomicBool,
  lanes: u32,
}

impl TileBarrier {
  fn new(lanes: u32) -> Self {
    Self {
      arrived: CachePadded::new(AtomicU32::new(0)),
      generation: CachePadded::new(AtomicUsize::new(0)),
      poisoned: AtomicBool::new(false),
      lanes,
    }
  }

  /// # Panics
  ///
  /// Panics if the barrier is poisoned while waiting.
  fn wait(&self) {
    let generation: usize = self.generation.load(Acquire);

    if self.arrived.fetch_add(1, AcqRel) + 1 == self.lanes {
      self.arrived.store(0, Relaxed);
      self.generation.store(generation.wrapping_add(1), Release);
      return;
    }

    let backoff: Backoff = Backoff::new();

    while self.generation.load(Acquire) == generation {
      assert!(!self.poisoned.load(Acquire), "another lane of the tile panicked");
      backoff.snooze();
    }
  }
}
