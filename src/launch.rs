//! The scoped worker pool driving bulk operations.
//!
//! A bulk call is a [`Kernel`] applied to every item of a batch. Single-lane
//! kernels run as a rayon parallel iterator over the batch. Cooperative
//! kernels run on scoped threads grouped into tiles; each tile claims one item
//! at a time from a shared cursor and runs the kernel on it with all of its
//! lanes. Every lane of a tile spins in its collectives until the others
//! arrive, so the lanes must run at the same time, which a rayon pool does not
//! promise. The call returns once every item is done.
//!
//! Under `loom` and `shuttle` the pool is replaced by a sequential loop over
//! a [`Solo`] tile. The model tests exercise the protocols directly.

use core::marker::PhantomData;
use core::num::NonZeroUsize;

use crate::params::TileSize;
use crate::tile::Solo;
use crate::tile::Tile;

#[cfg(not(any(loom, shuttle)))]
use std::thread;

#[cfg(not(any(loom, shuttle)))]
use rayon::prelude::*;

#[cfg(not(any(loom, shuttle)))]
use crate::sync::atomic::AtomicUsize;
#[cfg(not(any(loom, shuttle)))]
use crate::sync::atomic::Ordering::Relaxed;
#[cfg(not(any(loom, shuttle)))]
use crate::tile::TileScratch;

/// The smallest number of elements a sweep hands to one worker.
const SWEEP_CHUNK: usize = 4096;

// -----------------------------------------------------------------------------
// Kernel
// -----------------------------------------------------------------------------

/// Per-item work of a bulk call.
pub(crate) trait Kernel: Sync {
  /// Processes item `index` on `tile`.
  ///
  /// Every lane of the tile calls this with the same `index`.
  fn run<T>(&self, tile: &T, index: usize)
  where
    T: Tile;
}

/// Returns the number of workers used when none is configured.
pub(crate) fn default_workers() -> NonZeroUsize {
  #[cfg(not(any(loom, shuttle)))]
  {
    NonZeroUsize::new(rayon::current_num_threads()).unwrap_or(NonZeroUsize::MIN)
  }

  #[cfg(any(loom, shuttle))]
  {
    NonZeroUsize::MIN
  }
}

// -----------------------------------------------------------------------------
// Launch
// -----------------------------------------------------------------------------

/// Runs `kernel` on every index in `0..items` and blocks until all are done.
///
/// Single-lane kernels are split into at most `workers` rayon jobs. Otherwise
/// workers form `max(1, workers / lanes)` tiles of `lanes` threads each, never
/// more tiles than items. A tile is never split, so a tile wider than
/// `workers` still gets all of its lanes.
#[cfg(not(any(loom, shuttle)))]
pub(crate) fn launch<K>(kernel: &K, items: usize, lanes: TileSize, workers: NonZeroUsize)
where
  K: Kernel,
{
  if items == 0 {
    return;
  }

  if !lanes.is_cooperative() {
    let jobs: usize = workers.get().min(items);

    tracing::trace!(items, lanes = 1, jobs, "launch");

    if jobs == 1 {
      (0..items).for_each(|index| kernel.run(&Solo, index));
      return;
    }

    (0..items)
      .into_par_iter()
      .with_min_len(items.div_ceil(jobs))
      .for_each(|index| kernel.run(&Solo, index));

    return;
  }

  let groups: usize = (workers.get() / lanes.as_usize()).clamp(1, items);

  tracing::trace!(items, lanes = lanes.as_u32(), groups, "launch");

  let cursor: AtomicUsize = AtomicUsize::new(0);

  let scratches: Vec<TileScratch> = (0..groups).map(|_| TileScratch::new(lanes)).collect();

  thread::scope(|scope| {
    for scratch in &scratches {
      for rank in 0..lanes.as_u32() {
        let cursor: &AtomicUsize = &cursor;

        scope.spawn(move || {
          let _guard: PoisonGuard<'_> = PoisonGuard { scratch };
          drive(kernel, &scratch.lane(rank), cursor, items);
        });
      }
    }
  });
}

#[cfg(any(loom, shuttle))]
pub(crate) fn launch<K>(kernel: &K, items: usize, lanes: TileSize, workers: NonZeroUsize)
where
  K: Kernel,
{
  tracing::trace!(items, lanes = lanes.as_u32(), workers = workers.get(), "launch (sequential)");

  for index in 0..items {
    kernel.run(&Solo, index);
  }
}

/// Poisons a tile when one of its lanes unwinds, so the remaining lanes panic
/// out of their collectives and the scope can join them.
#[cfg(not(any(loom, shuttle)))]
struct PoisonGuard<'scratch> {
  scratch: &'scratch TileScratch,
}

#[cfg(not(any(loom, shuttle)))]
impl Drop for PoisonGuard<'_> {
  fn drop(&mut self) {
    if thread::panicking() {
      self.scratch.poison();
    }
  }
}

/// Claims items for `tile` until the cursor runs past `items`.
///
/// Lane zero claims and broadcasts, so every lane sees the same index and the
/// whole tile leaves the loop together.
#[cfg(not(any(loom, shuttle)))]
fn drive<K, T>(kernel: &K, tile: &T, cursor: &AtomicUsize, items: usize)
where
  K: Kernel,
  T: Tile,
{
  loop {
    let claimed: usize = if tile.rank() == 0 {
      cursor.fetch_add(1, Relaxed)
    } else {
      0
    };

    let index: usize = tile.shfl(claimed, 0);

    if index >= items {
      break;
    }

    kernel.run(tile, index);
  }
}

// -----------------------------------------------------------------------------
// Sweep
// -----------------------------------------------------------------------------

/// Applies `init` to every element of `slice`, splitting it into contiguous
/// chunks handed to up to `workers` rayon jobs.
///
/// Slices of at most one chunk are handled on the calling thread.
pub(crate) fn sweep<T, F>(slice: &mut [T], workers: NonZeroUsize, init: F)
where
  T: Send,
  F: Fn(&mut T) + Sync,
{
  let chunk: usize = slice.len().div_ceil(workers.get()).max(SWEEP_CHUNK);

  if slice.len() <= chunk {
    tracing::trace!(len = slice.len(), chunk, "sweep inline");
    slice.iter_mut().for_each(init);
    return;
  }

  sweep_chunks(slice, chunk, &init);
}

#[cfg(not(any(loom, shuttle)))]
fn sweep_chunks<T, F>(slice: &mut [T], chunk: usize, init: &F)
where
  T: Send,
  F: Fn(&mut T) + Sync,
{
  slice
    .par_chunks_mut(chunk)
    .for_each(|part| part.iter_mut().for_each(init));
}

#[cfg(any(loom, shuttle))]
fn sweep_chunks<T, F>(slice: &mut [T], _chunk: usize, init: &F)
where
  T: Send,
  F: Fn(&mut T) + Sync,
{
  slice.iter_mut().for_each(init);
}

// -----------------------------------------------------------------------------
// Scatter
// -----------------------------------------------------------------------------

/// Shared write access to distinct positions of an output slice.
///
/// Kernels write their result for item `i` to position `i`. Exactly one lane
/// of exactly one tile handles each item, so no position is written twice.
pub(crate) struct Scatter<'out, T> {
  base: *mut T,
  len: usize,
  marker: PhantomData<&'out mut [T]>,
}

impl<'out, T> Scatter<'out, T>
where
  T: Copy,
{
  #[inline]
  pub(crate) fn new(slice: &'out mut [T]) -> Self {
    Self {
      base: slice.as_mut_ptr(),
      len: slice.len(),
      marker: PhantomData,
    }
  }

  /// Writes `value` at `index`.
  ///
  /// # Panics
  ///
  /// Panics if `index` is out of bounds.
  ///
  /// # Safety
  ///
  /// No other thread may access position `index` while this `Scatter` lives.
  #[inline]
  pub(crate) unsafe fn write(&self, index: usize, value: T) {
    assert!(index < self.len, "scatter index out of bounds");

    // SAFETY: In bounds per the assertion; exclusive per the caller.
    unsafe {
      self.base.add(index).write(value);
    }
  }
}

// SAFETY: A `Scatter` is a `&mut [T]` split across threads by position.
unsafe impl<T> Send for Scatter<'_, T> where T: Send {}

// SAFETY: Concurrent writes target disjoint positions per `write`'s contract.
unsafe impl<T> Sync for Scatter<'_, T> where T: Send {}
