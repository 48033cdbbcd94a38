//! A fixed-capacity, lock-free concurrent hash table with bulk operations.
//!
//! `htab` provides [`HTab`], an open-addressing table mapping integer keys to
//! integer values. Its capacity is chosen once at construction and never
//! changes. Batches of keys are inserted and looked up by a pool of worker
//! threads that probe the table concurrently without locks.
//!
//! # Overview
//!
//! Every slot is a pair of independent atomic cells. Two reserved values, the
//! empty key sentinel and the empty value sentinel, mark a slot as unused; a
//! slot is claimed with a compare-and-swap on its key and then never released.
//! Collisions are resolved by linear probing.
//!
//! Keys are processed by *tiles*: groups of lanes that inspect a window of
//! consecutive slots together and agree on where a key lives through
//! [`ballot`] and [`shfl`] collectives. A tile of one lane runs the plain
//! single-lane protocols.
//!
//! # Usage
//!
//! ```
//! use htab::{DefaultKeyEqual, HTab, IdentityHash};
//!
//! // Sixteen slots; -1 marks empty keys and unwritten values.
//! let mut table: HTab<i32, i32> = HTab::new(16, -1, -1);
//!
//! // Insert a batch and learn how many keys were new.
//! let pairs: Vec<(i32, i32)> = (0..8).map(|key| (key, key)).collect();
//! assert_eq!(table.insert(&pairs, &IdentityHash, &DefaultKeyEqual), 8);
//!
//! // Look a batch up; results come back in input order.
//! let found = table.find(&[1, 2, 3, 9], &IdentityHash, &DefaultKeyEqual);
//! assert_eq!(found, vec![Some(1), Some(2), Some(3), None]);
//!
//! let present = table.contains(&[0, 8], &IdentityHash, &DefaultKeyEqual);
//! assert_eq!(present, vec![true, false]);
//! ```
//!
//! # Configuration
//!
//! Tile widths are configured at compile time through the [`Params`] trait.
//! The default configuration ([`DefaultParams`]) inserts with 8 lanes per key
//! and looks up with 4:
//!
//! ```
//! use htab::{ConstParams, DefaultParams, HTab, SingleLane};
//!
//! // These are equivalent:
//! let table1: HTab<u64, u64> = HTab::new(64, u64::MAX, 0);
//! let table2: HTab<u64, u64, DefaultParams> = HTab::new(64, u64::MAX, 0);
//!
//! // Custom tile widths:
//! let table3: HTab<u64, u64, ConstParams<16, 2>> = HTab::new(64, u64::MAX, 0);
//!
//! // No tiles at all:
//! let table4: HTab<u64, u64, SingleLane> = HTab::new(64, u64::MAX, 0);
//! ```
//!
//! The number of worker threads defaults to the size of the global rayon pool
//! and is set with [`HTab::with_workers`].
//!
//! # Concurrency
//!
//! A bulk insert takes `&mut self`, so at most one runs at a time, and never
//! alongside a bulk lookup. Inside a bulk call, all workers share the table.
//!
//! For finer control, [`HTab::view`] returns a [`MapRef`] whose per-key
//! operations may be called from any number of threads at once:
//!
//! ```no_run
//! use std::thread;
//!
//! use htab::{DefaultKeyEqual, HTab, XxHash64};
//!
//! let table: HTab<u64, u64> = HTab::new(4096, u64::MAX, u64::MAX);
//! let view = table.view();
//!
//! thread::scope(|scope| {
//!   for thread_id in 0..4 {
//!     scope.spawn(move || {
//!       for key in 0..256 {
//!         view.insert(thread_id * 1000 + key, key, &XxHash64::new(), &DefaultKeyEqual);
//!       }
//!     });
//!   }
//! });
//! ```
//!
//! A key inserted concurrently with a lookup may be found while its value
//! still reads as the value sentinel; see [`Entry`].
//!
//! # Capacity Limits
//!
//! The table never grows. Inserting a new key into a table with no empty slot
//! left probes forever, so callers must size the table for their data. Bulk
//! inserts emit a `tracing` warning when a batch would push the load factor
//! past [`MAX_LOAD_FACTOR`].
//!
//! [`ballot`]: crate::Tile::ballot
//! [`shfl`]: crate::Tile::shfl
//! [`DefaultParams`]: crate::config::DefaultParams
//! [`Params`]: crate::config::Params
//! [`MAX_LOAD_FACTOR`]: crate::config::MAX_LOAD_FACTOR
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod array;
mod bulk;
mod error;
mod hash;
mod index;
mod insert;
mod launch;
mod lookup;
mod params;
mod probing;
mod public;
mod store;
mod tile;
mod utils;
mod view;
mod word;

pub(crate) use crate::utils::alloc;
pub(crate) use crate::utils::sync;

pub mod implementation {
  #![doc = include_str!("../IMPLEMENTATION.md")]
}

pub mod config {
  //! Configuration parameters which can be used to override the default launch
  //! settings.

  pub use crate::params::CACHE_LINE;
  pub use crate::params::ConstParams;
  pub use crate::params::DebugParams;
  pub use crate::params::DefaultParams;
  pub use crate::params::Params;
  pub use crate::params::ParamsExt;
  pub use crate::params::SingleLane;
  pub use crate::params::TileSize;
  pub use crate::public::MAX_LOAD_FACTOR;
}

#[doc(inline)]
pub use self::config::ConstParams;

#[doc(inline)]
pub use self::config::DefaultParams;

#[doc(inline)]
pub use self::config::Params;

#[doc(inline)]
pub use self::config::ParamsExt;

#[doc(inline)]
pub use self::config::SingleLane;

#[doc(inline)]
pub use self::config::TileSize;

pub use self::error::Error;
pub use self::hash::DefaultKeyEqual;
pub use self::hash::IdentityHash;
pub use self::hash::KeyEqual;
pub use self::hash::KeyHash;
pub use self::hash::XxHash64;
pub use self::index::SlotIndex;
pub use self::public::HTab;
pub use self::store::Entry;
pub use self::tile::Solo;
pub use self::tile::ThreadTile;
pub use self::tile::Tile;
pub use self::tile::TileScratch;
pub use self::view::MapRef;
pub use self::word::Word;

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests;
