use core::any;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::mem;
use core::num::NonZeroU32;

use crossbeam_utils::CachePadded;

// -----------------------------------------------------------------------------
// Cache-line Properties
// -----------------------------------------------------------------------------

/// The size of a cache line in bytes.
///
/// The slot array is aligned to this boundary so that a probe window never
/// straddles more cache lines than necessary.
pub const CACHE_LINE: usize = size_of::<CachePadded<u8>>();

const _: () = assert!(
  CACHE_LINE.is_power_of_two(),
  "invalid params: `CACHE_LINE` must be a power of two",
);

// -----------------------------------------------------------------------------
// Configurable Params
// -----------------------------------------------------------------------------

/// Launch configuration for an [`HTab`].
///
/// Selects, at compile time, how many lanes cooperate on a single key during
/// bulk operations. The simplest approach is [`ConstParams`]:
///
/// ```no_run
/// use htab::{ConstParams, HTab};
///
/// type MyTable = HTab<u64, u64, ConstParams<4, 2>>;
/// ```
///
/// # Implementing `Params`
///
/// ```no_run
/// use htab::{HTab, Params, TileSize};
///
/// struct WideInsert;
///
/// impl Params for WideInsert {
///   const INSERT_TILE: TileSize = TileSize::new(16);
/// }
///
/// let table: HTab<u32, u32, WideInsert> = HTab::new(1024, u32::MAX, u32::MAX);
/// ```
///
/// [`TileSize::new`] clamps values to the valid range and rounds up to the
/// nearest power of two.
///
/// [`HTab`]: crate::public::HTab
pub trait Params {
  /// The number of lanes probing together for one key during bulk insertion.
  const INSERT_TILE: TileSize = DefaultParams::INSERT_TILE;

  /// The number of lanes probing together for one key during bulk `find` and
  /// `contains`.
  const LOOKUP_TILE: TileSize = DefaultParams::LOOKUP_TILE;
}

// -----------------------------------------------------------------------------
// Configurable Params - Extensions
// -----------------------------------------------------------------------------

/// Derived parameters computed from [`Params`].
///
/// Automatically implemented for all [`Params`] types.
///
/// # Example
///
/// ```no_run
/// use htab::{ConstParams, ParamsExt};
///
/// println!("{:#?}", <ConstParams<8, 4> as ParamsExt>::debug());
/// ```
pub trait ParamsExt: Params + Sealed {
  const INSERT_LANES: u32 = Self::INSERT_TILE.as_u32();
  const LOOKUP_LANES: u32 = Self::LOOKUP_TILE.as_u32();
  const INSERT_MASK: u32 = Self::INSERT_TILE.lane_mask();
  const LOOKUP_MASK: u32 = Self::LOOKUP_TILE.lane_mask();

  #[inline]
  fn debug() -> DebugParams<Self> {
    DebugParams {
      marker: PhantomData,
    }
  }
}

// -----------------------------------------------------------------------------
// Debug Params
// -----------------------------------------------------------------------------

/// A helper type for displaying [`Params`] configuration.
///
/// Returned by [`ParamsExt::debug`]; implements [`Debug`] to show all derived
/// configuration values.
#[derive(Clone, Copy)]
pub struct DebugParams<P>
where
  P: ?Sized,
{
  marker: PhantomData<fn(P)>,
}

impl<P> Debug for DebugParams<P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct(any::type_name::<P>())
      .field("INSERT_TILE", &P::INSERT_TILE)
      .field("LOOKUP_TILE", &P::LOOKUP_TILE)
      .field("INSERT_MASK", &format_args!("{:0>32b}", P::INSERT_MASK))
      .field("LOOKUP_MASK", &format_args!("{:0>32b}", P::LOOKUP_MASK))
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Default Params
// -----------------------------------------------------------------------------

/// The default launch configuration.
///
/// Inserts run on tiles of 8 lanes; `find` and `contains` run on tiles of 4.
#[derive(Clone, Copy)]
#[non_exhaustive]
pub struct DefaultParams;

impl Debug for DefaultParams {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(&<Self as ParamsExt>::debug(), f)
  }
}

impl Params for DefaultParams {
  const INSERT_TILE: TileSize = TileSize::new(8);
  const LOOKUP_TILE: TileSize = TileSize::new(4);
}

// -----------------------------------------------------------------------------
// Single-lane Params
// -----------------------------------------------------------------------------

/// A launch configuration where every key is handled by a single lane.
///
/// Bulk calls skip all tile coordination and run the single-lane protocols.
///
/// ```no_run
/// use htab::{HTab, SingleLane};
///
/// let table: HTab<i64, i64, SingleLane> = HTab::new(64, -1, -1);
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub struct SingleLane;

impl Params for SingleLane {
  const INSERT_TILE: TileSize = TileSize::ONE;
  const LOOKUP_TILE: TileSize = TileSize::ONE;
}

// -----------------------------------------------------------------------------
// Const-Generic Params
// -----------------------------------------------------------------------------

/// A [`Params`] implementation with compile-time configurable tile sizes.
///
/// `I` is the insert tile size and `L` the lookup tile size. Both are rounded
/// up to the nearest power of two and clamped to
/// <code>[TileSize::ONE]..=[TileSize::MAX]</code>.
///
/// # Examples
///
/// ```no_run
/// use htab::{ConstParams, HTab, Params, TileSize};
///
/// assert_eq!(<ConstParams<3, 1> as Params>::INSERT_TILE, TileSize::new(4));
///
/// let table: HTab<u32, u32, ConstParams<4, 4>> = HTab::new(256, 0, 0);
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConstParams<const I: usize, const L: usize>;

impl<const I: usize, const L: usize> Params for ConstParams<I, L> {
  const INSERT_TILE: TileSize = TileSize::new(I);
  const LOOKUP_TILE: TileSize = TileSize::new(L);
}

// -----------------------------------------------------------------------------
// Auto-implement Derive
// -----------------------------------------------------------------------------

mod private {
  pub trait Sealed {}
}

use private::Sealed;

impl<P> Sealed for P where P: Params + ?Sized {}
impl<P> ParamsExt for P where P: Params + ?Sized {}

// -----------------------------------------------------------------------------
// Tile Size
// -----------------------------------------------------------------------------

/// A validated tile size.
///
/// Represents a power-of-two lane count in the range <code>[ONE]..=[MAX]</code>.
/// The upper bound is the width of a ballot mask.
///
/// # Construction
///
/// ```no_run
/// use htab::TileSize;
///
/// // Exact power of two
/// assert_eq!(TileSize::new(8).as_usize(), 8);
///
/// // Rounded up
/// assert_eq!(TileSize::new(5).as_usize(), 8);
///
/// // Clamped to minimum
/// assert_eq!(TileSize::new(0), TileSize::ONE);
///
/// // Clamped to maximum
/// assert_eq!(TileSize::new(1000), TileSize::MAX);
/// ```
///
/// [ONE]: Self::ONE
/// [MAX]: Self::MAX
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct TileSize(TileSizeEnum);

impl TileSize {
  /// A single lane; no cooperation.
  pub const ONE: Self = Self(TileSizeEnum::_Lanes1);

  /// The widest supported tile (32 lanes).
  pub const MAX: Self = Self(TileSizeEnum::_Lanes32);

  /// Creates a new [`TileSize`] from an arbitrary value.
  ///
  /// Rounds up to the nearest power of two and clamps to
  /// <code>[ONE]..=[MAX]</code>.
  ///
  /// [ONE]: Self::ONE
  /// [MAX]: Self::MAX
  #[inline]
  pub const fn new(value: usize) -> Self {
    let Some(lanes) = value.checked_next_power_of_two() else {
      return Self::MAX;
    };

    if lanes > Self::MAX.as_usize() {
      Self::MAX
    } else {
      // SAFETY: `next_power_of_two` never yields zero and `lanes` is at most
      // `Self::MAX`, so it names a declared variant.
      unsafe { Self::new_unchecked(lanes) }
    }
  }

  /// Creates a new [`TileSize`] without validation.
  ///
  /// # Safety
  ///
  /// `value` must be a power of two in <code>[ONE]..=[MAX]</code>.
  ///
  /// [ONE]: Self::ONE
  /// [MAX]: Self::MAX
  #[inline]
  pub const unsafe fn new_unchecked(value: usize) -> Self {
    // SAFETY: Caller guarantees `value` is a valid `TileSize`.
    unsafe { mem::transmute::<usize, Self>(value) }
  }

  /// Returns the lane count as a [`usize`].
  #[inline]
  pub const fn as_usize(self) -> usize {
    self.0 as usize
  }

  /// Returns the lane count as a [`u32`].
  #[inline]
  pub const fn as_u32(self) -> u32 {
    self.0 as u32
  }

  /// Returns the lane count as a [`NonZeroU32`].
  #[inline]
  pub const fn as_nonzero(self) -> NonZeroU32 {
    match NonZeroU32::new(self.as_u32()) {
      Some(lanes) => lanes,
      None => unreachable!(),
    }
  }

  /// Returns `true` if this tile has more than one lane.
  #[inline]
  pub const fn is_cooperative(self) -> bool {
    self.as_u32() > 1
  }

  /// Returns a ballot mask with one bit set per lane.
  ///
  /// # Examples
  ///
  /// ```no_run
  /// use htab::TileSize;
  ///
  /// assert_eq!(TileSize::new(4).lane_mask(), 0b1111);
  /// assert_eq!(TileSize::MAX.lane_mask(), u32::MAX);
  /// ```
  #[inline]
  pub const fn lane_mask(self) -> u32 {
    u32::MAX >> (u32::BITS - self.as_u32())
  }
}

impl Debug for TileSize {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{:?} (1 << {:?})", self.as_u32(), self.as_u32().trailing_zeros())
  }
}

impl Default for TileSize {
  #[inline]
  fn default() -> Self {
    Self::ONE
  }
}

impl From<TileSize> for usize {
  #[inline]
  fn from(other: TileSize) -> Self {
    other.as_usize()
  }
}

impl From<TileSize> for u32 {
  #[inline]
  fn from(other: TileSize) -> Self {
    other.as_u32()
  }
}

#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
enum TileSizeEnum {
  _Lanes1 = 1 << 0,
  _Lanes2 = 1 << 1,
  _Lanes4 = 1 << 2,
  _Lanes8 = 1 << 3,
  _Lanes16 = 1 << 4,
  _Lanes32 = 1 << 5,
}
