//! Cache-aligned array allocation.
//!
//! Provides [`Array`], the backing storage for table slots.

use core::marker::PhantomData;
use core::mem;
use core::mem::ManuallyDrop;
use core::mem::MaybeUninit;
use core::num::NonZeroUsize;
use core::ptr;
use core::ptr::NonNull;
use core::slice;

use crate::alloc::Layout;
use crate::alloc::alloc;
use crate::alloc::dealloc;
use crate::error::Error;
use crate::params::CACHE_LINE;

/// A fixed-size array with cache-line-aligned allocation.
///
/// The length is chosen at runtime and never changes afterwards.
pub(crate) struct Array<T> {
  nonnull: NonNull<T>,
  length: NonZeroUsize,
  phantom: PhantomData<T>,
}

impl<T> Array<T> {
  /// Returns the layout of an array holding `length` elements.
  #[inline]
  pub(crate) fn layout(length: NonZeroUsize) -> Result<Layout, Error> {
    let overflow = || Error::CapacityOverflow {
      capacity: length.get(),
    };

    let layout: Layout = Layout::array::<T>(length.get()).map_err(|_| overflow())?;
    let layout: Layout = layout.align_to(CACHE_LINE).map_err(|_| overflow())?;

    if layout.size() == 0 {
      return Err(overflow());
    }

    Ok(layout.pad_to_align())
  }

  /// Creates a new array without initializing its contents.
  #[inline]
  pub(crate) fn try_new_uninit(length: NonZeroUsize) -> Result<Array<MaybeUninit<T>>, Error> {
    let layout: Layout = Self::layout(length)?;

    // SAFETY: `Self::layout` rejects zero-sized layouts.
    let raw: *mut u8 = unsafe { alloc(layout) };

    match NonNull::new(raw.cast()) {
      Some(nonnull) => Ok(Array {
        nonnull,
        length,
        phantom: PhantomData,
      }),
      None => Err(Error::Alloc { layout }),
    }
  }

  /// Returns the number of elements.
  #[inline]
  pub(crate) const fn len(&self) -> usize {
    self.length.get()
  }

  /// Returns a raw pointer to the array.
  #[inline]
  pub(crate) const fn as_ptr(&self) -> *const T {
    self.nonnull.as_ptr()
  }

  #[inline]
  pub(crate) const fn as_slice(&self) -> &[T] {
    // SAFETY: Contiguous allocation of `self.length` initialized elements.
    unsafe { slice::from_raw_parts(self.as_ptr(), self.len()) }
  }

  #[inline]
  pub(crate) const fn as_mut_slice(&mut self) -> &mut [T] {
    // SAFETY: Contiguous allocation of `self.length` initialized elements, and
    // `&mut self` guarantees exclusive access.
    unsafe { slice::from_raw_parts_mut(self.nonnull.as_ptr(), self.len()) }
  }

  /// Returns a reference to the element at `index` without bounds checking.
  ///
  /// # Safety
  ///
  /// `index` must be less than [`len()`].
  ///
  /// [`len()`]: Self::len
  #[inline]
  pub(crate) const unsafe fn get_unchecked(&self, index: usize) -> &T {
    debug_assert!(
      index < self.len(),
      "Array::get_unchecked requires that the index is in bounds",
    );

    // SAFETY: Caller guarantees `index < self.len()`.
    unsafe { self.nonnull.add(index).as_ref() }
  }
}

impl<T> Array<MaybeUninit<T>> {
  /// Converts to an initialized array.
  ///
  /// # Safety
  ///
  /// All elements must be initialized.
  #[inline]
  pub(crate) unsafe fn assume_init(self) -> Array<T> {
    // Prevent drop from running on `self` (would deallocate).
    let this: ManuallyDrop<Self> = ManuallyDrop::new(self);

    Array {
      nonnull: this.nonnull.cast(),
      length: this.length,
      phantom: PhantomData,
    }
  }
}

impl<T> Drop for Array<T> {
  fn drop(&mut self) {
    if mem::needs_drop::<T>() {
      // SAFETY: Elements are initialized and never accessed again.
      unsafe {
        ptr::drop_in_place(self.as_mut_slice());
      }
    }

    // SAFETY: `Self::layout` succeeded for `self.length` when allocating.
    let layout: Layout = unsafe { Self::layout(self.length).unwrap_unchecked() };

    // SAFETY: Allocated with `layout` in `try_new_uninit`.
    unsafe {
      dealloc(self.nonnull.cast().as_ptr(), layout);
    }
  }
}

// SAFETY: `Array<T>` owns its elements like a `Box<[T]>`.
unsafe impl<T> Send for Array<T> where T: Send {}

// SAFETY: Shared access only hands out `&T`.
unsafe impl<T> Sync for Array<T> where T: Sync {}
