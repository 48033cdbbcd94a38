use core::mem::MaybeUninit;
use core::num::NonZeroUsize;

use crate::array::Array;
use crate::error::Error;
use crate::params::CACHE_LINE;

fn filled(length: usize) -> Array<usize> {
  let length: NonZeroUsize = NonZeroUsize::new(length).unwrap();
  let mut uninit: Array<MaybeUninit<usize>> = Array::try_new_uninit(length).unwrap();

  for (index, slot) in uninit.as_mut_slice().iter_mut().enumerate() {
    slot.write(index);
  }

  // SAFETY: Every element was written above.
  unsafe { uninit.assume_init() }
}

#[test]
fn alignment() {
  for length in [1, 3, 64, 1000] {
    let array: Array<usize> = filled(length);

    // TODO: ptr::is_aligned_to once stable
    assert_eq!(array.as_ptr().addr() & (CACHE_LINE - 1), 0);
  }
}

#[test]
fn layout_is_padded_to_cache_line() {
  let layout = Array::<u8>::layout(NonZeroUsize::new(1).unwrap()).unwrap();

  assert_eq!(layout.align(), CACHE_LINE);
  assert_eq!(layout.size(), CACHE_LINE);
}

#[test]
fn layout_overflow() {
  let length: NonZeroUsize = NonZeroUsize::new(usize::MAX).unwrap();

  assert_eq!(
    Array::<u64>::layout(length),
    Err(Error::CapacityOverflow {
      capacity: usize::MAX,
    }),
  );
}

#[test]
fn slice_representation() {
  let mut array: Array<usize> = filled(64);

  assert_eq!(array.len(), 64);
  assert_eq!(array.as_slice().len(), 64);
  assert_eq!(array.as_mut_slice().len(), 64);

  for (index, value) in array.as_slice().iter().enumerate() {
    assert_eq!(*value, index);
  }

  for value in array.as_mut_slice() {
    *value += 1;
  }

  for (index, value) in array.as_slice().iter().enumerate() {
    assert_eq!(*value, index + 1);
  }
}

#[test]
fn drops_elements() {
  use std::sync::Arc;

  let marker: Arc<()> = Arc::new(());
  let length: NonZeroUsize = NonZeroUsize::new(8).unwrap();
  let mut uninit: Array<MaybeUninit<Arc<()>>> = Array::try_new_uninit(length).unwrap();

  for slot in uninit.as_mut_slice() {
    slot.write(Arc::clone(&marker));
  }

  // SAFETY: Every element was written above.
  let array: Array<Arc<()>> = unsafe { uninit.assume_init() };

  assert_eq!(Arc::strong_count(&marker), 9);
  drop(array);
  assert_eq!(Arc::strong_count(&marker), 1);
}
