#[cfg(all(loom, shuttle))]
compile_error!("cannot use loom and shuttle at once");

#[cfg(loom)]
pub(crate) mod alloc {
  pub(crate) use ::loom::alloc::Layout;
  pub(crate) use ::loom::alloc::alloc;
  pub(crate) use ::loom::alloc::dealloc;
  pub(crate) use ::std::alloc::handle_alloc_error;
}

#[cfg(not(loom))]
pub(crate) mod alloc {
  pub(crate) use ::std::alloc::Layout;
  pub(crate) use ::std::alloc::alloc;
  pub(crate) use ::std::alloc::dealloc;
  pub(crate) use ::std::alloc::handle_alloc_error;
}

#[cfg(not(any(loom, shuttle)))]
pub(crate) mod sync {
  pub(crate) use ::crossbeam_utils::Backoff;

  pub(crate) mod atomic {
    pub(crate) use ::core::sync::atomic::AtomicBool;
    pub(crate) use ::core::sync::atomic::AtomicI32;
    pub(crate) use ::core::sync::atomic::AtomicI64;
    pub(crate) use ::core::sync::atomic::AtomicIsize;
    pub(crate) use ::core::sync::atomic::AtomicU32;
    pub(crate) use ::core::sync::atomic::AtomicU64;
    pub(crate) use ::core::sync::atomic::AtomicUsize;
    pub(crate) use ::core::sync::atomic::Ordering;
  }
}

#[cfg(loom)]
pub(crate) mod sync {
  /// Yields to the model scheduler on every snooze; loom must observe each
  /// iteration of a spin loop to explore it.
  pub(crate) struct Backoff;

  impl Backoff {
    #[inline]
    pub(crate) fn new() -> Self {
      Self
    }

    #[inline]
    pub(crate) fn snooze(&self) {
      ::loom::thread::yield_now();
    }
  }

  pub(crate) mod atomic {
    pub(crate) use ::loom::sync::atomic::AtomicBool;
    pub(crate) use ::loom::sync::atomic::AtomicI32;
    pub(crate) use ::loom::sync::atomic::AtomicI64;
    pub(crate) use ::loom::sync::atomic::AtomicIsize;
    pub(crate) use ::loom::sync::atomic::AtomicU32;
    pub(crate) use ::loom::sync::atomic::AtomicU64;
    pub(crate) use ::loom::sync::atomic::AtomicUsize;
    pub(crate) use ::loom::sync::atomic::Ordering;
  }
}

#[cfg(shuttle)]
pub(crate) mod sync {
  /// Yields to the shuttle scheduler on every snooze.
  pub(crate) struct Backoff;

  impl Backoff {
    #[inline]
    pub(crate) fn new() -> Self {
      Self
    }

    #[inline]
    pub(crate) fn snooze(&self) {
      ::shuttle::thread::yield_now();
    }
  }

  pub(crate) mod atomic {
    pub(crate) use ::shuttle::sync::atomic::AtomicBool;
    pub(crate) use ::shuttle::sync::atomic::AtomicI32;
    pub(crate) use ::shuttle::sync::atomic::AtomicI64;
    pub(crate) use ::shuttle::sync::atomic::AtomicIsize;
    pub(crate) use ::shuttle::sync::atomic::AtomicU32;
    pub(crate) use ::shuttle::sync::atomic::AtomicU64;
    pub(crate) use ::shuttle::sync::atomic::AtomicUsize;
    pub(crate) use ::shuttle::sync::atomic::Ordering;
  }
}
