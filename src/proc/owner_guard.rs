use std::cell::UnsafeCell;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ops::DerefMut;

/// Guard proving exclusive access to owner-only process state.
///
/// Only the process itself, or its scheduler while the process is not
/// running, may hold one. The invariant `'owner` lifetime and the raw
/// pointer marker keep the guard on the thread that created it.
///
/// A guard must never be held across a suspension point: once the process
/// suspends, its scheduler may create a guard of its own.
pub(crate) struct OwnerGuard<'owner, T> {
  protect: &'owner UnsafeCell<T>,
  phantom: PhantomData<*mut &'owner ()>,
}

impl<'owner, T> OwnerGuard<'owner, T> {
  /// Creates a new guard.
  ///
  /// # Safety
  ///
  /// The caller must guarantee no other guard for `protect` exists and that
  /// the data is not accessed through any other path while this guard lives.
  #[inline]
  pub(crate) unsafe fn new(protect: &'owner UnsafeCell<T>) -> Self {
    debug_assert!(
      crate::proc::on_worker(),
      "OwnerGuard::new called outside a scheduler thread",
    );

    Self {
      protect,
      phantom: PhantomData,
    }
  }
}

impl<T> Deref for OwnerGuard<'_, T> {
  type Target = T;

  #[inline]
  fn deref(&self) -> &Self::Target {
    // SAFETY: The guard's existence proves exclusive access.
    unsafe { &*self.protect.get() }
  }
}

impl<T> DerefMut for OwnerGuard<'_, T> {
  #[inline]
  fn deref_mut(&mut self) -> &mut Self::Target {
    // SAFETY: The guard's existence proves exclusive access, and `&mut self`
    //         prevents aliasing through this guard.
    unsafe { &mut *self.protect.get() }
  }
}

impl<T> Debug for OwnerGuard<'_, T>
where
  T: Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&**self, f)
  }
}
