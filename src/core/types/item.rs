use dyn_clone::DynClone;
use std::any::Any;
use std::fmt::Debug;

/// Values that can travel inside a [`Term`].
///
/// Implemented automatically for every `'static` type that is
/// `Debug + Clone + PartialEq + Send + Sync`.
///
/// [`Term`]: crate::core::Term
pub trait Item: Any + Debug + DynClone + Send + Sync + 'static {
  /// Returns a shared reference to this value as [`Any`].
  fn as_any(&self) -> &(dyn Any + Send + Sync);

  /// Converts this value into a boxed [`Any`] trait object.
  fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

  /// Returns `true` if `other` has the same type and compares equal.
  fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl PartialEq for dyn Item {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.dyn_eq(other.as_any())
  }
}

impl<T> Item for T
where
  T: Any + Debug + DynClone + Send + Sync + 'static,
  T: PartialEq,
{
  #[inline]
  fn as_any(&self) -> &(dyn Any + Send + Sync) {
    self
  }

  #[inline]
  fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
    self
  }

  #[inline]
  fn dyn_eq(&self, other: &dyn Any) -> bool {
    other
      .downcast_ref::<T>()
      .is_some_and(|other| PartialEq::eq(self, other))
  }
}
