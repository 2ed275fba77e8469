use dyn_clone::clone_box;
use std::any::Any;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::core::Item;

/// Opaque message payload.
///
/// A `Term` owns a boxed [`Item`]; the runtime never inspects it. Receivers
/// recover the concrete value with [`downcast_ref`] or [`downcast`].
///
/// # Examples
///
/// ```
/// use swarm::core::Term;
///
/// let term = Term::new(vec![1, 2, 3]);
///
/// assert!(term.is::<Vec<i32>>());
/// assert_eq!(term.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
/// assert_eq!(term.downcast_ref::<String>(), None);
///
/// let data: Box<Vec<i32>> = term.downcast().unwrap();
/// assert_eq!(*data, [1, 2, 3]);
/// ```
///
/// [`downcast_ref`]: Self::downcast_ref
/// [`downcast`]: Self::downcast
#[repr(transparent)]
pub struct Term {
  data: Box<dyn Item>,
}

impl Term {
  /// Creates a new term wrapping the given value.
  #[inline]
  pub fn new<T>(data: T) -> Self
  where
    T: Item,
  {
    Self {
      data: Box::new(data),
    }
  }

  /// Returns `true` if the contained value is of type `T`.
  #[inline]
  pub fn is<T>(&self) -> bool
  where
    T: 'static,
  {
    self.data.as_any().is::<T>()
  }

  /// Returns a shared reference to the contained value of type `T`.
  #[inline]
  pub fn downcast_ref<T>(&self) -> Option<&T>
  where
    T: 'static,
  {
    self.data.as_any().downcast_ref()
  }

  /// Extracts the contained value of type `T`.
  ///
  /// # Errors
  ///
  /// Returns the term unchanged if it holds a different type.
  #[inline]
  pub fn downcast<T>(self) -> std::result::Result<Box<T>, Self>
  where
    T: 'static,
  {
    if !self.is::<T>() {
      return Err(self);
    }

    match self.data.into_any().downcast::<T>() {
      Ok(data) => Ok(data),
      Err(_) => unreachable!("type checked above"),
    }
  }

  /// Creates a term describing a panic payload.
  pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
    if let Some(message) = payload.downcast_ref::<&str>() {
      Self::new((*message).to_owned())
    } else if let Some(message) = payload.downcast_ref::<String>() {
      Self::new(message.clone())
    } else if let Some(exception) = payload.downcast_ref::<crate::core::Exception>() {
      Self::new(exception.to_string())
    } else {
      Self::new(String::from("unknown panic"))
    }
  }
}

impl Clone for Term {
  #[inline]
  fn clone(&self) -> Self {
    Self {
      data: clone_box(&*self.data),
    }
  }
}

impl PartialEq for Term {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    *self.data == *other.data
  }
}

impl Debug for Term {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&*self.data, f)
  }
}

impl Display for Term {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&*self.data, f)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::any::Any;

  use crate::core::Term;

  #[test]
  fn test_downcast_mismatch_returns_term() {
    let term: Term = Term::new(5_u8);
    let term: Term = term.downcast::<u16>().unwrap_err();

    assert_eq!(term.downcast_ref::<u8>(), Some(&5));
  }

  #[test]
  fn test_eq_requires_same_type() {
    assert_eq!(Term::new(1_i32), Term::new(1_i32));
    assert_ne!(Term::new(1_i32), Term::new(1_i64));
    assert_ne!(Term::new(1_i32), Term::new(2_i32));
  }

  #[test]
  fn test_clone_is_deep() {
    let term: Term = Term::new(String::from("hello"));
    let copy: Term = term.clone();

    drop(term);

    assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("hello"));
  }

  #[test]
  fn test_from_panic() {
    let payload: Box<dyn Any + Send> = Box::new("boom");
    let term: Term = Term::from_panic(&*payload);

    assert_eq!(term.downcast_ref::<String>().map(String::as_str), Some("boom"));

    let payload: Box<dyn Any + Send> = Box::new(17_u32);
    let term: Term = Term::from_panic(&*payload);

    assert_eq!(
      term.downcast_ref::<String>().map(String::as_str),
      Some("unknown panic"),
    );
  }
}
