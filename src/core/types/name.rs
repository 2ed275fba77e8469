use std::borrow::Borrow;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use std::sync::Arc;

/// Registered process name.
///
/// Names are cheap to clone and compare by content.
///
/// # Examples
///
/// ```
/// use swarm::core::Name;
///
/// let name = Name::new("logger");
///
/// assert_eq!(name.as_str(), "logger");
/// assert_eq!(name, Name::from("logger"));
/// ```
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Name {
  data: Arc<str>,
}

impl Name {
  /// Creates a new name.
  #[inline]
  pub fn new(data: &str) -> Self {
    Self {
      data: Arc::from(data),
    }
  }

  /// Returns the name as a string slice.
  #[inline]
  pub fn as_str(&self) -> &str {
    &self.data
  }
}

impl Borrow<str> for Name {
  #[inline]
  fn borrow(&self) -> &str {
    &self.data
  }
}

impl Debug for Name {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&*self.data, f)
  }
}

impl Display for Name {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(&*self.data, f)
  }
}

impl From<&str> for Name {
  #[inline]
  fn from(other: &str) -> Self {
    Self::new(other)
  }
}

impl From<String> for Name {
  #[inline]
  fn from(other: String) -> Self {
    Self {
      data: Arc::from(other),
    }
  }
}
