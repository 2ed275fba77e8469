use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result;
use std::time::Duration;
use std::time::Instant;

/// Maximum time a receive waits for a matching message.
///
/// [`Timeout::ZERO`] polls the mailbox without blocking and
/// [`Timeout::INFINITY`] waits forever.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Timeout {
  inner: Option<Duration>,
}

impl Timeout {
  /// Do not block.
  pub const ZERO: Self = Self::new(Duration::ZERO);

  /// Block until a matching message arrives.
  pub const INFINITY: Self = Self { inner: None };

  /// Creates a finite timeout.
  #[inline]
  pub const fn new(duration: Duration) -> Self {
    Self {
      inner: Some(duration),
    }
  }

  /// Creates a finite timeout of `millis` milliseconds.
  #[inline]
  pub const fn from_millis(millis: u64) -> Self {
    Self::new(Duration::from_millis(millis))
  }

  /// Returns the duration, or `None` for [`Timeout::INFINITY`].
  #[inline]
  pub const fn duration(self) -> Option<Duration> {
    self.inner
  }

  /// Returns `true` if this timeout never blocks.
  #[inline]
  pub const fn is_zero(self) -> bool {
    matches!(self.inner, Some(duration) if duration.is_zero())
  }

  /// Returns `true` if this timeout never expires.
  #[inline]
  pub const fn is_infinite(self) -> bool {
    self.inner.is_none()
  }

  /// Returns the absolute deadline starting from `now`.
  ///
  /// Durations too large to represent are treated as infinite.
  #[inline]
  pub(crate) fn deadline(self, now: Instant) -> Option<Instant> {
    self.inner.and_then(|duration| now.checked_add(duration))
  }
}

impl Debug for Timeout {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self.inner {
      Some(duration) => Debug::fmt(&duration, f),
      None => f.write_str("infinity"),
    }
  }
}

impl From<Duration> for Timeout {
  #[inline]
  fn from(other: Duration) -> Self {
    Self::new(other)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;
  use std::time::Instant;

  use crate::core::Timeout;

  #[test]
  fn test_kinds() {
    assert!(Timeout::ZERO.is_zero());
    assert!(!Timeout::ZERO.is_infinite());
    assert!(Timeout::INFINITY.is_infinite());
    assert!(!Timeout::from_millis(5).is_zero());
  }

  #[test]
  fn test_deadline() {
    let now: Instant = Instant::now();

    assert_eq!(Timeout::INFINITY.deadline(now), None);
    assert_eq!(
      Timeout::from(Duration::from_secs(1)).deadline(now),
      Some(now + Duration::from_secs(1)),
    );
    assert_eq!(Timeout::new(Duration::MAX).deadline(now), None);
  }
}
