use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use std::num::NonZeroU64;

// -----------------------------------------------------------------------------
// Monitor Ref
// -----------------------------------------------------------------------------

/// Reference identifying a single monitor.
///
/// Returned by `monitor` and carried in every DOWN message it produces.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MonitorRef {
  bits: NonZeroU64,
}

impl MonitorRef {
  #[inline]
  pub(crate) const fn new(bits: NonZeroU64) -> Self {
    Self { bits }
  }

  /// Converts this reference into its raw bits.
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.bits.get()
  }
}

impl Debug for MonitorRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for MonitorRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "#Ref<0.monitor.{}>", self.bits)
  }
}

// -----------------------------------------------------------------------------
// Timer Ref
// -----------------------------------------------------------------------------

/// Reference identifying a pending timer.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TimerRef {
  bits: NonZeroU64,
}

impl TimerRef {
  #[inline]
  pub(crate) const fn new(bits: NonZeroU64) -> Self {
    Self { bits }
  }

  /// Converts this reference into its raw bits.
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.bits.get()
  }
}

impl Debug for TimerRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for TimerRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "#Ref<0.timer.{}>", self.bits)
  }
}

#[cfg(test)]
mod tests {
  use std::num::NonZeroU64;

  use crate::core::MonitorRef;
  use crate::core::TimerRef;

  #[test]
  fn test_display() {
    let bits: NonZeroU64 = NonZeroU64::new(9).unwrap();

    assert_eq!(MonitorRef::new(bits).to_string(), "#Ref<0.monitor.9>");
    assert_eq!(TimerRef::new(bits).to_string(), "#Ref<0.timer.9>");
  }
}
