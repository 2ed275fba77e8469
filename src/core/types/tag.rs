use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Numeric key used by selective receive.
///
/// Plain sends carry [`Tag::NONE`]. [`Tag::EXIT`] and [`Tag::DOWN`] are
/// reserved for signals produced by links and monitors.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tag {
  bits: u64,
}

impl Tag {
  /// Tag of untagged messages.
  pub const NONE: Self = Self::new(0);

  /// Tag of EXIT signals delivered to processes trapping exits.
  pub const EXIT: Self = Self::new(u64::MAX);

  /// Tag of DOWN signals delivered to monitoring processes.
  pub const DOWN: Self = Self::new(u64::MAX - 1);

  /// Creates a tag from raw bits.
  #[inline]
  pub const fn new(bits: u64) -> Self {
    Self { bits }
  }

  /// Returns the raw tag bits.
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.bits
  }

  /// Returns `true` for [`Tag::EXIT`] and [`Tag::DOWN`].
  #[inline]
  pub const fn is_reserved(self) -> bool {
    self.bits == Self::EXIT.bits || self.bits == Self::DOWN.bits
  }
}

impl Debug for Tag {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for Tag {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match *self {
      Self::NONE => f.write_str("none"),
      Self::EXIT => f.write_str("EXIT"),
      Self::DOWN => f.write_str("DOWN"),
      Self { bits } => write!(f, "tag({bits})"),
    }
  }
}

impl From<u64> for Tag {
  #[inline]
  fn from(other: u64) -> Self {
    Self::new(other)
  }
}
