use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use std::num::NonZeroU64;

use crate::consts::MAX_INDEX_BITS;

/// Identifier uniquely naming a process within a swarm.
///
/// A process id packs two fields into a non-zero `u64`:
///
/// - **Serial**: value of a swarm-wide monotonic counter (high bits)
/// - **Slot**: arena slot holding the process (low [`MAX_INDEX_BITS`] bits)
///
/// Because the serial occupies the high bits, ids compare in spawn order and
/// are never reused, even when a slot is recycled.
///
/// # Format
///
/// Process ids display as `#PID<0.Serial.Slot>`.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProcessId {
  bits: NonZeroU64,
}

impl ProcessId {
  /// Bit width of the slot index field.
  pub(crate) const SLOT_BITS: u32 = MAX_INDEX_BITS;

  /// Bitmask for extracting the slot index field.
  pub(crate) const SLOT_MASK: u64 = (1 << Self::SLOT_BITS) - 1;

  /// Largest serial number representable in a process id.
  pub(crate) const MAX_SERIAL: u64 = u64::MAX >> Self::SLOT_BITS;

  /// Creates a process id from a serial number and slot index.
  ///
  /// Returns `None` if `serial` is zero or out of range.
  #[inline]
  pub(crate) const fn new(serial: u64, slot: u32) -> Option<Self> {
    if serial == 0 || serial > Self::MAX_SERIAL {
      return None;
    }

    let bits: u64 = (serial << Self::SLOT_BITS) | (slot as u64 & Self::SLOT_MASK);

    match NonZeroU64::new(bits) {
      Some(bits) => Some(Self { bits }),
      None => None,
    }
  }

  /// Creates a process id from its raw encoded bits.
  ///
  /// Returns `None` for zero or for bits without a serial.
  #[inline]
  pub const fn from_bits(bits: u64) -> Option<Self> {
    if bits >> Self::SLOT_BITS == 0 {
      return None;
    }

    match NonZeroU64::new(bits) {
      Some(bits) => Some(Self { bits }),
      None => None,
    }
  }

  /// Converts this process id into its raw encoded bits.
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.bits.get()
  }

  /// Returns the serial number component.
  #[inline]
  pub const fn serial(self) -> u64 {
    self.bits.get() >> Self::SLOT_BITS
  }

  /// Returns the arena slot component.
  #[inline]
  pub const fn slot(self) -> u32 {
    (self.bits.get() & Self::SLOT_MASK) as u32
  }
}

impl Debug for ProcessId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for ProcessId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "#PID<0.{}.{}>", self.serial(), self.slot())
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
