use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Scheduling priority of a process.
///
/// Run queues are served strictly in priority order; within one level
/// dispatch is FIFO.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
  Low = 0,
  #[default]
  Normal = 1,
  High = 2,
  Max = 3,
}

impl Priority {
  /// Number of priority levels.
  pub const COUNT: usize = 4;

  /// All levels, highest first.
  pub const DESCENDING: [Self; Self::COUNT] = [Self::Max, Self::High, Self::Normal, Self::Low];

  /// Returns the run queue index of this level.
  #[inline]
  pub const fn index(self) -> usize {
    self as usize
  }

  #[inline]
  pub(crate) const fn from_u8(value: u8) -> Self {
    match value {
      0 => Self::Low,
      1 => Self::Normal,
      2 => Self::High,
      _ => Self::Max,
    }
  }
}

impl Display for Priority {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Low => f.write_str("low"),
      Self::Normal => f.write_str("normal"),
      Self::High => f.write_str("high"),
      Self::Max => f.write_str("max"),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::core::Priority;

  #[test]
  fn test_index_roundtrip() {
    for priority in Priority::DESCENDING {
      assert_eq!(Priority::from_u8(priority.index() as u8), priority);
    }
  }

  #[test]
  fn test_descending_order() {
    assert!(Priority::DESCENDING.windows(2).all(|pair| pair[0] > pair[1]));
  }
}
