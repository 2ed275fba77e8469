use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::consts;

/// Reason describing why a process stopped executing.
///
/// An exit reason is a signed integer code. Zero is a normal exit and every
/// other value is abnormal. Negative codes are reserved for the runtime:
///
/// - [`Exit::PANIC`]: the process panicked
/// - [`Exit::KILLED`]: the process was killed without a custom reason
/// - [`Exit::NOPROC`]: the target of a link or monitor did not exist
/// - [`Exit::SHUTDOWN`]: the swarm stopped while the process was alive
///
/// Only abnormal reasons kill linked processes that do not trap exits.
///
/// # Examples
///
/// ```
/// use swarm::core::Exit;
///
/// assert!(Exit::NORMAL.is_normal());
/// assert!(Exit::new(42).is_abnormal());
/// assert_eq!(Exit::KILLED.to_string(), "killed");
/// ```
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Exit {
  code: i64,
}

impl Exit {
  /// Normal termination.
  pub const NORMAL: Self = Self::new(consts::EXIT_NORMAL);

  /// The process panicked.
  pub const PANIC: Self = Self::new(consts::EXIT_PANIC);

  /// Forced termination.
  pub const KILLED: Self = Self::new(consts::EXIT_KILLED);

  /// The linked or monitored process did not exist.
  pub const NOPROC: Self = Self::new(consts::EXIT_NOPROC);

  /// The swarm shut down.
  pub const SHUTDOWN: Self = Self::new(consts::EXIT_SHUTDOWN);

  /// Creates an exit reason from a raw code.
  #[inline]
  pub const fn new(code: i64) -> Self {
    Self { code }
  }

  /// Returns the raw exit code.
  #[inline]
  pub const fn code(self) -> i64 {
    self.code
  }

  /// Returns `true` if this exit reason represents normal termination.
  #[inline]
  pub const fn is_normal(self) -> bool {
    self.code == consts::EXIT_NORMAL
  }

  /// Returns `true` if this exit reason represents abnormal termination.
  #[inline]
  pub const fn is_abnormal(self) -> bool {
    !self.is_normal()
  }

  #[inline]
  const fn label(self) -> Option<&'static str> {
    match self.code {
      consts::EXIT_NORMAL => Some("normal"),
      consts::EXIT_PANIC => Some("panic"),
      consts::EXIT_KILLED => Some("killed"),
      consts::EXIT_NOPROC => Some("noproc"),
      consts::EXIT_SHUTDOWN => Some("shutdown"),
      _ => None,
    }
  }
}

impl Debug for Exit {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for Exit {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self.label() {
      Some(label) => f.write_str(label),
      None => write!(f, "exit({})", self.code),
    }
  }
}

impl From<i64> for Exit {
  #[inline]
  fn from(other: i64) -> Self {
    Self::new(other)
  }
}

impl From<Exit> for i64 {
  #[inline]
  fn from(other: Exit) -> Self {
    other.code
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
