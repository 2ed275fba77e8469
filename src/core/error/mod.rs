mod macros;

pub(crate) use self::macros::fatal;
pub(crate) use self::macros::raise;

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

// -----------------------------------------------------------------------------
// Exception Class
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExceptionClass {
  Error,
}

// -----------------------------------------------------------------------------
// Exception Group
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExceptionGroup {
  BadArg,
  BadCtx,
  SysCap,
}

impl ExceptionGroup {
  #[inline]
  const fn label(&self) -> &'static str {
    match self {
      Self::BadArg => "(BadArg) errors were found with the given argument(s)",
      Self::BadCtx => "(BadCtx) the operation requires a process context",
      Self::SysCap => "(SysCap) a system limit has been reached",
    }
  }
}

// -----------------------------------------------------------------------------
// Exception
// -----------------------------------------------------------------------------

/// Panic payload raised by misused runtime operations.
pub struct Exception {
  class: ExceptionClass,
  group: ExceptionGroup,
  error: &'static str,
  trace: Backtrace,
}

impl Exception {
  #[inline]
  pub(crate) fn new(class: ExceptionClass, group: ExceptionGroup, error: &'static str) -> Self {
    Self {
      class,
      group,
      error,
      trace: Backtrace::capture(),
    }
  }

  /// Returns the exception class.
  #[inline]
  pub const fn class(&self) -> ExceptionClass {
    self.class
  }

  /// Returns the exception group.
  #[inline]
  pub const fn group(&self) -> ExceptionGroup {
    self.group
  }

  /// Returns the exception error message.
  #[inline]
  pub const fn error(&self) -> &'static str {
    self.error
  }

  /// Returns the thread stack backtrace leading up to the exception.
  #[inline]
  pub const fn trace(&self) -> &Backtrace {
    &self.trace
  }
}

impl Debug for Exception {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for Exception {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "[swarm]: {}: {}", self.group.label(), self.error)
  }
}

impl Error for Exception {}

// -----------------------------------------------------------------------------
// Spawn Error
// -----------------------------------------------------------------------------

/// Error returned when a process could not be spawned.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpawnError {
  /// Every arena partition is out of process slots or heap blocks.
  Exhausted,
  /// The swarm is shutting down.
  Stopped,
}

impl Display for SpawnError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Exhausted => f.write_str("process arena exhausted"),
      Self::Stopped => f.write_str("swarm is shutting down"),
    }
  }
}

impl Error for SpawnError {}

// -----------------------------------------------------------------------------
// Register Error
// -----------------------------------------------------------------------------

/// Error returned by a failed name registration.
///
/// A failed registration never modifies the registry.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum RegisterError {
  /// The name is bound to another process.
  NameTaken,
  /// The process already has a registered name.
  AlreadyRegistered,
  /// The process does not exist or is exiting.
  NotAlive,
}

impl Display for RegisterError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::NameTaken => f.write_str("name already registered"),
      Self::AlreadyRegistered => f.write_str("process already has a registered name"),
      Self::NotAlive => f.write_str("process is not alive"),
    }
  }
}

impl Error for RegisterError {}

// -----------------------------------------------------------------------------
// Init Error
// -----------------------------------------------------------------------------

/// Error returned when a swarm fails to start.
#[derive(Debug)]
#[non_exhaustive]
pub enum InitError {
  /// The global swarm is already running.
  AlreadyRunning,
  /// A configuration value is out of range.
  InvalidConfig(&'static str),
  /// The arena memory reservation failed.
  Reservation(usize),
  /// A scheduler thread could not be started.
  Thread(std::io::Error),
}

impl Display for InitError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::AlreadyRunning => f.write_str("swarm is already running"),
      Self::InvalidConfig(error) => write!(f, "invalid config: {error}"),
      Self::Reservation(bytes) => write!(f, "failed to reserve {bytes} bytes of arena memory"),
      Self::Thread(error) => write!(f, "failed to start scheduler thread: {error}"),
    }
  }
}

impl Error for InitError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Thread(error) => Some(error),
      _ => None,
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::error::Error;
  use std::io;

  use crate::core::Exception;
  use crate::core::ExceptionClass;
  use crate::core::ExceptionGroup;
  use crate::core::InitError;
  use crate::core::RegisterError;
  use crate::core::SpawnError;

  #[test]
  fn test_exception_display() {
    let exception: Exception = Exception::new(ExceptionClass::Error, ExceptionGroup::BadCtx, "oops");

    assert_eq!(exception.error(), "oops");
    assert_eq!(exception.group(), ExceptionGroup::BadCtx);
    assert_eq!(
      exception.to_string(),
      "[swarm]: (BadCtx) the operation requires a process context: oops",
    );
  }

  #[test]
  fn test_error_display() {
    assert_eq!(SpawnError::Exhausted.to_string(), "process arena exhausted");
    assert_eq!(RegisterError::NameTaken.to_string(), "name already registered");
    assert_eq!(
      InitError::InvalidConfig("schedulers must be non-zero").to_string(),
      "invalid config: schedulers must be non-zero",
    );
  }

  #[test]
  fn test_init_error_source() {
    let error: InitError = InitError::Thread(io::Error::other("nope"));

    assert!(error.source().is_some());
    assert!(InitError::AlreadyRunning.source().is_none());
  }
}
