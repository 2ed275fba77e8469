use crate::consts;
use crate::core::MonitorRef;
use crate::core::Priority;
use crate::core::ProcessId;

// -----------------------------------------------------------------------------
// Spawn Config
// -----------------------------------------------------------------------------

/// Options used to configure a spawned process.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SpawnConfig {
  /// Creates a link to the parent process.
  ///
  /// This is the same as calling [`Process::spawn_link`].
  ///
  /// [`Process::spawn_link`]: crate::erts::Process::spawn_link
  pub link: bool,
  /// Monitors the new process.
  ///
  /// This is the same as calling [`Process::spawn_monitor`].
  ///
  /// [`Process::spawn_monitor`]: crate::erts::Process::spawn_monitor
  pub monitor: bool,
  /// Sets the [`TRAP_EXIT`] process flag of the spawned process.
  ///
  /// [`TRAP_EXIT`]: crate::erts::ProcessFlags::TRAP_EXIT
  pub trap_exit: bool,
  /// Run queue priority of the spawned process.
  pub priority: Priority,
}

impl SpawnConfig {
  #[inline]
  pub const fn new() -> Self {
    Self {
      link: false,
      monitor: false,
      trap_exit: consts::SPAWN_INIT_TRAP_EXIT,
      priority: Priority::Normal,
    }
  }

  #[inline]
  pub const fn new_link() -> Self {
    let mut this: Self = Self::new();
    this.link = true;
    this
  }

  #[inline]
  pub const fn new_monitor() -> Self {
    let mut this: Self = Self::new();
    this.monitor = true;
    this
  }

  /// Returns a copy of this config with the given `priority`.
  #[inline]
  pub const fn with_priority(mut self, priority: Priority) -> Self {
    self.priority = priority;
    self
  }

  /// Returns a copy of this config with the [`TRAP_EXIT`] flag set to `value`.
  ///
  /// [`TRAP_EXIT`]: crate::erts::ProcessFlags::TRAP_EXIT
  #[inline]
  pub const fn with_trap_exit(mut self, value: bool) -> Self {
    self.trap_exit = value;
    self
  }
}

impl Default for SpawnConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

// -----------------------------------------------------------------------------
// Spawn Handle
// -----------------------------------------------------------------------------

/// A handle to a spawned process.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpawnHandle {
  /// A normal process.
  Process(ProcessId),
  /// A monitored process.
  Monitor(ProcessId, MonitorRef),
}

impl SpawnHandle {
  /// Returns the identifier of the spawned process.
  #[inline]
  pub const fn pid(self) -> ProcessId {
    match self {
      Self::Process(pid) => pid,
      Self::Monitor(pid, _) => pid,
    }
  }

  /// Returns the monitor reference, if the process was spawned monitored.
  #[inline]
  pub const fn mref(self) -> Option<MonitorRef> {
    match self {
      Self::Process(_) => None,
      Self::Monitor(_, mref) => Some(mref),
    }
  }

  /// Returns `true` if this is a [`SpawnHandle::Process`].
  #[inline]
  pub const fn is_process(&self) -> bool {
    matches!(self, Self::Process(_))
  }

  /// Returns `true` if this is a [`SpawnHandle::Monitor`].
  #[inline]
  pub const fn is_monitor(&self) -> bool {
    matches!(self, Self::Monitor(_, _))
  }
}

#[cfg(test)]
mod tests {
  use crate::core::Priority;
  use crate::erts::SpawnConfig;

  #[test]
  fn test_builders() {
    let config: SpawnConfig = SpawnConfig::new_link().with_priority(Priority::High);

    assert!(config.link);
    assert!(!config.monitor);
    assert_eq!(config.priority, Priority::High);
    assert_eq!(SpawnConfig::default(), SpawnConfig::new());
    assert!(SpawnConfig::new_monitor().with_trap_exit(true).trap_exit);
  }
}
