use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

/// Lifecycle state of a process slot.
///
/// ```text
///  Free -> Runnable -> Running -> Runnable   (yield)
///                              -> Waiting    (blocked receive)
///                              -> Exiting    (return or kill)
///          Waiting  -> Runnable              (message, timer, kill)
///          Exiting  -> Free
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessState {
  /// The slot holds no process.
  Free = 0,
  /// Queued on a run queue.
  Runnable = 1,
  /// Executing on its scheduler.
  Running = 2,
  /// Blocked in a receive.
  Waiting = 3,
  /// Reserved, not yet published to a run queue.
  Suspended = 4,
  /// Terminating; no longer alive.
  Exiting = 5,
}

impl ProcessState {
  #[inline]
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => Self::Runnable,
      2 => Self::Running,
      3 => Self::Waiting,
      4 => Self::Suspended,
      5 => Self::Exiting,
      _ => Self::Free,
    }
  }

  /// Returns `true` for states of a live, non-exiting process.
  #[inline]
  pub const fn is_alive(self) -> bool {
    !matches!(self, Self::Free | Self::Exiting)
  }
}

impl Display for ProcessState {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Free => f.write_str("free"),
      Self::Runnable => f.write_str("runnable"),
      Self::Running => f.write_str("running"),
      Self::Waiting => f.write_str("waiting"),
      Self::Suspended => f.write_str("suspended"),
      Self::Exiting => f.write_str("exiting"),
    }
  }
}

/// Atomic cell holding a [`ProcessState`].
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct AtomicState {
  inner: AtomicU8,
}

impl AtomicState {
  #[inline]
  pub(crate) const fn new(state: ProcessState) -> Self {
    Self {
      inner: AtomicU8::new(state as u8),
    }
  }

  #[inline]
  pub(crate) fn load(&self) -> ProcessState {
    ProcessState::from_u8(self.inner.load(Ordering::Acquire))
  }

  #[inline]
  pub(crate) fn store(&self, state: ProcessState) {
    self.inner.store(state as u8, Ordering::Release);
  }

  /// Moves from `current` to `new`, returning `false` if the state differed.
  #[inline]
  pub(crate) fn transition(&self, current: ProcessState, new: ProcessState) -> bool {
    self
      .inner
      .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }
}
