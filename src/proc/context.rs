//! Coroutine plumbing shared by processes and their schedulers.

use corosensei::Coroutine;
use corosensei::Yielder;
use corosensei::stack::DefaultStack;
use std::panic;

use crate::core::Exit;

/// Process entry point.
pub(crate) type Entry = Box<dyn FnOnce() + Send + 'static>;

/// Yielder handed to a process coroutine.
pub(crate) type Yield = Yielder<Resume, Suspend>;

/// Stackful coroutine running one process.
pub(crate) type ProcCoroutine = Coroutine<Resume, Suspend, Exit, DefaultStack>;

/// Value passed into a process when its scheduler resumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resume {
  /// Continue normally.
  Run,
  /// Unwind and terminate with the pending kill reason.
  Exit,
}

/// Reason a process handed control back to its scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Suspend {
  /// Re-enqueue as runnable.
  Yield,
  /// Parked in a receive; a waker re-enqueues it.
  Wait,
}

/// Unwind payload used to terminate a process from a suspension point.
///
/// Raised with [`panic::resume_unwind`] so no panic hook runs.
#[derive(Debug)]
pub(crate) struct ExitUnwind(pub(crate) Exit);

/// Suspends the calling process.
///
/// Unwinds the process stack if the scheduler resumes with [`Resume::Exit`].
///
/// # Safety
///
/// `yielder` must be the yielder of the coroutine currently executing on
/// this thread.
pub(crate) unsafe fn suspend(yielder: *const Yield, reason: Suspend, kill: impl FnOnce() -> Exit) {
  // SAFETY: Upheld by the caller.
  let resume: Resume = unsafe { (*yielder).suspend(reason) };

  if resume == Resume::Exit {
    panic::resume_unwind(Box::new(ExitUnwind(kill())));
  }
}
