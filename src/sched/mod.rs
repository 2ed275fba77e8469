//! Per-thread schedulers.
//!
//! Each scheduler owns one run queue per [`Priority`] and is the only
//! consumer of those queues. Any thread may enqueue onto any scheduler. A
//! process stays on the scheduler chosen at spawn for its whole life, since
//! its coroutine cannot leave the thread that created it.

mod parker;
mod ticker;
mod worker;

pub(crate) use self::parker::Parker;
pub(crate) use self::ticker::ticker;
pub(crate) use self::worker::Running;
pub(crate) use self::worker::current_scheduler;
pub(crate) use self::worker::on_worker;
pub(crate) use self::worker::run;
pub(crate) use self::worker::with_current;

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use crate::core::Priority;
use crate::tyre::MpscQueue;
use crate::tyre::NIL;
use crate::tyre::NodeArena;

/// Shared half of a scheduler, reachable from every thread.
pub(crate) struct Scheduler {
  pub(crate) index: usize,
  queues: [MpscQueue; Priority::COUNT],
  pub(crate) parker: Parker,
  running: AtomicU32,
}

impl Scheduler {
  /// Creates a scheduler whose queue sentinels start at node `stubs`.
  pub(crate) fn new(index: usize, nodes: &NodeArena, stubs: u32) -> Self {
    Self {
      index,
      queues: [0, 1, 2, 3].map(|offset| MpscQueue::new(nodes, stubs + offset)),
      parker: Parker::new(),
      running: AtomicU32::new(NIL),
    }
  }

  /// Appends `slot` to the run queue for `priority` and wakes the scheduler.
  #[inline]
  pub(crate) fn enqueue(&self, nodes: &NodeArena, slot: u32, priority: Priority) {
    self.queues[priority.index()].push(nodes, slot);
    self.parker.unpark();
  }

  /// Removes the next runnable slot, highest priority first.
  ///
  /// # Safety
  ///
  /// Must only be called from this scheduler's own thread.
  #[inline]
  pub(crate) unsafe fn dequeue(&self, nodes: &NodeArena) -> Option<u32> {
    Priority::DESCENDING
      .iter()
      // SAFETY: Upheld by the caller.
      .find_map(|priority| unsafe { self.queues[priority.index()].pop(nodes) })
  }

  #[inline]
  pub(crate) fn has_work(&self, nodes: &NodeArena) -> bool {
    self.queues.iter().any(|queue| !queue.is_empty(nodes))
  }

  /// Returns the slot currently executing, if any.
  #[inline]
  pub(crate) fn running(&self) -> Option<u32> {
    match self.running.load(Ordering::Acquire) {
      NIL => None,
      slot => Some(slot),
    }
  }

  #[inline]
  pub(crate) fn set_running(&self, slot: Option<u32>) {
    self.running.store(slot.unwrap_or(NIL), Ordering::Release);
  }
}

impl Debug for Scheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Scheduler")
      .field("index", &self.index)
      .field("running", &self.running())
      .finish_non_exhaustive()
  }
}
