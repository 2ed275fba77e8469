use corosensei::CoroutineResult;
use corosensei::stack::DefaultStack;
use hashbrown::HashMap;
use std::cell::Cell;
use std::cell::OnceCell;
use std::mem;
use std::ops::Deref;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::ptr;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::warn;
use triomphe::Arc;

use crate::bifs;
use crate::consts::CAP_STACK_CACHE;
use crate::core::Exit;
use crate::core::ProcessId;
use crate::core::Term;
use crate::core::fatal;
use crate::node::Counters;
use crate::node::Node;
use crate::proc::Entry;
use crate::proc::ExitUnwind;
use crate::proc::ProcCoroutine;
use crate::proc::ProcData;
use crate::proc::ProcessState;
use crate::proc::Resume;
use crate::proc::Suspend;
use crate::proc::Yield;
use crate::sched::Scheduler;

// -----------------------------------------------------------------------------
// Thread Globals
// -----------------------------------------------------------------------------

thread_local! {
  static WORKER: OnceCell<WorkerContext> = const { OnceCell::new() };
}

struct WorkerContext {
  node: Arc<Node>,
  index: usize,
  current: Cell<Option<u32>>,
}

/// Returns `true` on a scheduler thread.
#[inline]
pub(crate) fn on_worker() -> bool {
  WORKER.with(|cell| cell.get().is_some())
}

/// Returns the index of the calling scheduler thread if it belongs to `node`.
pub(crate) fn current_scheduler(node: &Node) -> Option<usize> {
  WORKER.with(|cell| {
    cell
      .get()
      .filter(|context| ptr::eq(context.node.deref(), node))
      .map(|context| context.index)
  })
}

/// Runs `f` with the process executing on this thread.
///
/// Returns `None` outside a process.
pub(crate) fn with_current<F, R>(f: F) -> Option<R>
where
  F: FnOnce(&Running<'_>) -> R,
{
  WORKER.with(|cell| {
    let context: &WorkerContext = cell.get()?;
    let data: &ProcData = context.node.arena.slot(context.current.get()?)?;
    let pid: ProcessId = data.pid()?;

    Some(f(&Running {
      node: &context.node,
      data,
      pid,
    }))
  })
}

// -----------------------------------------------------------------------------
// Running
// -----------------------------------------------------------------------------

/// The process executing on the current scheduler thread.
pub(crate) struct Running<'a> {
  pub(crate) node: &'a Node,
  pub(crate) data: &'a ProcData,
  pub(crate) pid: ProcessId,
}

impl Deref for Running<'_> {
  type Target = ProcData;

  #[inline]
  fn deref(&self) -> &Self::Target {
    self.data
  }
}

// -----------------------------------------------------------------------------
// Worker
// -----------------------------------------------------------------------------

/// Scheduler-thread state that never leaves the thread.
struct Worker {
  index: usize,
  coroutines: HashMap<u32, ProcCoroutine>,
  stacks: Vec<DefaultStack>,
}

/// Runs scheduler `index` of `node` until the node stops.
pub(crate) fn run(node: Arc<Node>, index: usize) {
  let context: WorkerContext = WorkerContext {
    node: Arc::clone(&node),
    index,
    current: Cell::new(None),
  };

  if WORKER.with(|cell| cell.set(context)).is_err() {
    fatal!("scheduler thread started twice");
  }

  let Some(scheduler) = node.schedulers.get(index) else {
    fatal!("unknown scheduler index");
  };

  let mut worker: Worker = Worker {
    index,
    coroutines: HashMap::new(),
    stacks: Vec::with_capacity(CAP_STACK_CACHE),
  };

  debug!(target: "swarm", scheduler = index, "scheduler started");

  while !node.is_stopping() {
    bifs::fire_timers(&node);

    // SAFETY: This thread is the only consumer of its scheduler's queues.
    match unsafe { scheduler.dequeue(&node.nodes) } {
      Some(slot) => worker.dispatch(&node, slot),
      None => park(&node, scheduler),
    }
  }

  worker.shutdown(&node, scheduler);

  debug!(target: "swarm", scheduler = index, "scheduler stopped");
}

fn park(node: &Node, scheduler: &Scheduler) {
  let mut timeout: Duration = node.params.park_timeout;

  if let Some(deadline) = node.timers.next_deadline() {
    timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
  }

  if timeout.is_zero() {
    return;
  }

  scheduler
    .parker
    .park(timeout, || scheduler.has_work(&node.nodes) || node.is_stopping());
}

impl Worker {
  fn dispatch(&mut self, node: &Node, slot: u32) {
    let Some(data) = node.arena.slot(slot) else {
      fatal!("run queue returned an invalid slot");
    };

    if data.pid().is_none() {
      return;
    }

    if data.is_killed() {
      if self.coroutines.contains_key(&slot) {
        self.resume(node, data, Resume::Exit);
      } else {
        bifs::proc_terminate(node, data, kill_reason(data));
      }

      return;
    }

    data.refill(node.params.reductions);
    self.resume(node, data, Resume::Run);
  }

  fn resume(&mut self, node: &Node, data: &ProcData, input: Resume) {
    let mut coroutine: ProcCoroutine = match self.coroutines.remove(&data.slot) {
      Some(coroutine) => coroutine,
      None => match self.create(node, data) {
        Some(coroutine) => coroutine,
        None => {
          bifs::proc_terminate(node, data, Exit::PANIC);
          return;
        }
      },
    };

    match self.switch(node, data, &mut coroutine, input) {
      CoroutineResult::Yield(Suspend::Yield) => {
        self.coroutines.insert(data.slot, coroutine);
        node.enqueue(data);
      }
      CoroutineResult::Yield(Suspend::Wait) => {
        self.coroutines.insert(data.slot, coroutine);
      }
      CoroutineResult::Return(exit) => {
        self.recycle(coroutine);
        bifs::proc_terminate(node, data, exit);
      }
    }
  }

  fn switch(
    &mut self,
    node: &Node,
    data: &ProcData,
    coroutine: &mut ProcCoroutine,
    input: Resume,
  ) -> CoroutineResult<Suspend, Exit> {
    let scheduler: &Scheduler = &node.schedulers[self.index];

    data.state.store(ProcessState::Running);
    scheduler.set_running(Some(data.slot));
    set_current(Some(data.slot));
    Counters::bump(&node.stats.switches);

    let result: CoroutineResult<Suspend, Exit> = coroutine.resume(input);

    set_current(None);
    scheduler.set_running(None);

    result
  }

  fn create(&mut self, node: &Node, data: &ProcData) -> Option<ProcCoroutine> {
    let stack: DefaultStack = match self.stacks.pop() {
      Some(stack) => stack,
      None => match DefaultStack::new(node.params.stack_size) {
        Ok(stack) => stack,
        Err(error) => {
          error!(
            target: "swarm",
            pid = ?data.pid(),
            %error,
            "failed to allocate process stack",
          );

          return None;
        }
      },
    };

    let data: *const ProcData = data;

    Some(ProcCoroutine::with_stack(stack, move |yielder: &Yield, input: Resume| {
      // SAFETY: Slots live as long as the node, which outlives its schedulers.
      trampoline(unsafe { &*data }, yielder, input)
    }))
  }

  fn recycle(&mut self, coroutine: ProcCoroutine) {
    if coroutine.done() && self.stacks.len() < CAP_STACK_CACHE {
      self.stacks.push(coroutine.into_stack());
    }
  }

  /// Terminates every process still bound to this scheduler.
  fn shutdown(&mut self, node: &Node, scheduler: &Scheduler) {
    self.evict_queued(node, scheduler);

    let slots: Vec<u32> = self.coroutines.keys().copied().collect();

    for slot in slots {
      let Some(mut coroutine) = self.coroutines.remove(&slot) else {
        continue;
      };

      let Some(data) = node.arena.slot(slot) else {
        continue;
      };

      data.kill(Exit::SHUTDOWN);

      match self.switch(node, data, &mut coroutine, Resume::Exit) {
        CoroutineResult::Return(exit) => {
          self.recycle(coroutine);
          bifs::proc_terminate(node, data, exit);
        }
        CoroutineResult::Yield(_) => {
          warn!(
            target: "swarm",
            pid = ?data.pid(),
            "process suspended while shutting down; leaking its stack",
          );

          mem::forget(coroutine);
          bifs::proc_terminate(node, data, Exit::SHUTDOWN);
        }
      }
    }

    self.evict_queued(node, scheduler);
  }

  /// Terminates queued processes that never started.
  fn evict_queued(&mut self, node: &Node, scheduler: &Scheduler) {
    // SAFETY: This thread is the only consumer of its scheduler's queues.
    while let Some(slot) = unsafe { scheduler.dequeue(&node.nodes) } {
      if self.coroutines.contains_key(&slot) {
        continue;
      }

      let Some(data) = node.arena.slot(slot) else {
        continue;
      };

      if data.pid().is_some() && data.state.load().is_alive() {
        bifs::proc_terminate(node, data, Exit::SHUTDOWN);
      }
    }
  }
}

#[inline]
fn set_current(slot: Option<u32>) {
  WORKER.with(|cell| {
    if let Some(context) = cell.get() {
      context.current.set(slot);
    }
  });
}

#[inline]
fn kill_reason(data: &ProcData) -> Exit {
  data.kill_reason().unwrap_or(Exit::KILLED)
}

// -----------------------------------------------------------------------------
// Trampoline
// -----------------------------------------------------------------------------

/// Body of every process coroutine.
fn trampoline(data: &ProcData, yielder: &Yield, input: Resume) -> Exit {
  if input == Resume::Exit {
    return kill_reason(data);
  }

  let entry: Option<Entry> = {
    // SAFETY: The process owns its internal state while it runs.
    let mut internal = unsafe { data.internal() };

    internal.yielder = yielder;
    internal.entry.take()
  };

  let Some(entry) = entry else {
    fatal!("process started without an entry point");
  };

  // A kill accepted while running wins over however the entry finished.
  match panic::catch_unwind(AssertUnwindSafe(entry)) {
    Ok(()) => data.kill_reason().unwrap_or(Exit::NORMAL),
    Err(payload) => match payload.downcast::<ExitUnwind>() {
      Ok(unwind) => data.kill_reason().unwrap_or(unwind.0),
      Err(payload) => {
        error!(
          target: "swarm",
          pid = ?data.pid(),
          reason = %Term::from_panic(&*payload),
          "process panicked",
        );

        Exit::PANIC
      }
    },
  }
}
