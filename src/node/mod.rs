//! Shared state of one running swarm.
//!
//! A [`Node`] owns everything the schedulers and processes of a swarm share:
//! the arena, run-queue nodes, schedulers, link/monitor graph, registry,
//! timer list, and statistics. It is reference counted and handed to every
//! scheduler thread.

mod graph;
mod timers;

pub(crate) use self::graph::Departure;
pub(crate) use self::graph::LinkGraph;
pub(crate) use self::timers::TimerEntry;
pub(crate) use self::timers::TimerList;

use hashbrown::HashMap;
use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::RwLock;
use std::num::NonZeroU64;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use crate::consts::CAP_REGISTERED_NAMES;
use crate::consts::MAX_PARTITIONS;
use crate::core::InitError;
use crate::core::Name;
use crate::core::Priority;
use crate::core::ProcessId;
use crate::core::arena::Arena;
use crate::core::fatal;
use crate::erts::SwarmConfig;
use crate::proc::Pinned;
use crate::proc::ProcData;
use crate::proc::ProcessState;
use crate::sched;
use crate::sched::Scheduler;
use crate::tyre::NodeArena;

// -----------------------------------------------------------------------------
// Params
// -----------------------------------------------------------------------------

/// Runtime parameters copied out of [`SwarmConfig`] at startup.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Params {
  pub(crate) reductions: i32,
  pub(crate) stack_size: usize,
  pub(crate) park_timeout: Duration,
  pub(crate) nudge_interval: Duration,
}

// -----------------------------------------------------------------------------
// Counters
// -----------------------------------------------------------------------------

/// Monotonic statistics counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
  pub(crate) spawned: AtomicU64,
  pub(crate) exited: AtomicU64,
  pub(crate) messages: AtomicU64,
  pub(crate) switches: AtomicU64,
  pub(crate) timers: AtomicU64,
}

impl Counters {
  #[inline]
  pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
  }
}

// -----------------------------------------------------------------------------
// Node
// -----------------------------------------------------------------------------

pub(crate) struct Node {
  pub(crate) name: String,
  pub(crate) params: Params,
  pub(crate) arena: Arena<ProcData>,
  pub(crate) nodes: NodeArena,
  pub(crate) schedulers: Box<[Scheduler]>,
  pub(crate) graph: Mutex<LinkGraph>,
  pub(crate) names: RwLock<HashMap<Name, ProcessId>>,
  pub(crate) timers: TimerList,
  pub(crate) stats: Counters,
  serial: AtomicU64,
  refs: AtomicU64,
  cursor: AtomicUsize,
  stopping: AtomicBool,
  idle: Mutex<()>,
  idle_signal: Condvar,
  halt: Mutex<bool>,
  halt_signal: Condvar,
}

impl Node {
  /// Reserves the arena and builds every shared structure for `config`.
  pub(crate) fn new(config: &SwarmConfig) -> Result<Self, InitError> {
    config.validate()?;

    let partitions: usize = config.schedulers.min(MAX_PARTITIONS);

    let arena: Arena<ProcData> = Arena::new(
      config.capacity,
      config.heap_block_size,
      partitions,
      config.steal_batch,
      ProcData::new,
    )?;

    let nodes: NodeArena = NodeArena::new(config.capacity + config.schedulers * Priority::COUNT);

    let schedulers: Box<[Scheduler]> = (0..config.schedulers)
      .map(|index| {
        let stubs: usize = config.capacity + index * Priority::COUNT;
        Scheduler::new(index, &nodes, stubs as u32)
      })
      .collect();

    Ok(Self {
      name: config.name.clone(),
      params: Params {
        reductions: config.reductions,
        stack_size: config.stack_size,
        park_timeout: config.park_timeout,
        nudge_interval: config.nudge_interval,
      },
      arena,
      nodes,
      schedulers,
      graph: Mutex::new(LinkGraph::new()),
      names: RwLock::new(HashMap::with_capacity(CAP_REGISTERED_NAMES)),
      timers: TimerList::new(),
      stats: Counters::default(),
      serial: AtomicU64::new(1),
      refs: AtomicU64::new(1),
      cursor: AtomicUsize::new(0),
      stopping: AtomicBool::new(false),
      idle: Mutex::new(()),
      idle_signal: Condvar::new(),
      halt: Mutex::new(false),
      halt_signal: Condvar::new(),
    })
  }

  // ---------------------------------------------------------------------------
  // Identity
  // ---------------------------------------------------------------------------

  /// Allocates the next process id for `slot`.
  pub(crate) fn next_pid(&self, slot: u32) -> ProcessId {
    let serial: u64 = self.serial.fetch_add(1, Ordering::Relaxed);

    match ProcessId::new(serial, slot) {
      Some(pid) => pid,
      None => fatal!("process id space exhausted"),
    }
  }

  /// Allocates the next unique reference number.
  pub(crate) fn next_ref(&self) -> NonZeroU64 {
    match NonZeroU64::new(self.refs.fetch_add(1, Ordering::Relaxed)) {
      Some(bits) => bits,
      None => fatal!("reference space exhausted"),
    }
  }

  /// Pins the slot of `pid` if the process still occupies it.
  #[inline]
  pub(crate) fn find(&self, pid: ProcessId) -> Option<Pinned<'_>> {
    self.arena.slot(pid.slot())?.pin(pid)
  }

  /// Returns `true` if `pid` names a live, non-exiting process.
  #[inline]
  pub(crate) fn alive(&self, pid: ProcessId) -> bool {
    self
      .find(pid)
      .is_some_and(|data| data.state.load().is_alive())
  }

  // ---------------------------------------------------------------------------
  // Scheduling
  // ---------------------------------------------------------------------------

  /// Chooses the scheduler for a new process.
  ///
  /// Processes spawned from a scheduler thread stay on it; everything else
  /// is spread round-robin.
  pub(crate) fn pick_scheduler(&self) -> usize {
    if let Some(index) = sched::current_scheduler(self) {
      return index;
    }

    self.cursor.fetch_add(1, Ordering::Relaxed) % self.schedulers.len()
  }

  /// Marks `data` runnable and queues it on its scheduler.
  ///
  /// The caller must own the right to enqueue: the spawner, the process
  /// itself after a yield, or the winner of the waiting flag.
  #[inline]
  pub(crate) fn enqueue(&self, data: &ProcData) {
    data.state.store(ProcessState::Runnable);

    match self.schedulers.get(data.scheduler()) {
      Some(scheduler) => scheduler.enqueue(&self.nodes, data.slot, data.priority()),
      None => fatal!("process bound to an unknown scheduler"),
    }
  }

  /// Re-queues `data` if it is parked in a receive.
  #[inline]
  pub(crate) fn wake(&self, data: &ProcData) {
    if data.take_waiting() {
      self.enqueue(data);
    }
  }

  /// Wakes every parked scheduler.
  pub(crate) fn unpark_all(&self) {
    for scheduler in self.schedulers.iter() {
      scheduler.parker.unpark();
    }
  }

  // ---------------------------------------------------------------------------
  // Lifecycle
  // ---------------------------------------------------------------------------

  #[inline]
  pub(crate) fn is_stopping(&self) -> bool {
    self.stopping.load(Ordering::Acquire)
  }

  /// Asks every scheduler and the ticker to stop.
  pub(crate) fn stop(&self) {
    self.stopping.store(true, Ordering::Release);

    *self.halt.lock() = true;
    self.halt_signal.notify_all();

    for scheduler in self.schedulers.iter() {
      scheduler.parker.notify();
    }
  }

  /// Sleeps for `timeout` unless the node halts first.
  ///
  /// Returns `true` once the node is halting.
  pub(crate) fn wait_halt(&self, timeout: Duration) -> bool {
    let mut halted = self.halt.lock();

    if !*halted {
      let _timeout = self.halt_signal.wait_for(&mut halted, timeout);
    }

    *halted
  }

  /// Returns the number of occupied process slots.
  #[inline]
  pub(crate) fn live(&self) -> usize {
    self.arena.capacity() - self.arena.free()
  }

  /// Signals threads blocked in [`await_idle`] after a process left.
  ///
  /// [`await_idle`]: Self::await_idle
  pub(crate) fn notify_idle(&self) {
    if self.live() == 0 {
      let _guard = self.idle.lock();
      self.idle_signal.notify_all();
    }
  }

  /// Blocks until no process is live or `timeout` elapses.
  pub(crate) fn await_idle(&self, timeout: Duration) -> bool {
    let deadline: Option<Instant> = Instant::now().checked_add(timeout);
    let mut guard = self.idle.lock();

    loop {
      if self.live() == 0 {
        return true;
      }

      match deadline {
        Some(deadline) => {
          if self.idle_signal.wait_until(&mut guard, deadline).timed_out() {
            return self.live() == 0;
          }
        }
        None => self.idle_signal.wait(&mut guard),
      }
    }
  }
}
