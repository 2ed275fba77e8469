use parking_lot::Mutex;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;
use tracing::info;
use tracing::warn;
use triomphe::Arc;

use crate::bifs;
use crate::consts;
use crate::core::Exit;
use crate::core::InitError;
use crate::core::Item;
use crate::core::Name;
use crate::core::Priority;
use crate::core::ProcessId;
use crate::core::RegisterError;
use crate::core::SpawnError;
use crate::core::Tag;
use crate::core::Term;
use crate::core::TimerRef;
use crate::erts::ProcessInfo;
use crate::erts::SpawnConfig;
use crate::erts::SpawnHandle;
use crate::erts::SwarmConfig;
use crate::erts::process::user_tag;
use crate::node::Node;
use crate::proc::Entry;
use crate::sched;
use crate::utils::measure_fn;

// -----------------------------------------------------------------------------
// Swarm Stats
// -----------------------------------------------------------------------------

/// Snapshot of the swarm-wide counters.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct SwarmStats {
  /// Processes spawned since startup.
  pub spawned: u64,
  /// Processes fully terminated since startup.
  pub exited: u64,
  /// Processes occupying an arena slot.
  pub live: usize,
  /// Messages delivered to a mailbox, including EXIT and DOWN signals.
  pub messages_sent: u64,
  /// Coroutine switches performed by all schedulers.
  pub context_switches: u64,
  /// Delayed sends that fired.
  pub timers_fired: u64,
  /// Timers not yet fired or cancelled, including receive timeouts.
  pub pending_timers: usize,
  /// Batches moved between arena partitions.
  pub arena_steals: u64,
  /// Unoccupied arena slots.
  pub free_slots: usize,
  /// Number of scheduler threads.
  pub schedulers: usize,
}

// -----------------------------------------------------------------------------
// Swarm
// -----------------------------------------------------------------------------

/// Handle to a running swarm of processes.
///
/// A swarm owns one scheduler thread per configured scheduler and a fixed
/// arena of process slots. The handle is the external API: every operation
/// works from any thread, including threads that are not part of the swarm.
/// Code running inside a process uses [`Process`] instead.
///
/// Dropping the handle shuts the swarm down.
///
/// [`Process`]: crate::erts::Process
pub struct Swarm {
  node: Arc<Node>,
  threads: Mutex<Vec<JoinHandle<()>>>,
  stopped: AtomicBool,
}

impl Swarm {
  /// Starts a swarm configured by `config`.
  ///
  /// # Errors
  ///
  /// Returns [`InitError`] if the config is invalid, the arena cannot be
  /// reserved, or a scheduler thread fails to start.
  pub fn new(config: SwarmConfig) -> Result<Self, InitError> {
    let node: Arc<Node> = Arc::new(Node::new(&config)?);

    let this: Self = Self {
      node,
      threads: Mutex::new(Vec::with_capacity(config.schedulers + 1)),
      stopped: AtomicBool::new(false),
    };

    if let Err(error) = this.start(&config) {
      this.shutdown();
      return Err(InitError::Thread(error));
    }

    info!(
      target: "swarm",
      name = %this.node.name,
      schedulers = config.schedulers,
      capacity = config.capacity,
      "swarm started",
    );

    Ok(this)
  }

  fn start(&self, config: &SwarmConfig) -> io::Result<()> {
    let mut threads = self.threads.lock();

    for index in 0..config.schedulers {
      let node: Arc<Node> = Arc::clone(&self.node);

      let handle: JoinHandle<()> = thread::Builder::new()
        .name(format!("swarm-sched-{index:0>2}"))
        .stack_size(config.thread_stack_size)
        .spawn(move || sched::run(node, index))?;

      threads.push(handle);
    }

    if !config.nudge_interval.is_zero() {
      let node: Arc<Node> = Arc::clone(&self.node);

      let handle: JoinHandle<()> = thread::Builder::new()
        .name(String::from("swarm-ticker"))
        .spawn(move || sched::ticker(node))?;

      threads.push(handle);
    }

    Ok(())
  }

  // ---------------------------------------------------------------------------
  // Spawning
  // ---------------------------------------------------------------------------

  /// Spawns a new process running `f`.
  ///
  /// # Errors
  ///
  /// Returns [`SpawnError`] if the arena is exhausted or the swarm is
  /// shutting down.
  pub fn spawn<F>(&self, f: F) -> Result<ProcessId, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    self.spawn_opt(f, SpawnConfig::new()).map(SpawnHandle::pid)
  }

  /// Spawns a new process running `f` at `priority`.
  ///
  /// # Errors
  ///
  /// See [`Swarm::spawn`].
  pub fn spawn_with_priority<F>(&self, f: F, priority: Priority) -> Result<ProcessId, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    self
      .spawn_opt(f, SpawnConfig::new().with_priority(priority))
      .map(SpawnHandle::pid)
  }

  /// Spawns a new process with the given `opts` running `f`.
  ///
  /// # Errors
  ///
  /// See [`Swarm::spawn`].
  ///
  /// # Panics
  ///
  /// Raises an exception if `opts` asks for a link or monitor, which needs
  /// a parent process.
  pub fn spawn_opt<F>(&self, f: F, opts: SpawnConfig) -> Result<SpawnHandle, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    let entry: Entry = Box::new(f);
    bifs::proc_spawn(&self.node, None, entry, opts)
  }

  // ---------------------------------------------------------------------------
  // Messaging
  // ---------------------------------------------------------------------------

  /// Sends `term` to `dest` as an untagged message with no sender.
  ///
  /// Returns `false` if `dest` does not exist.
  pub fn send<T>(&self, dest: ProcessId, term: T) -> bool
  where
    T: Item,
  {
    self.send_tagged(dest, Tag::NONE, term)
  }

  /// Sends `term` to `dest` tagged with `tag`.
  ///
  /// Returns `false` if `dest` does not exist.
  ///
  /// # Panics
  ///
  /// Raises an exception if `tag` is reserved for exit or monitor signals.
  pub fn send_tagged<T>(&self, dest: ProcessId, tag: impl Into<Tag>, term: T) -> bool
  where
    T: Item,
  {
    let tag: Tag = user_tag(tag.into());
    bifs::proc_send(&self.node, None, dest, tag, Term::new(term))
  }

  /// Sends `term` to the process registered under `name`.
  ///
  /// Returns `false` if the name is not registered.
  pub fn send_named<T>(&self, name: impl Into<Name>, term: T) -> bool
  where
    T: Item,
  {
    let name: Name = name.into();
    bifs::proc_send_named(&self.node, None, &name, Tag::NONE, Term::new(term))
  }

  /// Sends `term` tagged with `tag` to `dest` after `delay`.
  pub fn send_after<T>(&self, delay: Duration, dest: ProcessId, tag: impl Into<Tag>, term: T) -> TimerRef
  where
    T: Item,
  {
    let tag: Tag = user_tag(tag.into());
    bifs::proc_send_after(&self.node, None, delay, dest, tag, Term::new(term))
  }

  /// Cancels a timer, returning `false` if it already fired.
  pub fn cancel_timer(&self, tref: TimerRef) -> bool {
    bifs::proc_cancel_timer(&self.node, tref)
  }

  /// Returns the time left on a pending timer.
  pub fn read_timer(&self, tref: TimerRef) -> Option<Duration> {
    bifs::proc_read_timer(&self.node, tref)
  }

  /// Kills `pid` with `reason`.
  ///
  /// Returns `false` if the process does not exist or was already killed.
  pub fn kill(&self, pid: ProcessId, reason: impl Into<Exit>) -> bool {
    bifs::proc_kill(&self.node, pid, reason.into())
  }

  // ---------------------------------------------------------------------------
  // Registration
  // ---------------------------------------------------------------------------

  /// Registers `name` for `pid`.
  ///
  /// # Errors
  ///
  /// Returns [`RegisterError`] if the name is taken, `pid` already has a
  /// name, or `pid` is not alive.
  pub fn register(&self, pid: ProcessId, name: impl Into<Name>) -> Result<(), RegisterError> {
    bifs::proc_register(&self.node, pid, name.into())
  }

  /// Removes the registration of `name`.
  pub fn unregister(&self, name: impl Into<Name>) -> bool {
    bifs::proc_unregister(&self.node, &name.into())
  }

  /// Returns the process registered under `name`.
  pub fn whereis(&self, name: impl Into<Name>) -> Option<ProcessId> {
    bifs::proc_whereis(&self.node, &name.into())
  }

  /// Returns every registered name.
  pub fn registered(&self) -> Vec<Name> {
    bifs::proc_registered(&self.node)
  }

  // ---------------------------------------------------------------------------
  // Introspection
  // ---------------------------------------------------------------------------

  /// Returns the name of the swarm.
  #[inline]
  pub fn name(&self) -> &str {
    &self.node.name
  }

  /// Returns `true` if `pid` is alive.
  pub fn alive(&self, pid: ProcessId) -> bool {
    bifs::proc_alive(&self.node, pid)
  }

  /// Returns information about `pid`, or `None` if it is not alive.
  pub fn info(&self, pid: ProcessId) -> Option<ProcessInfo> {
    bifs::proc_info(&self.node, pid)
  }

  /// Returns the identifiers of every existing process.
  pub fn processes(&self) -> Vec<ProcessId> {
    bifs::proc_list(&self.node)
  }

  /// Returns a snapshot of the swarm-wide counters.
  pub fn stats(&self) -> SwarmStats {
    bifs::swarm_stats(&self.node)
  }

  /// Returns the number of occupied process slots.
  #[inline]
  pub fn process_count(&self) -> usize {
    self.node.live()
  }

  /// Returns the number of unoccupied process slots.
  #[inline]
  pub fn free_slots(&self) -> usize {
    self.node.arena.free()
  }

  /// Returns the total number of process slots.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.node.arena.capacity()
  }

  /// Returns the number of scheduler threads.
  #[inline]
  pub fn schedulers(&self) -> usize {
    self.node.schedulers.len()
  }

  /// Blocks until no process is live or `timeout` elapses.
  ///
  /// Returns `true` if the swarm became idle.
  pub fn await_idle(&self, timeout: Duration) -> bool {
    self.node.await_idle(timeout)
  }

  // ---------------------------------------------------------------------------
  // Shutdown
  // ---------------------------------------------------------------------------

  /// Stops every scheduler and waits for its thread to exit.
  ///
  /// Processes still alive are terminated with [`Exit::SHUTDOWN`]. Calling
  /// this more than once is a no-op. When called from inside the swarm the
  /// threads are told to stop but not joined.
  pub fn shutdown(&self) {
    if self.stopped.swap(true, Ordering::AcqRel) {
      return;
    }

    info!(target: "swarm", name = %self.node.name, "swarm stopping");

    let elapsed: Duration = measure_fn(|| {
      self.node.stop();

      let threads: Vec<JoinHandle<()>> = self.threads.lock().drain(..).collect();

      if sched::current_scheduler(&self.node).is_some() {
        warn!(target: "swarm", "shutdown called from a scheduler thread, not joining");
        return;
      }

      join_all(threads, consts::SHUTDOWN_TIMEOUT);
    });

    info!(
      target: "swarm",
      name = %self.node.name,
      elapsed = ?elapsed,
      "swarm stopped",
    );
  }
}

impl Debug for Swarm {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Swarm")
      .field("name", &self.node.name)
      .field("schedulers", &self.node.schedulers.len())
      .field("capacity", &self.node.arena.capacity())
      .field("stopped", &self.stopped.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl Drop for Swarm {
  fn drop(&mut self) {
    self.shutdown();
  }
}

fn join_all(threads: Vec<JoinHandle<()>>, timeout: Duration) {
  let deadline: Instant = Instant::now() + timeout;

  for handle in threads {
    while !handle.is_finished() && Instant::now() < deadline {
      thread::sleep(Duration::from_millis(1));
    }

    if !handle.is_finished() {
      warn!(
        target: "swarm",
        thread = handle.thread().name().unwrap_or("<unnamed>"),
        "thread did not stop in time",
      );
      continue;
    }

    if handle.join().is_err() {
      warn!(target: "swarm", "thread panicked during shutdown");
    }
  }
}
