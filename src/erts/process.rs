use bitflags::bitflags;
use std::alloc::Layout;
use std::ptr::NonNull;
use std::time::Duration;

use crate::bifs;
use crate::core::Exit;
use crate::core::Item;
use crate::core::MonitorRef;
use crate::core::Name;
use crate::core::Priority;
use crate::core::ProcessId;
use crate::core::RegisterError;
use crate::core::SpawnError;
use crate::core::Tag;
use crate::core::Term;
use crate::core::Timeout;
use crate::core::TimerRef;
use crate::core::fatal;
use crate::core::raise;
use crate::erts::Message;
use crate::erts::SpawnConfig;
use crate::erts::SpawnHandle;
use crate::proc::Entry;
use crate::proc::ProcessState;
use crate::sched;
use crate::sched::Running;

// -----------------------------------------------------------------------------
// @type - ProcessFlags
// -----------------------------------------------------------------------------

bitflags! {
  /// Per-process behavior flags.
  #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
  pub struct ProcessFlags: u32 {
    /// Convert exit signals from linked processes into EXIT messages.
    const TRAP_EXIT = 1 << 1;
  }
}

// -----------------------------------------------------------------------------
// @type - ProcessInfo
// -----------------------------------------------------------------------------

/// Snapshot of a live process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
  /// The process identifier.
  pub pid: ProcessId,
  /// The lifecycle state at the time of the snapshot.
  pub state: ProcessState,
  /// The scheduling priority.
  pub priority: Priority,
  /// The index of the scheduler the process is bound to.
  pub scheduler: usize,
  /// Messages delivered but not yet received.
  pub message_queue_len: usize,
  /// Reductions consumed over the lifetime of the process.
  pub reductions: u64,
  /// Processes linked to this process.
  pub links: Vec<ProcessId>,
  /// Monitors installed by this process.
  pub monitors: Vec<MonitorRef>,
  /// The value of the [`TRAP_EXIT`] process flag.
  ///
  /// [`TRAP_EXIT`]: ProcessFlags::TRAP_EXIT
  pub trap_exit: bool,
  /// The name registered to this process, if any.
  pub name: Option<Name>,
}

// -----------------------------------------------------------------------------
// @api - Process
// -----------------------------------------------------------------------------

/// In-process API.
///
/// Every function acts on behalf of the calling process and must be called
/// from inside a process spawned on a [`Swarm`]; calling one from any other
/// thread raises an [`Exception`].
///
/// [`Swarm`]: crate::erts::Swarm
/// [`Exception`]: crate::core::Exception
pub struct Process;

impl Process {
  /// Runs `f` with the calling process.
  #[inline]
  pub(crate) fn with<F, R>(f: F) -> R
  where
    F: FnOnce(&Running<'_>) -> R,
  {
    match sched::with_current(f) {
      Some(result) => result,
      None => raise!(Error, BadCtx, "not called from a process"),
    }
  }

  // ---------------------------------------------------------------------------
  // General API
  // ---------------------------------------------------------------------------

  /// Returns the process identifier of the calling process.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#self/0>
  pub fn this() -> ProcessId {
    Self::with(|this| this.pid)
  }

  /// Returns the identifiers of every process currently existing in the
  /// swarm, including exiting ones.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#processes/0>
  pub fn list() -> Vec<ProcessId> {
    Self::with(|this| bifs::proc_list(this.node))
  }

  /// Hands the scheduler to other runnable processes.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#yield/0>
  pub fn yield_now() {
    Self::with(bifs::proc_yield)
  }

  /// Charges `reductions` units of work to the calling process.
  ///
  /// Yields once the budget of the current time slice is spent. Long
  /// computations call this periodically to stay preemptible.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#bump_reductions/1>
  pub fn consume(reductions: u32) {
    let cost: i32 = i32::try_from(reductions).unwrap_or(i32::MAX);
    Self::with(|this| bifs::proc_consume(this, cost))
  }

  /// Kills `pid` with `reason`.
  ///
  /// The kill cannot be trapped. Returns `false` if the process does not
  /// exist or was already killed.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#exit/2>
  pub fn kill(pid: ProcessId, reason: impl Into<Exit>) -> bool {
    Self::with(|this| bifs::proc_kill(this.node, pid, reason.into()))
  }

  /// Terminates the calling process with `reason`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#exit/1>
  pub fn exit(reason: impl Into<Exit>) -> ! {
    let reason: Exit = reason.into();

    Self::with(|this| -> () { bifs::proc_exit(this, reason) });

    fatal!("process exit returned")
  }

  /// Returns `true` if the process exists and is alive, that is, is not exiting
  /// and has not exited. Otherwise returns `false`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#is_process_alive/1>
  pub fn alive(pid: ProcessId) -> bool {
    Self::with(|this| bifs::proc_alive(this.node, pid))
  }

  /// Returns the process flags of the calling process.
  ///
  /// REF: **N/A**
  pub fn get_flags() -> ProcessFlags {
    Self::with(bifs::proc_get_flags)
  }

  /// Sets the process flags of the calling process.
  ///
  /// REF: **N/A**
  pub fn set_flags(flags: ProcessFlags) {
    Self::with(|this| bifs::proc_set_flags(this, flags))
  }

  /// Sets the process flag indicated to the specified value, returning the
  /// previous value.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#process_flag/2>
  pub fn set_flag(flag: ProcessFlags, value: bool) -> bool {
    Self::with(|this| bifs::proc_set_flag(this, flag, value))
  }

  /// Returns information about the process identified by `pid`.
  ///
  /// Returns `None` if the process is not alive.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#process_info/1>
  pub fn info(pid: ProcessId) -> Option<ProcessInfo> {
    Self::with(|this| bifs::proc_info(this.node, pid))
  }

  // ---------------------------------------------------------------------------
  // General API - Spawning
  // ---------------------------------------------------------------------------

  /// Spawns a new process running `f`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#spawn/1>
  ///
  /// # Errors
  ///
  /// Returns [`SpawnError`] if the arena is exhausted or the swarm is
  /// shutting down.
  pub fn spawn<F>(f: F) -> Result<ProcessId, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    Self::spawn_opt(f, SpawnConfig::new()).map(SpawnHandle::pid)
  }

  /// Spawns a new process running `f` at `priority`.
  ///
  /// # Errors
  ///
  /// See [`Process::spawn`].
  pub fn spawn_with_priority<F>(f: F, priority: Priority) -> Result<ProcessId, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    Self::spawn_opt(f, SpawnConfig::new().with_priority(priority)).map(SpawnHandle::pid)
  }

  /// Spawns a new atomically linked process running `f`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#spawn_link/1>
  ///
  /// # Errors
  ///
  /// See [`Process::spawn`].
  pub fn spawn_link<F>(f: F) -> Result<ProcessId, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    Self::spawn_opt(f, SpawnConfig::new_link()).map(SpawnHandle::pid)
  }

  /// Spawns a new atomically monitored process running `f`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#spawn_monitor/1>
  ///
  /// # Errors
  ///
  /// See [`Process::spawn`].
  pub fn spawn_monitor<F>(f: F) -> Result<(ProcessId, MonitorRef), SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    match Self::spawn_opt(f, SpawnConfig::new_monitor())? {
      SpawnHandle::Monitor(pid, mref) => Ok((pid, mref)),
      SpawnHandle::Process(_) => raise!(Error, SysCap, "monitor not created"),
    }
  }

  /// Spawns a new process with the given `opts` running `f`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#spawn_opt/2>
  ///
  /// # Errors
  ///
  /// See [`Process::spawn`].
  pub fn spawn_opt<F>(f: F, opts: SpawnConfig) -> Result<SpawnHandle, SpawnError>
  where
    F: FnOnce() + Send + 'static,
  {
    let entry: Entry = Box::new(f);
    Self::with(|this| bifs::proc_spawn(this.node, Some(this), entry, opts))
  }

  // ---------------------------------------------------------------------------
  // General API - Messaging
  // ---------------------------------------------------------------------------

  /// Sends `term` to `dest` as an untagged message.
  ///
  /// Returns `false` if `dest` does not exist.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#send/2>
  pub fn send<T>(dest: ProcessId, term: T) -> bool
  where
    T: Item,
  {
    Self::send_tagged(dest, Tag::NONE, term)
  }

  /// Sends `term` to `dest` tagged with `tag`.
  ///
  /// Returns `false` if `dest` does not exist.
  ///
  /// # Panics
  ///
  /// Raises an exception if `tag` is reserved for exit or monitor signals.
  pub fn send_tagged<T>(dest: ProcessId, tag: impl Into<Tag>, term: T) -> bool
  where
    T: Item,
  {
    let tag: Tag = user_tag(tag.into());

    Self::with(|this| {
      let sent: bool = bifs::proc_send(this.node, Some(this.pid), dest, tag, Term::new(term));
      bifs::charge_send(this);
      sent
    })
  }

  /// Sends `term` to the process registered under `name`.
  ///
  /// Returns `false` if the name is not registered.
  pub fn send_named<T>(name: impl Into<Name>, term: T) -> bool
  where
    T: Item,
  {
    let name: Name = name.into();

    Self::with(|this| {
      let sent: bool =
        bifs::proc_send_named(this.node, Some(this.pid), &name, Tag::NONE, Term::new(term));
      bifs::charge_send(this);
      sent
    })
  }

  /// Receives the first untagged message.
  ///
  /// Returns `None` if no message arrives within `timeout`.
  ///
  /// REF: <https://www.erlang.org/doc/system/expressions.html#receive>
  pub fn receive(timeout: impl Into<Timeout>) -> Option<Message> {
    Self::receive_tagged(Tag::NONE, timeout)
  }

  /// Receives the first message tagged with `tag`, leaving every other
  /// message queued in order.
  ///
  /// Returns `None` if no message arrives within `timeout`.
  pub fn receive_tagged(tag: impl Into<Tag>, timeout: impl Into<Timeout>) -> Option<Message> {
    let tag: Tag = tag.into();
    Self::receive_match(move |message| message.tag() == tag, timeout)
  }

  /// Receives the first message of any tag, including EXIT and DOWN
  /// signals.
  ///
  /// Returns `None` if no message arrives within `timeout`.
  pub fn receive_any(timeout: impl Into<Timeout>) -> Option<Message> {
    Self::receive_match(|_| true, timeout)
  }

  /// Receives the first message accepted by `filter`.
  ///
  /// Returns `None` if no message arrives within `timeout`.
  pub fn receive_match<F>(filter: F, timeout: impl Into<Timeout>) -> Option<Message>
  where
    F: FnMut(&Message) -> bool,
  {
    let timeout: Timeout = timeout.into();
    Self::with(|this| bifs::proc_receive(this, timeout, filter))
  }

  // ---------------------------------------------------------------------------
  // General API - Links & Monitors
  // ---------------------------------------------------------------------------

  /// Creates a link between the calling process and `pid`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#link/1>
  pub fn link(pid: ProcessId) {
    Self::with(|this| bifs::proc_link(this, pid))
  }

  /// Removes the link between the calling process and `pid`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#unlink/1>
  pub fn unlink(pid: ProcessId) -> bool {
    Self::with(|this| bifs::proc_unlink(this, pid))
  }

  /// Starts monitoring `pid`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#monitor/2>
  pub fn monitor(pid: ProcessId) -> MonitorRef {
    Self::with(|this| bifs::proc_monitor(this, pid))
  }

  /// Stops the monitor identified by `mref`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#demonitor/1>
  pub fn demonitor(mref: MonitorRef) -> bool {
    Self::with(|this| bifs::proc_demonitor(this, mref))
  }

  // ---------------------------------------------------------------------------
  // General API - Timers
  // ---------------------------------------------------------------------------

  /// Sends `term` tagged with `tag` to `dest` after `delay`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#send_after/3>
  pub fn send_after<T>(delay: Duration, dest: ProcessId, tag: impl Into<Tag>, term: T) -> TimerRef
  where
    T: Item,
  {
    let tag: Tag = user_tag(tag.into());

    Self::with(|this| {
      bifs::proc_send_after(this.node, Some(this.pid), delay, dest, tag, Term::new(term))
    })
  }

  /// Cancels a timer, returning `false` if it already fired.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#cancel_timer/1>
  pub fn cancel_timer(tref: TimerRef) -> bool {
    Self::with(|this| bifs::proc_cancel_timer(this.node, tref))
  }

  /// Returns the time left on a pending timer.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#read_timer/1>
  pub fn read_timer(tref: TimerRef) -> Option<Duration> {
    Self::with(|this| bifs::proc_read_timer(this.node, tref))
  }

  // ---------------------------------------------------------------------------
  // General API - Registration
  // ---------------------------------------------------------------------------

  /// Registers `name` for `pid`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#register/2>
  ///
  /// # Errors
  ///
  /// Returns [`RegisterError`] if the name is taken, `pid` already has a
  /// name, or `pid` is not alive.
  pub fn register(pid: ProcessId, name: impl Into<Name>) -> Result<(), RegisterError> {
    let name: Name = name.into();
    Self::with(|this| bifs::proc_register(this.node, pid, name))
  }

  /// Removes the registration of `name`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#unregister/1>
  pub fn unregister(name: impl Into<Name>) -> bool {
    let name: Name = name.into();
    Self::with(|this| bifs::proc_unregister(this.node, &name))
  }

  /// Returns the process registered under `name`.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#whereis/1>
  pub fn whereis(name: impl Into<Name>) -> Option<ProcessId> {
    let name: Name = name.into();
    Self::with(|this| bifs::proc_whereis(this.node, &name))
  }

  /// Returns every registered name.
  ///
  /// REF: <https://www.erlang.org/doc/apps/erts/erlang.html#registered/0>
  pub fn registered() -> Vec<Name> {
    Self::with(|this| bifs::proc_registered(this.node))
  }

  // ---------------------------------------------------------------------------
  // General API - Heap
  // ---------------------------------------------------------------------------

  /// Allocates `layout` from the calling process's heap block.
  ///
  /// Returns `None` when the block cannot fit the request. Memory stays
  /// valid until the process exits and is never reclaimed individually.
  pub fn heap_alloc(layout: Layout) -> Option<NonNull<u8>> {
    // SAFETY: The calling process owns its internal state.
    Self::with(|this| unsafe { this.internal() }.heap.alloc(layout))
  }

  /// Returns the number of bytes allocated from the calling process's heap.
  pub fn heap_used() -> usize {
    // SAFETY: The calling process owns its internal state.
    Self::with(|this| unsafe { this.internal() }.heap.used())
  }
}

#[inline]
pub(crate) fn user_tag(tag: Tag) -> Tag {
  if tag.is_reserved() {
    raise!(Error, BadArg, "reserved message tag");
  }

  tag
}
