use parking_lot::RwLock;
use std::cell::UnsafeCell;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Deref;
use std::ptr;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use crate::core::Exit;
use crate::core::Name;
use crate::core::Priority;
use crate::core::ProcessId;
use crate::core::arena::BumpHeap;
use crate::erts::Message;
use crate::erts::ProcessFlags;
use crate::proc::AtomicState;
use crate::proc::Entry;
use crate::proc::OwnerGuard;
use crate::proc::ProcMailbox;
use crate::proc::ProcessState;
use crate::proc::Yield;
use crate::tyre::AtomicStack;

// -----------------------------------------------------------------------------
// Proc Data
// -----------------------------------------------------------------------------

/// Process control block stored in one arena slot.
///
/// Fields fall into three access domains:
///
/// 1. **Atomics**: readable and writable from any thread
/// 2. **Internal**: owner-only state behind an `UnsafeCell`, reached through
///    [`OwnerGuard`] while the process (or its scheduler) holds it
/// 3. **External**: rarely-modified state behind an `RwLock`
///
/// The slot outlives every process that occupies it. Any thread holding a
/// stale [`ProcessId`] must [`pin`] the slot, which fails once the occupant
/// has been retired.
///
/// [`pin`]: Self::pin
pub(crate) struct ProcData {
  pub(crate) slot: u32,
  pid: AtomicU64,
  pins: AtomicUsize,
  pub(crate) state: AtomicState,
  priority: AtomicU8,
  scheduler: AtomicUsize,
  pub(crate) reductions: AtomicI32,
  executed: AtomicU64,
  waiting: AtomicBool,
  killed: AtomicBool,
  flags: AtomicU32,
  inbox: AtomicUsize,
  pub(crate) signals: AtomicStack<Message>,
  internal: UnsafeCell<ProcInternal>,
  pub(crate) external: RwLock<ProcExternal>,
}

// SAFETY: ProcData is shared by all schedulers through the arena. Only
//         atomics, the signal stack, and `external` are accessed concurrently.
//         `internal` is touched by one thread at a time: the spawner before
//         publication, then the owning scheduler thread.
unsafe impl Send for ProcData {}

// SAFETY: See above.
unsafe impl Sync for ProcData {}

impl ProcData {
  pub(crate) fn new(slot: u32) -> Self {
    Self {
      slot,
      pid: AtomicU64::new(0),
      pins: AtomicUsize::new(0),
      state: AtomicState::new(ProcessState::Free),
      priority: AtomicU8::new(Priority::Normal as u8),
      scheduler: AtomicUsize::new(0),
      reductions: AtomicI32::new(0),
      executed: AtomicU64::new(0),
      waiting: AtomicBool::new(false),
      killed: AtomicBool::new(false),
      flags: AtomicU32::new(0),
      inbox: AtomicUsize::new(0),
      signals: AtomicStack::new(),
      internal: UnsafeCell::new(ProcInternal::new()),
      external: RwLock::new(ProcExternal::new()),
    }
  }

  // ---------------------------------------------------------------------------
  // Identity
  // ---------------------------------------------------------------------------

  /// Returns the id of the current occupant, if any.
  #[inline]
  pub(crate) fn pid(&self) -> Option<ProcessId> {
    ProcessId::from_bits(self.pid.load(Ordering::Acquire))
  }

  /// Pins the slot if it is still occupied by `pid`.
  ///
  /// While the returned guard lives the occupant cannot be recycled.
  #[inline]
  pub(crate) fn pin(&self, pid: ProcessId) -> Option<Pinned<'_>> {
    self.pins.fetch_add(1, Ordering::SeqCst);

    if self.pid.load(Ordering::SeqCst) == pid.into_bits() {
      Some(Pinned { data: self, pid })
    } else {
      self.pins.fetch_sub(1, Ordering::Release);
      None
    }
  }

  /// Makes the slot reachable under `pid`.
  #[inline]
  pub(crate) fn publish(&self, pid: ProcessId) {
    self.pid.store(pid.into_bits(), Ordering::SeqCst);
  }

  /// Detaches the current id and waits for every pin to be released.
  pub(crate) fn retire(&self) {
    self.pid.store(0, Ordering::SeqCst);

    while self.pins.load(Ordering::SeqCst) != 0 {
      thread::yield_now();
    }
  }

  // ---------------------------------------------------------------------------
  // Scheduling
  // ---------------------------------------------------------------------------

  #[inline]
  pub(crate) fn priority(&self) -> Priority {
    Priority::from_u8(self.priority.load(Ordering::Relaxed))
  }

  #[inline]
  pub(crate) fn scheduler(&self) -> usize {
    self.scheduler.load(Ordering::Relaxed)
  }

  /// Grants a fresh reduction budget.
  #[inline]
  pub(crate) fn refill(&self, budget: i32) {
    self.reductions.store(budget, Ordering::Relaxed);
  }

  /// Charges `cost` reductions, returning `true` once the budget is spent.
  #[inline]
  pub(crate) fn consume(&self, cost: i32) -> bool {
    self.executed.fetch_add(cost.max(0) as u64, Ordering::Relaxed);
    self.reductions.fetch_sub(cost, Ordering::Relaxed) - cost <= 0
  }

  /// Zeroes the budget so the next yield point suspends.
  #[inline]
  pub(crate) fn exhaust(&self) {
    self.reductions.store(0, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn executed(&self) -> u64 {
    self.executed.load(Ordering::Relaxed)
  }

  // ---------------------------------------------------------------------------
  // Waiting Flag
  // ---------------------------------------------------------------------------

  /// Announces that the owner is about to park in a receive.
  #[inline]
  pub(crate) fn set_waiting(&self) {
    self.waiting.store(true, Ordering::SeqCst);
  }

  /// Clears the waiting flag.
  ///
  /// Returns `true` for exactly one caller per park; that caller owns the
  /// responsibility of making the process runnable again.
  #[inline]
  pub(crate) fn take_waiting(&self) -> bool {
    self.waiting.swap(false, Ordering::SeqCst)
  }

  // ---------------------------------------------------------------------------
  // Kill Flag
  // ---------------------------------------------------------------------------

  /// Requests termination with `reason`.
  ///
  /// The first reason wins. Returns `false` if a kill was already pending.
  pub(crate) fn kill(&self, reason: Exit) -> bool {
    let mut external = self.external.write();

    if external.kill.is_some() {
      return false;
    }

    external.kill = Some(reason);
    self.killed.store(true, Ordering::SeqCst);

    true
  }

  #[inline]
  pub(crate) fn is_killed(&self) -> bool {
    self.killed.load(Ordering::SeqCst)
  }

  #[inline]
  pub(crate) fn kill_reason(&self) -> Option<Exit> {
    self.external.read().kill
  }

  // ---------------------------------------------------------------------------
  // Flags
  // ---------------------------------------------------------------------------

  #[inline]
  pub(crate) fn flags(&self) -> ProcessFlags {
    ProcessFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
  }

  #[inline]
  pub(crate) fn set_flags(&self, flags: ProcessFlags) {
    self.flags.store(flags.bits(), Ordering::Release);
  }

  #[inline]
  pub(crate) fn traps_exits(&self) -> bool {
    self.flags().contains(ProcessFlags::TRAP_EXIT)
  }

  // ---------------------------------------------------------------------------
  // Mailbox
  // ---------------------------------------------------------------------------

  /// Pushes `message` onto the signal stack.
  #[inline]
  pub(crate) fn push(&self, message: Message) {
    self.inbox.fetch_add(1, Ordering::Relaxed);
    self.signals.push(message);
  }

  /// Records that the owner consumed one message.
  #[inline]
  pub(crate) fn consumed(&self) {
    self.inbox.fetch_sub(1, Ordering::Relaxed);
  }

  /// Returns the number of undelivered messages.
  #[inline]
  pub(crate) fn inbox_len(&self) -> usize {
    self.inbox.load(Ordering::Relaxed)
  }

  // ---------------------------------------------------------------------------
  // Owner State
  // ---------------------------------------------------------------------------

  /// Returns a guard over the owner-only state.
  ///
  /// # Safety
  ///
  /// The caller must be the process itself or the scheduler thread acting
  /// for it while it is not running, and no other guard may be alive.
  #[inline]
  pub(crate) unsafe fn internal(&self) -> OwnerGuard<'_, ProcInternal> {
    // SAFETY: Upheld by the caller.
    unsafe { OwnerGuard::new(&self.internal) }
  }

  /// Resets the slot for a new occupant.
  ///
  /// # Safety
  ///
  /// The slot must be freshly leased from the arena and not yet published.
  pub(crate) unsafe fn prepare(&self, prepare: Prepare) {
    self.state.store(ProcessState::Suspended);
    self.priority.store(prepare.priority as u8, Ordering::Relaxed);
    self.scheduler.store(prepare.scheduler, Ordering::Relaxed);
    self.reductions.store(0, Ordering::Relaxed);
    self.executed.store(0, Ordering::Relaxed);
    self.waiting.store(false, Ordering::Relaxed);
    self.killed.store(false, Ordering::Relaxed);
    self.flags.store(prepare.flags.bits(), Ordering::Relaxed);
    self.inbox.store(0, Ordering::Relaxed);

    *self.external.write() = ProcExternal::new();

    // SAFETY: The slot is unpublished so nothing else can reach `internal`.
    let internal: &mut ProcInternal = unsafe { &mut *self.internal.get() };

    internal.mailbox.clear();
    internal.heap = prepare.heap;
    internal.block = prepare.block;
    internal.entry = Some(prepare.entry);
    internal.yielder = ptr::null();
    internal.filtering = false;
  }
}

impl Debug for ProcData {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("ProcData")
      .field("slot", &self.slot)
      .field("pid", &self.pid())
      .field("state", &self.state.load())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Pinned
// -----------------------------------------------------------------------------

/// Guard keeping a slot bound to one process id.
pub(crate) struct Pinned<'a> {
  data: &'a ProcData,
  pid: ProcessId,
}

impl Pinned<'_> {
  #[inline]
  pub(crate) const fn pid(&self) -> ProcessId {
    self.pid
  }
}

impl Deref for Pinned<'_> {
  type Target = ProcData;

  #[inline]
  fn deref(&self) -> &Self::Target {
    self.data
  }
}

impl Drop for Pinned<'_> {
  #[inline]
  fn drop(&mut self) {
    self.data.pins.fetch_sub(1, Ordering::Release);
  }
}

// -----------------------------------------------------------------------------
// Prepare
// -----------------------------------------------------------------------------

/// Initial values written into a slot at spawn.
pub(crate) struct Prepare {
  pub(crate) priority: Priority,
  pub(crate) scheduler: usize,
  pub(crate) flags: ProcessFlags,
  pub(crate) heap: BumpHeap,
  pub(crate) block: u32,
  pub(crate) entry: Entry,
}

// -----------------------------------------------------------------------------
// Proc Internal
// -----------------------------------------------------------------------------

/// Owner-only process state.
pub(crate) struct ProcInternal {
  /// Private message queue.
  pub(crate) mailbox: ProcMailbox,
  /// Bump heap over the leased arena block.
  pub(crate) heap: BumpHeap,
  /// Leased arena heap block.
  pub(crate) block: u32,
  /// Entry closure, taken on first dispatch.
  pub(crate) entry: Option<Entry>,
  /// Yielder of the running coroutine; null before the first dispatch.
  pub(crate) yielder: *const Yield,
  /// Set while a receive filter runs; suspension is deferred until it clears.
  pub(crate) filtering: bool,
}

impl ProcInternal {
  fn new() -> Self {
    Self {
      mailbox: ProcMailbox::new(),
      heap: BumpHeap::empty(),
      block: 0,
      entry: None,
      yielder: ptr::null(),
      filtering: false,
    }
  }
}

impl Debug for ProcInternal {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("ProcInternal")
      .field("mailbox", &self.mailbox)
      .field("heap", &self.heap)
      .field("block", &self.block)
      .field("started", &!self.yielder.is_null())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Proc External
// -----------------------------------------------------------------------------

/// Lock-protected process state.
#[derive(Debug)]
pub(crate) struct ProcExternal {
  /// Registered name.
  pub(crate) name: Option<Name>,
  /// Pending kill reason.
  pub(crate) kill: Option<Exit>,
}

impl ProcExternal {
  const fn new() -> Self {
    Self {
      name: None,
      kill: None,
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
