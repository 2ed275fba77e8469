// -----------------------------------------------------------------------------
// Process Spawning & Termination
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_process.c
// -----------------------------------------------------------------------------

use std::ptr;
use tracing::trace;

use crate::bifs;
use crate::core::Exit;
use crate::core::MonitorRef;
use crate::core::ProcessId;
use crate::core::SpawnError;
use crate::core::arena::BumpHeap;
use crate::core::arena::Lease;
use crate::core::fatal;
use crate::core::raise;
use crate::erts::Message;
use crate::erts::ProcessFlags;
use crate::erts::SpawnConfig;
use crate::erts::SpawnHandle;
use crate::node::Counters;
use crate::node::Departure;
use crate::node::Node;
use crate::proc::Entry;
use crate::proc::Prepare;
use crate::proc::ProcData;
use crate::proc::ProcessState;
use crate::sched::Running;

/// Spawns a new process running `entry`.
///
/// # Spawn Sequence
///
/// 1. **Reserve**: lease a slot and heap block from the target partition
/// 2. **Prepare**: reset the slot for the new occupant
/// 3. **Connect**: install the parent link or monitor
/// 4. **Publish**: make the id resolvable
/// 5. **Enqueue**: queue the process as runnable
///
/// The new process runs on the caller's scheduler when called from a
/// process, otherwise on the next scheduler in round-robin order.
///
/// # Errors
///
/// Returns [`SpawnError::Exhausted`] if no partition has a free slot after
/// stealing, or [`SpawnError::Stopped`] once shutdown began.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L1000>
pub(crate) fn proc_spawn(
  node: &Node,
  parent: Option<&Running<'_>>,
  entry: Entry,
  opts: SpawnConfig,
) -> Result<SpawnHandle, SpawnError> {
  if (opts.link || opts.monitor) && parent.is_none() {
    raise!(Error, BadCtx, "link or monitor requested outside a process");
  }

  if node.is_stopping() {
    return Err(SpawnError::Stopped);
  }

  // ---------------------------------------------------------------------------
  // 1. Reserve
  // ---------------------------------------------------------------------------

  let scheduler: usize = node.pick_scheduler();

  let Some(lease) = node.arena.acquire(scheduler) else {
    return Err(SpawnError::Exhausted);
  };

  let Some(data) = node.arena.slot(lease.slot) else {
    fatal!("arena leased an invalid slot");
  };

  // ---------------------------------------------------------------------------
  // 2. Prepare
  // ---------------------------------------------------------------------------

  let mut heap: BumpHeap = BumpHeap::empty();
  heap.reset(node.arena.block(lease.block), node.arena.block_size());

  let mut flags: ProcessFlags = ProcessFlags::empty();
  flags.set(ProcessFlags::TRAP_EXIT, opts.trap_exit);

  // SAFETY: The slot was just leased and is not yet published.
  unsafe {
    data.prepare(Prepare {
      priority: opts.priority,
      scheduler,
      flags,
      heap,
      block: lease.block,
      entry,
    });
  }

  let pid: ProcessId = node.next_pid(lease.slot);

  // ---------------------------------------------------------------------------
  // 3. Connect
  // ---------------------------------------------------------------------------

  let mut handle: SpawnHandle = SpawnHandle::Process(pid);

  if let Some(parent) = parent.filter(|_| opts.link || opts.monitor) {
    let mut graph = node.graph.lock();

    if opts.link {
      graph.link(parent.pid, pid);
    }

    if opts.monitor {
      let mref: MonitorRef = MonitorRef::new(node.next_ref());
      graph.monitor(mref, parent.pid, pid);
      handle = SpawnHandle::Monitor(pid, mref);
    }
  }

  // ---------------------------------------------------------------------------
  // 4. Publish
  // ---------------------------------------------------------------------------

  data.publish(pid);
  Counters::bump(&node.stats.spawned);

  trace!(
    target: "swarm",
    %pid,
    parent = ?parent.map(|parent| parent.pid),
    scheduler,
    priority = ?opts.priority,
    "process spawned",
  );

  // ---------------------------------------------------------------------------
  // 5. Enqueue
  // ---------------------------------------------------------------------------

  node.enqueue(data);

  Ok(handle)
}

/// Tears down a finished process and returns its slot to the arena.
///
/// # Termination Sequence
///
/// 1. Mark the process exiting and detach it from the link/monitor graph
/// 2. Notify linked peers and watchers
/// 3. Drop the registered name
/// 4. Retire the id and wait for in-flight senders
/// 5. Release mailbox, heap, and entry
/// 6. Return the slot and block to the owning partition
///
/// Must run on the owning scheduler thread after the process stopped
/// executing.
pub(crate) fn proc_terminate(node: &Node, data: &ProcData, exit: Exit) {
  let Some(pid) = data.pid() else {
    fatal!("terminating an unpublished process");
  };

  let departure: Departure = {
    let mut graph = node.graph.lock();
    data.state.store(ProcessState::Exiting);
    graph.remove(pid)
  };

  trace!(target: "swarm", %pid, reason = %exit, "process exited");

  propagate(node, pid, exit, departure);

  {
    let mut names = node.names.write();

    if let Some(name) = data.external.write().name.take() {
      names.remove(&name);
    }
  }

  data.retire();

  // SAFETY: The process no longer runs and its id is retired, so the
  //         scheduler is the only party touching owner state.
  let mut internal = unsafe { data.internal() };

  drop(data.signals.take());
  internal.mailbox.clear();
  internal.heap.clear();
  internal.entry = None;
  internal.yielder = ptr::null();

  let block: u32 = internal.block;

  drop(internal);

  Counters::bump(&node.stats.exited);

  data.state.store(ProcessState::Free);
  node.arena.release(data.scheduler(), Lease { slot: data.slot, block });
  node.notify_idle();
}

/// Delivers exit signals for `pid` to the peers recorded in `departure`.
///
/// Trapping peers receive an EXIT message. Non-trapping peers are killed
/// with the same reason, unless the exit was normal. Every watcher receives
/// one DOWN message.
fn propagate(node: &Node, pid: ProcessId, exit: Exit, departure: Departure) {
  for peer in departure.links {
    let Some(data) = node.find(peer) else {
      continue;
    };

    if data.traps_exits() {
      bifs::proc_deliver(node, &data, Message::exit(pid, exit));
    } else if exit.is_abnormal() && data.kill(exit) {
      node.wake(&data);
    }
  }

  for (mref, watcher) in departure.watchers {
    if let Some(data) = node.find(watcher) {
      bifs::proc_deliver(node, &data, Message::down(pid, mref, exit));
    }
  }
}
