// -----------------------------------------------------------------------------
// Message Passing
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_message.c
// -----------------------------------------------------------------------------

use std::mem;
use std::time::Instant;

use crate::bifs;
use crate::consts::COST_RECEIVE;
use crate::consts::COST_SEND;
use crate::core::Exit;
use crate::core::Name;
use crate::core::ProcessId;
use crate::core::Tag;
use crate::core::Term;
use crate::core::Timeout;
use crate::core::TimerRef;
use crate::core::raise;
use crate::erts::Message;
use crate::node::Counters;
use crate::node::Node;
use crate::proc::ProcData;
use crate::proc::ProcMailbox;
use crate::proc::ProcessState;
use crate::proc::Suspend;
use crate::proc::Yield;
use crate::proc::suspend;
use crate::sched::Running;

use super::timer::arm_wake;

// -----------------------------------------------------------------------------
// Send
// -----------------------------------------------------------------------------

/// Sends `term` tagged with `tag` to `dest`.
///
/// Returns `false` if `dest` does not exist. Sending never blocks.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L2210>
pub(crate) fn proc_send(
  node: &Node,
  from: Option<ProcessId>,
  dest: ProcessId,
  tag: Tag,
  term: Term,
) -> bool {
  let Some(data) = node.find(dest) else {
    return false;
  };

  proc_deliver(node, &data, Message::new(from, tag, term));

  true
}

/// Resolves `name` and sends `term` to the registered process.
///
/// Returns `false` if the name is not registered.
pub(crate) fn proc_send_named(
  node: &Node,
  from: Option<ProcessId>,
  name: &Name,
  tag: Tag,
  term: Term,
) -> bool {
  match bifs::proc_whereis(node, name) {
    Some(dest) => proc_send(node, from, dest, tag, term),
    None => false,
  }
}

/// Pushes `message` onto the signal stack of a pinned process and wakes it.
///
/// Whoever observes the waiting flag set re-queues the receiver; every other
/// party leaves scheduling alone.
pub(crate) fn proc_deliver(node: &Node, data: &ProcData, message: Message) {
  data.push(message);
  Counters::bump(&node.stats.messages);
  node.wake(data);
}

// -----------------------------------------------------------------------------
// Receive
// -----------------------------------------------------------------------------

/// Removes the first message accepted by `filter` from the caller's mailbox.
///
/// Messages rejected by `filter` stay queued in arrival order. Blocks until a
/// match arrives or `timeout` elapses; [`Timeout::ZERO`] polls.
///
/// # Receive Protocol
///
/// 1. Drain the signal stack and scan for a match
/// 2. Raise the waiting flag, drain again, and rescan
/// 3. If a match (or kill) appeared, race wakers for the waiting flag:
///    the winner keeps running, the loser suspends once since a waker has
///    already queued it
/// 4. Otherwise arm a wake timer and suspend until woken
pub(crate) fn proc_receive<F>(this: &Running<'_>, timeout: Timeout, mut filter: F) -> Option<Message>
where
  F: FnMut(&Message) -> bool,
{
  // SAFETY: Called by the process that owns its internal state.
  if unsafe { this.internal() }.filtering {
    raise!(Error, BadCtx, "receive called from a receive filter");
  }

  let deadline: Option<Instant> = timeout.deadline(Instant::now());

  proc_consume(this, COST_RECEIVE);

  loop {
    if let Some(message) = scan(this, &mut filter) {
      this.consumed();
      return Some(message);
    }

    if timeout.is_zero() || deadline.is_some_and(|deadline| Instant::now() >= deadline) {
      return None;
    }

    this.state.store(ProcessState::Waiting);
    this.set_waiting();

    let found: Option<Message> = scan(this, &mut filter);
    let queued: bool = found.is_some() || this.is_killed();

    if queued && this.take_waiting() {
      this.state.store(ProcessState::Running);

      if found.is_some() {
        this.consumed();
        return found;
      }

      bifs::proc_exit(this, kill_reason(this));
    }

    let timer: Option<TimerRef> = if queued {
      None
    } else {
      deadline.map(|deadline| arm_wake(this.node, this.pid, deadline))
    };

    // SAFETY: Called by the process that owns its internal state.
    let yielder: *const Yield = unsafe { this.internal() }.yielder;

    // SAFETY: `yielder` belongs to the coroutine running this process.
    unsafe {
      suspend(yielder, Suspend::Wait, || kill_reason(this));
    }

    if let Some(tref) = timer {
      this.node.timers.cancel(tref);
    }

    if found.is_some() {
      this.consumed();
      return found;
    }

    this.consume(COST_RECEIVE);
  }
}

/// Drains pending signals and removes the first message accepted by `filter`.
///
/// The queue is moved out of the owner state while `filter` runs, so the
/// filter may call back into the process API. Yields requested by the filter
/// are skipped; the spent budget yields at the next accounted operation.
fn scan<F>(this: &Running<'_>, filter: &mut F) -> Option<Message>
where
  F: FnMut(&Message) -> bool,
{
  let mut mailbox: ProcMailbox = {
    // SAFETY: Called by the process that owns the mailbox.
    let mut internal = unsafe { this.internal() };

    internal.mailbox.drain(&this.signals);
    internal.filtering = true;
    mem::replace(&mut internal.mailbox, ProcMailbox::empty())
  };

  let found: Option<Message> = mailbox
    .find(filter)
    .and_then(|index| mailbox.take(index));

  // SAFETY: Called by the process that owns the mailbox.
  let mut internal = unsafe { this.internal() };

  internal.filtering = false;
  internal.mailbox.restore(mailbox);

  found
}

// -----------------------------------------------------------------------------
// Reductions
// -----------------------------------------------------------------------------

/// Hands the scheduler back to other runnable processes.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L3390>
pub(crate) fn proc_yield(this: &Running<'_>) {
  let yielder: *const Yield = {
    // SAFETY: Called by the process that owns its internal state.
    let internal = unsafe { this.internal() };

    if internal.filtering {
      return;
    }

    internal.yielder
  };

  // SAFETY: `yielder` belongs to the coroutine running this process.
  unsafe {
    suspend(yielder, Suspend::Yield, || kill_reason(this));
  }
}

/// Charges `cost` reductions, yielding once the budget is spent.
pub(crate) fn proc_consume(this: &Running<'_>, cost: i32) {
  if this.consume(cost) {
    proc_yield(this);
  }
}

/// Charges a completed send, yielding once the budget is spent.
#[inline]
pub(crate) fn charge_send(this: &Running<'_>) {
  proc_consume(this, COST_SEND);
}

#[inline]
fn kill_reason(data: &ProcData) -> Exit {
  data.kill_reason().unwrap_or(Exit::KILLED)
}
