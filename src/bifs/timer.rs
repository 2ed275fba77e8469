// -----------------------------------------------------------------------------
// Process Timers
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_timer.c
// -----------------------------------------------------------------------------

use std::time::Duration;
use std::time::Instant;
use tracing::trace;

use crate::bifs;
use crate::core::ProcessId;
use crate::core::Tag;
use crate::core::Term;
use crate::core::TimerRef;
use crate::node::Counters;
use crate::node::Node;
use crate::node::TimerEntry;

/// Delivers `term` tagged with `tag` to `dest` after `delay`.
///
/// Returns a reference usable with [`proc_cancel_timer`] and
/// [`proc_read_timer`]. A timer aimed at a process that exits first is
/// dropped when it fires.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_timer.c#L2450>
pub(crate) fn proc_send_after(
  node: &Node,
  from: Option<ProcessId>,
  delay: Duration,
  dest: ProcessId,
  tag: Tag,
  term: Term,
) -> TimerRef {
  let tref: TimerRef = TimerRef::new(node.next_ref());
  let deadline: Instant = deadline(delay);

  trace!(target: "swarm", %tref, %dest, ?delay, "timer armed");

  schedule(node, tref, deadline, TimerEntry::Send { from, dest, tag, term });

  tref
}

/// Cancels a pending timer.
///
/// Returns `false` if the timer already fired or was canceled.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_timer.c#L2500>
pub(crate) fn proc_cancel_timer(node: &Node, tref: TimerRef) -> bool {
  node.timers.cancel(tref)
}

/// Returns the time left before a pending timer fires.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_timer.c#L2580>
pub(crate) fn proc_read_timer(node: &Node, tref: TimerRef) -> Option<Duration> {
  node.timers.remaining(tref, Instant::now())
}

/// Fires every due timer.
///
/// Called by each scheduler on every loop iteration; the common case of
/// nothing due does not take the timer lock.
pub(crate) fn fire_timers(node: &Node) {
  for entry in node.timers.expire(Instant::now()) {
    match entry {
      TimerEntry::Send {
        from,
        dest,
        tag,
        term,
      } => {
        Counters::bump(&node.stats.timers);
        bifs::proc_send(node, from, dest, tag, term);
      }
      TimerEntry::Wake { pid } => {
        if let Some(data) = node.find(pid) {
          node.wake(&data);
        }
      }
    }
  }
}

/// Arms a timer that wakes `pid` out of a receive at `deadline`.
pub(crate) fn arm_wake(node: &Node, pid: ProcessId, deadline: Instant) -> TimerRef {
  let tref: TimerRef = TimerRef::new(node.next_ref());

  schedule(node, tref, deadline, TimerEntry::Wake { pid });

  tref
}

fn schedule(node: &Node, tref: TimerRef, deadline: Instant, entry: TimerEntry) {
  if node.timers.insert(tref, deadline, entry) {
    node.unpark_all();
  }
}

#[inline]
fn deadline(delay: Duration) -> Instant {
  let now: Instant = Instant::now();

  now.checked_add(delay).unwrap_or(now + Duration::from_secs(u32::MAX as u64))
}
