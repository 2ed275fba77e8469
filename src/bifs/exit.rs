// -----------------------------------------------------------------------------
// Process Exit Signals
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_proc_sig_queue.c
// -----------------------------------------------------------------------------

use std::panic;
use tracing::trace;

use crate::core::Exit;
use crate::core::ProcessId;
use crate::node::Node;
use crate::proc::ExitUnwind;
use crate::sched::Running;

/// Kills the process identified by `pid` with `reason`.
///
/// The kill cannot be trapped. It takes effect the next time the target is
/// scheduled; a target blocked in a receive is woken immediately. The first
/// reason recorded wins.
///
/// Returns `false` if the process does not exist or was already killed.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L1710>
pub(crate) fn proc_kill(node: &Node, pid: ProcessId, reason: Exit) -> bool {
  let Some(data) = node.find(pid) else {
    return false;
  };

  if !data.state.load().is_alive() || !data.kill(reason) {
    return false;
  }

  trace!(target: "swarm", %pid, %reason, "process killed");

  node.wake(&data);

  true
}

/// Terminates the calling process with `reason`.
///
/// Unwinds the process stack, running destructors, before the scheduler
/// tears the process down.
pub(crate) fn proc_exit(_this: &Running<'_>, reason: Exit) -> ! {
  panic::resume_unwind(Box::new(ExitUnwind(reason)))
}
