// -----------------------------------------------------------------------------
// Process Links
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_monitor_link.c
// -----------------------------------------------------------------------------

use tracing::trace;

use crate::bifs;
use crate::core::Exit;
use crate::core::ProcessId;
use crate::erts::Message;
use crate::sched::Running;

/// Links the calling process to `pid`.
///
/// Linking is idempotent and linking to oneself does nothing. If `pid` is
/// not alive the caller receives an EXIT message with [`Exit::NOPROC`] when
/// trapping exits, and is killed with that reason otherwise.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L106>
pub(crate) fn proc_link(this: &Running<'_>, pid: ProcessId) {
  if pid == this.pid {
    return;
  }

  let linked: bool = {
    let mut graph = this.node.graph.lock();

    if this.node.alive(pid) {
      graph.link(this.pid, pid);
      true
    } else {
      false
    }
  };

  if linked {
    trace!(target: "swarm", from = %this.pid, to = %pid, "link");
    return;
  }

  if this.traps_exits() {
    bifs::proc_deliver(this.node, this, Message::exit(pid, Exit::NOPROC));
  } else {
    this.kill(Exit::NOPROC);
    bifs::proc_exit(this, this.kill_reason().unwrap_or(Exit::NOPROC));
  }
}

/// Removes the link between the calling process and `pid`.
///
/// Returns `false` if no link existed.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L1050>
pub(crate) fn proc_unlink(this: &Running<'_>, pid: ProcessId) -> bool {
  let removed: bool = this.node.graph.lock().unlink(this.pid, pid);

  if removed {
    trace!(target: "swarm", from = %this.pid, to = %pid, "unlink");
  }

  removed
}
