// -----------------------------------------------------------------------------
// Process Monitors
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_monitor_link.c
// -----------------------------------------------------------------------------

use tracing::trace;

use crate::bifs;
use crate::core::Exit;
use crate::core::MonitorRef;
use crate::core::ProcessId;
use crate::erts::Message;
use crate::sched::Running;

/// Starts monitoring `pid` from the calling process.
///
/// Each call creates an independent monitor. If `pid` is not alive a DOWN
/// message with [`Exit::NOPROC`] is delivered immediately.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L400>
pub(crate) fn proc_monitor(this: &Running<'_>, pid: ProcessId) -> MonitorRef {
  let mref: MonitorRef = MonitorRef::new(this.node.next_ref());

  let installed: bool = {
    let mut graph = this.node.graph.lock();

    if this.node.alive(pid) {
      graph.monitor(mref, this.pid, pid);
      true
    } else {
      false
    }
  };

  if installed {
    trace!(target: "swarm", from = %this.pid, to = %pid, %mref, "monitor");
  } else {
    bifs::proc_deliver(this.node, this, Message::down(pid, mref, Exit::NOPROC));
  }

  mref
}

/// Removes a monitor created by the calling process.
///
/// Returns `false` if the monitor already fired or belongs to another
/// process. A DOWN message that was already delivered stays queued.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L700>
pub(crate) fn proc_demonitor(this: &Running<'_>, mref: MonitorRef) -> bool {
  let removed: bool = this.node.graph.lock().demonitor(mref, this.pid);

  if removed {
    trace!(target: "swarm", from = %this.pid, %mref, "demonitor");
  }

  removed
}
