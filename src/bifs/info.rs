// -----------------------------------------------------------------------------
// Process Info
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_info.c
// -----------------------------------------------------------------------------

use crate::core::ProcessId;
use crate::erts::ProcessInfo;
use crate::erts::SwarmStats;
use crate::node::Counters;
use crate::node::Node;
use crate::proc::ProcessState;

/// Returns a list of all currently existing process identifiers.
///
/// Includes exiting processes (not yet fully terminated). The returned list
/// is a snapshot and may be stale immediately after returning.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L4078>
pub(crate) fn proc_list(node: &Node) -> Vec<ProcessId> {
  node
    .arena
    .slots()
    .iter()
    .filter(|data| data.state.load() != ProcessState::Free)
    .filter_map(|data| data.pid())
    .collect()
}

/// Checks if a process is alive.
///
/// Returns `true` if the process exists and has not started exiting.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_info.c#L3990>
pub(crate) fn proc_alive(node: &Node, pid: ProcessId) -> bool {
  node.alive(pid)
}

/// Returns detailed information about a process.
///
/// Returns `None` if the process is not alive.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_bif_info.c#L1558>
pub(crate) fn proc_info(node: &Node, pid: ProcessId) -> Option<ProcessInfo> {
  let (links, monitors) = {
    let graph = node.graph.lock();
    (graph.links_of(pid), graph.monitors_of(pid))
  };

  let data = node.find(pid)?;
  let state: ProcessState = data.state.load();

  if !state.is_alive() {
    return None;
  }

  Some(ProcessInfo {
    pid,
    state,
    priority: data.priority(),
    scheduler: data.scheduler(),
    message_queue_len: data.inbox_len(),
    reductions: data.executed(),
    links,
    monitors,
    trap_exit: data.traps_exits(),
    name: data.external.read().name.clone(),
  })
}

/// Returns a snapshot of the swarm-wide counters.
pub(crate) fn swarm_stats(node: &Node) -> SwarmStats {
  SwarmStats {
    spawned: Counters::read(&node.stats.spawned),
    exited: Counters::read(&node.stats.exited),
    live: node.live(),
    messages_sent: Counters::read(&node.stats.messages),
    context_switches: Counters::read(&node.stats.switches),
    timers_fired: Counters::read(&node.stats.timers),
    pending_timers: node.timers.len(),
    arena_steals: node.arena.steals(),
    free_slots: node.arena.free(),
    schedulers: node.schedulers.len(),
  }
}
