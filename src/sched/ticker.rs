use tracing::debug;
use triomphe::Arc;

use crate::node::Node;

/// Periodically zeroes the budget of every running process.
///
/// The next accounted operation of a nudged process then yields. This is a
/// hint, not preemption: a process that never reaches a yield point keeps
/// its scheduler.
pub(crate) fn ticker(node: Arc<Node>) {
  debug!(target: "swarm", interval = ?node.params.nudge_interval, "ticker started");

  while !node.wait_halt(node.params.nudge_interval) {
    for scheduler in node.schedulers.iter() {
      if let Some(data) = scheduler.running().and_then(|slot| node.arena.slot(slot)) {
        data.exhaust();
      }
    }
  }

  debug!(target: "swarm", "ticker stopped");
}
