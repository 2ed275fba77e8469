use hashbrown::HashMap;
use hashbrown::HashSet;

use crate::core::MonitorRef;
use crate::core::ProcessId;

/// Edges removed when a process leaves the graph.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Departure {
  /// Processes that were linked to the departing process.
  pub(crate) links: Vec<ProcessId>,
  /// Monitors watching the departing process, with their watchers.
  pub(crate) watchers: Vec<(MonitorRef, ProcessId)>,
}

/// Link and monitor edges between live processes.
///
/// Links are stored in both directions. Each monitor is stored once by
/// reference plus an index on each endpoint for cleanup.
#[derive(Debug, Default)]
pub(crate) struct LinkGraph {
  links: HashMap<ProcessId, HashSet<ProcessId>>,
  monitors: HashMap<MonitorRef, (ProcessId, ProcessId)>,
  watched_by: HashMap<ProcessId, HashSet<MonitorRef>>,
  watching: HashMap<ProcessId, HashSet<MonitorRef>>,
}

impl LinkGraph {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Links `a` and `b`. Returns `false` if they were already linked.
  pub(crate) fn link(&mut self, a: ProcessId, b: ProcessId) -> bool {
    if a == b {
      return false;
    }

    let inserted: bool = self.links.entry(a).or_default().insert(b);
    self.links.entry(b).or_default().insert(a);

    inserted
  }

  /// Unlinks `a` and `b`. Returns `false` if they were not linked.
  pub(crate) fn unlink(&mut self, a: ProcessId, b: ProcessId) -> bool {
    let removed: bool = remove_edge(&mut self.links, a, &b);
    remove_edge(&mut self.links, b, &a);

    removed
  }

  /// Records that `watcher` monitors `watched` under `mref`.
  pub(crate) fn monitor(&mut self, mref: MonitorRef, watcher: ProcessId, watched: ProcessId) {
    self.monitors.insert(mref, (watcher, watched));
    self.watched_by.entry(watched).or_default().insert(mref);
    self.watching.entry(watcher).or_default().insert(mref);
  }

  /// Removes monitor `mref` if it is owned by `watcher`.
  pub(crate) fn demonitor(&mut self, mref: MonitorRef, watcher: ProcessId) -> bool {
    match self.monitors.get(&mref) {
      Some(&(owner, watched)) if owner == watcher => {
        self.monitors.remove(&mref);
        remove_edge(&mut self.watched_by, watched, &mref);
        remove_edge(&mut self.watching, watcher, &mref);
        true
      }
      _ => false,
    }
  }

  #[inline]
  pub(crate) fn linked(&self, a: ProcessId, b: ProcessId) -> bool {
    self.links.get(&a).is_some_and(|set| set.contains(&b))
  }

  #[inline]
  pub(crate) fn links_of(&self, pid: ProcessId) -> Vec<ProcessId> {
    self
      .links
      .get(&pid)
      .map(|set| set.iter().copied().collect())
      .unwrap_or_default()
  }

  /// Returns the monitors installed by `pid`.
  #[inline]
  pub(crate) fn monitors_of(&self, pid: ProcessId) -> Vec<MonitorRef> {
    self
      .watching
      .get(&pid)
      .map(|set| set.iter().copied().collect())
      .unwrap_or_default()
  }

  /// Removes every edge touching `pid`.
  ///
  /// Monitors installed by `pid` are discarded silently.
  pub(crate) fn remove(&mut self, pid: ProcessId) -> Departure {
    let mut departure: Departure = Departure::default();

    if let Some(peers) = self.links.remove(&pid) {
      for peer in peers {
        remove_edge(&mut self.links, peer, &pid);
        departure.links.push(peer);
      }
    }

    if let Some(mrefs) = self.watched_by.remove(&pid) {
      for mref in mrefs {
        if let Some((watcher, _)) = self.monitors.remove(&mref) {
          remove_edge(&mut self.watching, watcher, &mref);
          departure.watchers.push((mref, watcher));
        }
      }
    }

    if let Some(mrefs) = self.watching.remove(&pid) {
      for mref in mrefs {
        if let Some((_, watched)) = self.monitors.remove(&mref) {
          remove_edge(&mut self.watched_by, watched, &mref);
        }
      }
    }

    departure.links.sort_unstable();
    departure.watchers.sort_unstable();
    departure
  }

  #[cfg(test)]
  fn is_empty(&self) -> bool {
    self.links.is_empty()
      && self.monitors.is_empty()
      && self.watched_by.is_empty()
      && self.watching.is_empty()
  }
}

fn remove_edge<K, V>(map: &mut HashMap<K, HashSet<V>>, key: K, value: &V) -> bool
where
  K: Eq + std::hash::Hash,
  V: Eq + std::hash::Hash,
{
  let Some(set) = map.get_mut(&key) else {
    return false;
  };

  let removed: bool = set.remove(value);

  if set.is_empty() {
    map.remove(&key);
  }

  removed
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::num::NonZeroU64;

  use crate::core::MonitorRef;
  use crate::core::ProcessId;
  use crate::node::graph::Departure;
  use crate::node::graph::LinkGraph;

  fn pid(serial: u64) -> ProcessId {
    ProcessId::new(serial, serial as u32).unwrap()
  }

  fn mref(bits: u64) -> MonitorRef {
    MonitorRef::new(NonZeroU64::new(bits).unwrap())
  }

  #[test]
  fn test_link_symmetric_and_idempotent() {
    let mut graph: LinkGraph = LinkGraph::new();

    assert!(graph.link(pid(1), pid(2)));
    assert!(!graph.link(pid(2), pid(1)));
    assert!(graph.linked(pid(1), pid(2)));
    assert!(graph.linked(pid(2), pid(1)));
    assert!(!graph.link(pid(3), pid(3)));
  }

  #[test]
  fn test_unlink_removes_both_sides() {
    let mut graph: LinkGraph = LinkGraph::new();

    graph.link(pid(1), pid(2));

    assert!(graph.unlink(pid(2), pid(1)));
    assert!(!graph.unlink(pid(2), pid(1)));
    assert!(!graph.linked(pid(1), pid(2)));
    assert!(graph.is_empty());
  }

  #[test]
  fn test_demonitor_requires_owner() {
    let mut graph: LinkGraph = LinkGraph::new();

    graph.monitor(mref(1), pid(1), pid(2));

    assert!(!graph.demonitor(mref(1), pid(2)));
    assert!(graph.demonitor(mref(1), pid(1)));
    assert!(!graph.demonitor(mref(1), pid(1)));
    assert!(graph.is_empty());
  }

  #[test]
  fn test_remove_reports_departure() {
    let mut graph: LinkGraph = LinkGraph::new();

    graph.link(pid(1), pid(2));
    graph.link(pid(1), pid(3));
    graph.monitor(mref(10), pid(4), pid(1));
    graph.monitor(mref(11), pid(2), pid(1));
    graph.monitor(mref(12), pid(1), pid(5));

    let departure: Departure = graph.remove(pid(1));

    assert_eq!(departure.links, [pid(2), pid(3)]);
    assert_eq!(departure.watchers, [(mref(10), pid(4)), (mref(11), pid(2))]);
    assert!(graph.is_empty());
  }

  #[test]
  fn test_monitors_of() {
    let mut graph: LinkGraph = LinkGraph::new();

    graph.monitor(mref(1), pid(1), pid(2));
    graph.monitor(mref(2), pid(1), pid(3));

    let mut mrefs: Vec<MonitorRef> = graph.monitors_of(pid(1));
    mrefs.sort_unstable();

    assert_eq!(mrefs, [mref(1), mref(2)]);
    assert!(graph.monitors_of(pid(2)).is_empty());
  }
}
