use hashbrown::HashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use crate::core::ProcessId;
use crate::core::Tag;
use crate::core::Term;
use crate::core::TimerRef;

/// Delivery performed when a timer fires.
#[derive(Debug)]
pub(crate) enum TimerEntry {
  /// Deliver a tagged message.
  Send {
    from: Option<ProcessId>,
    dest: ProcessId,
    tag: Tag,
    term: Term,
  },
  /// Wake a process blocked in a receive with a timeout.
  Wake { pid: ProcessId },
}

#[derive(Debug, Default)]
struct TimerQueue {
  by_deadline: BTreeMap<(Instant, TimerRef), TimerEntry>,
  by_ref: HashMap<TimerRef, Instant>,
}

/// Swarm-wide list of pending one-shot timers.
///
/// The earliest deadline is mirrored in an atomic so schedulers can skip the
/// lock when nothing is due.
#[derive(Debug)]
pub(crate) struct TimerList {
  queue: Mutex<TimerQueue>,
  epoch: Instant,
  next: AtomicU64,
}

impl TimerList {
  const NONE: u64 = u64::MAX;

  pub(crate) fn new() -> Self {
    Self {
      queue: Mutex::new(TimerQueue::default()),
      epoch: Instant::now(),
      next: AtomicU64::new(Self::NONE),
    }
  }

  /// Schedules `entry` at `deadline`.
  ///
  /// Returns `true` if the new timer is now the earliest one.
  pub(crate) fn insert(&self, tref: TimerRef, deadline: Instant, entry: TimerEntry) -> bool {
    let mut queue = self.queue.lock();

    queue.by_deadline.insert((deadline, tref), entry);
    queue.by_ref.insert(tref, deadline);

    let earliest: bool = queue
      .by_deadline
      .keys()
      .next()
      .is_some_and(|&(_, first)| first == tref);

    self.sync(&queue);

    earliest
  }

  /// Cancels a pending timer, returning `false` if it already fired.
  pub(crate) fn cancel(&self, tref: TimerRef) -> bool {
    let mut queue = self.queue.lock();

    let Some(deadline) = queue.by_ref.remove(&tref) else {
      return false;
    };

    queue.by_deadline.remove(&(deadline, tref));

    self.sync(&queue);

    true
  }

  /// Returns the time left before `tref` fires.
  pub(crate) fn remaining(&self, tref: TimerRef, now: Instant) -> Option<Duration> {
    self
      .queue
      .lock()
      .by_ref
      .get(&tref)
      .map(|deadline| deadline.saturating_duration_since(now))
  }

  /// Removes and returns every timer due at `now`, earliest first.
  pub(crate) fn expire(&self, now: Instant) -> Vec<TimerEntry> {
    if self.next.load(Ordering::Acquire) > self.offset(now) {
      return Vec::new();
    }

    let mut queue = self.queue.lock();
    let mut due: Vec<TimerEntry> = Vec::new();

    while let Some(entry) = queue.by_deadline.first_entry() {
      let (deadline, tref): (Instant, TimerRef) = *entry.key();

      if deadline > now {
        break;
      }

      due.push(entry.remove());
      queue.by_ref.remove(&tref);
    }

    self.sync(&queue);

    due
  }

  /// Returns the earliest pending deadline.
  pub(crate) fn next_deadline(&self) -> Option<Instant> {
    match self.next.load(Ordering::Acquire) {
      Self::NONE => None,
      nanos => Some(self.epoch + Duration::from_nanos(nanos)),
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.queue.lock().by_ref.len()
  }

  #[inline]
  fn offset(&self, instant: Instant) -> u64 {
    let nanos: u128 = instant.saturating_duration_since(self.epoch).as_nanos();

    u64::try_from(nanos).unwrap_or(Self::NONE - 1)
  }

  fn sync(&self, queue: &TimerQueue) {
    let next: u64 = queue
      .by_deadline
      .keys()
      .next()
      .map_or(Self::NONE, |&(deadline, _)| self.offset(deadline));

    self.next.store(next, Ordering::Release);
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::num::NonZeroU64;
  use std::time::Duration;
  use std::time::Instant;

  use crate::core::ProcessId;
  use crate::core::TimerRef;
  use crate::node::timers::TimerEntry;
  use crate::node::timers::TimerList;

  fn tref(bits: u64) -> TimerRef {
    TimerRef::new(NonZeroU64::new(bits).unwrap())
  }

  fn wake(serial: u64) -> TimerEntry {
    TimerEntry::Wake {
      pid: ProcessId::new(serial, 0).unwrap(),
    }
  }

  fn woken(entries: Vec<TimerEntry>) -> Vec<u64> {
    entries
      .into_iter()
      .map(|entry| match entry {
        TimerEntry::Wake { pid } => pid.serial(),
        TimerEntry::Send { .. } => 0,
      })
      .collect()
  }

  #[test]
  fn test_expire_in_deadline_order() {
    let timers: TimerList = TimerList::new();
    let now: Instant = Instant::now();

    timers.insert(tref(1), now + Duration::from_millis(30), wake(1));
    timers.insert(tref(2), now + Duration::from_millis(10), wake(2));
    timers.insert(tref(3), now + Duration::from_millis(20), wake(3));

    assert!(timers.expire(now).is_empty());
    assert_eq!(woken(timers.expire(now + Duration::from_millis(25))), [2, 3]);
    assert_eq!(timers.len(), 1);
    assert_eq!(woken(timers.expire(now + Duration::from_secs(1))), [1]);
    assert_eq!(timers.next_deadline(), None);
  }

  #[test]
  fn test_insert_reports_earliest() {
    let timers: TimerList = TimerList::new();
    let now: Instant = Instant::now();

    assert!(timers.insert(tref(1), now + Duration::from_secs(5), wake(1)));
    assert!(!timers.insert(tref(2), now + Duration::from_secs(9), wake(2)));
    assert!(timers.insert(tref(3), now + Duration::from_secs(1), wake(3)));
  }

  #[test]
  fn test_cancel_once() {
    let timers: TimerList = TimerList::new();
    let now: Instant = Instant::now();

    timers.insert(tref(1), now + Duration::from_secs(5), wake(1));

    assert!(timers.cancel(tref(1)));
    assert!(!timers.cancel(tref(1)));
    assert!(timers.expire(now + Duration::from_secs(10)).is_empty());
  }

  #[test]
  fn test_cancel_after_fire_fails() {
    let timers: TimerList = TimerList::new();
    let now: Instant = Instant::now();

    timers.insert(tref(1), now, wake(1));

    assert_eq!(timers.expire(now).len(), 1);
    assert!(!timers.cancel(tref(1)));
  }

  #[test]
  fn test_remaining() {
    let timers: TimerList = TimerList::new();
    let now: Instant = Instant::now();

    timers.insert(tref(1), now + Duration::from_millis(50), wake(1));

    assert_eq!(timers.remaining(tref(1), now), Some(Duration::from_millis(50)));
    assert_eq!(timers.remaining(tref(1), now + Duration::from_secs(1)), Some(Duration::ZERO));
    assert_eq!(timers.remaining(tref(2), now), None);
  }

  #[test]
  fn test_next_deadline_tracks_earliest() {
    let timers: TimerList = TimerList::new();
    let now: Instant = Instant::now();
    let soon: Instant = now + Duration::from_millis(5);

    timers.insert(tref(1), now + Duration::from_secs(1), wake(1));
    timers.insert(tref(2), soon, wake(2));

    let next: Instant = timers.next_deadline().unwrap();

    assert!(next <= soon && soon - next < Duration::from_micros(1));

    timers.cancel(tref(2));

    assert!(timers.next_deadline().unwrap() > soon);
  }
}
