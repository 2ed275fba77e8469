use parking_lot::Condvar;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::atomic::fence;
use std::time::Duration;

/// Sleep/wake handshake between one idle scheduler and its producers.
///
/// The scheduler raises `sleeping` before its final emptiness check and
/// producers read it after publishing work, each separated by a full fence,
/// so at least one side observes the other.
#[derive(Debug, Default)]
pub(crate) struct Parker {
  sleeping: AtomicBool,
  notified: Mutex<bool>,
  condvar: Condvar,
}

impl Parker {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Blocks for at most `timeout` unless `ready` reports pending work.
  pub(crate) fn park<F>(&self, timeout: Duration, ready: F)
  where
    F: FnOnce() -> bool,
  {
    self.sleeping.store(true, Ordering::SeqCst);

    fence(Ordering::SeqCst);

    if !ready() {
      let mut notified = self.notified.lock();

      if !*notified {
        let _timeout = self.condvar.wait_for(&mut notified, timeout);
      }

      *notified = false;
    }

    self.sleeping.store(false, Ordering::Release);
  }

  /// Wakes the scheduler if it is parked or about to park.
  #[inline]
  pub(crate) fn unpark(&self) {
    fence(Ordering::SeqCst);

    if self.sleeping.load(Ordering::SeqCst) {
      self.notify();
    }
  }

  /// Wakes the scheduler unconditionally.
  pub(crate) fn notify(&self) {
    *self.notified.lock() = true;
    self.condvar.notify_one();
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::thread;
  use std::time::Duration;
  use std::time::Instant;

  use super::Parker;

  #[test]
  fn test_ready_skips_wait() {
    let parker: Parker = Parker::new();
    let start: Instant = Instant::now();

    parker.park(Duration::from_secs(5), || true);

    assert!(start.elapsed() < Duration::from_secs(1));
  }

  #[test]
  fn test_timeout_expires() {
    let parker: Parker = Parker::new();
    let start: Instant = Instant::now();

    parker.park(Duration::from_millis(20), || false);

    assert!(start.elapsed() >= Duration::from_millis(20));
  }

  #[test]
  fn test_notify_before_park_is_not_lost() {
    let parker: Parker = Parker::new();
    let start: Instant = Instant::now();

    parker.notify();
    parker.park(Duration::from_secs(5), || false);

    assert!(start.elapsed() < Duration::from_secs(1));
  }

  #[test]
  fn test_unpark_wakes_sleeper() {
    let parker: Arc<Parker> = Arc::new(Parker::new());
    let remote: Arc<Parker> = Arc::clone(&parker);

    let handle = thread::spawn(move || {
      let start: Instant = Instant::now();
      remote.park(Duration::from_secs(10), || false);
      start.elapsed()
    });

    while !parker.sleeping.load(std::sync::atomic::Ordering::SeqCst) {
      thread::yield_now();
    }

    parker.unpark();

    assert!(handle.join().unwrap() < Duration::from_secs(5));
  }
}
