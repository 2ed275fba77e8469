//! Fixed-capacity process arena.
//!
//! The arena is reserved once at startup and never grows. It holds:
//!
//! - a slot array with one `T` per process,
//! - a pool of fixed-size heap blocks,
//! - per-scheduler partitions of free slot/block indices.
//!
//! Each partition is seeded with a contiguous index range. A partition that
//! runs dry steals a batch of indices from its peers. When two partitions are
//! locked together the lower id is always locked first.

mod heap;
mod partition;

pub(crate) use self::heap::BumpHeap;

use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ptr::NonNull;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tracing::debug;

use crate::core::InitError;

use self::heap::HeapPool;
use self::partition::FreeLists;
use self::partition::Partition;

/// Slot and heap block reserved for one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Lease {
  pub(crate) slot: u32,
  pub(crate) block: u32,
}

pub(crate) struct Arena<T> {
  slots: Box<[T]>,
  heap: HeapPool,
  partitions: Box<[Partition]>,
  steal_batch: usize,
  free: AtomicUsize,
  steals: AtomicU64,
}

impl<T> Arena<T> {
  /// Reserves an arena of `capacity` slots split across `partitions`.
  pub(crate) fn new<F>(
    capacity: usize,
    block_size: usize,
    partitions: usize,
    steal_batch: usize,
    mut init: F,
  ) -> Result<Self, InitError>
  where
    F: FnMut(u32) -> T,
  {
    let Ok(slot_count) = u32::try_from(capacity) else {
      return Err(InitError::InvalidConfig("capacity out of range"));
    };

    let Ok(partition_count) = u32::try_from(partitions) else {
      return Err(InitError::InvalidConfig("too many partitions"));
    };

    let mut slots: Vec<T> = Vec::new();

    if slots.try_reserve_exact(capacity).is_err() {
      return Err(InitError::Reservation(capacity.saturating_mul(size_of::<T>())));
    }

    slots.extend((0..slot_count).map(&mut init));

    let heap: HeapPool = HeapPool::new(capacity, block_size)?;

    let partitions: Box<[Partition]> = partition::split(slot_count, partition_count)
      .map(Partition::new)
      .collect();

    Ok(Self {
      slots: slots.into_boxed_slice(),
      heap,
      partitions,
      steal_batch: steal_batch.max(1),
      free: AtomicUsize::new(capacity),
      steals: AtomicU64::new(0),
    })
  }

  #[inline]
  pub(crate) fn capacity(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  pub(crate) fn partitions(&self) -> usize {
    self.partitions.len()
  }

  #[inline]
  pub(crate) fn free(&self) -> usize {
    self.free.load(Ordering::Relaxed)
  }

  #[inline]
  pub(crate) fn steals(&self) -> u64 {
    self.steals.load(Ordering::Relaxed)
  }

  #[inline]
  pub(crate) fn block_size(&self) -> usize {
    self.heap.block_size()
  }

  #[inline]
  pub(crate) fn reserved(&self) -> usize {
    self.heap.reserved() + self.slots.len() * size_of::<T>()
  }

  /// Returns the slot at `index`.
  #[inline]
  pub(crate) fn slot(&self, index: u32) -> Option<&T> {
    self.slots.get(index as usize)
  }

  #[inline]
  pub(crate) fn slots(&self) -> &[T] {
    &self.slots
  }

  /// Returns the start of heap block `index`.
  #[inline]
  pub(crate) fn block(&self, index: u32) -> NonNull<u8> {
    self.heap.block(index)
  }

  /// Reserves a slot and heap block, preferring `partition`.
  ///
  /// Returns `None` only when no partition has capacity left.
  pub(crate) fn acquire(&self, partition: usize) -> Option<Lease> {
    let home: usize = partition % self.partitions.len();

    if let Some((slot, block)) = self.partitions[home].lock().pop() {
      return Some(self.leased(slot, block));
    }

    for offset in 1..self.partitions.len() {
      let victim: usize = (home + offset) % self.partitions.len();

      if let Some((slot, block)) = self.steal(home, victim) {
        return Some(self.leased(slot, block));
      }
    }

    None
  }

  /// Returns a slot and heap block to `partition`.
  pub(crate) fn release(&self, partition: usize, lease: Lease) {
    let home: usize = partition % self.partitions.len();

    self.partitions[home].lock().push(lease.slot, lease.block);
    self.free.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  fn leased(&self, slot: u32, block: u32) -> Lease {
    self.free.fetch_sub(1, Ordering::Relaxed);
    Lease { slot, block }
  }

  fn steal(&self, home: usize, victim: usize) -> Option<(u32, u32)> {
    let (mut own, mut other): (MutexGuard<'_, FreeLists>, MutexGuard<'_, FreeLists>) =
      if home < victim {
        let own = self.partitions[home].lock();
        let other = self.partitions[victim].lock();
        (own, other)
      } else {
        let other = self.partitions[victim].lock();
        let own = self.partitions[home].lock();
        (own, other)
      };

    // Another thread may have refilled us while we were unlocked.
    if let Some(pair) = own.pop() {
      return Some(pair);
    }

    let moved: usize = other.move_into(&mut own, self.steal_batch);

    if moved == 0 {
      return None;
    }

    self.steals.fetch_add(1, Ordering::Relaxed);

    debug!(
      target: "swarm",
      partition = home,
      victim,
      moved,
      "arena steal",
    );

    own.pop()
  }
}

impl<T> Debug for Arena<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Arena")
      .field("capacity", &self.capacity())
      .field("partitions", &self.partitions())
      .field("free", &self.free())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::sync::Arc;
  use std::thread;

  use super::Arena;
  use super::Lease;

  fn arena(capacity: usize, partitions: usize, batch: usize) -> Arena<u32> {
    Arena::new(capacity, 64, partitions, batch, |index| index).unwrap()
  }

  #[test]
  fn test_slots_initialized() {
    let arena: Arena<u32> = arena(8, 2, 4);

    assert_eq!(arena.capacity(), 8);
    assert_eq!(arena.slot(5), Some(&5));
    assert_eq!(arena.slot(8), None);
  }

  #[test]
  fn test_acquire_local_range() {
    let arena: Arena<u32> = arena(8, 2, 4);

    assert_eq!(arena.acquire(0), Some(Lease { slot: 0, block: 0 }));
    assert_eq!(arena.acquire(1), Some(Lease { slot: 4, block: 4 }));
    assert_eq!(arena.free(), 6);
    assert_eq!(arena.steals(), 0);
  }

  #[test]
  fn test_acquire_steals_when_empty() {
    let arena: Arena<u32> = arena(4, 2, 1);

    assert!(arena.acquire(0).is_some());
    assert!(arena.acquire(0).is_some());

    let lease: Lease = arena.acquire(0).unwrap();

    assert!(lease.slot >= 2);
    assert_eq!(arena.steals(), 1);
  }

  #[test]
  fn test_exhaustion_and_release() {
    let arena: Arena<u32> = arena(4, 3, 2);
    let mut leases: Vec<Lease> = Vec::new();

    while let Some(lease) = arena.acquire(1) {
      leases.push(lease);
    }

    assert_eq!(leases.len(), 4);
    assert_eq!(arena.free(), 0);
    assert!(arena.acquire(2).is_none());

    let lease: Lease = leases.pop().unwrap();

    arena.release(2, lease);

    assert_eq!(arena.acquire(0), Some(lease));
    assert!(arena.acquire(0).is_none());
  }

  #[test]
  fn test_concurrent_acquire_unique() {
    let arena: Arc<Arena<u32>> = Arc::new(arena(1024, 4, 8));

    let handles: Vec<_> = (0..4)
      .map(|partition| {
        let arena: Arc<Arena<u32>> = Arc::clone(&arena);

        thread::spawn(move || {
          let mut slots: Vec<u32> = Vec::new();

          while let Some(lease) = arena.acquire(partition) {
            slots.push(lease.slot);
          }

          slots
        })
      })
      .collect();

    let mut seen: HashSet<u32> = HashSet::new();

    for handle in handles {
      for slot in handle.join().unwrap() {
        assert!(seen.insert(slot), "slot {slot} leased twice");
      }
    }

    assert_eq!(seen.len(), 1024);
    assert_eq!(arena.free(), 0);
  }
}
