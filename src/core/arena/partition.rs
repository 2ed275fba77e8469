use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::ops::Range;

// -----------------------------------------------------------------------------
// Free Lists
// -----------------------------------------------------------------------------

/// LIFO free-index stacks of one partition.
///
/// Slots and blocks always move in pairs, so both stacks have equal length.
#[derive(Debug)]
pub(crate) struct FreeLists {
  pub(crate) slots: Vec<u32>,
  pub(crate) blocks: Vec<u32>,
}

impl FreeLists {
  fn seeded(range: Range<u32>) -> Self {
    // Reversed so the lowest index is handed out first.
    let slots: Vec<u32> = range.clone().rev().collect();
    let blocks: Vec<u32> = range.rev().collect();

    Self { slots, blocks }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    debug_assert_eq!(self.slots.len(), self.blocks.len());
    self.slots.len()
  }

  #[inline]
  pub(crate) fn pop(&mut self) -> Option<(u32, u32)> {
    let slot: u32 = self.slots.pop()?;
    let block: u32 = self.blocks.pop()?;

    Some((slot, block))
  }

  #[inline]
  pub(crate) fn push(&mut self, slot: u32, block: u32) {
    self.slots.push(slot);
    self.blocks.push(block);
  }

  /// Moves up to `batch` index pairs from `self` into `into`.
  pub(crate) fn move_into(&mut self, into: &mut Self, batch: usize) -> usize {
    let count: usize = batch.min(self.len());
    let from: usize = self.len() - count;

    into.slots.extend(self.slots.drain(from..));
    into.blocks.extend(self.blocks.drain(from..));

    count
  }
}

// -----------------------------------------------------------------------------
// Partition
// -----------------------------------------------------------------------------

/// One scheduler's share of the arena free lists.
#[derive(Debug)]
pub(crate) struct Partition {
  lists: CachePadded<Mutex<FreeLists>>,
}

impl Partition {
  pub(crate) fn new(range: Range<u32>) -> Self {
    Self {
      lists: CachePadded::new(Mutex::new(FreeLists::seeded(range))),
    }
  }

  #[inline]
  pub(crate) fn lock(&self) -> MutexGuard<'_, FreeLists> {
    self.lists.lock()
  }
}

/// Splits `0..capacity` into `count` contiguous, disjoint ranges.
pub(crate) fn split(capacity: u32, count: u32) -> impl Iterator<Item = Range<u32>> {
  let chunk: u32 = capacity / count;
  let extra: u32 = capacity % count;

  (0..count).map(move |index| {
    let start: u32 = index * chunk + index.min(extra);
    let end: u32 = start + chunk + u32::from(index < extra);

    start..end
  })
}
