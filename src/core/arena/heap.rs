use std::alloc::Layout;
use std::alloc::alloc;
use std::alloc::dealloc;
use std::ptr::NonNull;

use crate::consts::HEAP_BLOCK_ALIGN;
use crate::core::InitError;

// -----------------------------------------------------------------------------
// Heap Pool
// -----------------------------------------------------------------------------

/// Single reservation carved into fixed-size heap blocks.
pub(crate) struct HeapPool {
  base: NonNull<u8>,
  layout: Layout,
  block_size: usize,
}

// SAFETY: Each block is handed to exactly one process at a time by the
//         arena free lists; the pool itself is never mutated after creation.
unsafe impl Send for HeapPool {}

// SAFETY: See above.
unsafe impl Sync for HeapPool {}

impl HeapPool {
  pub(crate) fn new(blocks: usize, block_size: usize) -> Result<Self, InitError> {
    let Some(bytes) = blocks.checked_mul(block_size) else {
      return Err(InitError::Reservation(usize::MAX));
    };

    let Ok(layout) = Layout::from_size_align(bytes.max(HEAP_BLOCK_ALIGN), HEAP_BLOCK_ALIGN) else {
      return Err(InitError::Reservation(bytes));
    };

    // SAFETY: `layout` has a non-zero size.
    let base: *mut u8 = unsafe { alloc(layout) };

    let Some(base) = NonNull::new(base) else {
      return Err(InitError::Reservation(layout.size()));
    };

    Ok(Self {
      base,
      layout,
      block_size,
    })
  }

  #[inline]
  pub(crate) const fn block_size(&self) -> usize {
    self.block_size
  }

  #[inline]
  pub(crate) const fn reserved(&self) -> usize {
    self.layout.size()
  }

  /// Returns the start of block `index`.
  #[inline]
  pub(crate) fn block(&self, index: u32) -> NonNull<u8> {
    let offset: usize = index as usize * self.block_size;

    debug_assert!(offset + self.block_size <= self.layout.size());

    // SAFETY: `index` comes from the arena free lists and is in bounds.
    unsafe { self.base.add(offset) }
  }
}

impl Drop for HeapPool {
  fn drop(&mut self) {
    // SAFETY: `base` was allocated with `layout` in `HeapPool::new`.
    unsafe { dealloc(self.base.as_ptr(), self.layout) }
  }
}

// -----------------------------------------------------------------------------
// Bump Heap
// -----------------------------------------------------------------------------

/// Bump-pointer allocator over one heap block.
///
/// Memory is only reclaimed when the heap is reset at the next spawn.
#[derive(Debug)]
pub(crate) struct BumpHeap {
  base: Option<NonNull<u8>>,
  size: usize,
  used: usize,
}

impl BumpHeap {
  pub(crate) const fn empty() -> Self {
    Self {
      base: None,
      size: 0,
      used: 0,
    }
  }

  #[inline]
  pub(crate) fn reset(&mut self, base: NonNull<u8>, size: usize) {
    self.base = Some(base);
    self.size = size;
    self.used = 0;
  }

  #[inline]
  pub(crate) fn clear(&mut self) {
    *self = Self::empty();
  }

  #[inline]
  pub(crate) const fn used(&self) -> usize {
    self.used
  }

  #[inline]
  pub(crate) const fn size(&self) -> usize {
    self.size
  }

  /// Allocates `layout` from the block, or `None` when it does not fit.
  pub(crate) fn alloc(&mut self, layout: Layout) -> Option<NonNull<u8>> {
    let base: NonNull<u8> = self.base?;
    let addr: usize = base.as_ptr() as usize + self.used;
    let pad: usize = addr.next_multiple_of(layout.align()) - addr;
    let start: usize = self.used.checked_add(pad)?;
    let end: usize = start.checked_add(layout.size())?;

    if end > self.size {
      return None;
    }

    self.used = end;

    // SAFETY: `start <= size`, so the pointer stays inside the block.
    Some(unsafe { base.add(start) })
  }
}

#[cfg(test)]
mod tests {
  use std::alloc::Layout;
  use std::ptr::NonNull;

  use super::BumpHeap;
  use super::HeapPool;

  #[test]
  fn test_blocks_are_disjoint() {
    let pool: HeapPool = HeapPool::new(4, 64).unwrap();

    let a: NonNull<u8> = pool.block(0);
    let b: NonNull<u8> = pool.block(1);

    assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 64);
    assert_eq!(pool.reserved(), 256);
  }

  #[test]
  fn test_bump_alloc_aligns() {
    let pool: HeapPool = HeapPool::new(1, 64).unwrap();
    let mut heap: BumpHeap = BumpHeap::empty();

    heap.reset(pool.block(0), pool.block_size());

    let a: NonNull<u8> = heap.alloc(Layout::new::<u8>()).unwrap();
    let b: NonNull<u8> = heap.alloc(Layout::new::<u64>()).unwrap();

    assert_eq!(b.as_ptr() as usize % 8, 0);
    assert!(b.as_ptr() > a.as_ptr());
    assert_eq!(heap.used(), 16);
  }

  #[test]
  fn test_bump_alloc_exhausts() {
    let pool: HeapPool = HeapPool::new(1, 32).unwrap();
    let mut heap: BumpHeap = BumpHeap::empty();

    heap.reset(pool.block(0), pool.block_size());

    assert!(heap.alloc(Layout::new::<[u8; 32]>()).is_some());
    assert!(heap.alloc(Layout::new::<u8>()).is_none());
  }

  #[test]
  fn test_empty_heap_rejects() {
    let mut heap: BumpHeap = BumpHeap::empty();

    assert!(heap.alloc(Layout::new::<u8>()).is_none());
  }
}
