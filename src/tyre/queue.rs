//! Intrusive, index-based multi-producer/single-consumer FIFO queue.
//!
//! Nodes are plain `u32` indices into a shared [`NodeArena`], which holds one
//! `next` link per node. Several queues may share one arena as long as each
//! queue owns a distinct sentinel ("stub") node and a node is linked into at
//! most one queue at a time.
//!
//! # Algorithm
//!
//! Producers append with a single atomic exchange on the tail followed by a
//! deferred store into the previous tail's link:
//!
//! ```text
//!   link[node] = NIL
//!   prev = tail.swap(node)
//!   link[prev] = node        <- "in flight" until this store lands
//! ```
//!
//! The consumer walks from the head. The sentinel keeps the list from ever
//! being structurally empty; when the consumer reaches the last real node it
//! re-appends the sentinel so that node can be detached. Between a producer's
//! exchange and its link store the list is briefly disconnected, and the
//! consumer spins until the link becomes visible.
//!
//! Producers are wait-free. The consumer is lock-free except for the short
//! spin on an in-flight link.

use crossbeam_utils::CachePadded;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::loom::hint;
use crate::loom::sync::atomic::AtomicU32;
use crate::loom::sync::atomic::Ordering::AcqRel;
use crate::loom::sync::atomic::Ordering::Acquire;
use crate::loom::sync::atomic::Ordering::Relaxed;
use crate::loom::sync::atomic::Ordering::Release;

/// Link value marking the end of a list.
pub const NIL: u32 = u32::MAX;

// -----------------------------------------------------------------------------
// Node Arena
// -----------------------------------------------------------------------------

/// Pre-allocated `next` links for every node a set of queues may hold.
pub struct NodeArena {
  links: Box<[AtomicU32]>,
}

impl NodeArena {
  /// Creates an arena with `capacity` nodes, all unlinked.
  ///
  /// # Panics
  ///
  /// Panics if `capacity` does not fit below [`NIL`].
  pub fn new(capacity: usize) -> Self {
    assert!(capacity < NIL as usize, "node arena too large");

    Self {
      links: (0..capacity).map(|_| AtomicU32::new(NIL)).collect(),
    }
  }

  /// Returns the number of nodes in the arena.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.links.len()
  }

  #[inline]
  fn link(&self, node: u32) -> &AtomicU32 {
    &self.links[node as usize]
  }
}

impl Debug for NodeArena {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "NodeArena({})", self.links.len())
  }
}

// -----------------------------------------------------------------------------
// MPSC Queue
// -----------------------------------------------------------------------------

/// Unbounded MPSC queue over nodes of a [`NodeArena`].
///
/// # Examples
///
/// ```
/// use swarm::tyre::MpscQueue;
/// use swarm::tyre::NodeArena;
///
/// let nodes = NodeArena::new(5);
/// let queue = MpscQueue::new(&nodes, 4);
///
/// queue.push(&nodes, 1);
/// queue.push(&nodes, 3);
///
/// // SAFETY: This thread is the only consumer.
/// unsafe {
///   assert_eq!(queue.pop(&nodes), Some(1));
///   assert_eq!(queue.pop(&nodes), Some(3));
///   assert_eq!(queue.pop(&nodes), None);
/// }
/// ```
pub struct MpscQueue {
  /// Consumer-owned cursor. Only touched by the single consumer.
  head: CachePadded<AtomicU32>,
  /// Producer-shared insertion point.
  tail: CachePadded<AtomicU32>,
  /// Sentinel node owned by this queue.
  stub: u32,
}

impl MpscQueue {
  /// Creates an empty queue using `stub` as its sentinel node.
  ///
  /// # Panics
  ///
  /// Panics if `stub` is not a node of `nodes`.
  pub fn new(nodes: &NodeArena, stub: u32) -> Self {
    assert!((stub as usize) < nodes.capacity(), "stub outside node arena");

    nodes.link(stub).store(NIL, Relaxed);

    Self {
      head: CachePadded::new(AtomicU32::new(stub)),
      tail: CachePadded::new(AtomicU32::new(stub)),
      stub,
    }
  }

  /// Returns the sentinel node of this queue.
  #[inline]
  pub const fn stub(&self) -> u32 {
    self.stub
  }

  /// Appends `node` to the back of the queue.
  ///
  /// Safe to call from any number of threads concurrently. The caller must
  /// ensure `node` is not currently linked into any queue sharing `nodes`.
  #[inline]
  pub fn push(&self, nodes: &NodeArena, node: u32) {
    debug_assert_ne!(node, NIL);

    nodes.link(node).store(NIL, Relaxed);

    let prev: u32 = self.tail.swap(node, AcqRel);

    nodes.link(prev).store(node, Release);
  }

  /// Returns `true` if no node is linked or in flight.
  ///
  /// The answer may be stale by the time the caller observes it.
  #[inline]
  pub fn is_empty(&self, nodes: &NodeArena) -> bool {
    let head: u32 = self.head.load(Relaxed);

    head == self.stub && nodes.link(head).load(Acquire) == NIL && self.tail.load(Acquire) == head
  }

  /// Removes the node at the front of the queue.
  ///
  /// Returns `None` only when the queue is empty and no push is in flight.
  ///
  /// # Safety
  ///
  /// At most one thread may call `pop` on a given queue at a time.
  pub unsafe fn pop(&self, nodes: &NodeArena) -> Option<u32> {
    'pop: loop {
      let mut head: u32 = self.head.load(Relaxed);
      let mut next: u32 = nodes.link(head).load(Acquire);

      if head == self.stub {
        if next == NIL {
          if self.tail.load(Acquire) == head {
            break 'pop None;
          }

          // A producer swapped the tail but has not linked the stub yet.
          hint::spin_loop();
          continue 'pop;
        }

        self.head.store(next, Relaxed);

        head = next;
        next = nodes.link(head).load(Acquire);
      }

      if next != NIL {
        self.head.store(next, Relaxed);
        break 'pop Some(head);
      }

      if self.tail.load(Acquire) != head {
        hint::spin_loop();
        continue 'pop;
      }

      // `head` is the last node; re-append the sentinel so it can detach.
      self.push(nodes, self.stub);

      next = nodes.link(head).load(Acquire);

      if next != NIL {
        self.head.store(next, Relaxed);
        break 'pop Some(head);
      }

      hint::spin_loop();
    }
  }
}

impl Debug for MpscQueue {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("MpscQueue")
      .field("head", &self.head.load(Relaxed))
      .field("tail", &self.tail.load(Relaxed))
      .field("stub", &self.stub)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(all(test, not(loom)))]
mod tests {
  use std::sync::Arc;
  use std::thread;

  use crate::tyre::MpscQueue;
  use crate::tyre::NodeArena;

  fn drain(queue: &MpscQueue, nodes: &NodeArena) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::new();

    // SAFETY: Tests consume from a single thread.
    while let Some(node) = unsafe { queue.pop(nodes) } {
      out.push(node);
    }

    out
  }

  #[test]
  fn test_empty() {
    let nodes: NodeArena = NodeArena::new(2);
    let queue: MpscQueue = MpscQueue::new(&nodes, 1);

    assert!(queue.is_empty(&nodes));
    assert!(drain(&queue, &nodes).is_empty());
  }

  #[test]
  fn test_fifo() {
    let nodes: NodeArena = NodeArena::new(9);
    let queue: MpscQueue = MpscQueue::new(&nodes, 8);

    for node in [3, 0, 7, 5] {
      queue.push(&nodes, node);
    }

    assert!(!queue.is_empty(&nodes));
    assert_eq!(drain(&queue, &nodes), vec![3, 0, 7, 5]);
    assert!(queue.is_empty(&nodes));
  }

  #[test]
  fn test_reuse_after_pop() {
    let nodes: NodeArena = NodeArena::new(3);
    let queue: MpscQueue = MpscQueue::new(&nodes, 2);

    for _ in 0..100 {
      queue.push(&nodes, 0);
      queue.push(&nodes, 1);

      assert_eq!(drain(&queue, &nodes), vec![0, 1]);
    }
  }

  #[test]
  fn test_interleaved_push_pop() {
    let nodes: NodeArena = NodeArena::new(4);
    let queue: MpscQueue = MpscQueue::new(&nodes, 3);

    queue.push(&nodes, 0);
    queue.push(&nodes, 1);

    // SAFETY: Tests consume from a single thread.
    assert_eq!(unsafe { queue.pop(&nodes) }, Some(0));

    queue.push(&nodes, 2);
    queue.push(&nodes, 0);

    assert_eq!(drain(&queue, &nodes), vec![1, 2, 0]);
  }

  #[test]
  fn test_shared_arena() {
    let nodes: NodeArena = NodeArena::new(6);
    let high: MpscQueue = MpscQueue::new(&nodes, 4);
    let low: MpscQueue = MpscQueue::new(&nodes, 5);

    high.push(&nodes, 0);
    low.push(&nodes, 1);
    high.push(&nodes, 2);
    low.push(&nodes, 3);

    assert_eq!(drain(&high, &nodes), vec![0, 2]);
    assert_eq!(drain(&low, &nodes), vec![1, 3]);
  }

  #[test]
  fn test_concurrent_producers() {
    const THREADS: u32 = 4;
    const PER_THREAD: u32 = 2_000;
    const TOTAL: u32 = THREADS * PER_THREAD;

    let nodes: Arc<NodeArena> = Arc::new(NodeArena::new(TOTAL as usize + 1));
    let queue: Arc<MpscQueue> = Arc::new(MpscQueue::new(&nodes, TOTAL));

    let handles: Vec<_> = (0..THREADS)
      .map(|thread| {
        let nodes: Arc<NodeArena> = Arc::clone(&nodes);
        let queue: Arc<MpscQueue> = Arc::clone(&queue);

        thread::spawn(move || {
          for index in 0..PER_THREAD {
            queue.push(&nodes, thread * PER_THREAD + index);
          }
        })
      })
      .collect();

    let mut seen: Vec<u32> = Vec::with_capacity(TOTAL as usize);

    while seen.len() < TOTAL as usize {
      // SAFETY: This thread is the only consumer.
      if let Some(node) = unsafe { queue.pop(&nodes) } {
        seen.push(node);
      } else {
        thread::yield_now();
      }
    }

    for handle in handles {
      handle.join().unwrap();
    }

    // Per-producer order is preserved.
    for thread in 0..THREADS {
      let order: Vec<u32> = seen
        .iter()
        .copied()
        .filter(|node| node / PER_THREAD == thread)
        .collect();

      assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
      assert_eq!(order.len(), PER_THREAD as usize);
    }
  }
}
