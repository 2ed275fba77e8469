//! Lock-free multi-producer stack drained in bulk by a single consumer.
//!
//! Producers push with a compare-and-swap loop on the head pointer. The
//! consumer detaches the entire list with one exchange and walks it in
//! reverse, yielding values in the order they were pushed. Since nodes are
//! never popped individually the structure has no ABA hazard.

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::marker::PhantomData;
use std::ptr;

use crate::loom::sync::atomic::AtomicPtr;
use crate::loom::sync::atomic::Ordering::AcqRel;
use crate::loom::sync::atomic::Ordering::Acquire;
use crate::loom::sync::atomic::Ordering::Relaxed;
use crate::loom::sync::atomic::Ordering::Release;

struct Node<T> {
  next: *mut Node<T>,
  item: T,
}

// -----------------------------------------------------------------------------
// Atomic Stack
// -----------------------------------------------------------------------------

/// Treiber stack with FIFO bulk removal.
///
/// # Examples
///
/// ```
/// use swarm::tyre::AtomicStack;
///
/// let stack = AtomicStack::new();
///
/// assert!(stack.push(1));
/// assert!(!stack.push(2));
///
/// assert_eq!(stack.take().collect::<Vec<_>>(), [1, 2]);
/// assert!(stack.is_empty());
/// ```
pub struct AtomicStack<T> {
  head: AtomicPtr<Node<T>>,
  marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: Values are moved between threads through the stack.
unsafe impl<T: Send> Send for AtomicStack<T> {}

// SAFETY: All shared access goes through atomic operations on `head`.
unsafe impl<T: Send> Sync for AtomicStack<T> {}

impl<T> AtomicStack<T> {
  /// Creates a new, empty stack.
  #[cfg(not(loom))]
  #[inline]
  pub const fn new() -> Self {
    Self {
      head: AtomicPtr::new(ptr::null_mut()),
      marker: PhantomData,
    }
  }

  /// Creates a new, empty stack.
  #[cfg(loom)]
  #[inline]
  pub fn new() -> Self {
    Self {
      head: AtomicPtr::new(ptr::null_mut()),
      marker: PhantomData,
    }
  }

  /// Returns `true` if the stack currently holds no values.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.head.load(Relaxed).is_null()
  }

  /// Pushes `item` onto the stack.
  ///
  /// Returns `true` if the stack was empty before the push.
  pub fn push(&self, item: T) -> bool {
    let node: *mut Node<T> = Box::into_raw(Box::new(Node {
      next: ptr::null_mut(),
      item,
    }));

    let mut head: *mut Node<T> = self.head.load(Relaxed);

    loop {
      // SAFETY: `node` is not yet shared with any other thread.
      unsafe {
        (*node).next = head;
      }

      match self.head.compare_exchange_weak(head, node, Release, Relaxed) {
        Ok(_) => break head.is_null(),
        Err(current) => head = current,
      }
    }
  }

  /// Detaches every value currently on the stack.
  ///
  /// The returned iterator yields values in push order.
  pub fn take(&self) -> Take<T> {
    let mut node: *mut Node<T> = self.head.swap(ptr::null_mut(), AcqRel);
    let mut prev: *mut Node<T> = ptr::null_mut();

    while !node.is_null() {
      // SAFETY: The detached list is exclusively owned by this call.
      unsafe {
        let next: *mut Node<T> = (*node).next;
        (*node).next = prev;
        prev = node;
        node = next;
      }
    }

    Take {
      node: prev,
      marker: PhantomData,
    }
  }
}

impl<T> Default for AtomicStack<T> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Drop for AtomicStack<T> {
  fn drop(&mut self) {
    let mut node: *mut Node<T> = self.head.load(Acquire);

    while !node.is_null() {
      // SAFETY: `&mut self` guarantees no concurrent producers remain.
      let boxed: Box<Node<T>> = unsafe { Box::from_raw(node) };
      node = boxed.next;
    }
  }
}

impl<T> Debug for AtomicStack<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("AtomicStack")
      .field("empty", &self.is_empty())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Take
// -----------------------------------------------------------------------------

/// Owning iterator over values detached by [`AtomicStack::take`].
pub struct Take<T> {
  node: *mut Node<T>,
  marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: The detached list is uniquely owned.
unsafe impl<T: Send> Send for Take<T> {}

impl<T> Iterator for Take<T> {
  type Item = T;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.node.is_null() {
      return None;
    }

    // SAFETY: Every node in the detached list came from `Box::into_raw`.
    let boxed: Box<Node<T>> = unsafe { Box::from_raw(self.node) };

    self.node = boxed.next;

    Some(boxed.item)
  }
}

impl<T> Drop for Take<T> {
  fn drop(&mut self) {
    for _ in self.by_ref() {}
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
