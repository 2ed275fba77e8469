use std::collections::VecDeque;

use crate::consts::CAP_PROC_MSG_BUFFER;
use crate::erts::Message;
use crate::tyre::AtomicStack;

/// Consumer-private half of a process mailbox.
///
/// Producers push onto the process signal stack; the owner moves those
/// messages here in arrival order and scans for selective receive. Removing
/// a match leaves every other message in its relative position.
#[derive(Debug)]
pub(crate) struct ProcMailbox {
  queue: VecDeque<Message>,
}

impl ProcMailbox {
  pub(crate) fn new() -> Self {
    Self {
      queue: VecDeque::with_capacity(CAP_PROC_MSG_BUFFER),
    }
  }

  /// Returns a mailbox that owns no buffer.
  #[inline]
  pub(crate) const fn empty() -> Self {
    Self {
      queue: VecDeque::new(),
    }
  }

  /// Puts back a mailbox previously moved out with [`mem::replace`].
  ///
  /// Messages in `earlier` precede anything drained into `self` meanwhile.
  ///
  /// [`mem::replace`]: std::mem::replace
  #[inline]
  pub(crate) fn restore(&mut self, mut earlier: Self) {
    earlier.queue.append(&mut self.queue);
    *self = earlier;
  }

  /// Appends everything pushed onto `signals` since the last drain.
  ///
  /// Returns the number of messages moved.
  #[inline]
  pub(crate) fn drain(&mut self, signals: &AtomicStack<Message>) -> usize {
    let before: usize = self.queue.len();

    self.queue.extend(signals.take());
    self.queue.len() - before
  }

  /// Returns the index of the first message accepted by `filter`.
  #[inline]
  pub(crate) fn find<F>(&self, filter: F) -> Option<usize>
  where
    F: FnMut(&Message) -> bool,
  {
    self.queue.iter().position(filter)
  }

  /// Removes the message at `index`.
  #[inline]
  pub(crate) fn take(&mut self, index: usize) -> Option<Message> {
    self.queue.remove(index)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.queue.len()
  }

  /// Drops every queued message, returning how many were dropped.
  #[inline]
  pub(crate) fn clear(&mut self) -> usize {
    let count: usize = self.queue.len();

    self.queue.clear();
    count
  }
}

#[cfg(test)]
mod tests {
  use crate::core::Tag;
  use crate::core::Term;
  use crate::erts::Message;
  use crate::proc::ProcMailbox;
  use crate::tyre::AtomicStack;

  fn message(tag: u64, value: u32) -> Message {
    Message::new(None, Tag::new(tag), Term::new(value))
  }

  fn values(mailbox: &mut ProcMailbox) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::new();

    while let Some(message) = mailbox.take(0) {
      out.push(*message.downcast::<u32>().unwrap());
    }

    out
  }

  #[test]
  fn test_drain_preserves_order() {
    let signals: AtomicStack<Message> = AtomicStack::new();
    let mut mailbox: ProcMailbox = ProcMailbox::new();

    signals.push(message(0, 1));
    signals.push(message(0, 2));

    assert_eq!(mailbox.drain(&signals), 2);

    signals.push(message(0, 3));

    assert_eq!(mailbox.drain(&signals), 1);
    assert_eq!(values(&mut mailbox), [1, 2, 3]);
  }

  #[test]
  fn test_selective_take_keeps_others() {
    let signals: AtomicStack<Message> = AtomicStack::new();
    let mut mailbox: ProcMailbox = ProcMailbox::new();

    signals.push(message(1, 10));
    signals.push(message(7, 20));
    signals.push(message(2, 30));

    mailbox.drain(&signals);

    let index: usize = mailbox.find(|message| message.tag() == Tag::new(7)).unwrap();
    let found: Message = mailbox.take(index).unwrap();

    assert_eq!(found.downcast_ref::<u32>(), Some(&20));
    assert_eq!(mailbox.len(), 2);
    assert_eq!(values(&mut mailbox), [10, 30]);
  }

  #[test]
  fn test_find_none() {
    let mailbox: ProcMailbox = ProcMailbox::new();

    assert!(mailbox.find(|_| true).is_none());
  }

  #[test]
  fn test_restore_keeps_earlier_messages_first() {
    let signals: AtomicStack<Message> = AtomicStack::new();
    let mut mailbox: ProcMailbox = ProcMailbox::new();

    signals.push(message(0, 1));
    signals.push(message(0, 2));
    mailbox.drain(&signals);

    let earlier: ProcMailbox = std::mem::replace(&mut mailbox, ProcMailbox::empty());

    signals.push(message(0, 3));
    mailbox.drain(&signals);
    mailbox.restore(earlier);

    assert_eq!(values(&mut mailbox), [1, 2, 3]);
  }
}
