use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::core::Exit;
use crate::core::MonitorRef;
use crate::core::ProcessId;
use crate::core::Tag;
use crate::core::Term;

// -----------------------------------------------------------------------------
// Message
// -----------------------------------------------------------------------------

/// A message delivered to a process mailbox.
///
/// Every message records its sender (`None` when sent from outside the
/// swarm), a [`Tag`] used by selective receive, and a [`Payload`].
#[derive(Clone)]
pub struct Message {
  from: Option<ProcessId>,
  tag: Tag,
  payload: Payload,
}

impl Message {
  #[inline]
  pub(crate) fn new(from: Option<ProcessId>, tag: Tag, term: Term) -> Self {
    Self {
      from,
      tag,
      payload: Payload::Term(term),
    }
  }

  #[inline]
  pub(crate) fn exit(from: ProcessId, reason: Exit) -> Self {
    Self {
      from: Some(from),
      tag: Tag::EXIT,
      payload: Payload::Exit(ExitMessage::new(from, reason)),
    }
  }

  #[inline]
  pub(crate) fn down(from: ProcessId, mref: MonitorRef, reason: Exit) -> Self {
    Self {
      from: Some(from),
      tag: Tag::DOWN,
      payload: Payload::Down(DownMessage::new(from, mref, reason)),
    }
  }

  /// Returns the sender of the message.
  #[inline]
  pub const fn from(&self) -> Option<ProcessId> {
    self.from
  }

  /// Returns the selective receive tag.
  #[inline]
  pub const fn tag(&self) -> Tag {
    self.tag
  }

  /// Returns a reference to the payload.
  #[inline]
  pub const fn payload(&self) -> &Payload {
    &self.payload
  }

  /// Converts the message into its payload.
  #[inline]
  pub fn into_payload(self) -> Payload {
    self.payload
  }

  /// Returns the user term, if this is not a system signal.
  #[inline]
  pub fn term(&self) -> Option<&Term> {
    match self.payload {
      Payload::Term(ref term) => Some(term),
      _ => None,
    }
  }

  /// Returns a reference to the user value if it has type `T`.
  #[inline]
  pub fn downcast_ref<T>(&self) -> Option<&T>
  where
    T: 'static,
  {
    self.term().and_then(Term::downcast_ref)
  }

  /// Extracts the user value of type `T`.
  ///
  /// # Errors
  ///
  /// Returns the message unchanged if it is a system signal or holds a
  /// different type.
  pub fn downcast<T>(self) -> Result<Box<T>, Self>
  where
    T: 'static,
  {
    let Self { from, tag, payload } = self;

    match payload {
      Payload::Term(term) => term.downcast::<T>().map_err(|term| Self {
        from,
        tag,
        payload: Payload::Term(term),
      }),
      payload => Err(Self { from, tag, payload }),
    }
  }

  /// Returns the EXIT signal, if this is one.
  #[inline]
  pub fn as_exit(&self) -> Option<&ExitMessage> {
    match self.payload {
      Payload::Exit(ref exit) => Some(exit),
      _ => None,
    }
  }

  /// Returns the DOWN signal, if this is one.
  #[inline]
  pub fn as_down(&self) -> Option<&DownMessage> {
    match self.payload {
      Payload::Down(ref down) => Some(down),
      _ => None,
    }
  }

  /// Returns `true` if the message is a trapped EXIT signal.
  #[inline]
  pub fn is_exit(&self) -> bool {
    matches!(self.payload, Payload::Exit(_))
  }

  /// Returns `true` if the message is a DOWN signal.
  #[inline]
  pub fn is_down(&self) -> bool {
    matches!(self.payload, Payload::Down(_))
  }
}

impl Debug for Message {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Message")
      .field("from", &self.from)
      .field("tag", &self.tag)
      .field("payload", &self.payload)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Payload
// -----------------------------------------------------------------------------

/// Contents of a [`Message`].
#[derive(Clone)]
pub enum Payload {
  /// Opaque user value.
  Term(Term),
  /// Trapped EXIT signal from a linked process.
  Exit(ExitMessage),
  /// DOWN signal from a monitored process.
  Down(DownMessage),
}

impl Debug for Payload {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Term(inner) => Debug::fmt(inner, f),
      Self::Exit(inner) => Debug::fmt(inner, f),
      Self::Down(inner) => Debug::fmt(inner, f),
    }
  }
}

// -----------------------------------------------------------------------------
// Exit Message
// -----------------------------------------------------------------------------

/// A message representing a trapped EXIT signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitMessage {
  from: ProcessId,
  reason: Exit,
}

impl ExitMessage {
  #[inline]
  pub(crate) const fn new(from: ProcessId, reason: Exit) -> Self {
    Self { from, reason }
  }

  /// Returns the process that exited.
  #[inline]
  pub const fn from(&self) -> ProcessId {
    self.from
  }

  /// Returns the exit reason.
  #[inline]
  pub const fn reason(&self) -> Exit {
    self.reason
  }
}

// -----------------------------------------------------------------------------
// Down Message
// -----------------------------------------------------------------------------

/// A message representing a monitor DOWN signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DownMessage {
  from: ProcessId,
  mref: MonitorRef,
  reason: Exit,
}

impl DownMessage {
  #[inline]
  pub(crate) const fn new(from: ProcessId, mref: MonitorRef, reason: Exit) -> Self {
    Self { from, mref, reason }
  }

  /// Returns the monitored process.
  #[inline]
  pub const fn from(&self) -> ProcessId {
    self.from
  }

  /// Returns the monitor reference.
  #[inline]
  pub const fn mref(&self) -> MonitorRef {
    self.mref
  }

  /// Returns the exit reason.
  #[inline]
  pub const fn reason(&self) -> Exit {
    self.reason
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
