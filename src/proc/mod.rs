//! Process control blocks and owner-side process state.
//!
//! # Architecture
//!
//! Every arena slot holds one [`ProcData`]. Its state is split by who may
//! touch it:
//!
//! - atomics (id, pins, lifecycle state, waiting and kill flags, reductions)
//!   and the lock-free signal stack, shared by all threads
//! - [`ProcInternal`], owned by the process and reached through
//!   [`OwnerGuard`]
//! - [`ProcExternal`], rarely-modified state behind a [`RwLock`]
//!
//! A process runs on a stackful coroutine pinned to the scheduler chosen at
//! spawn. It hands control back with a [`Suspend`] reason and is resumed
//! with a [`Resume`] command.
//!
//! [`RwLock`]: ::parking_lot::RwLock

mod context;
mod mailbox;
mod owner_guard;
mod proc_data;
mod state;

pub(crate) use self::context::Entry;
pub(crate) use self::context::ExitUnwind;
pub(crate) use self::context::ProcCoroutine;
pub(crate) use self::context::Resume;
pub(crate) use self::context::Suspend;
pub(crate) use self::context::Yield;
pub(crate) use self::context::suspend;
pub(crate) use self::mailbox::ProcMailbox;
pub(crate) use self::owner_guard::OwnerGuard;
pub(crate) use self::proc_data::Pinned;
pub(crate) use self::proc_data::Prepare;
pub(crate) use self::proc_data::ProcData;
pub(crate) use self::proc_data::ProcExternal;
pub(crate) use self::proc_data::ProcInternal;
pub(crate) use self::state::AtomicState;

pub use self::state::ProcessState;

pub(crate) use crate::sched::on_worker;
