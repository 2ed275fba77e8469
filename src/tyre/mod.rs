//! Lock-free building blocks used by the scheduler and mailboxes.
//!
//! - [`MpscQueue`]: intrusive sentinel run queue over a [`NodeArena`]
//! - [`AtomicStack`]: producer-side signal stack drained in push order

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("tyre requires a 32-bit or 64-bit platform");

mod queue;
mod stack;

pub use self::queue::MpscQueue;
pub use self::queue::NIL;
pub use self::queue::NodeArena;
pub use self::stack::AtomicStack;
pub use self::stack::Take;
