//! Value types shared by the whole runtime.
//!
//! - [`ProcessId`]: serial + arena slot process identifier
//! - [`MonitorRef`], [`TimerRef`]: unique references
//! - [`Exit`]: integer exit reason
//! - [`Term`], [`Item`]: type-erased message payload
//! - [`Name`]: registered process name
//! - [`Priority`], [`Timeout`], [`Tag`]: scheduling and receive parameters

mod exit;
mod item;
mod name;
mod pid;
mod priority;
mod refs;
mod tag;
mod term;
mod timeout;

pub use self::exit::Exit;
pub use self::item::Item;
pub use self::name::Name;
pub use self::pid::ProcessId;
pub use self::priority::Priority;
pub use self::refs::MonitorRef;
pub use self::refs::TimerRef;
pub use self::tag::Tag;
pub use self::term::Term;
pub use self::timeout::Timeout;
