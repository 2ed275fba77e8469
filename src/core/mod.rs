//! Core runtime types, errors, and the process arena.

mod error;
mod types;

pub(crate) mod arena;

pub(crate) use self::error::fatal;
pub(crate) use self::error::raise;

pub use self::error::Exception;
pub use self::error::ExceptionClass;
pub use self::error::ExceptionGroup;
pub use self::error::InitError;
pub use self::error::RegisterError;
pub use self::error::SpawnError;
pub use self::types::Exit;
pub use self::types::Item;
pub use self::types::MonitorRef;
pub use self::types::Name;
pub use self::types::Priority;
pub use self::types::ProcessId;
pub use self::types::Tag;
pub use self::types::Term;
pub use self::types::TimerRef;
pub use self::types::Timeout;
