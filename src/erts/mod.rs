//! Public API of the swarm runtime system.
//!
//! - [`Swarm`]: external handle that owns the scheduler threads
//! - [`Process`]: API available to code running inside a process
//! - [`Message`]: values received from a mailbox

mod config;
mod message;
mod process;
mod spawn;
mod swarm;

pub use self::config::SwarmConfig;
pub use self::config::available_cpus;
pub use self::message::DownMessage;
pub use self::message::ExitMessage;
pub use self::message::Message;
pub use self::message::Payload;
pub use self::process::Process;
pub use self::process::ProcessFlags;
pub use self::process::ProcessInfo;
pub use self::spawn::SpawnConfig;
pub use self::spawn::SpawnHandle;
pub use self::swarm::Swarm;
pub use self::swarm::SwarmStats;

pub use crate::proc::ProcessState;
