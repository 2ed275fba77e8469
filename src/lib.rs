//! Swarm - A BEAM-inspired lightweight process runtime for Rust.
//!
//! Swarm runs very large numbers of isolated processes on a fixed pool of
//! scheduler threads. Each process runs on its own stackful coroutine and
//! yields cooperatively when its reduction budget is spent. Processes talk
//! only through mailboxes with selective receive, and crash detection uses
//! Erlang-style links and monitors.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use swarm::erts::Process;
//! use swarm::erts::Swarm;
//! use swarm::erts::SwarmConfig;
//!
//! let mut config: SwarmConfig = SwarmConfig::new();
//! config.schedulers = 2;
//! config.capacity = 64;
//!
//! let swarm: Swarm = Swarm::new(config).unwrap();
//!
//! let echo = swarm
//!   .spawn(|| {
//!     let message = Process::receive(Duration::from_secs(5)).unwrap();
//!     let (from, text) = *message.downcast::<(swarm::core::ProcessId, String)>().unwrap();
//!     Process::send(from, text.to_uppercase());
//!   })
//!   .unwrap();
//!
//! swarm
//!   .spawn(move || {
//!     Process::send(echo, (Process::this(), String::from("hello")));
//!     let reply = Process::receive(Duration::from_secs(5)).unwrap();
//!     assert_eq!(reply.downcast_ref::<String>().map(String::as_str), Some("HELLO"));
//!   })
//!   .unwrap();
//!
//! assert!(swarm.await_idle(Duration::from_secs(10)));
//! swarm.shutdown();
//! ```
//!
//! # Core Modules
//!
//! - [`erts`]: Swarm handle, in-process API, and messages
//! - [`init`]: Process-wide swarm singleton
//! - [`core`]: Core types (process ids, references, exit reasons, errors)
//! - [`tyre`]: Lock-free run queue and signal stack
//! - [`consts`]: Runtime configuration constants

mod bifs;
mod loom;
mod node;
mod proc;
mod sched;
mod utils;

pub mod consts;
pub mod core;
pub mod erts;
pub mod init;
pub mod tyre;
