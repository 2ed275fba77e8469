use std::time::Duration;

// -----------------------------------------------------------------------------
// Exit Codes
// -----------------------------------------------------------------------------

/// Process exit code of a normal termination.
pub const EXIT_NORMAL: i64 = 0;

/// Process exit code of a process that panicked.
pub const EXIT_PANIC: i64 = -1;

/// Process exit code of an untrappable kill without a custom reason.
pub const EXIT_KILLED: i64 = -2;

/// Exit code synthesized when linking or monitoring a process that does not exist.
pub const EXIT_NOPROC: i64 = -3;

/// Process exit code delivered to processes still alive at shutdown.
pub const EXIT_SHUTDOWN: i64 = -4;

// -----------------------------------------------------------------------------
// System - Process Identifiers
// -----------------------------------------------------------------------------

/// Maximum number of bits of a [`ProcessId`] used for the arena slot index.
///
/// [`ProcessId`]: crate::core::ProcessId
pub const MAX_INDEX_BITS: u32 = 24;

/// Maximum number of process slots in a single arena.
pub const MAX_CAPACITY: usize = 1 << MAX_INDEX_BITS;

/// Maximum number of arena free-list partitions.
pub const MAX_PARTITIONS: usize = 64;

// -----------------------------------------------------------------------------
// System - Process Behavior
// -----------------------------------------------------------------------------

/// Whether the [`TRAP_EXIT`] flag is set by default.
///
/// [`TRAP_EXIT`]: crate::erts::ProcessFlags::TRAP_EXIT
pub const SPAWN_INIT_TRAP_EXIT: bool = false;

/// Reduction budget granted to a process at every dispatch.
pub const DEFAULT_REDUCTIONS: i32 = 2000;

/// Reductions charged for a single message send.
pub const COST_SEND: i32 = 1;

/// Reductions charged for each mailbox scan in a receive.
pub const COST_RECEIVE: i32 = 1;

// -----------------------------------------------------------------------------
// System - Scheduler Behavior
// -----------------------------------------------------------------------------

/// Default number of schedulers.
///
/// Note: This value is only used when a default value is not
///       retrievable from the host environment.
pub const DEFAULT_PARALLELISM: usize = 1;

/// Maximum number of schedulers in a single swarm.
pub const MAX_SCHEDULERS: usize = 1024;

/// Maximum number of indices moved per arena steal.
pub const DEFAULT_STEAL_BATCH: usize = 32;

/// Longest time an idle scheduler parks before re-checking its queues.
pub const DEFAULT_PARK_TIMEOUT: Duration = Duration::from_millis(10);

/// Interval of the best-effort reduction nudge.
pub const DEFAULT_NUDGE_INTERVAL: Duration = Duration::from_millis(10);

/// Stack size (in bytes) for scheduler threads.
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Number of coroutine stacks cached per scheduler.
pub const CAP_STACK_CACHE: usize = 64;

// -----------------------------------------------------------------------------
// System - Shutdown
// -----------------------------------------------------------------------------

/// How long [`Swarm::shutdown`] waits for a scheduler thread to exit.
///
/// [`Swarm::shutdown`]: crate::erts::Swarm::shutdown
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

// -----------------------------------------------------------------------------
// System - Memory Allocation
// -----------------------------------------------------------------------------

/// Default number of process slots in the arena.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Default size (in bytes) of the heap block backing each process.
pub const DEFAULT_HEAP_BLOCK_SIZE: usize = 4 * 1024;

/// Alignment (in bytes) of every heap block.
pub const HEAP_BLOCK_ALIGN: usize = 16;

/// Default size (in bytes) of each process coroutine stack.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Number of pre-allocated slots in the private mailbox queue.
pub const CAP_PROC_MSG_BUFFER: usize = 8;

/// Number of pre-allocated registered names.
pub const CAP_REGISTERED_NAMES: usize = 64;
