use std::thread;
use std::time::Duration;

use crate::consts;
use crate::core::InitError;

/// Returns the number of available CPU cores.
///
/// Falls back to [`DEFAULT_PARALLELISM`] if CPU detection fails.
///
/// [`DEFAULT_PARALLELISM`]: consts::DEFAULT_PARALLELISM
pub fn available_cpus() -> usize {
  match thread::available_parallelism() {
    Ok(count) => count.get(),
    Err(_) => consts::DEFAULT_PARALLELISM,
  }
}

// -----------------------------------------------------------------------------
// Swarm Config
// -----------------------------------------------------------------------------

/// Options used to start a [`Swarm`].
///
/// [`Swarm`]: crate::erts::Swarm
#[derive(Clone, Debug)]
pub struct SwarmConfig {
  // ---------------------------------------------------------------------------
  // Swarm Configuration
  // ---------------------------------------------------------------------------
  /// Name of the swarm, used in log output.
  pub name: String,
  /// Number of scheduler threads.
  pub schedulers: usize,
  /// Number of process slots in the arena.
  pub capacity: usize,
  /// Size (in bytes) of the heap block reserved for each process.
  pub heap_block_size: usize,
  /// Size (in bytes) of each process coroutine stack.
  pub stack_size: usize,
  /// Reduction budget granted at every dispatch.
  pub reductions: i32,
  /// Maximum number of slots moved per arena steal.
  pub steal_batch: usize,
  /// Longest time an idle scheduler parks before re-checking its queues.
  pub park_timeout: Duration,
  /// Interval of the reduction nudge. [`Duration::ZERO`] disables it.
  pub nudge_interval: Duration,
  /// Stack size (in bytes) of scheduler threads.
  pub thread_stack_size: usize,
  // ---------------------------------------------------------------------------
  // Tracing Subscriber Configuration
  // ---------------------------------------------------------------------------
  /// Include the source file of each event.
  pub tracing_source_file: bool,
  /// Include the source line of each event.
  pub tracing_source_line: bool,
  /// Include the target of each event.
  pub tracing_source_name: bool,
  /// Include the thread name and id of each event.
  pub tracing_thread_info: bool,
  /// Log at `DEBUG` instead of `INFO`.
  pub tracing_verbose: bool,
  /// Log at `TRACE`; overrides `tracing_verbose`.
  pub tracing_very_verbose: bool,
}

impl SwarmConfig {
  #[inline]
  pub fn new() -> Self {
    Self {
      name: String::from("swarm"),
      schedulers: available_cpus(),
      capacity: consts::DEFAULT_CAPACITY,
      heap_block_size: consts::DEFAULT_HEAP_BLOCK_SIZE,
      stack_size: consts::DEFAULT_STACK_SIZE,
      reductions: consts::DEFAULT_REDUCTIONS,
      steal_batch: consts::DEFAULT_STEAL_BATCH,
      park_timeout: consts::DEFAULT_PARK_TIMEOUT,
      nudge_interval: consts::DEFAULT_NUDGE_INTERVAL,
      thread_stack_size: consts::DEFAULT_THREAD_STACK_SIZE,
      tracing_source_file: false,
      tracing_source_line: false,
      tracing_source_name: false,
      tracing_thread_info: true,
      tracing_verbose: true,
      tracing_very_verbose: false,
    }
  }

  /// Checks every field for a usable value.
  ///
  /// # Errors
  ///
  /// Returns [`InitError::InvalidConfig`] naming the first invalid field.
  pub fn validate(&self) -> Result<(), InitError> {
    if self.schedulers == 0 {
      return Err(InitError::InvalidConfig("schedulers must be non-zero"));
    }

    if self.schedulers > consts::MAX_SCHEDULERS {
      return Err(InitError::InvalidConfig("too many schedulers"));
    }

    if self.capacity == 0 {
      return Err(InitError::InvalidConfig("capacity must be non-zero"));
    }

    if self.capacity > consts::MAX_CAPACITY {
      return Err(InitError::InvalidConfig("capacity out of range"));
    }

    if self.heap_block_size == 0 || self.heap_block_size % consts::HEAP_BLOCK_ALIGN != 0 {
      return Err(InitError::InvalidConfig("heap block size must be a non-zero multiple of 16"));
    }

    if self.stack_size == 0 {
      return Err(InitError::InvalidConfig("stack size must be non-zero"));
    }

    if self.reductions <= 0 {
      return Err(InitError::InvalidConfig("reductions must be positive"));
    }

    if self.park_timeout.is_zero() {
      return Err(InitError::InvalidConfig("park timeout must be non-zero"));
    }

    Ok(())
  }

  #[inline]
  pub const fn tracing_filter(&self) -> tracing::Level {
    if self.tracing_very_verbose {
      tracing::Level::TRACE
    } else if self.tracing_verbose {
      tracing::Level::DEBUG
    } else {
      tracing::Level::INFO
    }
  }
}

impl Default for SwarmConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::core::InitError;
  use crate::erts::SwarmConfig;

  #[test]
  fn test_default_is_valid() {
    assert!(SwarmConfig::default().validate().is_ok());
  }

  #[test]
  fn test_rejects_zero_schedulers() {
    let mut config: SwarmConfig = SwarmConfig::new();
    config.schedulers = 0;

    assert!(matches!(config.validate(), Err(InitError::InvalidConfig(_))));
  }

  #[test]
  fn test_rejects_unaligned_heap_block() {
    let mut config: SwarmConfig = SwarmConfig::new();
    config.heap_block_size = 100;

    assert!(matches!(config.validate(), Err(InitError::InvalidConfig(_))));
  }

  #[test]
  fn test_rejects_zero_park_timeout() {
    let mut config: SwarmConfig = SwarmConfig::new();
    config.park_timeout = Duration::ZERO;

    assert!(config.validate().is_err());
  }

  #[test]
  fn test_tracing_filter() {
    let mut config: SwarmConfig = SwarmConfig::new();
    assert_eq!(config.tracing_filter(), tracing::Level::DEBUG);

    config.tracing_very_verbose = true;
    assert_eq!(config.tracing_filter(), tracing::Level::TRACE);
  }
}
