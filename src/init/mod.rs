//! Process-wide swarm singleton.
//!
//! Most programs run a single swarm. [`init`] starts it, installs the
//! tracing subscriber, and stores the handle so that any thread can reach
//! it with [`swarm`]. [`shutdown`] stops it again.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::Once;
use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::span;

use crate::core::InitError;
use crate::erts::Swarm;
use crate::erts::SwarmConfig;

static GLOBAL: Mutex<Option<Arc<Swarm>>> = Mutex::new(None);
static TRACING: Once = Once::new();

/// Starts the global swarm named `name` with `schedulers` scheduler threads.
///
/// This is the same as calling [`init_opts`] with a default config.
///
/// # Errors
///
/// See [`init_opts`].
pub fn init(name: &str, schedulers: usize) -> Result<Arc<Swarm>, InitError> {
  let mut config: SwarmConfig = SwarmConfig::new();

  config.name = name.to_owned();
  config.schedulers = schedulers;

  init_opts(config)
}

/// Starts the global swarm configured by `config`.
///
/// # Errors
///
/// Returns [`InitError::AlreadyRunning`] if the global swarm is running,
/// and any error of [`Swarm::new`] otherwise.
pub fn init_opts(config: SwarmConfig) -> Result<Arc<Swarm>, InitError> {
  let mut global = GLOBAL.lock();

  if global.is_some() {
    return Err(InitError::AlreadyRunning);
  }

  TRACING.call_once(|| {
    if let Err(error) = init_tracing_subscriber(&config) {
      eprintln!("failed to set tracing subscriber:");
      eprintln!("    {error}");
    }
  });

  let span: Span = span!(target: "swarm", Level::DEBUG, "init", name = %config.name);

  debug!(target: "swarm", parent: &span, "initializing");

  let swarm: Arc<Swarm> = Arc::new(Swarm::new(config)?);

  *global = Some(Arc::clone(&swarm));

  debug!(target: "swarm", parent: &span, "initialized");

  Ok(swarm)
}

/// Returns the global swarm, if running.
pub fn swarm() -> Option<Arc<Swarm>> {
  GLOBAL.lock().clone()
}

/// Stops the global swarm.
///
/// Returns `false` if no global swarm was running. Handles returned by
/// [`swarm`] stay usable but the swarm no longer runs processes.
pub fn shutdown() -> bool {
  let Some(swarm) = GLOBAL.lock().take() else {
    return false;
  };

  swarm.shutdown();

  true
}

/// Builds the global tracing subscriber configuration.
#[cfg(feature = "tracing")]
fn init_tracing_subscriber(config: &SwarmConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
  use tracing_subscriber::FmtSubscriber;
  use tracing_subscriber::fmt::format;
  use tracing_subscriber::util::SubscriberInitExt;

  FmtSubscriber::builder()
    .event_format(format().compact())
    .log_internal_errors(true)
    .with_ansi(true)
    .with_file(config.tracing_source_file)
    .with_level(true)
    .with_line_number(config.tracing_source_line)
    .with_max_level(config.tracing_filter())
    .with_target(config.tracing_source_name)
    .with_thread_ids(config.tracing_thread_info)
    .with_thread_names(config.tracing_thread_info)
    .finish()
    .try_init()
}

#[cfg(not(feature = "tracing"))]
fn init_tracing_subscriber(_config: &SwarmConfig) -> Result<(), std::convert::Infallible> {
  Ok(())
}
