//! Internal error handling macros.
//!
//! - [`fatal!`]: broken runtime invariants, aborts the program
//! - [`raise!`]: API misuse, panics with an [`Exception`]
//!
//! [`Exception`]: crate::core::Exception

/// Displays a system error message and aborts the program.
///
/// Reserved for states the scheduler cannot recover from, such as a run
/// queue handing out a slot that holds no process. No unwinding happens.
///
/// # Examples
///
/// ```ignore
/// if proc.pid() == 0 {
///   fatal!("dispatched a free process slot");
/// }
/// ```
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a system invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

/// Panics with an [`Exception`] describing a misused API.
///
/// Inside a process the panic terminates only that process with
/// [`Exit::PANIC`]; elsewhere it unwinds the calling thread.
///
/// # Examples
///
/// ```ignore
/// let Some(context) = context() else {
///   raise!(Error, BadCtx, "not called from a process");
/// };
/// ```
///
/// [`Exception`]: crate::core::Exception
/// [`Exit::PANIC`]: crate::core::Exit::PANIC
macro_rules! raise {
  ($class:ident, $group:ident, $error:expr $(,)?) => {
    ::std::panic::panic_any($crate::core::Exception::new(
      $crate::core::ExceptionClass::$class,
      $crate::core::ExceptionGroup::$group,
      $error,
    ))
  };
}

pub(crate) use fatal;
pub(crate) use raise;
