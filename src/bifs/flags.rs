// -----------------------------------------------------------------------------
// Process Flags
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/erl_process.h#L1632
// -----------------------------------------------------------------------------

use crate::erts::ProcessFlags;
use crate::sched::Running;

/// Returns the process flags of the calling process.
///
/// BEAM Builtin: N/A
pub(crate) fn proc_get_flags(this: &Running<'_>) -> ProcessFlags {
  this.flags()
}

/// Replaces every process flag of the calling process.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L2013>
pub(crate) fn proc_set_flags(this: &Running<'_>, flags: ProcessFlags) {
  this.set_flags(flags);
}

/// Sets a single process flag, returning its previous value.
///
/// Only the owner writes its flags, so the read-modify-write cannot race.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L2013>
pub(crate) fn proc_set_flag(this: &Running<'_>, flag: ProcessFlags, value: bool) -> bool {
  let mut flags: ProcessFlags = this.flags();
  let previous: bool = flags.contains(flag);

  flags.set(flag, value);
  this.set_flags(flags);

  previous
}
