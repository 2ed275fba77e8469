// -----------------------------------------------------------------------------
// Local Name Registration
//
// BEAM Reference:
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/register.h
//   https://github.com/erlang/otp/blob/master/erts/emulator/beam/register.c
// -----------------------------------------------------------------------------

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use parking_lot::RwLockWriteGuard;
use tracing::trace;

use crate::core::Name;
use crate::core::ProcessId;
use crate::core::RegisterError;
use crate::node::Node;
use crate::proc::ProcExternal;

/// Registers `name` for the process `pid`.
///
/// # Registration Protocol
///
/// 1. Acquire write lock on name table
/// 2. Check name is not already registered
/// 3. Check process is alive
/// 4. Check process doesn't have a registered name
/// 5. Register name → PID mapping
/// 6. Set process's registered name
///
/// # Errors
///
/// Fails without side effects if the name is taken, the process already has
/// a name, or the process is not alive.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L2295>
pub(crate) fn proc_register(node: &Node, pid: ProcessId, name: Name) -> Result<(), RegisterError> {
  let mut name_guard: RwLockWriteGuard<'_, HashMap<Name, ProcessId>> = node.names.write();

  let Entry::Vacant(name_entry) = name_guard.entry(name) else {
    return Err(RegisterError::NameTaken);
  };

  let Some(proc) = node.find(pid) else {
    return Err(RegisterError::NotAlive);
  };

  if !proc.state.load().is_alive() {
    return Err(RegisterError::NotAlive);
  }

  let mut proc_guard: RwLockWriteGuard<'_, ProcExternal> = proc.external.write();

  if proc_guard.name.is_some() {
    return Err(RegisterError::AlreadyRegistered);
  }

  trace!(target: "swarm", %pid, name = %name_entry.key(), "register");

  proc_guard.name = Some(name_entry.key().clone());
  name_entry.insert(pid);

  Ok(())
}

/// Removes the registration of `name`.
///
/// Returns `false` if the name is not registered.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L2309>
pub(crate) fn proc_unregister(node: &Node, name: &Name) -> bool {
  let mut name_guard: RwLockWriteGuard<'_, HashMap<Name, ProcessId>> = node.names.write();

  let Some(pid) = name_guard.remove(name) else {
    return false;
  };

  if let Some(proc) = node.find(pid) {
    proc.external.write().name = None;
  }

  trace!(target: "swarm", %pid, %name, "unregister");

  true
}

/// Looks up a PID by registered name.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/bif.c#L2327>
pub(crate) fn proc_whereis(node: &Node, name: &Name) -> Option<ProcessId> {
  node.names.read().get(name).copied()
}

/// Returns all currently registered names.
///
/// The result is a snapshot and may be stale immediately after returning.
///
/// BEAM Builtin: <https://github.com/erlang/otp/blob/master/erts/emulator/beam/register.c#L576>
pub(crate) fn proc_registered(node: &Node) -> Vec<Name> {
  node.names.read().keys().cloned().collect()
}
