//! Built-in operations shared by [`Process`] and [`Swarm`].
//!
//! Functions taking a [`Running`] act on behalf of the calling process and
//! may only run on its scheduler thread. Functions taking a [`Node`] may run
//! on any thread.
//!
//! [`Process`]: crate::erts::Process
//! [`Swarm`]: crate::erts::Swarm
//! [`Running`]: crate::sched::Running
//! [`Node`]: crate::node::Node

mod exit;
mod flags;
mod info;
mod link;
mod mailbox;
mod monitor;
mod name;
mod spawn;
mod timer;

pub(crate) use self::exit::proc_exit;
pub(crate) use self::exit::proc_kill;
pub(crate) use self::flags::proc_get_flags;
pub(crate) use self::flags::proc_set_flag;
pub(crate) use self::flags::proc_set_flags;
pub(crate) use self::info::proc_alive;
pub(crate) use self::info::proc_info;
pub(crate) use self::info::proc_list;
pub(crate) use self::info::swarm_stats;
pub(crate) use self::link::proc_link;
pub(crate) use self::link::proc_unlink;
pub(crate) use self::mailbox::charge_send;
pub(crate) use self::mailbox::proc_consume;
pub(crate) use self::mailbox::proc_deliver;
pub(crate) use self::mailbox::proc_receive;
pub(crate) use self::mailbox::proc_send;
pub(crate) use self::mailbox::proc_send_named;
pub(crate) use self::mailbox::proc_yield;
pub(crate) use self::monitor::proc_demonitor;
pub(crate) use self::monitor::proc_monitor;
pub(crate) use self::name::proc_register;
pub(crate) use self::name::proc_registered;
pub(crate) use self::name::proc_unregister;
pub(crate) use self::name::proc_whereis;
pub(crate) use self::spawn::proc_spawn;
pub(crate) use self::spawn::proc_terminate;
pub(crate) use self::timer::fire_timers;
pub(crate) use self::timer::proc_cancel_timer;
pub(crate) use self::timer::proc_read_timer;
pub(crate) use self::timer::proc_send_after;
