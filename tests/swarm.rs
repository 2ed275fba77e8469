use std::alloc::Layout;
use std::hint;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use swarm::core::Exception;
use swarm::core::ExceptionGroup;
use swarm::core::Exit;
use swarm::core::InitError;
use swarm::core::Priority;
use swarm::core::ProcessId;
use swarm::core::RegisterError;
use swarm::core::SpawnError;
use swarm::core::Tag;
use swarm::core::Timeout;
use swarm::erts::DownMessage;
use swarm::erts::ExitMessage;
use swarm::erts::Message;
use swarm::erts::Process;
use swarm::erts::ProcessFlags;
use swarm::erts::ProcessState;
use swarm::erts::SpawnConfig;
use swarm::erts::SpawnHandle;
use swarm::erts::Swarm;
use swarm::erts::SwarmConfig;

const WAIT: Duration = Duration::from_secs(10);

fn start(schedulers: usize, capacity: usize) -> Swarm {
  let mut config: SwarmConfig = SwarmConfig::new();

  config.name = String::from("test");
  config.schedulers = schedulers;
  config.capacity = capacity;

  Swarm::new(config).unwrap()
}

fn wait_until<F>(mut condition: F) -> bool
where
  F: FnMut() -> bool,
{
  let deadline: Instant = Instant::now() + WAIT;

  while Instant::now() < deadline {
    if condition() {
      return true;
    }

    thread::sleep(Duration::from_millis(1));
  }

  condition()
}

fn block_forever() {
  let _ignore: Option<Message> = Process::receive(Timeout::INFINITY);
}

// -----------------------------------------------------------------------------
// Identity
// -----------------------------------------------------------------------------

#[test]
fn test_pids_increase_across_slot_reuse() {
  let swarm: Swarm = start(2, 4);
  let mut pids: Vec<ProcessId> = Vec::new();

  for _ in 0..64 {
    pids.push(swarm.spawn(|| {}).unwrap());
    assert!(swarm.await_idle(WAIT));
  }

  assert!(pids.windows(2).all(|pair| pair[0] < pair[1]));
  assert!(pids.iter().all(|pid| pid.slot() < 4));
  assert!(pids.iter().all(|pid| !swarm.alive(*pid)));
}

#[test]
fn test_stale_pid_is_not_found() {
  let swarm: Swarm = start(1, 1);

  let old: ProcessId = swarm.spawn(|| {}).unwrap();
  assert!(swarm.await_idle(WAIT));

  let new: ProcessId = swarm.spawn(block_forever).unwrap();

  assert_eq!(old.slot(), new.slot());
  assert!(!swarm.send(old, 1_u32));
  assert!(!swarm.kill(old, Exit::KILLED));
  assert!(swarm.info(old).is_none());
  assert!(swarm.alive(new));
}

// -----------------------------------------------------------------------------
// Messaging
// -----------------------------------------------------------------------------

#[test]
fn test_per_sender_order() {
  const SENDERS: usize = 4;
  const COUNT: usize = 200;

  let swarm: Swarm = start(4, 64);
  let (send, recv): (Sender<Vec<(usize, usize)>>, Receiver<_>) = mpsc::channel();

  let collector: ProcessId = swarm
    .spawn(move || {
      let mut seen: Vec<(usize, usize)> = Vec::with_capacity(SENDERS * COUNT);

      while seen.len() < SENDERS * COUNT {
        let message: Message = Process::receive(WAIT).unwrap();
        seen.push(*message.downcast::<(usize, usize)>().unwrap());
      }

      send.send(seen).unwrap();
    })
    .unwrap();

  for sender in 0..SENDERS {
    swarm
      .spawn(move || {
        for seq in 0..COUNT {
          assert!(Process::send(collector, (sender, seq)));
        }
      })
      .unwrap();
  }

  let seen: Vec<(usize, usize)> = recv.recv_timeout(WAIT).unwrap();

  for sender in 0..SENDERS {
    let order: Vec<usize> = seen
      .iter()
      .filter(|(from, _)| *from == sender)
      .map(|(_, seq)| *seq)
      .collect();

    assert_eq!(order, (0..COUNT).collect::<Vec<_>>());
  }
}

#[test]
fn test_selective_receive_keeps_order() {
  const A: u64 = 1;
  const T: u64 = 2;
  const B: u64 = 3;

  let swarm: Swarm = start(1, 8);
  let (send, recv): (Sender<Vec<&'static str>>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let this: ProcessId = Process::this();

      Process::send_tagged(this, A, "a");
      Process::send_tagged(this, T, "t");
      Process::send_tagged(this, B, "b");

      let mut out: Vec<&'static str> = Vec::new();

      for message in [
        Process::receive_tagged(T, Timeout::ZERO),
        Process::receive_any(Timeout::ZERO),
        Process::receive_any(Timeout::ZERO),
      ] {
        out.push(*message.unwrap().downcast_ref::<&'static str>().unwrap());
      }

      assert!(Process::receive_any(Timeout::ZERO).is_none());

      send.send(out).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), ["t", "a", "b"]);
}

#[test]
fn test_receive_skips_tagged_messages() {
  let swarm: Swarm = start(1, 8);
  let (send, recv): (Sender<(u32, Option<u32>)>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let this: ProcessId = Process::this();

      Process::send_tagged(this, 7_u64, 1_u32);
      Process::send(this, 2_u32);

      let plain: u32 = *Process::receive(Timeout::ZERO).unwrap().downcast_ref::<u32>().unwrap();
      let tagged: Option<u32> = Process::receive_tagged(7_u64, Timeout::ZERO)
        .and_then(|message| message.downcast_ref::<u32>().copied());

      send.send((plain, tagged)).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), (2, Some(1)));
}

#[test]
fn test_collector_receives_every_message() {
  const N: usize = 500;

  let swarm: Swarm = start(4, 1024);
  let baseline: usize = swarm.free_slots();
  let (send, recv): (Sender<usize>, Receiver<_>) = mpsc::channel();

  let collector: ProcessId = swarm
    .spawn(move || {
      let mut count: usize = 0;

      while Process::receive(Duration::from_millis(500)).is_some() {
        count += 1;
      }

      send.send(count).unwrap();
    })
    .unwrap();

  for index in 0..N {
    swarm.spawn(move || assert!(Process::send(collector, index))).unwrap();
  }

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), N);
  assert!(swarm.await_idle(WAIT));
  assert_eq!(swarm.free_slots(), baseline);
  assert_eq!(swarm.process_count(), 0);

  let stats = swarm.stats();

  assert_eq!(stats.spawned, N as u64 + 1);
  assert_eq!(stats.exited, N as u64 + 1);
  assert!(stats.messages_sent >= N as u64);
}

#[test]
fn test_receive_timeout() {
  let swarm: Swarm = start(1, 8);
  let (send, recv): (Sender<(bool, Duration)>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let start: Instant = Instant::now();
      let message: Option<Message> = Process::receive(Duration::from_millis(30));
      send.send((message.is_none(), start.elapsed())).unwrap();
    })
    .unwrap();

  let (timed_out, elapsed): (bool, Duration) = recv.recv_timeout(WAIT).unwrap();

  assert!(timed_out);
  assert!(elapsed >= Duration::from_millis(30));
}

#[test]
fn test_external_send_wakes_receiver() {
  let swarm: Swarm = start(2, 8);
  let (send, recv): (Sender<String>, Receiver<_>) = mpsc::channel();

  let pid: ProcessId = swarm
    .spawn(move || {
      let message: Message = Process::receive(WAIT).unwrap();

      assert_eq!(message.from(), None);
      send.send(*message.downcast::<String>().unwrap()).unwrap();
    })
    .unwrap();

  thread::sleep(Duration::from_millis(20));

  assert!(swarm.send(pid, String::from("ping")));
  assert_eq!(recv.recv_timeout(WAIT).unwrap(), "ping");
}

#[test]
fn test_reserved_tags_are_rejected() {
  let swarm: Swarm = start(1, 4);
  let pid: ProcessId = swarm.spawn(block_forever).unwrap();

  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    swarm.send_tagged(pid, Tag::EXIT, 1_u8)
  }));
  let error: Box<Exception> = result.unwrap_err().downcast::<Exception>().unwrap();

  assert_eq!(error.group(), ExceptionGroup::BadArg);
}

// -----------------------------------------------------------------------------
// Links & Monitors
// -----------------------------------------------------------------------------

#[test]
fn test_link_kills_non_trapping_peer() {
  let swarm: Swarm = start(2, 16);
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let (_pid, mref) = Process::spawn_monitor(|| {
        Process::spawn_link(|| {
          let _ignore: Option<Message> = Process::receive(Duration::from_millis(20));
          Process::exit(Exit::new(7));
        })
        .unwrap();

        block_forever();
      })
      .unwrap();

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      let down: &DownMessage = message.as_down().unwrap();

      assert_eq!(down.mref(), mref);
      send.send(down.reason()).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::new(7));
}

#[test]
fn test_link_delivers_exit_to_trapping_peer() {
  let swarm: Swarm = start(2, 16);
  let (send, recv): (Sender<(ProcessId, Exit, bool)>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      Process::set_flag(ProcessFlags::TRAP_EXIT, true);

      let child: ProcessId = Process::spawn_link(|| Process::exit(Exit::new(7))).unwrap();

      let message: Message = Process::receive_tagged(Tag::EXIT, WAIT).unwrap();
      let exit: &ExitMessage = message.as_exit().unwrap();

      assert_eq!(exit.from(), child);
      send.send((exit.from(), exit.reason(), Process::alive(Process::this()))).unwrap();
    })
    .unwrap();

  let (_from, reason, alive) = recv.recv_timeout(WAIT).unwrap();

  assert_eq!(reason, Exit::new(7));
  assert!(alive);
}

#[test]
fn test_normal_exit_does_not_kill_link() {
  let swarm: Swarm = start(2, 16);
  let (send, recv): (Sender<bool>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      Process::spawn_link(|| {}).unwrap();

      let message: Option<Message> = Process::receive_any(Duration::from_millis(50));
      send.send(message.is_none()).unwrap();
    })
    .unwrap();

  assert!(recv.recv_timeout(WAIT).unwrap());
}

#[test]
fn test_link_dead_process_delivers_noproc_exit() {
  let swarm: Swarm = start(1, 8);
  let dead: ProcessId = swarm.spawn(|| {}).unwrap();
  let (send, recv): (Sender<(ProcessId, Exit)>, Receiver<_>) = mpsc::channel();

  assert!(wait_until(|| !swarm.alive(dead)));

  swarm
    .spawn(move || {
      Process::set_flag(ProcessFlags::TRAP_EXIT, true);
      Process::link(dead);

      let message: Message = Process::receive_tagged(Tag::EXIT, WAIT).unwrap();
      let exit: &ExitMessage = message.as_exit().unwrap();

      send.send((exit.from(), exit.reason())).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), (dead, Exit::NOPROC));
}

#[test]
fn test_link_dead_process_kills_non_trapping_caller() {
  let swarm: Swarm = start(1, 8);
  let dead: ProcessId = swarm.spawn(|| {}).unwrap();
  let reached: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  assert!(wait_until(|| !swarm.alive(dead)));

  let after: Arc<AtomicBool> = Arc::clone(&reached);

  swarm
    .spawn(move || {
      let (_pid, _mref) = Process::spawn_monitor(move || {
        Process::link(dead);
        after.store(true, Ordering::Release);
      })
      .unwrap();

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::NOPROC);
  assert!(!reached.load(Ordering::Acquire));
}

#[test]
fn test_monitor_fires_once_when_also_linked() {
  let swarm: Swarm = start(2, 16);
  let (send, recv): (Sender<(usize, Exit)>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      Process::set_flag(ProcessFlags::TRAP_EXIT, true);

      let child: ProcessId = Process::spawn_link(|| {
        let _go: Option<Message> = Process::receive(WAIT);
        Process::exit(Exit::new(9));
      })
      .unwrap();

      let mref = Process::monitor(child);
      Process::send(child, ());

      let mut downs: Vec<Exit> = Vec::new();

      while let Some(message) = Process::receive_tagged(Tag::DOWN, Duration::from_millis(200)) {
        let down: &DownMessage = message.as_down().unwrap();

        assert_eq!(down.from(), child);
        assert_eq!(down.mref(), mref);
        downs.push(down.reason());
      }

      assert!(Process::receive_tagged(Tag::EXIT, Timeout::ZERO).is_some());

      send.send((downs.len(), downs[0])).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), (1, Exit::new(9)));
}

#[test]
fn test_monitor_dead_process_reports_noproc() {
  let swarm: Swarm = start(1, 8);
  let dead: ProcessId = swarm.spawn(|| {}).unwrap();
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  assert!(wait_until(|| !swarm.alive(dead)));

  swarm
    .spawn(move || {
      Process::monitor(dead);

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::NOPROC);
}

#[test]
fn test_demonitor_suppresses_down() {
  let swarm: Swarm = start(2, 8);
  let (send, recv): (Sender<bool>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let child: ProcessId = Process::spawn(block_forever).unwrap();
      let mref = Process::monitor(child);

      assert!(Process::demonitor(mref));
      assert!(Process::kill(child, Exit::KILLED));

      send.send(Process::receive_tagged(Tag::DOWN, Duration::from_millis(50)).is_none()).unwrap();
    })
    .unwrap();

  assert!(recv.recv_timeout(WAIT).unwrap());
}

#[test]
fn test_panic_exits_with_panic_reason() {
  let swarm: Swarm = start(2, 8);
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let (_pid, _mref) = Process::spawn_monitor(|| panic!("boom")).unwrap();
      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();

      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::PANIC);
}

#[test]
fn test_kill_is_not_trappable() {
  let swarm: Swarm = start(2, 8);
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let handle: SpawnHandle = Process::spawn_opt(
        block_forever,
        SpawnConfig::new_monitor().with_trap_exit(true),
      )
      .unwrap();

      assert!(Process::kill(handle.pid(), Exit::new(3)));
      assert!(!Process::kill(handle.pid(), Exit::new(4)));

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::new(3));
}

#[test]
fn test_kill_wakes_waiting_process() {
  let swarm: Swarm = start(2, 8);
  let (pids, targets): (Sender<ProcessId>, Receiver<_>) = mpsc::channel();
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let handle: SpawnHandle = Process::spawn_opt(
        || {
          let _ignore: Option<Message> = Process::receive(Duration::from_secs(30));
        },
        SpawnConfig::new_monitor().with_trap_exit(true),
      )
      .unwrap();

      pids.send(handle.pid()).unwrap();

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  let target: ProcessId = targets.recv_timeout(WAIT).unwrap();

  assert!(wait_until(|| {
    swarm
      .info(target)
      .is_some_and(|info| info.state == ProcessState::Waiting)
  }));

  let killed: Instant = Instant::now();

  assert!(swarm.kill(target, Exit::new(9)));
  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::new(9));
  assert!(killed.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_kill_while_running_outlives_normal_return() {
  let swarm: Swarm = start(1, 8);
  let running: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
  let release: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
  let (pids, targets): (Sender<ProcessId>, Receiver<_>) = mpsc::channel();
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  let started: Arc<AtomicBool> = Arc::clone(&running);
  let released: Arc<AtomicBool> = Arc::clone(&release);

  swarm
    .spawn(move || {
      let (pid, _mref) = Process::spawn_monitor(move || {
        started.store(true, Ordering::Release);

        while !released.load(Ordering::Acquire) {
          hint::spin_loop();
        }
      })
      .unwrap();

      pids.send(pid).unwrap();

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  let target: ProcessId = targets.recv_timeout(WAIT).unwrap();

  assert!(wait_until(|| running.load(Ordering::Acquire)));
  assert!(swarm.kill(target, Exit::new(7)));

  release.store(true, Ordering::Release);

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::new(7));
}

// -----------------------------------------------------------------------------
// Timers
// -----------------------------------------------------------------------------

#[test]
fn test_send_after_latency() {
  const DELAY: Duration = Duration::from_millis(50);

  let swarm: Swarm = start(2, 8);
  let (send, recv): (Sender<Duration>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let start: Instant = Instant::now();

      Process::send_after(DELAY, Process::this(), 42_u64, "tick");

      let message: Message = Process::receive_tagged(42_u64, DELAY * 2).unwrap();

      assert_eq!(message.downcast_ref::<&str>(), Some(&"tick"));
      send.send(start.elapsed()).unwrap();
    })
    .unwrap();

  let elapsed: Duration = recv.recv_timeout(WAIT).unwrap();

  assert!(elapsed >= DELAY, "fired early: {elapsed:?}");
  assert!(elapsed < DELAY * 5, "fired late: {elapsed:?}");
  assert_eq!(swarm.stats().timers_fired, 1);
}

#[test]
fn test_cancel_and_read_timer() {
  let swarm: Swarm = start(1, 8);
  let pid: ProcessId = swarm.spawn(block_forever).unwrap();

  let tref = swarm.send_after(Duration::from_secs(60), pid, 5_u64, ());
  let remaining: Duration = swarm.read_timer(tref).unwrap();

  assert!(remaining <= Duration::from_secs(60));
  assert!(remaining > Duration::from_secs(50));
  assert!(swarm.cancel_timer(tref));
  assert!(!swarm.cancel_timer(tref));
  assert!(swarm.read_timer(tref).is_none());
}

// -----------------------------------------------------------------------------
// Arena
// -----------------------------------------------------------------------------

#[test]
fn test_exhaustion_and_recovery() {
  const CAPACITY: usize = 8;

  let swarm: Swarm = start(2, CAPACITY);
  let mut pids: Vec<ProcessId> = Vec::new();

  for _ in 0..CAPACITY {
    pids.push(swarm.spawn(block_forever).unwrap());
  }

  assert_eq!(swarm.spawn(|| {}), Err(SpawnError::Exhausted));
  assert_eq!(swarm.free_slots(), 0);
  assert!(pids.iter().all(|pid| swarm.alive(*pid)));

  assert!(swarm.kill(pids[0], Exit::KILLED));
  assert!(wait_until(|| swarm.free_slots() == 1));

  let pid: ProcessId = swarm.spawn(block_forever).unwrap();

  assert!(swarm.alive(pid));
  assert_eq!(swarm.spawn(|| {}), Err(SpawnError::Exhausted));
  assert_eq!(swarm.processes().len(), CAPACITY);
}

#[test]
fn test_heap_alloc() {
  let swarm: Swarm = start(1, 4);
  let (send, recv): (Sender<(bool, usize, bool)>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let layout: Layout = Layout::from_size_align(64, 16).unwrap();
      let block = Process::heap_alloc(layout);
      let aligned: bool = block.is_some_and(|ptr| ptr.as_ptr() as usize % 16 == 0);
      let huge: bool = Process::heap_alloc(Layout::from_size_align(1 << 30, 8).unwrap()).is_none();

      send.send((aligned, Process::heap_used(), huge)).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), (true, 64, true));
}

// -----------------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------------

#[test]
fn test_registry_uniqueness_and_cleanup() {
  let swarm: Swarm = start(2, 8);

  let first: ProcessId = swarm.spawn(block_forever).unwrap();
  let second: ProcessId = swarm.spawn(block_forever).unwrap();

  assert_eq!(swarm.register(first, "svc"), Ok(()));
  assert_eq!(swarm.register(second, "svc"), Err(RegisterError::NameTaken));
  assert_eq!(swarm.register(first, "other"), Err(RegisterError::AlreadyRegistered));
  assert_eq!(swarm.whereis("svc"), Some(first));
  assert_eq!(swarm.info(first).unwrap().name.unwrap().as_str(), "svc");

  assert!(swarm.kill(first, Exit::KILLED));
  assert!(wait_until(|| swarm.whereis("svc").is_none()));

  assert_eq!(swarm.register(second, "svc"), Ok(()));
  assert_eq!(swarm.registered().len(), 1);
  assert!(swarm.unregister("svc"));
  assert!(!swarm.unregister("svc"));
}

#[test]
fn test_register_dead_process_fails() {
  let swarm: Swarm = start(1, 4);
  let pid: ProcessId = swarm.spawn(|| {}).unwrap();

  assert!(wait_until(|| !swarm.alive(pid)));
  assert_eq!(swarm.register(pid, "gone"), Err(RegisterError::NotAlive));
  assert!(swarm.registered().is_empty());
}

#[test]
fn test_send_named() {
  let swarm: Swarm = start(2, 8);
  let (send, recv): (Sender<u32>, Receiver<_>) = mpsc::channel();

  let pid: ProcessId = swarm
    .spawn(move || {
      let message: Message = Process::receive(WAIT).unwrap();
      send.send(*message.downcast_ref::<u32>().unwrap()).unwrap();
    })
    .unwrap();

  swarm.register(pid, "sink").unwrap();

  assert!(!swarm.send_named("missing", 1_u32));
  assert!(swarm.send_named("sink", 11_u32));
  assert_eq!(recv.recv_timeout(WAIT).unwrap(), 11);
}

// -----------------------------------------------------------------------------
// Scheduling
// -----------------------------------------------------------------------------

#[test]
fn test_consume_yields_to_other_processes() {
  let swarm: Swarm = start(1, 8);
  let flag: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
  let (send, recv): (Sender<()>, Receiver<_>) = mpsc::channel();

  let spin: Arc<AtomicBool> = Arc::clone(&flag);

  swarm
    .spawn(move || {
      while !spin.load(Ordering::Acquire) {
        Process::consume(10);
      }

      send.send(()).unwrap();
    })
    .unwrap();

  swarm.spawn(move || flag.store(true, Ordering::Release)).unwrap();

  assert!(recv.recv_timeout(WAIT).is_ok());
}

#[test]
fn test_send_loop_yields_to_other_processes() {
  let swarm: Swarm = start(1, 8);
  let flag: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
  let (send, recv): (Sender<bool>, Receiver<_>) = mpsc::channel();
  let sink: ProcessId = swarm.spawn(block_forever).unwrap();

  let spin: Arc<AtomicBool> = Arc::clone(&flag);

  swarm
    .spawn(move || {
      let deadline: Instant = Instant::now() + WAIT;

      while !spin.load(Ordering::Acquire) && Instant::now() < deadline {
        Process::send(sink, 1_u32);
      }

      send.send(spin.load(Ordering::Acquire)).unwrap();
    })
    .unwrap();

  swarm.spawn(move || flag.store(true, Ordering::Release)).unwrap();

  assert!(recv.recv_timeout(WAIT * 2).unwrap());
}

#[test]
fn test_receive_filter_may_use_process_heap() {
  let swarm: Swarm = start(1, 4);
  let (send, recv): (Sender<(u32, usize, Vec<u32>)>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let this: ProcessId = Process::this();

      for value in 1_u32..=3 {
        Process::send(this, value);
      }

      let layout: Layout = Layout::from_size_align(16, 16).unwrap();

      let message: Message = Process::receive_match(
        |message| {
          assert!(Process::heap_alloc(layout).is_some());
          message.downcast_ref::<u32>() == Some(&2)
        },
        WAIT,
      )
      .unwrap();

      let mut rest: Vec<u32> = Vec::new();

      while let Some(message) = Process::receive_any(Timeout::ZERO) {
        rest.push(*message.downcast::<u32>().unwrap());
      }

      let value: u32 = *message.downcast::<u32>().unwrap();

      send.send((value, Process::heap_used(), rest)).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), (2, 32, vec![1, 3]));
}

#[test]
fn test_receive_inside_filter_raises() {
  let swarm: Swarm = start(1, 8);
  let (send, recv): (Sender<Exit>, Receiver<_>) = mpsc::channel();

  swarm
    .spawn(move || {
      let (_pid, _mref) = Process::spawn_monitor(|| {
        Process::send(Process::this(), 1_u32);

        let _ignore: Option<Message> =
          Process::receive_match(|_| Process::receive(Timeout::ZERO).is_some(), WAIT);
      })
      .unwrap();

      let message: Message = Process::receive_tagged(Tag::DOWN, WAIT).unwrap();
      send.send(message.as_down().unwrap().reason()).unwrap();
    })
    .unwrap();

  assert_eq!(recv.recv_timeout(WAIT).unwrap(), Exit::PANIC);
}

#[test]
fn test_priority_is_reported() {
  let swarm: Swarm = start(1, 8);
  let pid: ProcessId = swarm.spawn_with_priority(block_forever, Priority::High).unwrap();

  assert!(wait_until(|| {
    swarm
      .info(pid)
      .is_some_and(|info| info.state == ProcessState::Waiting)
  }));

  let info = swarm.info(pid).unwrap();

  assert_eq!(info.priority, Priority::High);
  assert_eq!(info.scheduler, 0);
  assert!(!info.trap_exit);
}

#[test]
fn test_api_outside_process_raises() {
  let result = panic::catch_unwind(Process::this);
  let error: Box<Exception> = result.unwrap_err().downcast::<Exception>().unwrap();

  assert_eq!(error.group(), ExceptionGroup::BadCtx);
}

#[test]
fn test_external_spawn_link_raises() {
  let swarm: Swarm = start(1, 4);
  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    swarm.spawn_opt(|| {}, SpawnConfig::new_link())
  }));

  assert!(result.is_err());
  assert_eq!(swarm.process_count(), 0);
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

#[test]
fn test_shutdown_terminates_live_processes() {
  let swarm: Swarm = start(2, 32);

  for _ in 0..16 {
    swarm.spawn(block_forever).unwrap();
  }

  swarm.spawn(|| loop { Process::yield_now() }).unwrap();

  assert!(wait_until(|| swarm.stats().context_switches >= 16));

  swarm.shutdown();
  swarm.shutdown();

  assert_eq!(swarm.process_count(), 0);
  assert_eq!(swarm.spawn(|| {}), Err(SpawnError::Stopped));
}

#[test]
fn test_invalid_config() {
  let mut config: SwarmConfig = SwarmConfig::new();
  config.capacity = 0;

  assert!(matches!(Swarm::new(config), Err(InitError::InvalidConfig(_))));
}

#[test]
fn test_global_singleton() {
  let global = swarm::init::init("global", 1).unwrap();

  assert_eq!(global.name(), "global");
  assert!(matches!(swarm::init::init("again", 1), Err(InitError::AlreadyRunning)));
  assert!(swarm::init::swarm().is_some());

  assert!(swarm::init::shutdown());
  assert!(!swarm::init::shutdown());
  assert!(swarm::init::swarm().is_none());
}
