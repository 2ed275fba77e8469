#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use swarm::tyre::MpscQueue;
use swarm::tyre::NodeArena;

const STUB: u32 = 4;

struct Shared {
  nodes: NodeArena,
  queue: MpscQueue,
}

fn shared() -> Arc<Shared> {
  let nodes: NodeArena = NodeArena::new(5);
  let queue: MpscQueue = MpscQueue::new(&nodes, STUB);

  Arc::new(Shared { nodes, queue })
}

fn drain(shared: &Shared) -> Vec<u32> {
  let mut out: Vec<u32> = Vec::new();

  // SAFETY: The model thread is the only consumer.
  while let Some(node) = unsafe { shared.queue.pop(&shared.nodes) } {
    out.push(node);
  }

  out
}

#[test]
fn two_producers_every_node_popped_once() {
  loom::model(|| {
    let shared: Arc<Shared> = shared();

    let threads: Vec<_> = [0_u32, 1]
      .into_iter()
      .map(|node| {
        let shared: Arc<Shared> = Arc::clone(&shared);

        thread::spawn(move || {
          shared.queue.push(&shared.nodes, node);
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    let mut out: Vec<u32> = drain(&shared);
    out.sort_unstable();

    assert_eq!(out, [0, 1]);
    assert!(shared.queue.is_empty(&shared.nodes));
  });
}

#[test]
fn producer_order_is_preserved() {
  loom::model(|| {
    let shared: Arc<Shared> = shared();

    let producer = {
      let shared: Arc<Shared> = Arc::clone(&shared);

      thread::spawn(move || {
        shared.queue.push(&shared.nodes, 0);
        shared.queue.push(&shared.nodes, 1);
      })
    };

    let mut seen: Vec<u32> = Vec::new();

    // SAFETY: This thread is the only consumer.
    if let Some(node) = unsafe { shared.queue.pop(&shared.nodes) } {
      seen.push(node);
    }

    producer.join().unwrap();

    seen.extend(drain(&shared));

    assert_eq!(seen, [0, 1]);
  });
}

#[test]
fn concurrent_push_and_pop() {
  loom::model(|| {
    let shared: Arc<Shared> = shared();

    shared.queue.push(&shared.nodes, 2);

    let producer = {
      let shared: Arc<Shared> = Arc::clone(&shared);

      thread::spawn(move || {
        shared.queue.push(&shared.nodes, 3);
      })
    };

    // SAFETY: This thread is the only consumer.
    let first: Option<u32> = unsafe { shared.queue.pop(&shared.nodes) };
    assert_eq!(first, Some(2));

    producer.join().unwrap();

    assert_eq!(drain(&shared), [3]);
  });
}
