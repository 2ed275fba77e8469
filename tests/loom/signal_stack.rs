#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use swarm::tyre::AtomicStack;

#[test]
fn concurrent_push_loses_nothing() {
  loom::model(|| {
    let stack: Arc<AtomicStack<u32>> = Arc::new(AtomicStack::new());

    let threads: Vec<_> = [1_u32, 2]
      .into_iter()
      .map(|value| {
        let stack: Arc<AtomicStack<u32>> = Arc::clone(&stack);

        thread::spawn(move || {
          stack.push(value);
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    let mut out: Vec<u32> = stack.take().collect();
    out.sort_unstable();

    assert_eq!(out, [1, 2]);
    assert!(stack.is_empty());
  });
}

#[test]
fn exactly_one_push_sees_empty() {
  loom::model(|| {
    let stack: Arc<AtomicStack<u32>> = Arc::new(AtomicStack::new());

    let other = {
      let stack: Arc<AtomicStack<u32>> = Arc::clone(&stack);
      thread::spawn(move || stack.push(1))
    };

    let mine: bool = stack.push(2);
    let theirs: bool = other.join().unwrap();

    assert!(mine ^ theirs, "exactly one push must observe the empty stack");
  });
}

#[test]
fn take_while_pushing_preserves_order() {
  loom::model(|| {
    let stack: Arc<AtomicStack<u32>> = Arc::new(AtomicStack::new());

    let producer = {
      let stack: Arc<AtomicStack<u32>> = Arc::clone(&stack);

      thread::spawn(move || {
        stack.push(1);
        stack.push(2);
      })
    };

    let mut seen: Vec<u32> = stack.take().collect();

    producer.join().unwrap();

    seen.extend(stack.take());

    assert_eq!(seen, [1, 2]);
  });
}
