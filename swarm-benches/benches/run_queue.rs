use criterion::BenchmarkGroup;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;
use swarm::tyre::AtomicStack;
use swarm::tyre::MpscQueue;
use swarm::tyre::NodeArena;

const THREADS: &[usize] = &[2, 4, 8];
const NODES: u32 = 1024;

struct Shared {
  nodes: NodeArena,
  queue: MpscQueue,
}

fn bench_run_queue(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("run_queue");

  group.bench_function("push-pop", |bench| {
    let nodes: NodeArena = NodeArena::new(NODES as usize + 1);
    let queue: MpscQueue = MpscQueue::new(&nodes, NODES);

    bench.iter(|| {
      for node in 0..NODES {
        queue.push(&nodes, node);
      }

      // SAFETY: This thread is the only consumer.
      while let Some(node) = unsafe { queue.pop(&nodes) } {
        black_box(node);
      }
    })
  });

  for threads in THREADS {
    let id: BenchmarkId = BenchmarkId::new("multi-producer", threads);

    group.bench_with_input(id, threads, |bench, &threads| {
      bench.iter_custom(|iters| {
        let per_thread: u32 = NODES / threads as u32;
        let shared: Arc<Shared> = {
          let nodes: NodeArena = NodeArena::new(NODES as usize + 1);
          let queue: MpscQueue = MpscQueue::new(&nodes, NODES);
          Arc::new(Shared { nodes, queue })
        };

        let mut elapsed: Duration = Duration::ZERO;

        for _ in 0..iters {
          let barrier: Arc<Barrier> = Arc::new(Barrier::new(threads + 1));
          let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(threads);

          for index in 0..threads as u32 {
            let barrier: Arc<Barrier> = barrier.clone();
            let shared: Arc<Shared> = shared.clone();

            handles.push(thread::spawn(move || {
              barrier.wait();

              for node in index * per_thread..(index + 1) * per_thread {
                shared.queue.push(&shared.nodes, node);
              }
            }));
          }

          barrier.wait();

          let start: Instant = Instant::now();
          let mut popped: u32 = 0;

          while popped < per_thread * threads as u32 {
            // SAFETY: This thread is the only consumer.
            if let Some(node) = unsafe { shared.queue.pop(&shared.nodes) } {
              black_box(node);
              popped += 1;
            }
          }

          elapsed += start.elapsed();

          for handle in handles {
            handle.join().unwrap();
          }
        }

        elapsed
      })
    });
  }

  group.finish();
}

fn bench_signal_stack(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("signal_stack");

  group.bench_function("push-take", |bench| {
    let stack: AtomicStack<u64> = AtomicStack::new();

    bench.iter(|| {
      for value in 0..64 {
        stack.push(value);
      }

      black_box(stack.take().count());
    })
  });

  group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default();
  targets = bench_run_queue, bench_signal_stack
}

criterion_main!(benches);
