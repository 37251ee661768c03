//! Randomized enqueue/drain interleavings: every task is drained exactly once.

use autolearn::queue::TaskQueue;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn run_interleaving(producers: usize, per_producer: usize, drains: usize, seed_jitter: u64) {
    let queue = Arc::new(TaskQueue::new());

    let mut handles = Vec::new();
    for p in 0..producers {
        let queue = Arc::clone(&queue);
        handles.push(thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for i in 0..per_producer {
                assert!(queue.enqueue(&format!("p{p}-t{i}")));
                if rng.gen_bool(0.2) {
                    thread::sleep(Duration::from_micros(rng.gen_range(0..=seed_jitter)));
                }
            }
            Vec::new()
        }));
    }
    for _ in 0..drains {
        let queue = Arc::clone(&queue);
        handles.push(thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let mut seen = Vec::new();
            for _ in 0..4 {
                thread::sleep(Duration::from_micros(rng.gen_range(0..=seed_jitter)));
                seen.extend(queue.drain_all().into_iter().map(|t| t.query));
            }
            seen
        }));
    }

    let mut drained: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    drained.extend(queue.drain_all().into_iter().map(|t| t.query));

    let mut counts: HashMap<String, usize> = HashMap::new();
    for q in drained {
        *counts.entry(q).or_default() += 1;
    }
    assert_eq!(counts.len(), producers * per_producer, "no task may be lost");
    assert!(
        counts.values().all(|&c| c == 1),
        "no task may be drained twice"
    );
}

#[test]
fn concurrent_enqueue_and_drain_loses_and_duplicates_nothing() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let producers = rng.gen_range(1..=6);
        let per_producer = rng.gen_range(1..=60);
        let drains = rng.gen_range(1..=3);
        run_interleaving(producers, per_producer, drains, 200);
    }
}

#[test]
fn drain_preserves_fifo_within_one_snapshot() {
    let queue = TaskQueue::new();
    let mut expected: Vec<String> = (0..50).map(|i| format!("q{i}")).collect();
    expected.shuffle(&mut rand::thread_rng());
    for q in &expected {
        queue.enqueue(q);
    }
    let drained: Vec<String> = queue.drain_all().into_iter().map(|t| t.query).collect();
    assert_eq!(drained, expected);
}

#[test]
fn drain_on_empty_queue_is_idempotent() {
    let queue = TaskQueue::new();
    assert!(queue.drain_all().is_empty());
    assert!(queue.drain_all().is_empty());
    queue.enqueue("x");
    assert_eq!(queue.drain_all().len(), 1);
    assert!(queue.drain_all().is_empty());
}
