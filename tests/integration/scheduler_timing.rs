//! Wall-clock scheduler behaviour: immediate run, interval spacing, stop.

use crate::helpers::{record_count, simple_service};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;

async fn wait_for_records(dir: &Path, n: usize, within: Duration) {
    tokio::time::timeout(within, async {
        while record_count(dir) < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} record(s) within {within:?}"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_second_interval_runs_immediately_then_on_schedule_and_stops_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let service = simple_service(tmp.path(), &["tick"]);

    let started_at = Utc::now();
    assert!(service.scheduler_start(Some(2), Some(true)).unwrap());

    wait_for_records(tmp.path(), 1, Duration::from_secs(2)).await;
    wait_for_records(tmp.path(), 2, Duration::from_secs(4)).await;

    // recent() is newest first.
    let recent = service.recent_results(2).await.unwrap();
    let (first, second) = (recent[1].timestamp, recent[0].timestamp);

    let to_first = (first - started_at).num_milliseconds();
    assert!(to_first <= 500, "first cycle took {to_first}ms to run");

    let gap = (second - first).num_milliseconds();
    assert!(
        (2000..=2500).contains(&gap),
        "second cycle ran {gap}ms after the first"
    );

    // Now inside the wait before the third cycle.
    assert!(service.scheduler_stop());
    let status = service.scheduler_status();
    assert!(!status.running);
    assert!(status.next_run_at.is_none());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(record_count(tmp.path()), 2, "no cycle may start after stop");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_is_available_while_a_cycle_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let service = simple_service(tmp.path(), &["a", "b", "c"]);
    for i in 0..20 {
        service.enqueue(&format!("q{i}"));
    }

    let cycle = {
        let service = service.clone();
        tokio::spawn(async move { service.run_cycle_now(None).await })
    };

    // Status never waits on the cycle lock.
    let polled = tokio::time::timeout(Duration::from_millis(200), async {
        service.scheduler_status()
    })
    .await;
    assert!(polled.is_ok());

    let report = cycle.await.unwrap();
    assert_eq!(report.queue_processed, 20);
    assert_eq!(service.scheduler_status().runs, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_start_and_stop_are_noops() {
    let tmp = tempfile::tempdir().unwrap();
    let service = simple_service(tmp.path(), &[]);

    assert!(!service.scheduler_stop());
    assert!(service.scheduler_start(Some(60), Some(false)).unwrap());
    assert!(!service.scheduler_start(Some(60), Some(false)).unwrap());
    assert!(service.scheduler_stop());
    assert!(!service.scheduler_stop());

    service.shutdown().await;
}
