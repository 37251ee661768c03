//! End-to-end cycles over a JSONL store with stub providers.

use crate::helpers::{StubProvider, record_count, service_with, simple_service};
use autolearn::degraded::FailureClass;
use autolearn::state::StateFile;
use autolearn::{RecordOrigin, paths};
use std::time::Duration;

#[tokio::test]
async fn cycle_processes_queue_then_topics_and_appends_three_records() {
    let tmp = tempfile::tempdir().unwrap();
    let service = simple_service(tmp.path(), &["t1"]);
    service.enqueue("a");
    service.enqueue("b");

    let report = service.run_cycle_now(None).await;
    assert_eq!(report.queue_processed, 2);
    assert_eq!(report.topics_processed, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(record_count(tmp.path()), 3);

    let recent = service.recent_results(10).await.unwrap();
    let queries: Vec<&str> = recent.iter().map(|r| r.query.as_str()).collect();
    assert_eq!(queries, vec!["t1", "b", "a"]);
    assert_eq!(recent[0].origin, RecordOrigin::Topic);
    assert_eq!(recent[2].origin, RecordOrigin::Queue);
}

#[tokio::test]
async fn primary_failure_falls_back_to_secondary_results() {
    let tmp = tempfile::tempdir().unwrap();
    let primary = StubProvider::failing("primary");
    let secondary = StubProvider::ok("secondary", 3);
    let service = service_with(tmp.path(), &[], primary.clone(), secondary.clone());

    let record = service.learn_now("fallback").await;
    assert_eq!(record.results.len(), 3);
    assert!(!record.is_error());
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);

    let degraded = service.scheduler_status().degraded;
    assert_eq!(degraded.total(), 1);
    assert_eq!(
        service
            .runner()
            .learner()
            .counters()
            .get(FailureClass::TransientProvider),
        1
    );
}

#[tokio::test]
async fn every_provider_down_still_completes_the_cycle() {
    let tmp = tempfile::tempdir().unwrap();
    let service = service_with(
        tmp.path(),
        &["t1", "t2"],
        StubProvider::failing("primary"),
        StubProvider::failing("secondary"),
    );
    service.enqueue("q");

    let report = service.run_cycle_now(None).await;
    assert_eq!(report.queue_processed, 1);
    assert_eq!(report.topics_processed, 2);
    assert_eq!(report.failures, 3);

    let recent = service.recent_results(10).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent.iter().all(|r| r.is_error()));
}

#[tokio::test]
async fn explicit_topics_override_configured_list() {
    let tmp = tempfile::tempdir().unwrap();
    let service = simple_service(tmp.path(), &["configured"]);
    let topics = vec!["override one".to_owned(), "override two".to_owned()];

    let report = service.run_cycle_now(Some(topics.as_slice())).await;
    assert_eq!(report.topics_processed, 2);

    let recent = service.recent_results(10).await.unwrap();
    assert!(recent.iter().all(|r| r.query != "configured"));
}

#[tokio::test]
async fn state_survives_a_restart() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let service = simple_service(tmp.path(), &["t1"]);
        service.run_cycle_now(None).await;
        service.run_cycle_now(None).await;
    }

    let state = StateFile::new(paths::state_file(tmp.path())).load().unwrap();
    assert_eq!(state.runs, 2);
    assert_eq!(state.last_topics_processed, 1);

    let reopened = simple_service(tmp.path(), &["t1"]);
    let status = reopened.scheduler_status();
    assert_eq!(status.runs, 2);
    assert!(status.last_run_at.is_some());
    assert_eq!(reopened.recent_results(10).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_on_demand_cycles_never_double_drain() {
    let tmp = tempfile::tempdir().unwrap();
    let service = simple_service(tmp.path(), &[]);
    for i in 0..10 {
        service.enqueue(&format!("q{i}"));
    }

    let a = {
        let service = service.clone();
        tokio::spawn(async move { service.run_cycle_now(None).await })
    };
    let b = {
        let service = service.clone();
        tokio::spawn(async move { service.run_cycle_now(None).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(a.queue_processed + b.queue_processed, 10);
    assert_eq!(record_count(tmp.path()), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoned_on_demand_cycle_still_learns_drained_tasks() {
    let tmp = tempfile::tempdir().unwrap();
    let service = service_with(
        tmp.path(),
        &[],
        StubProvider::slow("primary", 1, Duration::from_millis(300)),
        StubProvider::ok("secondary", 1),
    );
    for i in 0..5 {
        service.enqueue(&format!("q{i}"));
    }

    // The caller gives up while the cycle is mid-way through the queue.
    let waited =
        tokio::time::timeout(Duration::from_millis(100), service.run_cycle_now(None)).await;
    assert!(waited.is_err());

    tokio::time::timeout(Duration::from_secs(10), async {
        while record_count(tmp.path()) < 5 || service.runner().is_running_cycle() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("cycle should finish on its own");

    assert!(service.runner().queue().is_empty());
    assert_eq!(record_count(tmp.path()), 5);
    assert_eq!(service.scheduler_status().runs, 1);
}
