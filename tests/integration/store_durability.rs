//! Result store and state file behaviour across reopen and torn writes.

use autolearn::state::{LearnState, StateFile};
use autolearn::store::{JsonlStore, RecordStore};
use autolearn::{LearnedRecord, RecordOrigin, SearchPreference};
use std::fs::OpenOptions;
use std::io::Write;

fn record(query: &str) -> LearnedRecord {
    LearnedRecord::new(
        query,
        format!("summary of {query}"),
        Vec::new(),
        RecordOrigin::Manual,
        SearchPreference::Auto,
    )
}

#[test]
fn recent_is_newest_first_and_bounded() {
    let tmp = tempfile::tempdir().unwrap();
    let store = JsonlStore::open(tmp.path().join("learned.jsonl"));
    let appended: Vec<LearnedRecord> = (0..12).map(|i| record(&format!("q{i}"))).collect();
    for r in &appended {
        store.append(r).unwrap();
    }

    let recent = store.recent(5).unwrap();
    assert_eq!(recent.len(), 5);
    let expected: Vec<_> = appended.iter().rev().take(5).map(|r| r.id).collect();
    assert_eq!(recent.iter().map(|r| r.id).collect::<Vec<_>>(), expected);

    assert_eq!(store.recent(100).unwrap().len(), 12);
    assert!(store.recent(0).unwrap().is_empty());
}

#[test]
fn records_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("learned.jsonl");
    let first = record("before restart");
    JsonlStore::open(&path).append(&first).unwrap();

    let reopened = JsonlStore::open(&path);
    assert_eq!(reopened.recent(1).unwrap()[0], first);
}

#[test]
fn torn_trailing_write_keeps_committed_records_and_later_appends() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("learned.jsonl");
    let store = JsonlStore::open(&path);
    let committed = record("committed");
    store.append(&committed).unwrap();

    // Simulate a crash halfway through the next append.
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(br#"{"id":"0000","query":"torn"#).unwrap();
    drop(file);

    let store = JsonlStore::open(&path);
    assert_eq!(store.count().unwrap(), 1);

    let after = record("after crash");
    store.append(&after).unwrap();
    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, after.id);
    assert_eq!(recent[1].id, committed.id);
}

#[test]
fn state_file_round_trips_and_leaves_no_temp_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = StateFile::new(tmp.path().join("state.json"));
    assert_eq!(file.load().unwrap(), LearnState::default());

    let state = LearnState {
        interval_secs: 120,
        runs: 7,
        last_message: Some("processed 1 queued task(s)".into()),
        ..Default::default()
    };
    file.save(&state).unwrap();
    assert_eq!(file.load().unwrap(), state);

    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
