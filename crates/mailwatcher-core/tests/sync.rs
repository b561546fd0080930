//! End-to-end tests for the sync engine.
//!
//! These tests run the engine against an in-memory message source and a
//! real index file inside a temporary base directory.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use tempfile::TempDir;

use mailwatcher_core::{
    Attachment, Error, MailIndex, MemorySource, Outcome, RemoteMessage, SearchQuery, SyncConfig,
    SyncEngine, attachment_dir,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

fn message(id: &str, from: &str, date: &str) -> RemoteMessage {
    RemoteMessage {
        id: id.to_string(),
        thread_id: format!("thread-{id}"),
        date: DateTime::parse_from_rfc3339(date).unwrap(),
        from: from.to_string(),
        subject: format!("Subject of {id}"),
        labels: vec!["INBOX".to_string()],
        body_text: Some(format!("Body of {id}")),
        body_html: None,
        attachments: Vec::new(),
    }
}

fn config(base: &Path) -> SyncConfig {
    SyncConfig::new(base, SearchQuery::default())
}

/// Every regular file under `dir`, excluding the index database.
fn stored_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else if !path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("index.sqlite.db")
            {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let mut source = MemorySource::new(
        vec![
            message("m1", "Alice <alice@example.com>", "2024-03-01T09:00:00Z"),
            message("m2", "bob@example.org", "2024-03-02T10:30:00Z"),
        ],
        today(),
    );

    let engine = SyncEngine::new(config(tmp.path())).await.unwrap();
    let first = engine.run(&mut source).await.unwrap();
    assert_eq!((first.fetched, first.skipped, first.indexed), (2, 0, 2));
    engine.into_index().close().await;
    let files_after_first = stored_files(tmp.path());

    let engine = SyncEngine::new(config(tmp.path())).await.unwrap();
    let second = engine.run(&mut source).await.unwrap();
    assert_eq!((second.fetched, second.skipped, second.indexed), (2, 2, 0));
    assert_eq!(engine.index().count().await.unwrap(), 2);
    assert_eq!(stored_files(tmp.path()), files_after_first);
}

#[tokio::test]
async fn replay_after_crash_writes_new_file() {
    let tmp = TempDir::new().unwrap();
    let msg = message("m1", "alice@example.com", "2024-03-01T09:00:00Z");

    // Crash between writing files and inserting the record.
    let engine = SyncEngine::new(config(tmp.path())).await.unwrap();
    let orphan = engine.materialize(&msg).await.unwrap();
    engine.into_index().close().await;

    let engine = SyncEngine::new(config(tmp.path())).await.unwrap();
    let Outcome::Indexed(record) = engine.process(&msg).await.unwrap() else {
        panic!("expected message to be indexed on replay");
    };

    assert!(orphan.filename.ends_with("20240301-090000.000"));
    assert!(record.filename.ends_with("20240301-090000.001"));
    assert!(Path::new(&record.filename).exists());
    assert_eq!(
        engine.index().get("m1").await.unwrap().unwrap().filename,
        record.filename
    );
}

#[tokio::test]
async fn same_second_messages_get_distinct_counters() {
    let tmp = TempDir::new().unwrap();
    let mut source = MemorySource::new(
        vec![
            message("m1", "alice@example.com", "2024-03-01T09:00:00Z"),
            message("m2", "Alice <alice@example.com>", "2024-03-01T09:00:00Z"),
            message("m3", "alice@example.com", "2024-03-01T09:00:00Z"),
        ],
        today(),
    );

    let engine = SyncEngine::with_index(config(tmp.path()), MailIndex::in_memory().await.unwrap());
    engine.run(&mut source).await.unwrap();

    let dir = tmp.path().join("alice@example.com").join("20240301");
    for (id, counter) in [("m1", "000"), ("m2", "001"), ("m3", "002")] {
        let record = engine.index().get(id).await.unwrap().unwrap();
        let expected = dir.join(format!("20240301-090000.{counter}"));
        assert_eq!(record.filename, expected.to_str().unwrap());
        assert_eq!(
            std::fs::read_to_string(&expected).unwrap(),
            format!("Body of {id}")
        );
    }
}

#[tokio::test]
async fn text_body_wins_and_missing_body_is_empty() {
    let tmp = TempDir::new().unwrap();
    let mut both = message("m1", "alice@example.com", "2024-03-01T09:00:00Z");
    both.body_text = Some("plain text".to_string());
    both.body_html = Some("<b>html</b>".to_string());
    let mut neither = message("m2", "alice@example.com", "2024-03-01T09:05:00Z");
    neither.body_text = None;

    let engine = SyncEngine::with_index(config(tmp.path()), MailIndex::in_memory().await.unwrap());
    engine.process(&both).await.unwrap();
    engine.process(&neither).await.unwrap();

    let both = engine.index().get("m1").await.unwrap().unwrap();
    assert_eq!(std::fs::read_to_string(both.filename).unwrap(), "plain text");

    let neither = engine.index().get("m2").await.unwrap().unwrap();
    assert_eq!(std::fs::metadata(neither.filename).unwrap().len(), 0);
}

#[tokio::test]
async fn attachments_are_stored_and_summarized() {
    let tmp = TempDir::new().unwrap();
    let mut msg = message("m1", "alice@example.com", "2024-03-01T09:00:00Z");
    msg.attachments = vec![
        Attachment {
            filename: "a.txt".to_string(),
            data: b"first".to_vec(),
        },
        Attachment {
            filename: "b.pdf".to_string(),
            data: b"%PDF-1.4".to_vec(),
        },
    ];

    let engine = SyncEngine::with_index(config(tmp.path()), MailIndex::in_memory().await.unwrap());
    let Outcome::Indexed(record) = engine.process(&msg).await.unwrap() else {
        panic!("expected message to be indexed");
    };

    assert_eq!(record.attachments, "a.txt;b.pdf");
    let dir = attachment_dir(Path::new(&record.filename));
    assert_eq!(std::fs::read(dir.join("a.txt")).unwrap(), b"first");
    assert_eq!(std::fs::read(dir.join("b.pdf")).unwrap(), b"%PDF-1.4");
}

#[tokio::test]
async fn malformed_sender_is_still_indexed() {
    let tmp = TempDir::new().unwrap();
    let msg = message("m1", "Mail Delivery Subsystem", "2024-03-01T09:00:00Z");

    let engine = SyncEngine::with_index(config(tmp.path()), MailIndex::in_memory().await.unwrap());
    let Outcome::Indexed(record) = engine.process(&msg).await.unwrap() else {
        panic!("expected message to be indexed");
    };

    let expected = tmp.path().join("20240301").join("20240301-090000.000");
    assert_eq!(record.filename, expected.to_str().unwrap());
    assert_eq!(record.sender, "Mail Delivery Subsystem");
}

#[tokio::test]
async fn result_limit_bounds_each_run() {
    let tmp = TempDir::new().unwrap();
    let mut source = MemorySource::new(
        (1..=5)
            .map(|n| {
                message(
                    &format!("m{n}"),
                    "alice@example.com",
                    &format!("2024-03-0{n}T09:00:00Z"),
                )
            })
            .collect(),
        today(),
    );
    let query = SearchQuery::default().with_max_results(3).unwrap();
    let engine = SyncEngine::with_index(
        SyncConfig::new(tmp.path(), query),
        MailIndex::in_memory().await.unwrap(),
    );

    let report = engine.run(&mut source).await.unwrap();
    assert_eq!((report.fetched, report.indexed), (3, 3));
    assert!(!engine.index().exists("m4").await.unwrap());
}

#[tokio::test]
async fn racing_runs_fail_with_duplicate_key() {
    let tmp = TempDir::new().unwrap();
    let index_path = tmp.path().join("index.sqlite.db");
    let msg = message("m1", "alice@example.com", "2024-03-01T09:00:00Z");

    let first = SyncEngine::new(config(tmp.path())).await.unwrap();
    let second = SyncEngine::with_index(
        config(tmp.path()),
        MailIndex::open(&index_path).await.unwrap(),
    );

    // Both runs pass the existence check before either commits.
    let slow = first.materialize(&msg).await.unwrap();
    second.process(&msg).await.unwrap();

    let err = first.index().insert(&slow).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
    assert_ne!(
        slow.filename,
        second.index().get("m1").await.unwrap().unwrap().filename
    );
}
