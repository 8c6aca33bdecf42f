//! JSON Lines event log on the local filesystem
//!
//! One record per line, appended in arrival order. A single exclusive guard
//! serializes appends and full reads, so a reader never observes a
//! half-written line and concurrent writers never interleave.

use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::trait_def::{EventStore, StorageError, StorageResult};
use crate::models::EventRecord;

#[derive(Clone)]
pub struct JsonLinesStore {
    inner: Arc<LogFile>,
}

struct LogFile {
    path: PathBuf,
    guard: Mutex<()>,
}

impl LogFile {
    fn lock(&self) -> MutexGuard<'_, ()> {
        // Guards no data; a poisoned lock is still safe to reuse.
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append_line(&self, line: &[u8]) -> StorageResult<()> {
        let _guard = self.lock();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line)?;
        file.flush()?;
        Ok(())
    }

    fn read_bytes(&self) -> StorageResult<Option<Vec<u8>>> {
        let _guard = self.lock();

        match fs::read(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_records(&self) -> StorageResult<Vec<EventRecord>> {
        Ok(self
            .read_bytes()?
            .map(|contents| parse_lines(&contents))
            .unwrap_or_default())
    }
}

/// Parse each non-empty line on its own; lines that don't parse are skipped.
fn parse_lines(contents: &[u8]) -> Vec<EventRecord> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for line in contents.split(|b| *b == b'\n') {
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<EventRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "skipping unreadable event log line");
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, kept = records.len(), "event log contained corrupt lines");
    }

    records
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(LogFile {
                path: path.into(),
                guard: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

#[async_trait]
impl EventStore for JsonLinesStore {
    async fn append(&self, record: &EventRecord) -> StorageResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        // Completes even if this future is dropped.
        let log = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || log.append_line(&line))
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?
    }

    async fn read_all(&self) -> StorageResult<Vec<EventRecord>> {
        let log = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || log.read_records())
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?
    }

    async fn read_raw(&self) -> StorageResult<Option<Vec<u8>>> {
        let log = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || log.read_bytes())
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(link_id: &str) -> EventRecord {
        EventRecord {
            link_id: link_id.to_string(),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            ..Default::default()
        }
    }

    fn store_in(dir: &TempDir) -> JsonLinesStore {
        JsonLinesStore::new(dir.path().join("logs.json"))
    }

    #[tokio::test]
    async fn test_read_all_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let records = store.read_all().await.unwrap();
        assert!(records.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_append_creates_file_and_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.append(&record("first")).await.unwrap();
        store.append(&record("second")).await.unwrap();
        store.append(&record("third")).await.unwrap();

        let records = store.read_all().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.link_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert!(raw.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        std::fs::write(
            store.path(),
            "{\"linkId\":\"a\",\"timestamp\":\"t1\"}\nnot json at all\n\n{\"linkId\":\"b\",\"timestamp\":\"t2\"}\n{\"linkId\":",
        )
        .unwrap();

        let records = store.read_all().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.link_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_read_raw_returns_file_bytes_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.read_raw().await.unwrap().is_none());

        store.append(&record("a")).await.unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .unwrap()
            .write_all(b"garbage\n")
            .unwrap();

        let raw = store.read_raw().await.unwrap().unwrap();
        assert_eq!(raw, std::fs::read(store.path()).unwrap());
        assert!(raw.ends_with(b"garbage\n"));
    }

    #[tokio::test]
    async fn test_append_after_existing_content() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{\"linkId\":\"old\",\"timestamp\":\"t0\"}\n").unwrap();

        store.append(&record("new")).await.unwrap();

        let records = store.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].link_id, "old");
        assert_eq!(records[1].link_id, "new");
    }

    #[tokio::test]
    async fn test_append_to_unwritable_path_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("missing").join("logs.json"));

        let result = store.append(&record("x")).await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_directory_path_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path());

        assert!(store.read_all().await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut r = record(&format!("link-{i}"));
                r.user_agent = "x".repeat(4096);
                store.append(&r).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.lines().count(), 64);
        for line in raw.lines() {
            serde_json::from_str::<EventRecord>(line).unwrap();
        }
        assert_eq!(store.read_all().await.unwrap().len(), 64);
    }
}
