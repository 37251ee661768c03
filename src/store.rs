//! Append-only result store.
//!
//! [`JsonlStore`] is the durable implementation: one JSON record per line in
//! `learned.jsonl`. Each append is a single complete line followed by
//! `sync_data`, and a torn trailing line from an interrupted write is skipped
//! on read, so earlier records always survive a crash.

use crate::error::{LearnError, Result};
use crate::types::LearnedRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append/read capability for learned records.
pub trait RecordStore: Send + Sync {
    /// Persist one record after all previously appended ones.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::Store`] or [`LearnError::Io`] if the record could
    /// not be written. Nothing partial is left visible to readers.
    fn append(&self, record: &LearnedRecord) -> Result<()>;

    /// Up to `limit` records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn recent(&self, limit: usize) -> Result<Vec<LearnedRecord>>;

    /// Number of readable records.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn count(&self) -> Result<usize>;
}

/// JSON-lines file store.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<LearnedRecord>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LearnedRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %e,
                        "skipping unreadable record line"
                    );
                }
            }
        }
        Ok(records)
    }
}

impl RecordStore for JsonlStore {
    fn append(&self, record: &LearnedRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| LearnError::Store(format!("cannot serialize record: {e}")))?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // A torn previous append would otherwise swallow this record too.
        if !ends_with_newline(&mut file)? {
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<LearnedRecord>> {
        let records = self.read_all()?;
        Ok(records.into_iter().rev().take(limit).collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<LearnedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record in append order.
    pub fn all(&self) -> Vec<LearnedRecord> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, record: &LearnedRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<LearnedRecord>> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.lock().unwrap_or_else(|p| p.into_inner()).len())
    }
}
