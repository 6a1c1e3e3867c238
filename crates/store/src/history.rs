//! Rolling chat-history log.
//!
//! The log is an append-only ring of the most recent N `{timestamp, user,
//! bot}` entries, persisted as a JSON array. Writes go through
//! read-modify-truncate-append under a single mutex so concurrent turns
//! cannot lose updates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use swapdesk_core::chat::HistoryEntry;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("could not read history file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write history file `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("history file `{path}` is not valid JSON: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },
    #[error("could not encode history entries: {0}")]
    Encode(#[source] serde_json::Error),
}

#[async_trait]
pub trait HistoryLog: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
    async fn recent(&self, n: usize) -> Result<Vec<HistoryEntry>, HistoryError>;
    async fn clear(&self) -> Result<(), HistoryError>;
}

pub struct FileHistoryLog {
    path: PathBuf,
    cap: usize,
    write_lock: Mutex<()>,
}

impl FileHistoryLog {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self { path: path.into(), cap: cap.max(1), write_lock: Mutex::new(()) }
    }

    async fn read_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(HistoryError::Read { path: self.path.clone(), source }),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw)
            .map_err(|source| HistoryError::Decode { path: self.path.clone(), source })
    }

    async fn write_all(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let encoded = serde_json::to_string_pretty(entries).map_err(HistoryError::Encode)?;
        write_atomically(&self.path, &encoded)
            .await
            .map_err(|source| HistoryError::Write { path: self.path.clone(), source })
    }
}

async fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

#[async_trait]
impl HistoryLog for FileHistoryLog {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_all().await?;
        entries.push(entry);
        if entries.len() > self.cap {
            let excess = entries.len() - self.cap;
            entries.drain(..excess);
        }

        self.write_all(&entries).await
    }

    async fn recent(&self, n: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self.read_all().await?;
        let start = entries.len().saturating_sub(n);
        Ok(entries[start..].to_vec())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;
        self.write_all(&[]).await
    }
}
