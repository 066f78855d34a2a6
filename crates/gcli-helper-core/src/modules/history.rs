//! Bounded verification history.
//!
//! Append-only in-memory ledger of verification attempts with FIFO
//! eviction past the configured bound. Optionally mirrors each record to a
//! line-oriented log file, best-effort: writes go through one writer task
//! (so file order matches append order) and unflushed records are lost on
//! crash — history is diagnostic, not authoritative.

use std::collections::VecDeque;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, RwLock};

use gcli_helper_types::{VerificationRecord, VerifyOutcome};

enum PersistOp {
    Append(String),
    Clear,
}

pub struct HistoryStore {
    records: RwLock<VecDeque<VerificationRecord>>,
    max_records: usize,
    // Feeds the single writer task; `None` when persistence is disabled.
    writer: Option<mpsc::UnboundedSender<PersistOp>>,
}

impl HistoryStore {
    /// Must be called from within a tokio runtime when `persist_path` is
    /// set: the backing writer task is spawned here.
    pub fn new(max_records: usize, persist_path: Option<PathBuf>) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(max_records.min(1024))),
            max_records,
            writer: persist_path.map(spawn_writer),
        }
    }

    /// Append a record, evicting the oldest past the bound. O(1) amortized.
    pub async fn append(&self, record: VerificationRecord) {
        {
            let mut records = self.records.write().await;
            if records.len() >= self.max_records {
                let excess = records.len() - self.max_records + 1;
                records.drain(..excess);
            }
            records.push_back(record.clone());
        }

        if let Some(writer) = &self.writer {
            let _ = writer.send(PersistOp::Append(record.to_line()));
        }
    }

    /// Records newest-first, optionally filtered by outcome and limited.
    pub async fn list(
        &self,
        outcome: Option<VerifyOutcome>,
        limit: Option<usize>,
    ) -> Vec<VerificationRecord> {
        let records = self.records.read().await;
        let limit = limit.unwrap_or(records.len());
        records
            .iter()
            .rev()
            .filter(|r| outcome.map_or(true, |o| r.outcome == o))
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Empty the store irreversibly; truncates the backing file too.
    pub async fn clear(&self) {
        self.records.write().await.clear();
        if let Some(writer) = &self.writer {
            let _ = writer.send(PersistOp::Clear);
        }
    }

    /// Serialize all records, newest-first, one line each.
    pub async fn export_text(&self) -> String {
        let records = self.records.read().await;
        records.iter().rev().map(VerificationRecord::to_line).collect::<Vec<_>>().join("\n")
    }
}

/// Parse text produced by [`HistoryStore::export_text`] back into records.
/// Lines that don't match the export format are skipped.
pub fn parse_export(text: &str) -> Vec<VerificationRecord> {
    text.lines().filter_map(VerificationRecord::parse_line).collect()
}

/// Spawn the writer task. Ops are processed strictly in send order, so
/// the file mirrors the in-memory append order. The task exits when the
/// store (and thus the sender) is dropped.
fn spawn_writer(path: PathBuf) -> mpsc::UnboundedSender<PersistOp> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            let result = match op {
                PersistOp::Append(line) => append_line(&path, &line).await,
                PersistOp::Clear => tokio::fs::write(&path, b"").await,
            };
            if let Err(e) = result {
                tracing::warn!("[History] Failed to persist to {:?}: {}", path, e);
            }
        }
    });
    tx
}

async fn append_line(path: &PathBuf, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}
