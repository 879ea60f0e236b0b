//! Append-only message table stored as JSON lines.
//!
//! Ids are assigned as `max(existing) + 1` under the table lock, so
//! concurrent inserts never share an id.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autotext_proto::message_log::{LogMessageRequest, MessageRow};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TableError {
    #[error("message table io: {0}")]
    Io(#[from] std::io::Error),

    #[error("message row encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct MessageTable {
    path: PathBuf,
    next_id: Arc<Mutex<u64>>,
}

impl MessageTable {
    /// Open (or create) the table at `path` and find the next free id.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TableError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let next_id = scan_max_id(&path).await? + 1;
        debug!("message table {:?}, next id {}", path, next_id);
        Ok(Self {
            path,
            next_id: Arc::new(Mutex::new(next_id)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and return its id.
    pub async fn insert(&self, entry: LogMessageRequest) -> Result<u64, TableError> {
        let mut next_id = self.next_id.lock().await;
        let row = MessageRow {
            id: *next_id,
            lead_id: entry.lead_id,
            message: entry.message,
            time: entry.time,
        };
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');

        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;
        let len = f.metadata().await?.len();
        // A torn earlier write must not swallow this row.
        if len > 0 && last_byte(&mut f, len).await? != b'\n' {
            warn!("message table ends mid-line, starting a new one");
            line.insert(0, '\n');
        }
        if let Err(e) = write_line(&mut f, &line).await {
            if let Err(trunc) = f.set_len(len).await {
                warn!("could not drop partial row: {}", trunc);
            }
            return Err(e.into());
        }

        *next_id += 1;
        Ok(row.id)
    }

    /// Every row in insertion order. Unreadable lines are skipped.
    pub async fn rows(&self) -> Result<Vec<MessageRow>, TableError> {
        let _guard = self.next_id.lock().await;
        read_rows(&self.path).await
    }
}

async fn last_byte(f: &mut tokio::fs::File, len: u64) -> std::io::Result<u8> {
    let mut byte = [0u8; 1];
    f.seek(SeekFrom::Start(len - 1)).await?;
    f.read_exact(&mut byte).await?;
    Ok(byte[0])
}

async fn write_line(f: &mut tokio::fs::File, line: &str) -> std::io::Result<()> {
    f.write_all(line.as_bytes()).await?;
    f.flush().await
}

async fn read_rows(path: &Path) -> Result<Vec<MessageRow>, TableError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match serde_json::from_str::<MessageRow>(l) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("skipping bad message row: {}", e);
                None
            }
        })
        .collect())
}

async fn scan_max_id(path: &Path) -> Result<u64, TableError> {
    Ok(read_rows(path)
        .await?
        .iter()
        .map(|r| r.id)
        .max()
        .unwrap_or(0))
}
