use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use tracing::debug;

/// A learned chat message, lower-cased at insertion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Retention cutoff for [`MessageStore::trim`].
///
/// An `Age` is resolved against the clock when the trim runs, so the same
/// value trims further back the later it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimBefore {
    Instant(DateTime<Utc>),
    Age(Duration),
}

impl TrimBefore {
    /// An age reaching past the earliest representable time keeps
    /// everything.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TrimBefore::Instant(at) => *at,
            TrimBefore::Age(age) => now
                .checked_sub_signed(*age)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid stored timestamp '{0}'")]
    Timestamp(String),
}

/// Append-only log of learned messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Lower-cases `text` and records it with the current time.
    async fn append(&self, text: &str) -> Result<(), StoreError>;

    /// Returns every stored row in insertion order, or `None` when nothing
    /// has been learned. Never trims.
    async fn fetch_all(&self) -> Result<Option<Vec<StoredMessage>>, StoreError>;

    /// Deletes rows strictly older than the resolved cutoff and returns how
    /// many were removed.
    async fn trim(&self, before: TrimBefore) -> Result<usize, StoreError>;
}

/// Process-local store, for tests.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row with an explicit timestamp.
    pub fn append_at(&self, text: &str, timestamp: DateTime<Utc>) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.push(StoredMessage {
            text: text.to_lowercase(),
            timestamp,
        });
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, text: &str) -> Result<(), StoreError> {
        self.append_at(text, Utc::now());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Option<Vec<StoredMessage>>, StoreError> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.clone()))
    }

    async fn trim(&self, before: TrimBefore) -> Result<usize, StoreError> {
        let cutoff = before.cutoff(Utc::now());
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let previous = rows.len();
        rows.retain(|row| row.timestamp >= cutoff);
        let removed = previous - rows.len();
        debug!("MemoryStore: trimmed {} messages older than {}", removed, cutoff);
        Ok(removed)
    }
}
