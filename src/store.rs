use crate::models::UrlRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Keyed record storage.
///
/// `put` replaces the whole record in one step; callers never observe a
/// partially written row. Exclusive per-token access is the dispatcher's job,
/// not the store's.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Persist the record for `token`, replacing any previous value.
    async fn put(&self, token: &str, full_url: &str) -> Result<(), StoreError>;

    /// Fetch the record for `token`. `None` means it was never written.
    async fn get(&self, token: &str) -> Result<Option<UrlRecord>, StoreError>;
}

// ── In-memory backend ──────────────────────────────────────────────────────

/// Non-durable store backed by a DashMap.
///
/// Every record is lost when the process exits. Useful for local runs and
/// tests; select it with `STORAGE_BACKEND=memory`.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, UrlRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, token: &str, full_url: &str) -> Result<(), StoreError> {
        self.inner
            .insert(token.to_owned(), UrlRecord::new(token, full_url));
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<UrlRecord>, StoreError> {
        Ok(self.inner.get(token).map(|r| r.clone()))
    }
}
