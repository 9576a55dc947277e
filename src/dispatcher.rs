use crate::{
    models::UrlRecord,
    store::{RecordStore, StoreError},
};
use dashmap::DashMap;
use std::{future::Future, sync::Arc};
use tokio::sync::Mutex;

/// Per-token exclusive access primitive.
type Slot = Arc<Mutex<()>>;

/// Routes every operation on a token through that token's slot.
///
/// Each token gets its own async mutex, created lazily on first reference and
/// kept for the lifetime of the process. Operations on the same token are
/// strictly serialized; operations on different tokens never contend.
///
/// Slots are not evicted. Each one is a single `Arc<Mutex<()>>`, so growth is
/// O(1) per token ever touched.
#[derive(Clone)]
pub struct KeyDispatcher {
    slots: Arc<DashMap<String, Slot>>,
    store: Arc<dyn RecordStore>,
}

impl KeyDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            store,
        }
    }

    /// Run `op` while holding the slot for `token`.
    ///
    /// The slot is released when `op` finishes, fails or is dropped
    /// mid-flight (e.g. the client disconnected). Whatever `op` returns is
    /// handed back untouched.
    pub async fn with_exclusive_access<F, Fut, T>(&self, token: &str, op: F) -> T
    where
        F: FnOnce(Arc<dyn RecordStore>) -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = self.slot(token);
        let _guard = slot.lock().await;
        op(Arc::clone(&self.store)).await
    }

    /// Replace the record for `token`.
    pub async fn put(&self, token: &str, full_url: &str) -> Result<(), StoreError> {
        self.with_exclusive_access(token, |store| async move {
            store.put(token, full_url).await
        })
        .await
    }

    /// Read the record for `token`.
    pub async fn get(&self, token: &str) -> Result<Option<UrlRecord>, StoreError> {
        self.with_exclusive_access(token, |store| async move { store.get(token).await })
            .await
    }

    /// Write the record only if `token` has never been assigned.
    ///
    /// The existence check and the write happen under one slot hold, so two
    /// callers racing on the same fresh token cannot both win. Returns `false`
    /// when the token was already taken.
    pub async fn put_if_absent(&self, token: &str, full_url: &str) -> Result<bool, StoreError> {
        self.with_exclusive_access(token, |store| async move {
            if store.get(token).await?.is_some() {
                return Ok(false);
            }
            store.put(token, full_url).await?;
            Ok(true)
        })
        .await
    }

    /// Number of slots created so far.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    // The shard guard from `entry` must be dropped before awaiting the
    // mutex, so only the cloned Arc leaves this function.
    fn slot(&self, token: &str) -> Slot {
        if let Some(slot) = self.slots.get(token) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(token.to_owned()).or_default().value())
    }
}
