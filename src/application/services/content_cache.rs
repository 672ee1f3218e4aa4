use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::object_store_port::ObjectStorePort;

/// Per-process cache of content blobs, validated against the stored
/// object's checksum on every read so a write from another worker is
/// picked up immediately.
#[derive(Default)]
pub struct ContentCache {
    entries: RwLock<HashMap<Uuid, CachedBlob>>,
}

#[derive(Clone)]
struct CachedBlob {
    checksum: Option<String>,
    bytes: Arc<Vec<u8>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<S>(
        &self,
        store: &S,
        document_id: Uuid,
        key: &str,
    ) -> anyhow::Result<Option<Arc<Vec<u8>>>>
    where
        S: ObjectStorePort + ?Sized,
    {
        let current = store.head(key).await?;
        let Some(current) = current else {
            self.invalidate(document_id).await;
            return Ok(None);
        };

        if let Some(cached) = self.entries.read().await.get(&document_id) {
            if cached.checksum == current.checksum {
                return Ok(Some(cached.bytes.clone()));
            }
        }

        let Some(bytes) = store.get(key, None).await? else {
            self.invalidate(document_id).await;
            return Ok(None);
        };
        let bytes = Arc::new(bytes);
        self.entries.write().await.insert(
            document_id,
            CachedBlob {
                checksum: current.checksum,
                bytes: bytes.clone(),
            },
        );
        Ok(Some(bytes))
    }

    pub async fn invalidate(&self, document_id: Uuid) {
        self.entries.write().await.remove(&document_id);
    }
}
