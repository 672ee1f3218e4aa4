use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::Document;
use crate::domain::documents::path::TreePath;

/// Cached per-document pair: rows on the document itself, and rows on the
/// document or any live ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCounts {
    pub direct: i64,
    pub ancestors: i64,
}

pub fn cache_key(document_id: Uuid) -> String {
    format!("document:{document_id}:nb_accesses")
}

pub struct AccessCountService<'a, A, C, D>
where
    A: AccessRepository + ?Sized,
    C: CachePort + ?Sized,
    D: DocumentRepository + ?Sized,
{
    pub accesses: &'a A,
    pub cache: &'a C,
    pub docs: &'a D,
}

impl<'a, A, C, D> AccessCountService<'a, A, C, D>
where
    A: AccessRepository + ?Sized,
    C: CachePort + ?Sized,
    D: DocumentRepository + ?Sized,
{
    /// Cached read; on miss, two counting queries fill the pair.
    pub async fn nb_accesses(&self, doc: &Document) -> anyhow::Result<AccessCounts> {
        let key = cache_key(doc.id);
        if let Some(raw) = self.cache.get(&key).await? {
            if let Ok(counts) = serde_json::from_str::<AccessCounts>(&raw) {
                return Ok(counts);
            }
        }
        let counts = AccessCounts {
            direct: self.accesses.count_direct(doc.id).await?,
            ancestors: self.accesses.count_chain(&doc.path).await?,
        };
        self.cache
            .set(&key, &serde_json::to_string(&counts)?, None)
            .await?;
        Ok(counts)
    }

    /// Drop the cached pair for the node and every descendant. Called on
    /// any access mutation, soft-delete, restore or move touching `path`.
    pub async fn invalidate_subtree(&self, path: &TreePath) -> anyhow::Result<()> {
        let ids = self.docs.subtree_ids(path).await?;
        tracing::debug!(subtree = %path, entries = ids.len(), "invalidating access counts");
        for id in ids {
            self.cache.delete(&cache_key(id)).await?;
        }
        Ok(())
    }
}
