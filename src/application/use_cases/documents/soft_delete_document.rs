use chrono::Utc;
use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::services::access_count::AccessCountService;

/// Soft-delete a subtree: stamp the node, propagate to descendants, keep
/// the parent's bookkeeping, drop the cached access counts.
pub struct SoftDeleteDocument<'a, D, A, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub cache: &'a K,
    pub ai: AiSettings,
}

impl<'a, D, A, K> SoftDeleteDocument<'a, D, A, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    K: CachePort + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, id: Uuid) -> DocsResult<()> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if doc.in_deleted_chain() {
            return Err(DocsError::Invariant(
                "document is already deleted or under a deleted ancestor".into(),
            ));
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).destroy {
            return Err(DocsError::PermissionDenied(
                "only owners can delete a document".into(),
            ));
        }

        self.docs.soft_delete_subtree(id, Utc::now()).await?;

        let counts = AccessCountService {
            accesses: self.accesses,
            cache: self.cache,
            docs: self.docs,
        };
        counts
            .invalidate_subtree(&doc.path)
            .await
            .map_err(DocsError::Internal)?;
        Ok(())
    }
}
