use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::services::access_count::AccessCountService;

/// Undo a soft-delete within the retention window. The node may stay
/// under a deleted ancestor; its `ancestors_deleted_at` is then realigned
/// to the earliest stamp still active above it.
pub struct RestoreDocument<'a, D, A, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub cache: &'a K,
    pub ai: AiSettings,
    /// `TRASHBIN_CUTOFF_DAYS`
    pub retention: Duration,
}

impl<'a, D, A, K> RestoreDocument<'a, D, A, K>
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
        if !access::abilities(&resolved, actor, &doc, self.ai).restore {
            return Err(DocsError::PermissionDenied(
                "only owners can restore a document".into(),
            ));
        }
        let Some(deleted_at) = doc.deleted_at else {
            return Err(DocsError::Invariant("document is not deleted".into()));
        };
        if deleted_at < Utc::now() - self.retention {
            return Err(DocsError::Invariant(
                "deletion is past the retention window".into(),
            ));
        }

        // Earliest stamp among still-deleted ancestors, ascending scan.
        let chain = self.docs.chain(&doc.path).await?;
        let new_ancestors_deleted_at = chain
            .iter()
            .filter(|d| d.id != doc.id)
            .filter_map(|d| d.deleted_at)
            .min();

        self.docs
            .restore_subtree(id, deleted_at, new_ancestors_deleted_at)
            .await?;

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
