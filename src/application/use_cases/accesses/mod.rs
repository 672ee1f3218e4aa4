use uuid::Uuid;

use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::services::access_count::AccessCountService;
use crate::domain::documents::document::Document;

pub mod create_access;
pub mod delete_access;
pub mod list_accesses;
pub mod update_access;

/// Every access mutation drops the cached counts for the subtree and asks
/// the collaboration server to re-check the affected room (reset failures
/// degrade to a warning, the grant change itself already committed).
pub(crate) async fn after_access_change<D, A, C, K>(
    docs: &D,
    accesses: &A,
    cache: &K,
    collaboration: &C,
    doc: &Document,
    user_id: Option<Uuid>,
) -> DocsResult<()>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    let counts = AccessCountService {
        accesses,
        cache,
        docs,
    };
    counts
        .invalidate_subtree(&doc.path)
        .await
        .map_err(DocsError::Internal)?;
    if let Err(err) = collaboration
        .reset_connections(&doc.id.to_string(), user_id)
        .await
    {
        tracing::warn!(document = %doc.id, error = %err, "collaboration reset failed after access change");
    }
    Ok(())
}
