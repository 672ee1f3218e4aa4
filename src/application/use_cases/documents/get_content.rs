use std::sync::Arc;

use uuid::Uuid;

use crate::application::access::{self, Actor};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::ObjectStorePort;
use crate::application::services::content_cache::ContentCache;

/// Fetch the current content blob through the per-process cache. Storage
/// misses surface as NotFound.
pub struct GetContent<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
    pub content_cache: &'a ContentCache,
}

impl<'a, D, A, S> GetContent<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, id: Uuid) -> DocsResult<Arc<Vec<u8>>> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        self.content_cache
            .get_or_fetch(self.store, doc.id, &doc.content_key())
            .await?
            .ok_or(DocsError::NotFound)
    }
}
