use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::ObjectStorePort;

pub struct DeleteVersion<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
    pub ai: AiSettings,
}

impl<'a, D, A, S> DeleteVersion<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, id: Uuid, version_id: &str) -> DocsResult<()> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).versions_destroy {
            return Err(DocsError::PermissionDenied(
                "only administrators and owners can delete versions".into(),
            ));
        }
        if !self
            .store
            .delete_version(&doc.content_key(), version_id)
            .await?
        {
            return Err(DocsError::NotFound);
        }
        Ok(())
    }
}
