use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::ObjectStorePort;

pub struct RetrieveVersion<'a, D, A, S>
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

impl<'a, D, A, S> RetrieveVersion<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        version_id: &str,
    ) -> DocsResult<Vec<u8>> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).versions_retrieve {
            return Err(DocsError::PermissionDenied(
                "you cannot read this document's versions".into(),
            ));
        }
        self.store
            .get(&doc.content_key(), Some(version_id))
            .await?
            .ok_or(DocsError::NotFound)
    }
}
