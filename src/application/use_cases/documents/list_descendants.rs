use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::Document;

pub struct ListDescendants<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub ai: AiSettings,
}

impl<'a, D, A> ListDescendants<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    /// Live strict descendants in path order.
    pub async fn execute(&self, actor: &Actor, id: Uuid) -> DocsResult<Vec<Document>> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).descendants {
            return Err(DocsError::PermissionDenied(
                "you cannot list this document's descendants".into(),
            ));
        }
        Ok(self.docs.descendants(&doc.path).await?)
    }
}
