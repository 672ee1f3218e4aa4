use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::abilities::Abilities;
use crate::domain::documents::document::Document;

pub struct ListChildren<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub ai: AiSettings,
}

impl<'a, D, A> ListChildren<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    /// Live children in sibling order, each with the caller's abilities.
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> DocsResult<Vec<(Document, Abilities)>> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).children_list {
            return Err(DocsError::PermissionDenied(
                "you cannot list this document's children".into(),
            ));
        }

        let mut out = Vec::new();
        for child in self.docs.children(&doc.path).await? {
            let child_resolved =
                access::resolve(self.docs, self.accesses, actor, &child).await?;
            let abilities = access::abilities(&child_resolved, actor, &child, self.ai);
            out.push((child, abilities));
        }
        Ok(out)
    }
}
