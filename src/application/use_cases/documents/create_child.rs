use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::documents::create_document::validate_init;
use crate::domain::documents::document::{Document, DocumentInit};

/// Create a child under an existing document. No access row is written:
/// the creator keeps whatever the chain already grants them.
pub struct CreateChildDocument<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub ai: AiSettings,
}

impl<'a, D, A> CreateChildDocument<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        parent_id: Uuid,
        mut init: DocumentInit,
    ) -> DocsResult<Document> {
        let parent = self
            .docs
            .get_by_id(parent_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        validate_init(&init)?;

        let resolved = access::resolve(self.docs, self.accesses, actor, &parent).await?;
        if !access::can_retrieve(&resolved, &parent) {
            return Err(DocsError::NotFound);
        }
        let abilities = access::abilities(&resolved, actor, &parent, self.ai);
        if !abilities.children_create {
            return Err(match actor {
                Actor::Anonymous => DocsError::Unauthenticated,
                Actor::User { .. } => DocsError::PermissionDenied(
                    "you cannot create children under this document".into(),
                ),
            });
        }

        if let Some(id) = init.id {
            if self.docs.get_by_id(id).await?.is_some() {
                return Err(DocsError::Conflict(format!(
                    "a document with id {id} already exists"
                )));
            }
        }

        init.creator_id = actor.user_id();
        Ok(self.docs.add_child(parent_id, init).await?)
    }
}
