use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::{
    Document, DocumentUpdate, EXCERPT_MAX_LEN, TITLE_MAX_LEN,
};

/// Update the non-structural text fields. Link policy changes go through
/// `UpdateLinkConfiguration`, content through `UpdateContent`.
pub struct UpdateDocument<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub ai: AiSettings,
}

impl<'a, D, A> UpdateDocument<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    // Outer None leaves a field untouched, inner None clears it.
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        title: Option<Option<String>>,
        excerpt: Option<Option<String>>,
    ) -> DocsResult<Document> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        let abilities = access::abilities(&resolved, actor, &doc, self.ai);
        if !abilities.partial_update {
            return Err(DocsError::PermissionDenied(
                "you cannot update this document".into(),
            ));
        }

        if title
            .as_ref()
            .and_then(|t| t.as_deref())
            .is_some_and(|t| t.chars().count() > TITLE_MAX_LEN)
        {
            return Err(DocsError::Invariant(format!(
                "title exceeds {TITLE_MAX_LEN} characters"
            )));
        }
        if excerpt
            .as_ref()
            .and_then(|e| e.as_deref())
            .is_some_and(|e| e.chars().count() > EXCERPT_MAX_LEN)
        {
            return Err(DocsError::Invariant(format!(
                "excerpt exceeds {EXCERPT_MAX_LEN} characters"
            )));
        }

        self.docs
            .update(
                id,
                DocumentUpdate {
                    title,
                    excerpt,
                    ..Default::default()
                },
            )
            .await?
            .ok_or(DocsError::NotFound)
    }
}
