use crate::application::access::Actor;
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::access::DocumentAccess;
use crate::domain::accesses::role::{Principal, Role};
use crate::domain::documents::document::{
    Document, DocumentInit, EXCERPT_MAX_LEN, TITLE_MAX_LEN,
};

/// Create a root document. The creator becomes its owner.
pub struct CreateDocument<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
}

impl<'a, D, A> CreateDocument<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, mut init: DocumentInit) -> DocsResult<Document> {
        let Some(user_id) = actor.user_id() else {
            return Err(DocsError::Unauthenticated);
        };
        validate_init(&init)?;

        if let Some(id) = init.id {
            if self.docs.get_by_id(id).await?.is_some() {
                return Err(DocsError::Conflict(format!(
                    "a document with id {id} already exists"
                )));
            }
        }

        init.creator_id = Some(user_id);
        let doc = self.docs.create_root(init).await?;
        self.accesses
            .create(&DocumentAccess::new(
                doc.id,
                Principal::User(user_id),
                Role::Owner,
            ))
            .await?;
        Ok(doc)
    }
}

pub(crate) fn validate_init(init: &DocumentInit) -> DocsResult<()> {
    if init
        .title
        .as_deref()
        .is_some_and(|t| t.chars().count() > TITLE_MAX_LEN)
    {
        return Err(DocsError::Invariant(format!(
            "title exceeds {TITLE_MAX_LEN} characters"
        )));
    }
    if init
        .excerpt
        .as_deref()
        .is_some_and(|e| e.chars().count() > EXCERPT_MAX_LEN)
    {
        return Err(DocsError::Invariant(format!(
            "excerpt exceeds {EXCERPT_MAX_LEN} characters"
        )));
    }
    Ok(())
}
