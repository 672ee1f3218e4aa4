use chrono::{Duration, Utc};

use crate::application::access::{self, Actor};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::role::Role;
use crate::domain::documents::document::Document;

/// Roots of trashed subtrees the caller owns, still inside the retention
/// window.
pub struct ListTrashbin<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub retention: Duration,
}

impl<'a, D, A> ListTrashbin<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub async fn execute(&self, actor: &Actor) -> DocsResult<Vec<Document>> {
        if !actor.is_authenticated() {
            return Err(DocsError::Unauthenticated);
        }
        let cutoff = Utc::now() - self.retention;
        let mut out = Vec::new();
        for doc in self.docs.deleted_subtree_roots(cutoff).await? {
            let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
            if resolved.role == Some(Role::Owner) {
                out.push(doc);
            }
        }
        Ok(out)
    }
}
