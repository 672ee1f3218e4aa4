use uuid::Uuid;

use crate::application::access::{self, Actor};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::ask_access_repository::{AskForAccess, AskForAccessRepository};
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::role::Role;

#[derive(Debug)]
pub struct AskOutcome {
    pub ask: AskForAccess,
    /// False when an identical request was already pending.
    pub created: bool,
}

/// Request a role on a document the caller cannot reach. Idempotent:
/// asking twice reports the existing request.
pub struct CreateAskForAccess<'a, D, A, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    Q: AskForAccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub asks: &'a Q,
}

impl<'a, D, A, Q> CreateAskForAccess<'a, D, A, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    Q: AskForAccessRepository + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        document_id: Uuid,
        role: Option<Role>,
    ) -> DocsResult<AskOutcome> {
        let Some(user_id) = actor.user_id() else {
            return Err(DocsError::Unauthenticated);
        };
        let doc = self
            .docs
            .get_by_id(document_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        if doc.in_deleted_chain() {
            return Err(DocsError::NotFound);
        }
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if resolved.role.is_some() {
            return Err(DocsError::Conflict(
                "you already have a role on this document".into(),
            ));
        }

        let ask = AskForAccess::new(document_id, user_id, role.unwrap_or(Role::Reader));
        let created = self.asks.create(&ask).await?;
        if created {
            Ok(AskOutcome { ask, created: true })
        } else {
            let existing = self
                .asks
                .list_for_document(document_id)
                .await?
                .into_iter()
                .find(|a| a.user_id == user_id)
                .ok_or(DocsError::NotFound)?;
            Ok(AskOutcome {
                ask: existing,
                created: false,
            })
        }
    }
}
