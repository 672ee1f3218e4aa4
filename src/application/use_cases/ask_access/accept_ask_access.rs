use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::ask_access_repository::AskForAccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::access::DocumentAccess;
use crate::domain::accesses::role::{Principal, Role};

/// Resolve a pending access request: create or raise the grant, drop the
/// request.
pub struct AcceptAskForAccess<'a, D, A, Q, C, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    Q: AskForAccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub asks: &'a Q,
    pub collaboration: &'a C,
    pub cache: &'a K,
    pub ai: AiSettings,
}

impl<'a, D, A, Q, C, K> AcceptAskForAccess<'a, D, A, Q, C, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    Q: AskForAccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        document_id: Uuid,
        ask_id: Uuid,
        role_override: Option<Role>,
    ) -> DocsResult<DocumentAccess> {
        let doc = self
            .docs
            .get_by_id(document_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).accesses_manage {
            return Err(DocsError::PermissionDenied(
                "only administrators and owners can resolve access requests".into(),
            ));
        }

        let ask = self
            .asks
            .get(ask_id)
            .await?
            .filter(|a| a.document_id == document_id)
            .ok_or(DocsError::NotFound)?;

        let role = role_override.unwrap_or(ask.role);
        if role == Role::Owner && resolved.role != Some(Role::Owner) {
            return Err(DocsError::PermissionDenied(
                "only owners can assign the owner role".into(),
            ));
        }

        let principal = Principal::User(ask.user_id);
        let role = match self
            .accesses
            .get_for_principal(document_id, &principal)
            .await?
        {
            Some(existing) => Role::max_of([existing.role, role]).unwrap_or(role),
            None => role,
        };
        let row = self
            .accesses
            .update_or_create(document_id, &principal, role)
            .await?;
        self.asks.delete(ask.id).await?;

        crate::application::use_cases::accesses::after_access_change(
            self.docs,
            self.accesses,
            self.cache,
            self.collaboration,
            &doc,
            Some(ask.user_id),
        )
        .await?;
        Ok(row)
    }
}
