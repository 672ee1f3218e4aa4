use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::role::Role;

/// Revoke a grant. Owner rows need an owner caller; the last owner row of
/// a root document cannot be removed (children inherit owners from their
/// chain, so the rule stops at roots).
pub struct DeleteAccess<'a, D, A, C, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub collaboration: &'a C,
    pub cache: &'a K,
    pub ai: AiSettings,
}

impl<'a, D, A, C, K> DeleteAccess<'a, D, A, C, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        document_id: Uuid,
        access_id: Uuid,
    ) -> DocsResult<()> {
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
                "only administrators and owners can manage accesses".into(),
            ));
        }

        let row = self
            .accesses
            .get(access_id)
            .await?
            .filter(|a| a.document_id == document_id)
            .ok_or(DocsError::NotFound)?;

        if row.role == Role::Owner {
            if resolved.role != Some(Role::Owner) {
                return Err(DocsError::PermissionDenied(
                    "only owners can revoke an owner access".into(),
                ));
            }
            if doc.is_root() && self.accesses.owners_of(document_id).await?.len() == 1 {
                return Err(DocsError::PermissionDenied(
                    "a root document must keep at least one owner".into(),
                ));
            }
        }

        if !self.accesses.delete(access_id).await? {
            return Err(DocsError::NotFound);
        }
        super::after_access_change(
            self.docs,
            self.accesses,
            self.cache,
            self.collaboration,
            &doc,
            row.principal.user_id(),
        )
        .await?;
        Ok(())
    }
}
