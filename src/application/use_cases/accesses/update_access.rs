use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::accesses::create_access::check_role_override;
use crate::domain::accesses::access::DocumentAccess;
use crate::domain::accesses::role::Role;

/// Change an existing grant's role. Touching the owner role in either
/// direction is reserved to owners, and a root document keeps at least
/// one owner.
pub struct UpdateAccess<'a, D, A, C, K>
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

impl<'a, D, A, C, K> UpdateAccess<'a, D, A, C, K>
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
        new_role: Role,
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
                "only administrators and owners can manage accesses".into(),
            ));
        }

        let row = self
            .accesses
            .get(access_id)
            .await?
            .filter(|a| a.document_id == document_id)
            .ok_or(DocsError::NotFound)?;

        if (row.role == Role::Owner || new_role == Role::Owner)
            && resolved.role != Some(Role::Owner)
        {
            return Err(DocsError::PermissionDenied(
                "only owners can change the owner role".into(),
            ));
        }
        if row.role == Role::Owner
            && new_role != Role::Owner
            && doc.is_root()
            && self.accesses.owners_of(document_id).await?.len() == 1
        {
            return Err(DocsError::PermissionDenied(
                "a root document must keep at least one owner".into(),
            ));
        }

        check_role_override(self.accesses, &doc, &row.principal, new_role).await?;

        let updated = self
            .accesses
            .update_role(access_id, new_role)
            .await?
            .ok_or(DocsError::NotFound)?;
        super::after_access_change(
            self.docs,
            self.accesses,
            self.cache,
            self.collaboration,
            &doc,
            updated.principal.user_id(),
        )
        .await?;
        Ok(updated)
    }
}
