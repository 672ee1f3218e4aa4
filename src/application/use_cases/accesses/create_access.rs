use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::access::DocumentAccess;
use crate::domain::accesses::role::{Principal, Role};
use crate::domain::documents::document::Document;

/// Grant a role on a document. Owner grants are reserved to owners, and a
/// grant on a child must exceed what the principal already inherits.
pub struct CreateAccess<'a, D, A, C, K>
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

impl<'a, D, A, C, K> CreateAccess<'a, D, A, C, K>
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
        principal: Principal,
        role: Role,
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
                "only administrators and owners can share this document".into(),
            ));
        }
        if role == Role::Owner && resolved.role != Some(Role::Owner) {
            return Err(DocsError::PermissionDenied(
                "only owners can assign the owner role".into(),
            ));
        }

        check_role_override(self.accesses, &doc, &principal, role).await?;

        if self
            .accesses
            .get_for_principal(document_id, &principal)
            .await?
            .is_some()
        {
            return Err(DocsError::Conflict(format!(
                "{} already has a role on this document",
                principal.target_key()
            )));
        }

        let row = DocumentAccess::new(document_id, principal, role);
        self.accesses.create(&row).await?;
        super::after_access_change(
            self.docs,
            self.accesses,
            self.cache,
            self.collaboration,
            &doc,
            row.principal.user_id(),
        )
        .await?;
        Ok(row)
    }
}

/// A role granted on a document must strictly exceed what the principal
/// already inherits from ancestors.
pub(crate) async fn check_role_override<A>(
    accesses: &A,
    doc: &Document,
    principal: &Principal,
    role: Role,
) -> DocsResult<()>
where
    A: AccessRepository + ?Sized,
{
    let inherited = accesses
        .chain_accesses_for_principal(&doc.path, principal)
        .await?
        .into_iter()
        .filter(|row| row.access.document_id != doc.id)
        .map(|row| row.access.role)
        .max();
    if let Some(inherited) = inherited {
        if role <= inherited {
            return Err(DocsError::Invariant(format!(
                "Role overrides must be greater than the inherited role: {inherited}/{role}"
            )));
        }
    }
    Ok(())
}
