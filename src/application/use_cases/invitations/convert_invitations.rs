use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::invitation_repository::InvitationRepository;
use crate::application::services::access_count::AccessCountService;
use crate::domain::accesses::role::{Principal, Role};

/// Turn the still-valid invitations for an email into access rows once a
/// user with that email exists. Existing grants are only ever raised.
pub struct ConvertInvitations<'a, D, A, I, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    I: InvitationRepository + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub invitations: &'a I,
    pub cache: &'a K,
    /// `INVITATION_VALIDITY_DURATION`
    pub validity: Duration,
}

impl<'a, D, A, I, K> ConvertInvitations<'a, D, A, I, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    I: InvitationRepository + ?Sized,
    K: CachePort + ?Sized,
{
    /// Returns the number of invitations converted.
    pub async fn execute(&self, user_id: Uuid, email: &str) -> DocsResult<usize> {
        let email = email.trim().to_ascii_lowercase();
        let horizon = Utc::now() - self.validity;
        let pending = self
            .invitations
            .list_valid_for_email(&email, horizon)
            .await?;

        let principal = Principal::User(user_id);
        let mut converted = 0;
        for invitation in pending {
            let role = match self
                .accesses
                .get_for_principal(invitation.document_id, &principal)
                .await?
            {
                Some(existing) => Role::max_of([existing.role, invitation.role])
                    .unwrap_or(invitation.role),
                None => invitation.role,
            };
            self.accesses
                .update_or_create(invitation.document_id, &principal, role)
                .await?;
            self.invitations.delete(invitation.id).await?;
            converted += 1;

            if let Some(doc) = self.docs.get_by_id(invitation.document_id).await? {
                let counts = AccessCountService {
                    accesses: self.accesses,
                    cache: self.cache,
                    docs: self.docs,
                };
                counts
                    .invalidate_subtree(&doc.path)
                    .await
                    .map_err(DocsError::Internal)?;
            }
        }
        Ok(converted)
    }
}
