use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::invitation_repository::{Invitation, InvitationRepository};
use crate::domain::accesses::role::Role;

/// Invite an email address onto a document with a role. The invitation
/// converts into a real access when the user materializes; sending the
/// email itself happens outside the engine.
pub struct CreateInvitation<'a, D, A, I>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    I: InvitationRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub invitations: &'a I,
    pub ai: AiSettings,
}

impl<'a, D, A, I> CreateInvitation<'a, D, A, I>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    I: InvitationRepository + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        document_id: Uuid,
        email: &str,
        role: Role,
    ) -> DocsResult<Invitation> {
        let doc = self
            .docs
            .get_by_id(document_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        let abilities = access::abilities(&resolved, actor, &doc, self.ai);
        if !abilities.accesses_manage {
            return Err(DocsError::PermissionDenied(
                "only administrators and owners can invite".into(),
            ));
        }
        if role == Role::Owner && !abilities.invite_owner {
            return Err(DocsError::PermissionDenied(
                "only owners can invite an owner".into(),
            ));
        }

        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DocsError::Invariant("invalid email address".into()));
        }
        if self
            .invitations
            .exists_for_email(document_id, &email)
            .await?
        {
            return Err(DocsError::Conflict(format!(
                "{email} is already invited to this document"
            )));
        }

        let invitation = Invitation::new(document_id, email, role, actor.user_id());
        self.invitations.create(&invitation).await?;
        Ok(invitation)
    }
}
