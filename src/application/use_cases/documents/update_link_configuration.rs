use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::link::{LinkReach, LinkRole};
use crate::domain::documents::document::{Document, DocumentUpdate};

/// Change a document's link policy within what its ancestors still allow,
/// then ask the collaboration server to re-evaluate open connections.
pub struct UpdateLinkConfiguration<'a, D, A, C>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub collaboration: &'a C,
    pub ai: AiSettings,
}

impl<'a, D, A, C> UpdateLinkConfiguration<'a, D, A, C>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    C: CollaborationPort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        reach: LinkReach,
        role: LinkRole,
    ) -> DocsResult<Document> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        let abilities = access::abilities(&resolved, actor, &doc, self.ai);
        if !abilities.link_configuration {
            return Err(DocsError::PermissionDenied(
                "only administrators and owners can configure the link".into(),
            ));
        }
        if !access::link_change_allowed(&resolved, reach, role) {
            return Err(DocsError::Invariant(format!(
                "link {reach}/{role} would regress what ancestors already grant"
            )));
        }

        let updated = self
            .docs
            .update(
                id,
                DocumentUpdate {
                    link_reach: Some(reach),
                    link_role: Some(role),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(DocsError::NotFound)?;

        if let Err(err) = self
            .collaboration
            .reset_connections(&id.to_string(), None)
            .await
        {
            tracing::warn!(document = %id, error = %err, "collaboration reset failed after link change");
        }
        Ok(updated)
    }
}
