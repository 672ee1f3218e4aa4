use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::link_trace_repository::LinkTraceRepository;
use crate::domain::abilities::Abilities;
use crate::domain::accesses::link::LinkDefinition;
use crate::domain::documents::document::Document;

#[derive(Debug)]
pub struct DocumentView {
    pub document: Document,
    pub abilities: Abilities,
    /// Equivalent (reach, role) of the ancestors' links, for serializers.
    pub ancestors_link: LinkDefinition,
}

pub struct GetDocument<'a, D, A, L>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    L: LinkTraceRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub link_traces: &'a L,
    pub ai: AiSettings,
}

impl<'a, D, A, L> GetDocument<'a, D, A, L>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    L: LinkTraceRepository + ?Sized,
{
    /// `cutoff` is now minus the retention window: soft-deletions older
    /// than that read as gone for everyone.
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> DocsResult<DocumentView> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        if doc.past_cutoff(cutoff) {
            return Err(DocsError::NotFound);
        }

        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }

        // First link-only view by a signed-in user: remember it so the
        // document shows up in their lists.
        if let Some(user_id) = actor.user_id() {
            if resolved.role.is_none() && resolved.link_grant.is_some() {
                self.link_traces.record(user_id, doc.id).await?;
            }
        }

        let abilities = access::abilities(&resolved, actor, &doc, self.ai);
        Ok(DocumentView {
            abilities,
            ancestors_link: resolved.ancestors_link,
            document: doc,
        })
    }
}
