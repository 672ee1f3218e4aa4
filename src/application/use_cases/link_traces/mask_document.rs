use uuid::Uuid;

use crate::application::access::{self, Actor};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::link_trace_repository::LinkTraceRepository;

pub struct MaskOutcome {
    /// False when the mask flag was already in the requested state.
    pub changed: bool,
}

/// Hide (or unhide) a link-reached document from the caller's lists by
/// flipping the mask flag on their link trace. Idempotent.
pub struct MaskDocument<'a, D, A, L>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    L: LinkTraceRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub link_traces: &'a L,
}

impl<'a, D, A, L> MaskDocument<'a, D, A, L>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    L: LinkTraceRepository + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        document_id: Uuid,
        masked: bool,
    ) -> DocsResult<MaskOutcome> {
        let Some(user_id) = actor.user_id() else {
            return Err(DocsError::Unauthenticated);
        };
        let doc = self
            .docs
            .get_by_id(document_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        let changed = self
            .link_traces
            .set_masked(user_id, document_id, masked)
            .await?;
        Ok(MaskOutcome { changed })
    }
}
