use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::{ObjectStorePort, VersionPage};

pub const MAX_VERSIONS_PAGE_SIZE: i32 = 50;

/// Page through a document's content history. A version is visible only
/// from the moment the caller first held an access on the chain, and the
/// live version never appears in the history.
pub struct ListVersions<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
    pub ai: AiSettings,
    /// `DOCUMENT_VERSIONS_PAGE_SIZE`
    pub default_page_size: i32,
}

impl<'a, D, A, S> ListVersions<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        page_size: Option<i32>,
        marker: Option<&str>,
    ) -> DocsResult<VersionPage> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).versions_list {
            return Err(DocsError::PermissionDenied(
                "you cannot list this document's versions".into(),
            ));
        }
        let floor = resolved
            .earliest_access
            .ok_or_else(|| DocsError::PermissionDenied("no dated access on this chain".into()))?;

        let size = page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_VERSIONS_PAGE_SIZE);
        let mut page = self
            .store
            .list_versions(&doc.content_key(), size, marker)
            .await?;
        page.versions
            .retain(|v| !v.is_latest && v.last_modified >= floor);
        Ok(page)
    }
}
