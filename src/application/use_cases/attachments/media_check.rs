use crate::application::access::Actor;
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::ObjectStorePort;
use crate::application::services::attachments::{AttachmentGate, AttachmentKey};

pub struct MediaStatus {
    /// "ready" or "processing".
    pub status: &'static str,
    pub file_unsafe: bool,
}

/// Report whether an attachment has cleared its safety pipeline.
pub struct MediaCheck<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
}

impl<'a, D, A, S> MediaCheck<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, key: &str) -> DocsResult<MediaStatus> {
        key.parse::<AttachmentKey>()
            .map_err(|_| DocsError::NotFound)?;

        let gate = AttachmentGate {
            docs: self.docs,
            accesses: self.accesses,
        };
        if !gate.can_read_key(actor, key).await? {
            return Err(DocsError::NotFound);
        }

        let meta = self.store.head(key).await?.ok_or(DocsError::NotFound)?;
        Ok(MediaStatus {
            status: if meta.is_ready() { "ready" } else { "processing" },
            file_unsafe: meta.is_unsafe,
        })
    }
}
