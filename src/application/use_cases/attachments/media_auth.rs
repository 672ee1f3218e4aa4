use std::time::Duration;

use crate::application::access::Actor;
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::{ObjectStorePort, PresignedRequest};
use crate::application::services::attachments::{AttachmentGate, AttachmentKey};

const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Authorize a media read: the caller must reach the key through some
/// document listing it, and the object must be past its safety pipeline.
/// Returns the signed request the gate relays to the caller.
pub struct MediaAuth<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
}

impl<'a, D, A, S> MediaAuth<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(&self, actor: &Actor, key: &str) -> DocsResult<PresignedRequest> {
        // Reject anything that is not a well-formed attachment key before
        // touching storage.
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
        if !meta.is_ready() {
            return Err(DocsError::NotFound);
        }

        Ok(self.store.presign_get(key, PRESIGN_EXPIRY).await?)
    }
}
