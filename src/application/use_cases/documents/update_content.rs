use std::collections::BTreeSet;
use std::time::Duration;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::{ObjectMeta, ObjectStorePort};
use crate::application::services::attachments::{AttachmentGate, extract_media_keys};
use crate::application::services::edit_arbiter::EditArbiter;
use crate::domain::documents::document::DocumentUpdate;

pub struct UpdateContentOutcome {
    /// False when the digest matched and no new blob version was written.
    pub stored: bool,
    /// Keys newly pinned onto the document's attachment list.
    pub attachments_added: Vec<String>,
}

/// Persist a new content blob: single-writer arbitration, attachment
/// reachability pinning, then a checksum-gated write.
pub struct UpdateContent<'a, D, A, S, C, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
    pub collaboration: &'a C,
    pub cache: &'a K,
    pub ai: AiSettings,
    /// `COLLABORATION_WS_NOT_CONNECTED_READY_ONLY`
    pub ws_ready_only: bool,
    /// `NO_WEBSOCKET_CACHE_TIMEOUT`
    pub lock_ttl: Duration,
}

impl<'a, D, A, S, C, K> UpdateContent<'a, D, A, S, C, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    /// `rendered_xml` is the caller-rendered view of `content` used for
    /// media reference extraction; the blob itself stays opaque.
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        content: &[u8],
        rendered_xml: &str,
        session_key: &str,
        websocket_declared: bool,
    ) -> DocsResult<UpdateContentOutcome> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        let abilities = access::abilities(&resolved, actor, &doc, self.ai);
        if !abilities.partial_update {
            return Err(DocsError::PermissionDenied(
                "you cannot edit this document".into(),
            ));
        }

        if self.ws_ready_only {
            let arbiter = EditArbiter {
                collaboration: self.collaboration,
                cache: self.cache,
                lock_ttl: self.lock_ttl,
            };
            arbiter.check(id, session_key, websocket_declared).await?;
        }

        // Pin newly referenced attachment keys the editor can read
        // through some other document.
        let referenced = extract_media_keys(rendered_xml);
        let known: BTreeSet<String> = doc.attachments.iter().cloned().collect();
        let new_keys: BTreeSet<String> = referenced.difference(&known).cloned().collect();
        let mut attachments_added = Vec::new();
        if !new_keys.is_empty() {
            let gate = AttachmentGate {
                docs: self.docs,
                accesses: self.accesses,
            };
            let admitted = gate.readable_keys(actor, &new_keys).await?;
            if !admitted.is_empty() {
                let mut attachments = doc.attachments.clone();
                for key in admitted {
                    attachments.push(key.clone());
                    attachments_added.push(key);
                }
                self.docs
                    .update(
                        id,
                        DocumentUpdate {
                            attachments: Some(attachments),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }

        // Skip the write when the stored blob already carries this digest.
        let digest = hex_digest(content);
        let key = doc.content_key();
        let current = self.store.head(&key).await?;
        if current
            .as_ref()
            .and_then(|meta| meta.checksum.as_deref())
            == Some(digest.as_str())
        {
            return Ok(UpdateContentOutcome {
                stored: false,
                attachments_added,
            });
        }
        self.store
            .put(
                &key,
                content,
                &ObjectMeta {
                    checksum: Some(digest),
                    ..Default::default()
                },
            )
            .await?;

        Ok(UpdateContentOutcome {
            stored: true,
            attachments_added,
        })
    }
}

pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{b:02x}")).collect()
}
