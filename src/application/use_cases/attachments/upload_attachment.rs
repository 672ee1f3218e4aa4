use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::{ObjectMeta, ObjectStatus, ObjectStorePort};
use crate::application::services::attachments::AttachmentKey;
use crate::domain::documents::document::DocumentUpdate;

#[derive(Debug)]
pub struct UploadedAttachment {
    pub key: String,
    pub is_unsafe: bool,
}

/// Store a new attachment under the document and pin its key onto the
/// attachment list. Unsafe MIME types are marked in the key and start in
/// `processing` until an external scanner clears them.
pub struct UploadAttachment<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
    pub ai: AiSettings,
    /// `DOCUMENT_IMAGE_MAX_SIZE`
    pub max_size: usize,
    /// `DOCUMENT_UNSAFE_MIME_TYPES`
    pub unsafe_mime_types: Vec<String>,
    /// `DOCUMENT_ATTACHMENT_CHECK_UNSAFE_MIME_TYPES_ENABLED`
    pub check_unsafe_mime_types: bool,
}

impl<'a, D, A, S> UploadAttachment<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        document_id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> DocsResult<UploadedAttachment> {
        let doc = self
            .docs
            .get_by_id(document_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &doc, self.ai).attachment_upload {
            return Err(DocsError::PermissionDenied(
                "you cannot upload attachments to this document".into(),
            ));
        }
        if bytes.len() > self.max_size {
            return Err(DocsError::Invariant(format!(
                "file exceeds the {} byte limit",
                self.max_size
            )));
        }

        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        let content_type = mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let is_unsafe = self.check_unsafe_mime_types
            && self
                .unsafe_mime_types
                .iter()
                .any(|m| m.eq_ignore_ascii_case(content_type));

        let key = AttachmentKey::generate(document_id, extension, is_unsafe).to_string();
        self.store
            .put(
                &key,
                bytes,
                &ObjectMeta {
                    checksum: None,
                    status: Some(if is_unsafe {
                        ObjectStatus::Processing
                    } else {
                        ObjectStatus::Ready
                    }),
                    owner: actor.user_id().map(|u| u.to_string()),
                    is_unsafe,
                    content_type: Some(content_type.to_string()),
                },
            )
            .await?;

        let mut attachments = doc.attachments.clone();
        attachments.push(key.clone());
        self.docs
            .update(
                document_id,
                DocumentUpdate {
                    attachments: Some(attachments),
                    ..Default::default()
                },
            )
            .await?;

        Ok(UploadedAttachment { key, is_unsafe })
    }
}
