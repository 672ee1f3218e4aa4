use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::object_store_port::{ObjectMeta, ObjectStorePort};
use crate::application::use_cases::documents::update_content::hex_digest;
use crate::domain::accesses::role::{Principal, Role};
use crate::domain::documents::document::{Document, DocumentInit};

/// Copy a document next to the original: content blob, attachment list
/// and `duplicated_from` are carried; the link policy resets to defaults.
pub struct DuplicateDocument<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub store: &'a S,
    pub ai: AiSettings,
}

impl<'a, D, A, S> DuplicateDocument<'a, D, A, S>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: ObjectStorePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        with_accesses: bool,
    ) -> DocsResult<Document> {
        let doc = self.docs.get_by_id(id).await?.ok_or(DocsError::NotFound)?;
        let resolved = access::resolve(self.docs, self.accesses, actor, &doc).await?;
        if !access::can_retrieve(&resolved, &doc) {
            return Err(DocsError::NotFound);
        }
        let abilities = access::abilities(&resolved, actor, &doc, self.ai);
        if !abilities.duplicate {
            return Err(match actor {
                Actor::Anonymous => DocsError::Unauthenticated,
                Actor::User { .. } => {
                    DocsError::PermissionDenied("you cannot duplicate this document".into())
                }
            });
        }

        let title = doc
            .title
            .as_deref()
            .map(|t| format!("Copy of {t}"))
            .or_else(|| Some("Copy".to_string()));
        let copy = self
            .docs
            .add_sibling(
                id,
                DocumentInit {
                    title,
                    excerpt: doc.excerpt.clone(),
                    creator_id: actor.user_id(),
                    duplicated_from: Some(id),
                    attachments: doc.attachments.clone(),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(bytes) = self.store.get(&doc.content_key(), None).await? {
            self.store
                .put(
                    &copy.content_key(),
                    &bytes,
                    &ObjectMeta {
                        checksum: Some(hex_digest(&bytes)),
                        ..Default::default()
                    },
                )
                .await?;
        }

        // Privileged callers may carry the grant rows over; everyone else
        // gets an owner grant when the chain gives them nothing on the
        // copy (a duplicate must not be unreachable to its creator).
        if with_accesses && resolved.role.is_some_and(Role::is_privileged) {
            for row in self.accesses.list_for_document(id).await? {
                self.accesses
                    .update_or_create(copy.id, &row.principal, row.role)
                    .await?;
            }
        }
        if let Some(user_id) = actor.user_id() {
            let on_copy = access::resolve(self.docs, self.accesses, actor, &copy).await?;
            if on_copy.role.is_none() {
                self.accesses
                    .update_or_create(copy.id, &Principal::User(user_id), Role::Owner)
                    .await?;
            }
        }

        Ok(copy)
    }
}
