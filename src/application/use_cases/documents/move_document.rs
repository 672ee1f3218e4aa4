use uuid::Uuid;

use crate::application::access::{self, Actor, AiSettings};
use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::document_repository::{DocumentRepository, MovePlan};
use crate::application::services::access_count::AccessCountService;
use crate::domain::accesses::role::Role;
use crate::domain::documents::document::Document;
use crate::domain::documents::path::plan_insertion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePosition {
    FirstChild,
    LastChild,
    FirstSibling,
    LastSibling,
    Left,
    Right,
}

impl MovePosition {
    fn is_child_position(self) -> bool {
        matches!(self, MovePosition::FirstChild | MovePosition::LastChild)
    }
}

/// Relocate a subtree. The caller must be privileged on the node, and on
/// the anchor: the target for child positions, the target's parent for
/// sibling positions. Moving a subtree to the root level preserves
/// ownership by copying the old root's owner grants when the node has
/// none of its own.
pub struct MoveDocument<'a, D, A, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    K: CachePort + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
    pub cache: &'a K,
    pub ai: AiSettings,
}

impl<'a, D, A, K> MoveDocument<'a, D, A, K>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    K: CachePort + ?Sized,
{
    pub async fn execute(
        &self,
        actor: &Actor,
        node_id: Uuid,
        target_id: Uuid,
        position: MovePosition,
    ) -> DocsResult<Document> {
        let node = self
            .docs
            .get_by_id(node_id)
            .await?
            .ok_or(DocsError::NotFound)?;
        let target = self
            .docs
            .get_by_id(target_id)
            .await?
            .ok_or(DocsError::NotFound)?;

        let resolved = access::resolve(self.docs, self.accesses, actor, &node).await?;
        if !access::can_retrieve(&resolved, &node) {
            return Err(DocsError::NotFound);
        }
        if !access::abilities(&resolved, actor, &node, self.ai).move_doc {
            return Err(DocsError::PermissionDenied(
                "you cannot move this document".into(),
            ));
        }

        if target.in_deleted_chain() {
            return Err(DocsError::Invariant(
                "cannot move below a deleted document".into(),
            ));
        }
        if node.id == target.id || node.path.is_ancestor_of(&target.path) {
            return Err(DocsError::Invariant(
                "cannot move a document inside its own subtree".into(),
            ));
        }

        // Privilege on the anchor: the future parent (child positions) or
        // the target's parent. Sibling moves at root level have no anchor;
        // being privileged on the node is then enough.
        let new_parent = if position.is_child_position() {
            Some(target.clone())
        } else {
            match target.path.parent() {
                Some(parent_path) => Some(
                    self.docs
                        .chain(&target.path)
                        .await?
                        .into_iter()
                        .find(|d| d.path == parent_path)
                        .ok_or_else(|| anyhow::anyhow!("missing parent for {}", target.id))?,
                ),
                None => None,
            }
        };
        if let Some(anchor) = new_parent.as_ref() {
            let anchor_resolved =
                access::resolve(self.docs, self.accesses, actor, anchor).await?;
            if !anchor_resolved.role.is_some_and(Role::is_privileged) {
                return Err(DocsError::PermissionDenied(
                    "you need to be administrator or owner at the destination".into(),
                ));
            }
        }

        let new_parent_path = new_parent.as_ref().map(|p| p.path.clone());
        let mut siblings = self.docs.child_paths(new_parent_path.as_ref()).await?;
        siblings.retain(|p| *p != node.path);
        let index = match position {
            MovePosition::FirstChild | MovePosition::FirstSibling => 0,
            MovePosition::LastChild | MovePosition::LastSibling => siblings.len(),
            MovePosition::Left | MovePosition::Right => {
                let at = siblings
                    .iter()
                    .position(|p| *p == target.path)
                    .ok_or_else(|| anyhow::anyhow!("target vanished from sibling list"))?;
                if position == MovePosition::Right { at + 1 } else { at }
            }
        };

        let (final_path, rewrites) =
            plan_insertion(&siblings, new_parent_path.as_ref(), index, &node.path)?;
        if rewrites.is_empty() {
            return Ok(node);
        }

        let old_parent_id = match node.path.parent() {
            Some(parent_path) => self
                .docs
                .chain(&node.path)
                .await?
                .into_iter()
                .find(|d| d.path == parent_path)
                .map(|d| d.id),
            None => None,
        };
        let old_root_id = self.old_root_id(&node).await?;

        self.docs
            .move_subtree(&MovePlan {
                node_id,
                rewrites,
                old_parent_id,
                new_parent_id: new_parent.as_ref().map(|p| p.id),
            })
            .await?;

        // A subtree promoted to root must not end up ownerless.
        if final_path.is_root() && self.accesses.owners_of(node_id).await?.is_empty() {
            if let Some(root_id) = old_root_id.filter(|rid| *rid != node_id) {
                for owner in self.accesses.owners_of(root_id).await? {
                    self.accesses
                        .update_or_create(node_id, &owner.principal, Role::Owner)
                        .await?;
                }
            }
        }

        let counts = AccessCountService {
            accesses: self.accesses,
            cache: self.cache,
            docs: self.docs,
        };
        counts
            .invalidate_subtree(&final_path)
            .await
            .map_err(DocsError::Internal)?;

        self.docs
            .get_by_id(node_id)
            .await?
            .ok_or(DocsError::NotFound)
    }

    async fn old_root_id(&self, node: &Document) -> DocsResult<Option<Uuid>> {
        if node.path.is_root() {
            return Ok(Some(node.id));
        }
        let chain = self.docs.chain(&node.path).await?;
        Ok(chain.first().map(|d| d.id))
    }
}
