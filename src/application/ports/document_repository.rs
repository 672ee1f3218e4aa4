use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::documents::document::{Document, DocumentInit, DocumentUpdate};
use crate::domain::documents::path::{PathRewrite, TreePath};

/// A planned subtree relocation. `rewrites` are applied in order inside a
/// single transaction; the last rewrite lands the moving node on its final
/// path. Parent ids drive numchild bookkeeping (the moving node is live).
#[derive(Debug, Clone)]
pub struct MovePlan {
    pub node_id: Uuid,
    pub rewrites: Vec<PathRewrite>,
    pub old_parent_id: Option<Uuid>,
    pub new_parent_id: Option<Uuid>,
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Document>>;

    /// The node and all its ancestors, shortest path first.
    async fn chain(&self, path: &TreePath) -> anyhow::Result<Vec<Document>>;

    /// Live children in sibling order.
    async fn children(&self, path: &TreePath) -> anyhow::Result<Vec<Document>>;

    /// Paths of every child (soft-deleted included) in sibling order;
    /// `None` lists root paths. Deleted children still occupy their step.
    async fn child_paths(&self, parent: Option<&TreePath>) -> anyhow::Result<Vec<TreePath>>;

    /// Live strict descendants in path order.
    async fn descendants(&self, path: &TreePath) -> anyhow::Result<Vec<Document>>;

    /// Ids of the node and every descendant, live or not.
    async fn subtree_ids(&self, path: &TreePath) -> anyhow::Result<Vec<Uuid>>;

    /// Root documents of trashed subtrees deleted at or after `cutoff`.
    async fn deleted_subtree_roots(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<Document>>;

    async fn create_root(&self, init: DocumentInit) -> anyhow::Result<Document>;

    /// Creates a child at the next free sibling step; increments the
    /// parent's numchild; inherits the parent's `ancestors_deleted_at`.
    async fn add_child(&self, parent_id: Uuid, init: DocumentInit) -> anyhow::Result<Document>;

    /// Creates a sibling immediately after `node_id`, shifting later
    /// siblings when the step is taken.
    async fn add_sibling(&self, node_id: Uuid, init: DocumentInit) -> anyhow::Result<Document>;

    async fn update(&self, id: Uuid, update: DocumentUpdate) -> anyhow::Result<Option<Document>>;

    async fn move_subtree(&self, plan: &MovePlan) -> anyhow::Result<()>;

    /// Stamps the node, propagates `ancestors_deleted_at` to descendants
    /// that have none, and maintains the parent's bookkeeping.
    async fn soft_delete_subtree(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<()>;

    /// Clears the node's stamp, realigns descendants whose
    /// `ancestors_deleted_at >= prior_deleted_at` to the new value, and
    /// re-increments the parent's numchild.
    async fn restore_subtree(
        &self,
        id: Uuid,
        prior_deleted_at: DateTime<Utc>,
        new_ancestors_deleted_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()>;

    /// Documents whose attachment list contains `key`.
    async fn documents_with_attachment(&self, key: &str) -> anyhow::Result<Vec<Document>>;
}
