use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::accesses::access::{ChainAccess, DocumentAccess};
use crate::domain::accesses::role::{Principal, Role};
use crate::domain::documents::path::TreePath;

#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<DocumentAccess>>;

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentAccess>>;

    /// Rows held by the caller (user id or one of their teams) on the
    /// document or any of its ancestors, the document itself always
    /// included, ancestors restricted to live chains. The query matches by
    /// path prefix, never by recursive traversal.
    async fn accesses_on_chain(
        &self,
        path: &TreePath,
        user_id: Uuid,
        teams: &[String],
    ) -> anyhow::Result<Vec<ChainAccess>>;

    /// Rows held by one principal on the document or any live ancestor;
    /// used for the role-override rule and ownership checks.
    async fn chain_accesses_for_principal(
        &self,
        path: &TreePath,
        principal: &Principal,
    ) -> anyhow::Result<Vec<ChainAccess>>;

    async fn create(&self, access: &DocumentAccess) -> anyhow::Result<()>;

    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<Option<DocumentAccess>>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Idempotent grant keyed by (document, principal); an existing row is
    /// raised (or lowered) to `role`.
    async fn update_or_create(
        &self,
        document_id: Uuid,
        principal: &Principal,
        role: Role,
    ) -> anyhow::Result<DocumentAccess>;

    async fn get_for_principal(
        &self,
        document_id: Uuid,
        principal: &Principal,
    ) -> anyhow::Result<Option<DocumentAccess>>;

    /// Grant rows on the exact document.
    async fn count_direct(&self, document_id: Uuid) -> anyhow::Result<i64>;

    /// Grant rows on the document or any ancestor not inside a deleted
    /// chain (path-prefix match).
    async fn count_chain(&self, path: &TreePath) -> anyhow::Result<i64>;

    async fn owners_of(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentAccess>>;
}
