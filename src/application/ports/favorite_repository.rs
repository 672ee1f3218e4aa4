use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Returns false when the pair already existed.
    async fn add(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool>;

    /// Returns false when there was nothing to remove.
    async fn remove(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool>;

    async fn is_favorite(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool>;

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
}
