use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Records that a user once reached a document through its link, so the
/// document shows up in their lists. Unique on (user, document).
#[derive(Debug, Clone)]
pub struct LinkTrace {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub is_masked: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait LinkTraceRepository: Send + Sync {
    /// Lazily creates the trace; returns false when it already existed.
    async fn record(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool>;

    async fn get(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<Option<LinkTrace>>;

    /// Upserts the trace and flips the mask flag; returns false when the
    /// flag was already in the requested state.
    async fn set_masked(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        masked: bool,
    ) -> anyhow::Result<bool>;

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<LinkTrace>>;
}
