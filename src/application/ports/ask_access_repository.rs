use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::accesses::role::Role;

/// A user's standing request for a role on a document. Unique on
/// (user, document); resolved by an owner or administrator.
#[derive(Debug, Clone)]
pub struct AskForAccess {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl AskForAccess {
    pub fn new(document_id: Uuid, user_id: Uuid, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            user_id,
            role,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AskForAccessRepository: Send + Sync {
    /// Returns false when the user already has a pending request.
    async fn create(&self, ask: &AskForAccess) -> anyhow::Result<bool>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<AskForAccess>>;

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<AskForAccess>>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
