use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::accesses::role::Role;

/// Pending grant addressed by email, converted into a DocumentAccess when
/// a matching user materializes.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub id: Uuid,
    pub document_id: Uuid,
    pub email: String,
    pub role: Role,
    pub issuer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(document_id: Uuid, email: String, role: Role, issuer_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            email,
            role,
            issuer_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, validity: Duration, now: DateTime<Utc>) -> bool {
        self.created_at + validity <= now
    }
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, invitation: &Invitation) -> anyhow::Result<()>;

    async fn exists_for_email(&self, document_id: Uuid, email: &str) -> anyhow::Result<bool>;

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<Invitation>>;

    /// Invitations for `email` issued at or after `issued_after` (the
    /// validity horizon).
    async fn list_valid_for_email(
        &self,
        email: &str,
        issued_after: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Invitation>>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
