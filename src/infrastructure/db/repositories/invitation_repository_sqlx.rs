use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::application::ports::invitation_repository::{Invitation, InvitationRepository};
use crate::domain::accesses::role::Role;
use crate::infrastructure::db::PgPool;

pub struct SqlxInvitationRepository {
    pub pool: PgPool,
}

impl SqlxInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_invitation(r: &PgRow) -> anyhow::Result<Invitation> {
    let role: String = r.get("role");
    Ok(Invitation {
        id: r.get("id"),
        document_id: r.get("document_id"),
        email: r.get("email"),
        role: role.parse::<Role>().map_err(anyhow::Error::msg)?,
        issuer_id: r.try_get("issuer_id").ok(),
        created_at: r.get("created_at"),
    })
}

#[async_trait]
impl InvitationRepository for SqlxInvitationRepository {
    async fn create(&self, invitation: &Invitation) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO invitations (id, document_id, email, role, issuer_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(invitation.id)
        .bind(invitation.document_id)
        .bind(&invitation.email)
        .bind(invitation.role.as_str())
        .bind(invitation.issuer_id)
        .bind(invitation.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn exists_for_email(&self, document_id: Uuid, email: &str) -> anyhow::Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM invitations WHERE document_id = $1 AND LOWER(email) = LOWER($2)",
        )
        .bind(document_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<Invitation>> {
        let rows = sqlx::query(
            "SELECT id, document_id, email, role, issuer_id, created_at
             FROM invitations WHERE document_id = $1 ORDER BY created_at",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_invitation).collect()
    }

    async fn list_valid_for_email(
        &self,
        email: &str,
        issued_after: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Invitation>> {
        let rows = sqlx::query(
            "SELECT id, document_id, email, role, issuer_id, created_at
             FROM invitations
             WHERE LOWER(email) = LOWER($1) AND created_at > $2
             ORDER BY created_at",
        )
        .bind(email)
        .bind(issued_after)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_invitation).collect()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM invitations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
