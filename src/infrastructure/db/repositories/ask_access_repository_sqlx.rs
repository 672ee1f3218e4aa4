use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::application::ports::ask_access_repository::{AskForAccess, AskForAccessRepository};
use crate::domain::accesses::role::Role;
use crate::infrastructure::db::PgPool;

pub struct SqlxAskForAccessRepository {
    pub pool: PgPool,
}

impl SqlxAskForAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_ask(r: &PgRow) -> anyhow::Result<AskForAccess> {
    let role: String = r.get("role");
    Ok(AskForAccess {
        id: r.get("id"),
        document_id: r.get("document_id"),
        user_id: r.get("user_id"),
        role: role.parse::<Role>().map_err(anyhow::Error::msg)?,
        created_at: r.get("created_at"),
    })
}

#[async_trait]
impl AskForAccessRepository for SqlxAskForAccessRepository {
    async fn create(&self, ask: &AskForAccess) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "INSERT INTO ask_for_accesses (id, document_id, user_id, role, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, document_id) DO NOTHING",
        )
        .bind(ask.id)
        .bind(ask.document_id)
        .bind(ask.user_id)
        .bind(ask.role.as_str())
        .bind(ask.created_at)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<AskForAccess>> {
        let row = sqlx::query(
            "SELECT id, document_id, user_id, role, created_at
             FROM ask_for_accesses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_ask).transpose()
    }

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<AskForAccess>> {
        let rows = sqlx::query(
            "SELECT id, document_id, user_id, role, created_at
             FROM ask_for_accesses WHERE document_id = $1 ORDER BY created_at",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_ask).collect()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM ask_for_accesses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
