use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::application::ports::link_trace_repository::{LinkTrace, LinkTraceRepository};
use crate::infrastructure::db::PgPool;

pub struct SqlxLinkTraceRepository {
    pub pool: PgPool,
}

impl SqlxLinkTraceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_trace(r: &PgRow) -> LinkTrace {
    LinkTrace {
        id: r.get("id"),
        user_id: r.get("user_id"),
        document_id: r.get("document_id"),
        is_masked: r.get("is_masked"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl LinkTraceRepository for SqlxLinkTraceRepository {
    async fn record(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "INSERT INTO link_traces (id, user_id, document_id, is_masked)
             VALUES ($1, $2, $3, FALSE)
             ON CONFLICT (user_id, document_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(document_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<Option<LinkTrace>> {
        let row = sqlx::query(
            "SELECT id, user_id, document_id, is_masked, created_at
             FROM link_traces WHERE user_id = $1 AND document_id = $2",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_trace))
    }

    async fn set_masked(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        masked: bool,
    ) -> anyhow::Result<bool> {
        let current = sqlx::query(
            "SELECT is_masked FROM link_traces WHERE user_id = $1 AND document_id = $2",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = &current {
            let is_masked: bool = row.get("is_masked");
            if is_masked == masked {
                return Ok(false);
            }
        }
        sqlx::query(
            "INSERT INTO link_traces (id, user_id, document_id, is_masked)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, document_id)
             DO UPDATE SET is_masked = EXCLUDED.is_masked",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(document_id)
        .bind(masked)
        .execute(&self.pool)
        .await?;
        Ok(true)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<LinkTrace>> {
        let rows = sqlx::query(
            "SELECT id, user_id, document_id, is_masked, created_at
             FROM link_traces WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_trace).collect())
    }
}
