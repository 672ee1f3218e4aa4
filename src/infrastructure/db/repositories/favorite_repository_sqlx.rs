use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::favorite_repository::FavoriteRepository;
use crate::infrastructure::db::PgPool;

pub struct SqlxFavoriteRepository {
    pub pool: PgPool,
}

impl SqlxFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for SqlxFavoriteRepository {
    async fn add(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "INSERT INTO document_favorites (id, user_id, document_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, document_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(document_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn remove(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let res =
            sqlx::query("DELETE FROM document_favorites WHERE user_id = $1 AND document_id = $2")
                .bind(user_id)
                .bind(document_id)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn is_favorite(&self, user_id: Uuid, document_id: Uuid) -> anyhow::Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM document_favorites WHERE user_id = $1 AND document_id = $2",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT document_id FROM document_favorites WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("document_id")).collect())
    }
}
