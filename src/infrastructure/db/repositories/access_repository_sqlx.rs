use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::application::ports::access_repository::AccessRepository;
use crate::domain::accesses::access::{ChainAccess, DocumentAccess};
use crate::domain::accesses::role::{Principal, Role};
use crate::domain::documents::path::TreePath;
use crate::infrastructure::db::PgPool;

pub struct SqlxAccessRepository {
    pub pool: PgPool,
}

impl SqlxAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_access(r: &PgRow) -> anyhow::Result<DocumentAccess> {
    let role: String = r.get("role");
    let user_id: Option<Uuid> = r.try_get("user_id").ok();
    let team: String = r.get("team");
    let principal = match user_id {
        Some(id) => Principal::User(id),
        None => Principal::Team(team),
    };
    Ok(DocumentAccess {
        id: r.get("id"),
        document_id: r.get("document_id"),
        principal,
        role: role.parse::<Role>().map_err(anyhow::Error::msg)?,
        created_at: r.get("created_at"),
    })
}

/// Prefixes of `path` at step width, the path itself included; the chain
/// query matches on them directly instead of walking parents.
fn chain_paths(path: &TreePath) -> Vec<String> {
    let mut out: Vec<String> = path
        .ancestors()
        .into_iter()
        .map(|p| p.as_str().to_string())
        .collect();
    out.push(path.as_str().to_string());
    out
}

#[async_trait]
impl AccessRepository for SqlxAccessRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<DocumentAccess>> {
        let row = sqlx::query(
            "SELECT id, document_id, user_id, team, role, created_at
             FROM document_accesses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_access).transpose()
    }

    async fn list_for_document(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentAccess>> {
        let rows = sqlx::query(
            "SELECT id, document_id, user_id, team, role, created_at
             FROM document_accesses WHERE document_id = $1
             ORDER BY created_at",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_access).collect()
    }

    async fn accesses_on_chain(
        &self,
        path: &TreePath,
        user_id: Uuid,
        teams: &[String],
    ) -> anyhow::Result<Vec<ChainAccess>> {
        let rows = sqlx::query(
            "SELECT a.id, a.document_id, a.user_id, a.team, a.role, a.created_at, d.path
             FROM document_accesses a
             JOIN documents d ON d.id = a.document_id
             WHERE d.path = ANY($1)
               AND (d.path = $2 OR d.ancestors_deleted_at IS NULL)
               AND (a.user_id = $3 OR a.team = ANY($4))",
        )
        .bind(chain_paths(path))
        .bind(path.as_str())
        .bind(user_id)
        .bind(teams)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                let p: String = r.get("path");
                Ok(ChainAccess {
                    access: row_to_access(r)?,
                    document_path: TreePath::parse(&p).map_err(anyhow::Error::msg)?,
                })
            })
            .collect()
    }

    async fn chain_accesses_for_principal(
        &self,
        path: &TreePath,
        principal: &Principal,
    ) -> anyhow::Result<Vec<ChainAccess>> {
        let rows = sqlx::query(
            "SELECT a.id, a.document_id, a.user_id, a.team, a.role, a.created_at, d.path
             FROM document_accesses a
             JOIN documents d ON d.id = a.document_id
             WHERE d.path = ANY($1)
               AND (d.path = $2 OR d.ancestors_deleted_at IS NULL)
               AND ((a.user_id IS NOT NULL AND a.user_id = $3) OR (a.team <> '' AND a.team = $4))",
        )
        .bind(chain_paths(path))
        .bind(path.as_str())
        .bind(principal.user_id())
        .bind(principal.team().unwrap_or(""))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                let p: String = r.get("path");
                Ok(ChainAccess {
                    access: row_to_access(r)?,
                    document_path: TreePath::parse(&p).map_err(anyhow::Error::msg)?,
                })
            })
            .collect()
    }

    async fn create(&self, access: &DocumentAccess) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO document_accesses (id, document_id, user_id, team, role, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(access.id)
        .bind(access.document_id)
        .bind(access.principal.user_id())
        .bind(access.principal.team().unwrap_or(""))
        .bind(access.role.as_str())
        .bind(access.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> anyhow::Result<Option<DocumentAccess>> {
        let row = sqlx::query(
            "UPDATE document_accesses SET role = $2 WHERE id = $1
             RETURNING id, document_id, user_id, team, role, created_at",
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_access).transpose()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM document_accesses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_or_create(
        &self,
        document_id: Uuid,
        principal: &Principal,
        role: Role,
    ) -> anyhow::Result<DocumentAccess> {
        // Two partial unique indexes stand in for one composite key, so
        // the upsert targets the matching one per principal kind.
        let row = match principal {
            Principal::User(user_id) => {
                sqlx::query(
                    "INSERT INTO document_accesses (id, document_id, user_id, team, role)
                     VALUES ($1, $2, $3, '', $4)
                     ON CONFLICT (document_id, user_id) WHERE user_id IS NOT NULL
                     DO UPDATE SET role = EXCLUDED.role
                     RETURNING id, document_id, user_id, team, role, created_at",
                )
                .bind(Uuid::new_v4())
                .bind(document_id)
                .bind(user_id)
                .bind(role.as_str())
                .fetch_one(&self.pool)
                .await?
            }
            Principal::Team(team) => {
                sqlx::query(
                    "INSERT INTO document_accesses (id, document_id, user_id, team, role)
                     VALUES ($1, $2, NULL, $3, $4)
                     ON CONFLICT (document_id, team) WHERE team <> ''
                     DO UPDATE SET role = EXCLUDED.role
                     RETURNING id, document_id, user_id, team, role, created_at",
                )
                .bind(Uuid::new_v4())
                .bind(document_id)
                .bind(team)
                .bind(role.as_str())
                .fetch_one(&self.pool)
                .await?
            }
        };
        row_to_access(&row)
    }

    async fn get_for_principal(
        &self,
        document_id: Uuid,
        principal: &Principal,
    ) -> anyhow::Result<Option<DocumentAccess>> {
        let row = sqlx::query(
            "SELECT id, document_id, user_id, team, role, created_at
             FROM document_accesses
             WHERE document_id = $1
               AND ((user_id IS NOT NULL AND user_id = $2) OR (team <> '' AND team = $3))",
        )
        .bind(document_id)
        .bind(principal.user_id())
        .bind(principal.team().unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_access).transpose()
    }

    async fn count_direct(&self, document_id: Uuid) -> anyhow::Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*)::BIGINT AS n FROM document_accesses WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    async fn count_chain(&self, path: &TreePath) -> anyhow::Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*)::BIGINT AS n
             FROM document_accesses a
             JOIN documents d ON d.id = a.document_id
             WHERE d.path = ANY($1)
               AND (d.path = $2 OR d.ancestors_deleted_at IS NULL)",
        )
        .bind(chain_paths(path))
        .bind(path.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    async fn owners_of(&self, document_id: Uuid) -> anyhow::Result<Vec<DocumentAccess>> {
        let rows = sqlx::query(
            "SELECT id, document_id, user_id, team, role, created_at
             FROM document_accesses WHERE document_id = $1 AND role = 'owner'",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_access).collect()
    }
}
