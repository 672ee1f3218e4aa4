use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::application::ports::document_repository::{DocumentRepository, MovePlan};
use crate::domain::accesses::link::{LinkReach, LinkRole};
use crate::domain::documents::document::{Document, DocumentInit, DocumentUpdate};
use crate::domain::documents::path::{STEP_LEN, TreePath};
use crate::infrastructure::db::PgPool;

const DOC_COLUMNS: &str = "id, title, excerpt, link_reach, link_role, creator_id, deleted_at, \
     ancestors_deleted_at, has_deleted_children, duplicated_from, attachments, path, depth, \
     numchild, created_at, updated_at";

pub struct SqlxDocumentRepository {
    pub pool: PgPool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_document(r: &PgRow) -> anyhow::Result<Document> {
    let path: String = r.get("path");
    let link_reach: String = r.get("link_reach");
    let link_role: String = r.get("link_role");
    let attachments: serde_json::Value = r.get("attachments");
    Ok(Document {
        id: r.get("id"),
        title: r.try_get("title").ok(),
        excerpt: r.try_get("excerpt").ok(),
        link_reach: link_reach
            .parse::<LinkReach>()
            .map_err(anyhow::Error::msg)?,
        link_role: link_role.parse::<LinkRole>().map_err(anyhow::Error::msg)?,
        creator_id: r.try_get("creator_id").ok(),
        deleted_at: r.try_get("deleted_at").ok(),
        ancestors_deleted_at: r.try_get("ancestors_deleted_at").ok(),
        has_deleted_children: r.get("has_deleted_children"),
        duplicated_from: r.try_get("duplicated_from").ok(),
        attachments: serde_json::from_value(attachments).unwrap_or_default(),
        path: TreePath::parse(&path).map_err(anyhow::Error::msg)?,
        depth: r.get("depth"),
        numchild: r.get("numchild"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

/// Insert a node at `path`. Callers hold the table lock and have already
/// decided the parent bookkeeping.
async fn insert_document(
    tx: &mut Transaction<'_, Postgres>,
    init: &DocumentInit,
    path: &TreePath,
    ancestors_deleted_at: Option<DateTime<Utc>>,
) -> anyhow::Result<Document> {
    let id = init.id.unwrap_or_else(Uuid::new_v4);
    let row = sqlx::query(&format!(
        r#"INSERT INTO documents
               (id, title, excerpt, link_reach, link_role, creator_id, deleted_at,
                ancestors_deleted_at, has_deleted_children, duplicated_from, attachments,
                path, depth, numchild)
           VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, FALSE, $8, $9, $10, $11, 0)
           RETURNING {DOC_COLUMNS}"#
    ))
    .bind(id)
    .bind(&init.title)
    .bind(&init.excerpt)
    .bind(init.link_reach.unwrap_or(LinkReach::Restricted).as_str())
    .bind(init.link_role.unwrap_or(LinkRole::Reader).as_str())
    .bind(init.creator_id)
    .bind(ancestors_deleted_at)
    .bind(init.duplicated_from)
    .bind(serde_json::to_value(&init.attachments)?)
    .bind(path.as_str())
    .bind(path.depth() as i32)
    .fetch_one(&mut **tx)
    .await?;
    row_to_document(&row)
}

/// Sibling-path allocation races with concurrent inserts; the share row
/// exclusive lock serializes writers while readers stay unblocked.
async fn lock_tree(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    sqlx::query("LOCK TABLE documents IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn last_child_path(
    tx: &mut Transaction<'_, Postgres>,
    parent: Option<&TreePath>,
) -> anyhow::Result<Option<TreePath>> {
    let row = match parent {
        Some(p) => {
            sqlx::query(
                "SELECT path FROM documents
                 WHERE path LIKE $1 || '%' AND LENGTH(path) = $2
                 ORDER BY path DESC LIMIT 1",
            )
            .bind(p.as_str())
            .bind((p.as_str().len() + STEP_LEN) as i32)
            .fetch_optional(&mut **tx)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT path FROM documents WHERE LENGTH(path) = $1
                 ORDER BY path DESC LIMIT 1",
            )
            .bind(STEP_LEN as i32)
            .fetch_optional(&mut **tx)
            .await?
        }
    };
    row.map(|r| {
        let p: String = r.get("path");
        TreePath::parse(&p).map_err(anyhow::Error::msg)
    })
    .transpose()
}

/// Rewrite one subtree prefix: path via overlay, depth by delta.
async fn apply_rewrite(
    tx: &mut Transaction<'_, Postgres>,
    old_prefix: &TreePath,
    new_prefix: &TreePath,
    depth_delta: i32,
) -> anyhow::Result<u64> {
    let res = sqlx::query(
        "UPDATE documents
         SET path = $2 || SUBSTR(path, $3),
             depth = depth + $4,
             updated_at = now()
         WHERE path LIKE $1 || '%'",
    )
    .bind(old_prefix.as_str())
    .bind(new_prefix.as_str())
    .bind((old_prefix.as_str().len() + 1) as i32)
    .bind(depth_delta)
    .execute(&mut **tx)
    .await?;
    Ok(res.rows_affected())
}

async fn refresh_has_deleted_children(
    tx: &mut Transaction<'_, Postgres>,
    parent_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE documents p
         SET has_deleted_children = EXISTS (
             SELECT 1 FROM documents c
             WHERE c.path LIKE p.path || '%'
               AND LENGTH(c.path) = LENGTH(p.path) + $2
               AND c.deleted_at IS NOT NULL
         )
         WHERE p.id = $1",
    )
    .bind(parent_id)
    .bind(STEP_LEN as i32)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(&format!("SELECT {DOC_COLUMNS} FROM documents WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn chain(&self, path: &TreePath) -> anyhow::Result<Vec<Document>> {
        // The chain of a path is every strict prefix of step width plus
        // the node itself; prefix matching stays on the C-collated index.
        let row_paths: Vec<String> = {
            let mut prefixes: Vec<String> = path
                .ancestors()
                .into_iter()
                .map(|p| p.as_str().to_string())
                .collect();
            prefixes.push(path.as_str().to_string());
            prefixes
        };
        let rows = sqlx::query(&format!(
            "SELECT {DOC_COLUMNS} FROM documents WHERE path = ANY($1) ORDER BY path"
        ))
        .bind(&row_paths)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn children(&self, path: &TreePath) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOC_COLUMNS} FROM documents
             WHERE path LIKE $1 || '%' AND LENGTH(path) = $2 AND deleted_at IS NULL
               AND ancestors_deleted_at IS NULL
             ORDER BY path"
        ))
        .bind(path.as_str())
        .bind((path.as_str().len() + STEP_LEN) as i32)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn child_paths(&self, parent: Option<&TreePath>) -> anyhow::Result<Vec<TreePath>> {
        let rows = match parent {
            Some(p) => {
                sqlx::query(
                    "SELECT path FROM documents
                     WHERE path LIKE $1 || '%' AND LENGTH(path) = $2
                     ORDER BY path",
                )
                .bind(p.as_str())
                .bind((p.as_str().len() + STEP_LEN) as i32)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT path FROM documents WHERE LENGTH(path) = $1 ORDER BY path",
                )
                .bind(STEP_LEN as i32)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter()
            .map(|r| {
                let p: String = r.get("path");
                TreePath::parse(&p).map_err(anyhow::Error::msg)
            })
            .collect()
    }

    async fn descendants(&self, path: &TreePath) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOC_COLUMNS} FROM documents
             WHERE path LIKE $1 || '%' AND LENGTH(path) > $2
               AND deleted_at IS NULL AND ancestors_deleted_at IS NULL
             ORDER BY path"
        ))
        .bind(path.as_str())
        .bind(path.as_str().len() as i32)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn subtree_ids(&self, path: &TreePath) -> anyhow::Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM documents WHERE path LIKE $1 || '%'")
            .bind(path.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }

    async fn deleted_subtree_roots(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOC_COLUMNS} FROM documents
             WHERE deleted_at IS NOT NULL AND deleted_at = ancestors_deleted_at
               AND deleted_at >= $1
             ORDER BY deleted_at DESC"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn create_root(&self, init: DocumentInit) -> anyhow::Result<Document> {
        let mut tx = self.pool.begin().await?;
        lock_tree(&mut tx).await?;
        let last = last_child_path(&mut tx, None).await?;
        let path = match last {
            Some(p) => p.next_sibling().map_err(anyhow::Error::msg)?,
            None => TreePath::for_insertion(None, 0).map_err(anyhow::Error::msg)?,
        };
        let doc = insert_document(&mut tx, &init, &path, None).await?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn add_child(&self, parent_id: Uuid, init: DocumentInit) -> anyhow::Result<Document> {
        let mut tx = self.pool.begin().await?;
        lock_tree(&mut tx).await?;
        let parent = sqlx::query(&format!(
            "SELECT {DOC_COLUMNS} FROM documents WHERE id = $1 FOR UPDATE"
        ))
        .bind(parent_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| anyhow::anyhow!("parent {parent_id} not found"))?;
        let parent = row_to_document(&parent)?;

        let last = last_child_path(&mut tx, Some(&parent.path)).await?;
        let path = match last {
            Some(p) => p.next_sibling().map_err(anyhow::Error::msg)?,
            None => parent.path.child(0).map_err(anyhow::Error::msg)?,
        };
        let doc = insert_document(&mut tx, &init, &path, parent.ancestors_deleted_at).await?;
        sqlx::query("UPDATE documents SET numchild = numchild + 1 WHERE id = $1")
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn add_sibling(&self, node_id: Uuid, init: DocumentInit) -> anyhow::Result<Document> {
        use crate::domain::documents::path::plan_insertion;

        let mut tx = self.pool.begin().await?;
        lock_tree(&mut tx).await?;
        let node = sqlx::query("SELECT path, ancestors_deleted_at FROM documents WHERE id = $1")
            .bind(node_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {node_id} not found"))?;
        let node_path: String = node.get("path");
        let node_path = TreePath::parse(&node_path).map_err(anyhow::Error::msg)?;
        let ancestors_deleted_at: Option<DateTime<Utc>> = node.try_get("ancestors_deleted_at").ok();
        let parent = node_path.parent();

        let sib_rows = match parent.as_ref() {
            Some(p) => {
                sqlx::query(
                    "SELECT path FROM documents
                     WHERE path LIKE $1 || '%' AND LENGTH(path) = $2 ORDER BY path",
                )
                .bind(p.as_str())
                .bind((p.as_str().len() + STEP_LEN) as i32)
                .fetch_all(&mut *tx)
                .await?
            }
            None => {
                sqlx::query("SELECT path FROM documents WHERE LENGTH(path) = $1 ORDER BY path")
                    .bind(STEP_LEN as i32)
                    .fetch_all(&mut *tx)
                    .await?
            }
        };
        let siblings: Vec<TreePath> = sib_rows
            .into_iter()
            .map(|r| {
                let p: String = r.get("path");
                TreePath::parse(&p).map_err(anyhow::Error::msg)
            })
            .collect::<anyhow::Result<_>>()?;

        let at = siblings
            .iter()
            .position(|p| *p == node_path)
            .ok_or_else(|| anyhow::anyhow!("node vanished from sibling list"))?;
        // Plan the landing step as if a phantom subtree from outside this
        // parent were moving in right after the node; only the sibling
        // shifts are applied, the phantom's own rewrite becomes the INSERT.
        let phantom = node_path.child(0).map_err(anyhow::Error::msg)?;
        let (final_path, rewrites) =
            plan_insertion(&siblings, parent.as_ref(), at + 1, &phantom)
                .map_err(anyhow::Error::msg)?;
        for rw in rewrites.iter().filter(|rw| rw.old_prefix != phantom) {
            apply_rewrite(&mut tx, &rw.old_prefix, &rw.new_prefix, rw.depth_delta).await?;
        }

        let doc = insert_document(&mut tx, &init, &final_path, ancestors_deleted_at).await?;
        if let Some(p) = parent.as_ref() {
            sqlx::query("UPDATE documents SET numchild = numchild + 1 WHERE path = $1")
                .bind(p.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(doc)
    }

    async fn update(&self, id: Uuid, update: DocumentUpdate) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(&format!(
            r#"UPDATE documents SET
                   title = CASE WHEN $2 THEN $3 ELSE title END,
                   excerpt = CASE WHEN $4 THEN $5 ELSE excerpt END,
                   link_reach = COALESCE($6, link_reach),
                   link_role = COALESCE($7, link_role),
                   attachments = COALESCE($8, attachments),
                   updated_at = now()
               WHERE id = $1
               RETURNING {DOC_COLUMNS}"#
        ))
        .bind(id)
        .bind(update.title.is_some())
        .bind(update.title.flatten())
        .bind(update.excerpt.is_some())
        .bind(update.excerpt.flatten())
        .bind(update.link_reach.map(|r| r.as_str()))
        .bind(update.link_role.map(|r| r.as_str()))
        .bind(
            update
                .attachments
                .map(serde_json::to_value)
                .transpose()?,
        )
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn move_subtree(&self, plan: &MovePlan) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        lock_tree(&mut tx).await?;
        for rw in &plan.rewrites {
            apply_rewrite(&mut tx, &rw.old_prefix, &rw.new_prefix, rw.depth_delta).await?;
        }
        if let Some(old_parent) = plan.old_parent_id {
            sqlx::query("UPDATE documents SET numchild = numchild - 1 WHERE id = $1")
                .bind(old_parent)
                .execute(&mut *tx)
                .await?;
            refresh_has_deleted_children(&mut tx, old_parent).await?;
        }
        if let Some(new_parent) = plan.new_parent_id {
            sqlx::query("UPDATE documents SET numchild = numchild + 1 WHERE id = $1")
                .bind(new_parent)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn soft_delete_subtree(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT path FROM documents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {id} not found"))?;
        let path: String = row.get("path");
        let path = TreePath::parse(&path).map_err(anyhow::Error::msg)?;

        sqlx::query(
            "UPDATE documents SET deleted_at = $2, ancestors_deleted_at = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE documents SET ancestors_deleted_at = $2
             WHERE path LIKE $1 || '%' AND LENGTH(path) > $3
               AND ancestors_deleted_at IS NULL",
        )
        .bind(path.as_str())
        .bind(now)
        .bind(path.as_str().len() as i32)
        .execute(&mut *tx)
        .await?;

        if let Some(parent) = path.parent() {
            sqlx::query(
                "UPDATE documents SET numchild = numchild - 1, has_deleted_children = TRUE
                 WHERE path = $1",
            )
            .bind(parent.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn restore_subtree(
        &self,
        id: Uuid,
        prior_deleted_at: DateTime<Utc>,
        new_ancestors_deleted_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT path FROM documents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {id} not found"))?;
        let path: String = row.get("path");
        let path = TreePath::parse(&path).map_err(anyhow::Error::msg)?;

        sqlx::query(
            "UPDATE documents
             SET deleted_at = NULL, ancestors_deleted_at = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(new_ancestors_deleted_at)
        .execute(&mut *tx)
        .await?;

        // Descendants stamped by this deletion (or a later one) realign to
        // the new value; ones deleted earlier keep their own stamp.
        sqlx::query(
            "UPDATE documents SET ancestors_deleted_at =
                 CASE WHEN deleted_at IS NOT NULL THEN deleted_at ELSE $2 END
             WHERE path LIKE $1 || '%' AND LENGTH(path) > $3
               AND ancestors_deleted_at >= $4",
        )
        .bind(path.as_str())
        .bind(new_ancestors_deleted_at)
        .bind(path.as_str().len() as i32)
        .bind(prior_deleted_at)
        .execute(&mut *tx)
        .await?;

        if let Some(parent) = path.parent() {
            sqlx::query("UPDATE documents SET numchild = numchild + 1 WHERE path = $1")
                .bind(parent.as_str())
                .execute(&mut *tx)
                .await?;
            let parent_row = sqlx::query("SELECT id FROM documents WHERE path = $1")
                .bind(parent.as_str())
                .fetch_optional(&mut *tx)
                .await?;
            if let Some(pr) = parent_row {
                refresh_has_deleted_children(&mut tx, pr.get("id")).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn documents_with_attachment(&self, key: &str) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOC_COLUMNS} FROM documents WHERE attachments @> $1"
        ))
        .bind(serde_json::json!([key]))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_document).collect()
    }
}
