use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::accesses::link::{LinkDefinition, LinkReach, LinkRole};
use crate::domain::documents::path::TreePath;

pub const TITLE_MAX_LEN: usize = 255;
pub const EXCERPT_MAX_LEN: usize = 300;

/// Node of the ordered document forest.
///
/// Deletion state invariant: `deleted_at` is NULL or equal to
/// `ancestors_deleted_at`; a node with a soft-deleted ancestor carries the
/// ancestor's stamp in `ancestors_deleted_at` while `deleted_at` stays
/// NULL. `numchild` counts live children only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub link_reach: LinkReach,
    pub link_role: LinkRole,
    pub creator_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub ancestors_deleted_at: Option<DateTime<Utc>>,
    pub has_deleted_children: bool,
    pub duplicated_from: Option<Uuid>,
    pub attachments: Vec<String>,
    pub path: TreePath,
    pub depth: i32,
    pub numchild: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// Soft-deleted itself or below a soft-deleted ancestor.
    pub fn in_deleted_chain(&self) -> bool {
        self.ancestors_deleted_at.is_some()
    }

    pub fn self_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Deleted longer ago than the retention window: treated as gone.
    pub fn past_cutoff(&self, cutoff: DateTime<Utc>) -> bool {
        self.ancestors_deleted_at
            .is_some_and(|stamp| stamp < cutoff)
    }

    pub fn link_definition(&self) -> LinkDefinition {
        LinkDefinition::new(self.link_reach, self.link_role)
    }

    /// Object-store key of the content blob.
    pub fn content_key(&self) -> String {
        format!("{}/file", self.id)
    }
}

/// Fields callers provide when creating a node; everything structural is
/// allocated by the store.
#[derive(Debug, Clone, Default)]
pub struct DocumentInit {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub link_reach: Option<LinkReach>,
    pub link_role: Option<LinkRole>,
    pub creator_id: Option<Uuid>,
    pub duplicated_from: Option<Uuid>,
    pub attachments: Vec<String>,
}

/// Non-structural field updates. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<Option<String>>,
    pub excerpt: Option<Option<String>>,
    pub link_reach: Option<LinkReach>,
    pub link_role: Option<LinkRole>,
    pub attachments: Option<Vec<String>>,
}
