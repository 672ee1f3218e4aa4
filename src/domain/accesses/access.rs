use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::accesses::role::{Principal, Role};

/// One grant row: a principal holds a role on a document. Uniqueness per
/// (document, user) and (document, team) is enforced by partial indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAccess {
    pub id: Uuid,
    pub document_id: Uuid,
    pub principal: Principal,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl DocumentAccess {
    pub fn new(document_id: Uuid, principal: Principal, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            principal,
            role,
            created_at: Utc::now(),
        }
    }
}

/// Access row joined with the path of the document carrying it, as
/// returned by the ancestor-chain query of the role resolver.
#[derive(Debug, Clone)]
pub struct ChainAccess {
    pub access: DocumentAccess,
    pub document_path: crate::domain::documents::path::TreePath,
}
