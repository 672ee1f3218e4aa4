use std::time::Duration;

use uuid::Uuid;

use crate::application::errors::{DocsError, DocsResult};
use crate::application::ports::cache_port::CachePort;
use crate::application::ports::collaboration_port::CollaborationPort;

pub fn lock_key(document_id: Uuid) -> String {
    format!("docs:no-websocket:{document_id}")
}

/// Serializes non-collaborative edits. When the realtime room is empty,
/// the first editing session takes a TTL'd advisory lock; others are
/// refused until it expires. Sessions present in the room edit freely.
pub struct EditArbiter<'a, C, K>
where
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    pub collaboration: &'a C,
    pub cache: &'a K,
    pub lock_ttl: Duration,
}

impl<'a, C, K> EditArbiter<'a, C, K>
where
    C: CollaborationPort + ?Sized,
    K: CachePort + ?Sized,
{
    /// Admit or refuse an edit for `session_key`. A client that declares
    /// itself connected to the collaboration channel bypasses the check.
    pub async fn check(
        &self,
        document_id: Uuid,
        session_key: &str,
        websocket_declared: bool,
    ) -> DocsResult<()> {
        if websocket_declared {
            return Ok(());
        }

        let room = document_id.to_string();
        let connections = match self
            .collaboration
            .get_connections(&room, session_key)
            .await
        {
            Ok(c) => Some(c),
            Err(err) => {
                // Unreachable or erroring collaboration server: treat the
                // room as empty and let the advisory lock serialize writers.
                tracing::warn!(%room, error = %err, "collaboration server unavailable, falling back to no-websocket lock");
                None
            }
        };

        match connections {
            Some(c) if c.count > 0 => {
                if c.exists {
                    Ok(())
                } else {
                    Err(DocsError::PermissionDenied(
                        "you are not allowed to edit this document while it is edited in realtime".into(),
                    ))
                }
            }
            _ => self.acquire_lock(document_id, session_key).await,
        }
    }

    async fn acquire_lock(&self, document_id: Uuid, session_key: &str) -> DocsResult<()> {
        let key = lock_key(document_id);
        if self
            .cache
            .set_if_absent(&key, session_key, self.lock_ttl)
            .await
            .map_err(DocsError::Internal)?
        {
            return Ok(());
        }
        // Re-entrant for the session already holding the lock.
        match self.cache.get(&key).await.map_err(DocsError::Internal)? {
            Some(holder) if holder == session_key => Ok(()),
            _ => Err(DocsError::PermissionDenied(
                "another session is already editing this document".into(),
            )),
        }
    }
}
