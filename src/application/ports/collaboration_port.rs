use async_trait::async_trait;
use uuid::Uuid;

/// Participant snapshot for a room: how many sessions are connected and
/// whether the asking session is one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConnections {
    pub count: u64,
    pub exists: bool,
}

#[async_trait]
pub trait CollaborationPort: Send + Sync {
    async fn get_connections(
        &self,
        room: &str,
        session_key: &str,
    ) -> anyhow::Result<RoomConnections>;

    /// Asks the collaboration server to drop connections for the room
    /// (optionally only one user's) after an access or link change.
    async fn reset_connections(&self, room: &str, user_id: Option<Uuid>) -> anyhow::Result<()>;
}
