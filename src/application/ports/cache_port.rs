use std::time::Duration;

use async_trait::async_trait;

/// Short-lived key-value cache shared across workers. Holds the per-
/// document access-count pairs and the no-websocket advisory locks.
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()>;

    /// SET NX EX: returns true when the key was absent and is now held.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<bool>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}
