use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Pipeline state of a stored object. Legacy objects predate the field;
/// an absent status reads as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStatus {
    Processing,
    Ready,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectMeta {
    /// SHA-256 digest of the object body, hex-encoded.
    pub checksum: Option<String>,
    pub status: Option<ObjectStatus>,
    pub owner: Option<String>,
    pub is_unsafe: bool,
    pub content_type: Option<String>,
}

impl ObjectMeta {
    pub fn is_ready(&self) -> bool {
        !matches!(self.status, Some(ObjectStatus::Processing))
    }
}

#[derive(Debug, Clone)]
pub struct ObjectVersion {
    pub version_id: String,
    pub last_modified: DateTime<Utc>,
    pub is_latest: bool,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct VersionPage {
    pub versions: Vec<ObjectVersion>,
    pub next_marker: Option<String>,
}

/// Signed GET request an API gate can relay to the caller: URL plus the
/// authorization headers the store expects.
#[derive(Debug, Clone)]
pub struct PresignedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Metadata for `key`, or None when the object does not exist.
    async fn head(&self, key: &str) -> anyhow::Result<Option<ObjectMeta>>;

    async fn get(&self, key: &str, version_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, bytes: &[u8], meta: &ObjectMeta) -> anyhow::Result<()>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    async fn delete_version(&self, key: &str, version_id: &str) -> anyhow::Result<bool>;

    async fn list_versions(
        &self,
        key: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> anyhow::Result<VersionPage>;

    async fn presign_get(&self, key: &str, expires_in: Duration)
        -> anyhow::Result<PresignedRequest>;
}
