use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::application::ports::object_store_port::{
    ObjectMeta, ObjectStatus, ObjectStorePort, ObjectVersion, PresignedRequest, VersionPage,
};
use crate::bootstrap::config::Config;

const META_CHECKSUM: &str = "checksum";
const META_STATUS: &str = "status";
const META_OWNER: &str = "owner";
const META_IS_UNSAFE: &str = "is-unsafe";

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn new(cfg: &Config) -> anyhow::Result<Self> {
        let bucket = cfg
            .s3_bucket
            .clone()
            .context("S3 bucket must be configured")?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.s3_region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let (Some(access), Some(secret)) = (&cfg.s3_access_key, &cfg.s3_secret_key) {
            let creds = Credentials::new(
                access.clone(),
                secret.clone(),
                None,
                None,
                "docs-core-s3-static",
            );
            builder = builder.credentials_provider(creds);
        }
        if let Some(endpoint) = &cfg.s3_endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }
        if cfg.s3_use_path_style {
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        Ok(Self { client, bucket })
    }

    fn meta_to_map(meta: &ObjectMeta) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(checksum) = &meta.checksum {
            map.insert(META_CHECKSUM.to_string(), checksum.clone());
        }
        if let Some(status) = meta.status {
            let value = match status {
                ObjectStatus::Processing => "processing",
                ObjectStatus::Ready => "ready",
            };
            map.insert(META_STATUS.to_string(), value.to_string());
        }
        if let Some(owner) = &meta.owner {
            map.insert(META_OWNER.to_string(), owner.clone());
        }
        if meta.is_unsafe {
            map.insert(META_IS_UNSAFE.to_string(), "true".to_string());
        }
        map
    }

    fn map_to_meta(
        metadata: Option<&HashMap<String, String>>,
        content_type: Option<&str>,
    ) -> ObjectMeta {
        let get = |key: &str| metadata.and_then(|m| m.get(key)).cloned();
        ObjectMeta {
            checksum: get(META_CHECKSUM),
            status: get(META_STATUS).as_deref().map(|s| match s {
                "processing" => ObjectStatus::Processing,
                _ => ObjectStatus::Ready,
            }),
            owner: get(META_OWNER),
            is_unsafe: get(META_IS_UNSAFE).as_deref() == Some("true"),
            content_type: content_type.map(|s| s.to_string()),
        }
    }
}

#[async_trait]
impl ObjectStorePort for S3ObjectStore {
    async fn head(&self, key: &str) -> anyhow::Result<Option<ObjectMeta>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(out) => Ok(Some(Self::map_to_meta(
                out.metadata(),
                out.content_type(),
            ))),
            Err(err) => match err {
                SdkError::ServiceError(service_err) => {
                    let head_err: &HeadObjectError = service_err.err();
                    if head_err.is_not_found() {
                        Ok(None)
                    } else {
                        Err(anyhow!("head_object error for {}: {}", key, head_err))
                    }
                }
                other => Err(anyhow!("head_object failed for {}: {}", key, other)),
            },
        }
    }

    async fn get(&self, key: &str, version_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>> {
        let mut req = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(version) = version_id {
            req = req.version_id(version);
        }
        match req.send().await {
            Ok(out) => {
                let bytes = out
                    .body
                    .collect()
                    .await
                    .with_context(|| format!("failed to read body of {key}"))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => match err {
                SdkError::ServiceError(service_err) => {
                    let get_err: &GetObjectError = service_err.err();
                    if matches!(get_err, GetObjectError::NoSuchKey(_)) {
                        Ok(None)
                    } else {
                        Err(anyhow!("get_object error for {}: {}", key, get_err))
                    }
                }
                other => Err(anyhow!("get_object failed for {}: {}", key, other)),
            },
        }
    }

    async fn put(&self, key: &str, bytes: &[u8], meta: &ObjectMeta) -> anyhow::Result<()> {
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()));
        for (k, v) in Self::meta_to_map(meta) {
            req = req.metadata(k, v);
        }
        if let Some(content_type) = &meta.content_type {
            req = req.content_type(content_type);
        }
        req.send()
            .await
            .with_context(|| format!("failed to store object {key}"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to delete object {key}"))?;
        Ok(())
    }

    async fn delete_version(&self, key: &str, version_id: &str) -> anyhow::Result<bool> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .version_id(version_id)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err)) => {
                Err(anyhow!("delete_object version error: {}", service_err.err()))
            }
            Err(other) => Err(anyhow!("delete_object version failed: {other}")),
        }
    }

    async fn list_versions(
        &self,
        key: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> anyhow::Result<VersionPage> {
        let mut req = self
            .client
            .list_object_versions()
            .bucket(&self.bucket)
            .prefix(key)
            .max_keys(page_size);
        if let Some(marker) = marker {
            req = req.key_marker(key).version_id_marker(marker);
        }
        let out = req
            .send()
            .await
            .with_context(|| format!("failed to list versions of {key}"))?;

        let versions = out
            .versions()
            .iter()
            .filter(|v| v.key() == Some(key))
            .filter_map(|v| {
                let last_modified = v.last_modified().and_then(|dt| {
                    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
                })?;
                Some(ObjectVersion {
                    version_id: v.version_id().unwrap_or_default().to_string(),
                    last_modified,
                    is_latest: v.is_latest().unwrap_or(false),
                    size: v.size().unwrap_or(0),
                })
            })
            .collect();

        Ok(VersionPage {
            versions,
            next_marker: out
                .next_version_id_marker()
                .map(|s| s.to_string())
                .filter(|_| out.is_truncated().unwrap_or(false)),
        })
    }

    async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<PresignedRequest> {
        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| anyhow!("invalid presign expiry: {e}"))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .with_context(|| format!("failed to presign {key}"))?;
        let headers = presigned
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Ok(PresignedRequest {
            url: presigned.uri().to_string(),
            headers,
        })
    }
}
