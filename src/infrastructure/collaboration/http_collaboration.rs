use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::collaboration_port::{CollaborationPort, RoomConnections};
use crate::bootstrap::config::Config;

#[derive(Debug, Deserialize)]
struct ConnectionsResponse {
    count: u64,
    exists: bool,
}

/// HTTP client for the realtime collaboration server. Calls carry a short
/// timeout; the arbiter treats failures as an empty room, so this client
/// only reports them.
pub struct HttpCollaborationClient {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

impl HttpCollaborationClient {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let base_url = cfg
            .collaboration_api_url
            .clone()
            .context("collaboration API url must be configured")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.collaboration_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: cfg.collaboration_server_secret.clone(),
        })
    }
}

#[async_trait]
impl CollaborationPort for HttpCollaborationClient {
    async fn get_connections(
        &self,
        room: &str,
        session_key: &str,
    ) -> anyhow::Result<RoomConnections> {
        let url = format!("{}/get-connections", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("room", room), ("sessionKey", session_key)])
            .header("Authorization", &self.secret)
            .send()
            .await
            .context("collaboration server unreachable")?;
        if !response.status().is_success() {
            anyhow::bail!(
                "collaboration server returned {} for room {room}",
                response.status()
            );
        }
        let body: ConnectionsResponse = response
            .json()
            .await
            .context("malformed get-connections response")?;
        Ok(RoomConnections {
            count: body.count,
            exists: body.exists,
        })
    }

    async fn reset_connections(&self, room: &str, user_id: Option<Uuid>) -> anyhow::Result<()> {
        let url = format!("{}/reset-connections", self.base_url);
        let mut payload = serde_json::json!({ "room": room });
        if let Some(user_id) = user_id {
            payload["user_id"] = serde_json::json!(user_id.to_string());
        }
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.secret)
            .json(&payload)
            .send()
            .await
            .context("collaboration server unreachable")?;
        if !response.status().is_success() {
            anyhow::bail!(
                "collaboration server returned {} resetting room {room}",
                response.status()
            );
        }
        Ok(())
    }
}
