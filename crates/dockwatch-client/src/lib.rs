//! HTTP client for the dockwatch dashboard API.

use std::time::Duration;

use dockwatch_core::api::{
    CurrentUserResponse, DashboardSnapshot, ErrorBody, EventsPage, ExecuteRequest, GrantRequest,
    GrantResponse, HealthResponse, LogsResponse, MessageResponse, RevokeRequest,
};
use dockwatch_core::{AccessGrant, CommandOutput, ContainerRecord};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_IDENTITY_HEADER: &str = "x-auth-request-user";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            ClientError::Config(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Username sent in the identity header. Without it only the health
    /// endpoint is reachable; a fronting proxy normally sets the header.
    pub user: Option<String>,
    pub identity_header: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: None,
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

#[derive(Debug, Clone)]
pub struct DockwatchClient {
    http: reqwest::Client,
    base_url: String,
}

impl DockwatchClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(user) = &config.user {
            let name = HeaderName::from_bytes(config.identity_header.as_bytes())
                .map_err(|e| ClientError::Config(format!("identity header: {e}")))?;
            let value = HeaderValue::from_str(user)
                .map_err(|e| ClientError::Config(format!("username: {e}")))?;
            headers.insert(name, value);
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get("health", &[]).await
    }

    pub async fn containers(&self) -> Result<Vec<ContainerRecord>, ClientError> {
        self.get("docker/containers", &[]).await
    }

    pub async fn logs(&self, container_id: &str, lines: Option<usize>) -> Result<String, ClientError> {
        let query: Vec<(&str, String)> = lines.map(|n| ("lines", n.to_string())).into_iter().collect();
        let resp: LogsResponse = self
            .get(&format!("docker/logs/{container_id}"), &query)
            .await?;
        Ok(resp.logs)
    }

    pub async fn execute(&self, command: &str) -> Result<CommandOutput, ClientError> {
        self.post(
            "docker/execute",
            &ExecuteRequest {
                command: command.to_string(),
            },
        )
        .await
    }

    pub async fn current_user(&self) -> Result<String, ClientError> {
        let resp: CurrentUserResponse = self.get("current-user", &[]).await?;
        Ok(resp.username)
    }

    /// Grant temporary access; `hours` defaults to 24 on the server.
    pub async fn grant(&self, username: &str, hours: Option<f64>) -> Result<GrantResponse, ClientError> {
        self.post(
            "grant-access",
            &GrantRequest {
                username: username.to_string(),
                duration: hours,
            },
        )
        .await
    }

    pub async fn revoke(&self, username: &str) -> Result<String, ClientError> {
        let resp: MessageResponse = self
            .post(
                "revoke-access",
                &RevokeRequest {
                    username: username.to_string(),
                },
            )
            .await?;
        Ok(resp.message)
    }

    pub async fn temp_access(&self) -> Result<Vec<AccessGrant>, ClientError> {
        self.get("temp-access", &[]).await
    }

    pub async fn dashboard(&self) -> Result<DashboardSnapshot, ClientError> {
        self.get("dashboard", &[]).await
    }

    /// Events after `since` in the feed identified by `epoch`.
    pub async fn events_since(&self, since: u64, epoch: u64) -> Result<EventsPage, ClientError> {
        self.get(
            "dashboard/events",
            &[("since", since.to_string()), ("epoch", epoch.to_string())],
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.http.get(self.endpoint(path)).query(query).send().await?;
        decode(response).await
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let bytes = response.bytes().await?;
    let (code, message) = match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => (body.code, body.message),
        Err(_) => (
            "http_error".to_string(),
            String::from_utf8_lossy(&bytes).trim().to_string(),
        ),
    };
    Err(ClientError::Api {
        status,
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = DockwatchClient::new(ClientConfig::new("http://host:3000/")).unwrap();
        assert_eq!(client.base_url(), "http://host:3000");
        assert_eq!(client.endpoint("health"), "http://host:3000/api/health");
    }

    #[test]
    fn rejects_unusable_identity() {
        let mut config = ClientConfig::default().with_user("alice");
        config.identity_header = "bad header".into();
        assert!(matches!(
            DockwatchClient::new(config),
            Err(ClientError::Config(_))
        ));
        let config = ClientConfig::default().with_user("line\nbreak");
        assert!(matches!(
            DockwatchClient::new(config),
            Err(ClientError::Config(_))
        ));
    }
}
