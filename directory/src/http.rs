//! HTTP directory backend.

use async_trait::async_trait;
use callverify_types::Identity;
use serde::Deserialize;
use std::time::Duration;

use crate::error::DirectoryError;
use crate::service::{ensure_unique_handles, DirectoryService};

/// Default timeout for directory requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a directory endpoint.
///
/// Sends `GET {base_url}/identities` and accepts either a bare JSON array of
/// identities or an object wrapping it as `{"identities": [...]}`.
pub struct HttpDirectory {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<Identity>),
    Wrapped { identities: Vec<Identity> },
}

impl ListResponse {
    fn into_identities(self) -> Vec<Identity> {
        match self {
            Self::Bare(identities) | Self::Wrapped { identities } => identities,
        }
    }
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    fn list_url(&self) -> String {
        format!("{}/identities", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl DirectoryService for HttpDirectory {
    async fn list_identities(&self) -> Result<Vec<Identity>, DirectoryError> {
        let url = self.list_url();
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Unavailable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                DirectoryError::Unavailable(format!("connection failed: {e}"))
            } else {
                DirectoryError::Unavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(DirectoryError::Unavailable(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: ListResponse = response.json().await.map_err(|e| {
            DirectoryError::Malformed(format!("failed to parse identity list: {e}"))
        })?;

        let identities = body.into_identities();
        ensure_unique_handles(&identities)?;
        tracing::debug!(count = identities.len(), url = %url, "fetched identity list");
        Ok(identities)
    }
}
