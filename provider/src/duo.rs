//! Duo Auth API adapter.
//!
//! - Push: `POST /auth/v2/auth` with `factor=push&async=1` returns a
//!   transaction id, then `GET /auth/v2/auth_status` is polled until the
//!   caller answers or the poll timeout elapses.
//! - Passcode: `POST /auth/v2/auth` with `factor=passcode` answers inline.

use async_trait::async_trait;
use callverify_types::{Identity, Verdict};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ProviderError;
use crate::service::{AuthenticationService, TokenVerificationService};
use crate::signing::{self, Credentials};

const AUTH_PATH: &str = "/auth/v2/auth";
const AUTH_STATUS_PATH: &str = "/auth/v2/auth_status";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to reach a Duo application.
#[derive(Clone, Debug)]
pub struct DuoSettings {
    /// API base URL, e.g. `https://api-xxxxxxxx.duosecurity.com`.
    pub api_url: String,
    pub credentials: Credentials,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub request_timeout: Duration,
}

impl DuoSettings {
    pub fn new(api_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            api_url: api_url.into(),
            credentials,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Standard Duo response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    stat: String,
    response: Option<T>,
    code: Option<u32>,
    message: Option<String>,
    message_detail: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, ProviderError> {
        if self.stat != "OK" {
            let mut message = self.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(detail) = self.message_detail {
                message = format!("{message}: {detail}");
            }
            return Err(ProviderError::Rejected {
                code: self.code.unwrap_or(0),
                message,
            });
        }
        self.response
            .ok_or_else(|| ProviderError::InvalidResponse("envelope has no response".into()))
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    txid: Option<String>,
    #[serde(default)]
    status_msg: Option<String>,
}

fn parse_verdict(result: Option<String>) -> Result<Verdict, ProviderError> {
    let result = result.ok_or_else(|| ProviderError::InvalidResponse("missing result".into()))?;
    result
        .parse()
        .map_err(|_| ProviderError::InvalidResponse(format!("unexpected auth result {result:?}")))
}

/// Client for the Duo Auth API.
pub struct DuoClient {
    http_client: reqwest::Client,
    base_url: String,
    host: String,
    credentials: Credentials,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl DuoClient {
    pub fn new(settings: DuoSettings) -> Result<Self, ProviderError> {
        let url = reqwest::Url::parse(&settings.api_url).map_err(|e| {
            ProviderError::Config(format!("invalid API URL {:?}: {e}", settings.api_url))
        })?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(ProviderError::Config(format!(
                "API URL must be http(s), got {}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| ProviderError::Config("unable to parse hostname from API URL".into()))?
            .to_ascii_lowercase();
        let base_url = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        if settings.credentials.integration_key.is_empty()
            || settings.credentials.secret_key.is_empty()
        {
            return Err(ProviderError::Config(
                "integration key and secret key are required".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            host,
            credentials: settings.credentials,
            poll_interval: settings.poll_interval,
            poll_timeout: settings.poll_timeout,
        })
    }

    /// Hostname requests are signed for.
    pub fn host(&self) -> &str {
        &self.host
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let signed = signing::sign(&self.credentials, method.as_str(), &self.host, path, params);

        let builder = if method == Method::GET {
            let url = if signed.params.is_empty() {
                format!("{}{}", self.base_url, path)
            } else {
                format!("{}{}?{}", self.base_url, path, signed.params)
            };
            self.http_client.get(url)
        } else {
            self.http_client
                .request(method, format!("{}{}", self.base_url, path))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(signed.params.clone())
        };

        let response = builder
            .header(DATE, &signed.date)
            .header(AUTHORIZATION, &signed.authorization)
            .send()
            .await?;

        // Duo reports failures as an envelope even on 4xx statuses.
        let status = response.status();
        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                ProviderError::InvalidResponse(format!("failed to parse response: {e}"))
            } else {
                ProviderError::RequestFailed(format!("HTTP status {status}"))
            }
        })?;
        envelope.into_result()
    }

    /// Send a push to the user's default device; returns the transaction id.
    pub async fn start_push(&self, username: &str) -> Result<String, ProviderError> {
        let params = [
            ("username", username),
            ("factor", "push"),
            ("device", "auto"),
            ("async", "1"),
        ];
        let response: AuthResponse = self.request(Method::POST, AUTH_PATH, &params).await?;
        response
            .txid
            .ok_or_else(|| ProviderError::InvalidResponse("push response has no txid".into()))
    }

    /// Poll a push transaction until the caller answers or the poll timeout elapses.
    pub async fn await_push(&self, txid: &str) -> Result<Verdict, ProviderError> {
        let deadline = tokio::time::Instant::now() + self.poll_timeout;
        loop {
            let response: AuthResponse = self
                .request(Method::GET, AUTH_STATUS_PATH, &[("txid", txid)])
                .await?;
            match response.result.as_deref() {
                Some("waiting") => {
                    tracing::debug!(
                        txid,
                        status = response.status_msg.as_deref().unwrap_or(""),
                        "push still waiting"
                    );
                }
                _ => return parse_verdict(response.result),
            }
            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(ProviderError::Timeout(self.poll_timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Check a passcode (hardware token number) for `username`.
    pub async fn check_passcode(&self, username: &str, code: &str) -> Result<Verdict, ProviderError> {
        let params = [
            ("username", username),
            ("factor", "passcode"),
            ("passcode", code),
        ];
        let response: AuthResponse = self.request(Method::POST, AUTH_PATH, &params).await?;
        parse_verdict(response.result)
    }
}

#[async_trait]
impl AuthenticationService for DuoClient {
    async fn challenge(&self, identity: &Identity) -> Result<Verdict, ProviderError> {
        tracing::info!(user = %identity.handle, host = %self.host, "sending push challenge");
        let txid = self.start_push(identity.handle.as_str()).await?;
        self.await_push(&txid).await
    }
}

#[async_trait]
impl TokenVerificationService for DuoClient {
    async fn verify(&self, identity: &Identity, code: &str) -> Result<Verdict, ProviderError> {
        tracing::info!(user = %identity.handle, host = %self.host, "verifying hardware token");
        self.check_passcode(identity.handle.as_str(), code).await
    }
}
