//! Duo API request signing.
//!
//! Each request carries a `Date` header and an `Authorization: Basic` header
//! whose password is an HMAC over the canonical request:
//!
//! ```text
//! {date}\n{METHOD}\n{host}\n{path}\n{params}
//! ```
//!
//! where `params` is the `key=value` list sorted by key, joined with `&`,
//! each side percent-encoded per RFC 3986 (unreserved characters, including
//! `~`, stay literal).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;

type HmacSha512 = Hmac<Sha512>;

/// Integration key and secret key of a Duo application.
#[derive(Clone)]
pub struct Credentials {
    pub integration_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(integration_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            integration_key: integration_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("integration_key", &self.integration_key)
            .field("secret_key", &callverify_utils::mask_secret(&self.secret_key))
            .finish()
    }
}

/// Headers and encoded parameters of a signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
    /// Canonical parameter string; the query string for GET, the form body otherwise.
    pub params: String,
    pub date: String,
    pub authorization: String,
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Sort parameters by key and join them as `k=v&k=v`.
pub fn canonical_params(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn canonical_request(date: &str, method: &str, host: &str, path: &str, params: &str) -> String {
    [
        date,
        &method.to_ascii_uppercase(),
        &host.to_ascii_lowercase(),
        path,
        params,
    ]
    .join("\n")
}

/// Sign a request with an explicit RFC 2822 date.
pub fn sign_at(
    credentials: &Credentials,
    method: &str,
    host: &str,
    path: &str,
    params: &[(&str, &str)],
    date: &str,
) -> SignedRequest {
    let params = canonical_params(params);
    let canon = canonical_request(date, method, host, path, &params);

    let mut mac = HmacSha512::new_from_slice(credentials.secret_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(canon.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let auth = format!("{}:{}", credentials.integration_key, signature);
    SignedRequest {
        params,
        date: date.to_string(),
        authorization: format!("Basic {}", STANDARD.encode(auth)),
    }
}

/// Sign a request dated now.
pub fn sign(
    credentials: &Credentials,
    method: &str,
    host: &str,
    path: &str,
    params: &[(&str, &str)],
) -> SignedRequest {
    let date = chrono::Utc::now().to_rfc2822();
    sign_at(credentials, method, host, path, params, &date)
}
