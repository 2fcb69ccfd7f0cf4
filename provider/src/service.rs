//! Collaborator contracts consumed by the verification session.

use async_trait::async_trait;
use callverify_types::{Identity, Verdict};

use crate::error::ProviderError;

/// Sends a push challenge to the identity's registered device and resolves
/// once the caller approves or denies it.
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    async fn challenge(&self, identity: &Identity) -> Result<Verdict, ProviderError>;
}

/// Validates a one-time code read out by the caller.
#[async_trait]
pub trait TokenVerificationService: Send + Sync {
    async fn verify(&self, identity: &Identity, code: &str) -> Result<Verdict, ProviderError>;
}
