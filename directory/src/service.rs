//! The directory collaborator contract.

use async_trait::async_trait;
use callverify_types::Identity;
use std::collections::HashSet;

use crate::error::DirectoryError;

/// Enumerates verifiable identities.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Fetch every identity the operator may select.
    async fn list_identities(&self) -> Result<Vec<Identity>, DirectoryError>;
}

/// Reject payloads that list the same handle twice.
pub(crate) fn ensure_unique_handles(identities: &[Identity]) -> Result<(), DirectoryError> {
    let mut seen = HashSet::with_capacity(identities.len());
    for identity in identities {
        if !seen.insert(&identity.handle) {
            return Err(DirectoryError::Malformed(format!(
                "duplicate handle {}",
                identity.handle
            )));
        }
    }
    Ok(())
}
