//! The cached identity list backing the operator's selector.

use callverify_types::{Handle, Identity};
use serde::Serialize;

use crate::service::DirectoryService;

/// One entry in the operator's identity selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdentityOption {
    pub handle: Handle,
    pub label: String,
    pub contact_status: callverify_types::ContactStatus,
}

/// Identities fetched once for the lifetime of an operator view.
///
/// A failed load leaves the list empty and records the reason for the
/// directory banner; nothing is retried.
#[derive(Clone, Debug, Default)]
pub struct IdentityDirectory {
    identities: Vec<Identity>,
    load_error: Option<String>,
}

impl IdentityDirectory {
    /// Query `service` once and cache the result.
    pub async fn load(service: &dyn DirectoryService) -> Self {
        match service.list_identities().await {
            Ok(identities) => {
                tracing::info!(count = identities.len(), "identity directory loaded");
                Self::from_identities(identities)
            }
            Err(e) => {
                tracing::warn!("identity directory failed to load: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_identities(identities: Vec<Identity>) -> Self {
        Self {
            identities,
            load_error: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            identities: Vec::new(),
            load_error: Some(reason.into()),
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn get(&self, handle: &Handle) -> Option<&Identity> {
        self.identities.iter().find(|i| &i.handle == handle)
    }

    /// Look up by a raw, possibly untrimmed, handle string.
    pub fn find(&self, raw: &str) -> Option<&Identity> {
        let handle = Handle::new(raw).ok()?;
        self.get(&handle)
    }

    pub fn options(&self) -> Vec<IdentityOption> {
        self.identities
            .iter()
            .map(|i| IdentityOption {
                handle: i.handle.clone(),
                label: i.label(),
                contact_status: i.contact_status,
            })
            .collect()
    }

    /// Whether the directory loaded and the operator can select from it.
    pub fn is_available(&self) -> bool {
        self.load_error.is_none()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
