//! Verifiable identities as returned by the directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Unique key of an identity in the directory (e.g. `rey_diaz`).
///
/// Always trimmed and non-empty.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Create a handle, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyHandle);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the raw handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Handle> for String {
    fn from(h: Handle) -> Self {
        h.0
    }
}

/// Whether the directory considers the identity reachable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Active,
    Suspended,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Unknown => "unknown",
        }
    }
}

/// Opaque reference to a registered second-factor device.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRef(String);

/// A verifiable principal. Immutable once fetched from the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub handle: Handle,
    #[serde(alias = "displayName")]
    pub display_name: String,
    #[serde(default, alias = "contactStatus")]
    pub contact_status: ContactStatus,
    #[serde(default, alias = "registeredDevices")]
    pub registered_devices: Vec<DeviceRef>,
}

impl Identity {
    /// An active identity with no registered devices whose display name is its handle.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            display_name: handle.as_str().to_string(),
            handle,
            contact_status: ContactStatus::Active,
            registered_devices: Vec::new(),
        }
    }

    /// Label for selector options: the display name, plus the handle when they differ.
    pub fn label(&self) -> String {
        if self.display_name == self.handle.as_str() {
            self.display_name.clone()
        } else {
            format!("{} ({})", self.display_name, self.handle)
        }
    }

    pub fn has_devices(&self) -> bool {
        !self.registered_devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_trimmed() {
        let h = Handle::new("  rey_diaz ").unwrap();
        assert_eq!(h.as_str(), "rey_diaz");
    }

    #[test]
    fn blank_handle_rejected() {
        assert_eq!(Handle::new("   "), Err(TypesError::EmptyHandle));
        assert!(serde_json::from_str::<Handle>("\"\"").is_err());
    }

    #[test]
    fn identity_accepts_camel_case_payload() {
        let json = r#"{
            "handle": "rey_diaz",
            "displayName": "Rey Diaz",
            "contactStatus": "suspended",
            "registeredDevices": ["DP1", "DP2"]
        }"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.handle.as_str(), "rey_diaz");
        assert_eq!(identity.contact_status, ContactStatus::Suspended);
        assert_eq!(identity.registered_devices.len(), 2);
        assert_eq!(identity.label(), "Rey Diaz (rey_diaz)");
    }

    #[test]
    fn unrecognized_status_is_unknown() {
        let json = r#"{"handle": "u", "display_name": "u", "contact_status": "locked out"}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.contact_status, ContactStatus::Unknown);
        assert!(!identity.has_devices());
    }

    #[test]
    fn label_omits_handle_when_same_as_name() {
        let identity = Identity::from_handle(Handle::new("user_2").unwrap());
        assert_eq!(identity.label(), "user_2");
    }
}
