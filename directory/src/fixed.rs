//! Directory backed by a fixed identity list.

use async_trait::async_trait;
use callverify_types::{Handle, Identity};

use crate::error::DirectoryError;
use crate::service::{ensure_unique_handles, DirectoryService};

/// Handles offered when no directory is configured.
pub const DEFAULT_HANDLES: [&str; 3] = ["rey_diaz", "user_2", "user_3"];

/// A directory whose contents are known up front (configuration, tests).
#[derive(Clone, Debug)]
pub struct StaticDirectory {
    identities: Vec<Identity>,
}

impl StaticDirectory {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// Build from bare handles; each identity displays as its handle.
    pub fn from_handles<I, S>(handles: I) -> Result<Self, DirectoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identities = handles
            .into_iter()
            .map(|h| {
                Handle::new(h.as_ref())
                    .map(Identity::from_handle)
                    .map_err(|e| DirectoryError::Malformed(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { identities })
    }
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self::from_handles(DEFAULT_HANDLES).expect("default handles are valid")
    }
}

#[async_trait]
impl DirectoryService for StaticDirectory {
    async fn list_identities(&self) -> Result<Vec<Identity>, DirectoryError> {
        ensure_unique_handles(&self.identities)?;
        Ok(self.identities.clone())
    }
}
