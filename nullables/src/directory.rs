//! Directory double with a scripted identity list.

use async_trait::async_trait;
use callverify_directory::{DirectoryError, DirectoryService};
use callverify_types::{Handle, Identity};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A directory that returns a fixed result and counts how often it was asked.
pub struct NullDirectory {
    result: Result<Vec<Identity>, DirectoryError>,
    calls: AtomicUsize,
}

impl NullDirectory {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self {
            result: Ok(identities),
            calls: AtomicUsize::new(0),
        }
    }

    /// Identities whose display names equal their handles.
    ///
    /// # Panics
    /// Panics if a handle is blank.
    pub fn with_handles<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identities = handles
            .into_iter()
            .map(|h| Identity::from_handle(Handle::new(h.as_ref()).expect("valid test handle")))
            .collect();
        Self::new(identities)
    }

    /// A directory that cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            result: Err(DirectoryError::Unavailable("directory service unreachable".into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `list_identities` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryService for NullDirectory {
    async fn list_identities(&self) -> Result<Vec<Identity>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
