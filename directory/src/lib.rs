//! Identity directory client.
//!
//! The directory enumerates the identities an operator may verify. It is
//! read once when the operator view is created and cached for the view's
//! lifetime; it is never refreshed automatically.
//!
//! Backends implement [`DirectoryService`]:
//! - [`StaticDirectory`]: a fixed list from configuration
//! - [`HttpDirectory`]: `GET {base_url}/identities` returning a JSON array

pub mod catalog;
pub mod error;
pub mod fixed;
pub mod http;
pub mod service;

pub use catalog::{IdentityDirectory, IdentityOption};
pub use error::DirectoryError;
pub use fixed::StaticDirectory;
pub use http::HttpDirectory;
pub use service::DirectoryService;
