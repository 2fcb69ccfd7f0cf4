//! Operator console for callverify.
//!
//! Projects a running verification session into an operator view and a
//! caller view, maps operator intents onto session triggers, and serves both
//! over HTTP.

pub mod adapter;
pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod shutdown;
pub mod views;

pub use adapter::{OperatorIntent, PresentationAdapter};
pub use app::Console;
pub use config::{ConsoleConfig, DirectoryConfig, DirectoryKind, DuoConfig};
pub use error::ConsoleError;
pub use shutdown::{ShutdownController, ShutdownReason};
pub use views::{render, CallerView, ConsoleViews, OperatorView};
