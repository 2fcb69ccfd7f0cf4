//! Shared utilities for callverify.

pub mod logging;
pub mod secret;

pub use logging::{init_tracing, LogFormat};
pub use secret::mask_secret;
