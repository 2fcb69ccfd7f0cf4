//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of a verification session (clock, directory,
//! push provider, token provider) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return scripted values
//! - Can be held and released programmatically
//! - Record what they were asked
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod directory;
pub mod provider;

pub use clock::NullClock;
pub use directory::NullDirectory;
pub use provider::{NullAuthenticator, NullTokenVerifier};
