//! Fundamental types for operator-assisted verification.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identities and their devices, second-factor methods, verification outcomes,
//! timestamps and the clock abstraction.

pub mod error;
pub mod identity;
pub mod outcome;
pub mod time;

pub use error::TypesError;
pub use identity::{ContactStatus, DeviceRef, Handle, Identity};
pub use outcome::{Method, Outcome, Verdict};
pub use time::{Clock, MonotonicClock, Timestamp};
