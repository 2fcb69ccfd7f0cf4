//! Second-factor provider contracts and adapters.
//!
//! The verification session only sees the two traits in [`service`]:
//! [`AuthenticationService`] sends a push challenge and waits for the
//! caller's answer, [`TokenVerificationService`] checks a hardware token code.
//! [`DuoClient`] implements both against the Duo Auth API.

pub mod duo;
pub mod error;
pub mod service;
pub mod signing;

pub use duo::{DuoClient, DuoSettings};
pub use error::ProviderError;
pub use service::{AuthenticationService, TokenVerificationService};
pub use signing::Credentials;
