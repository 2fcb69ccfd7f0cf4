//! Errors raised while constructing core types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("identity handle must not be empty")]
    EmptyHandle,

    #[error("unknown verification outcome: {0}")]
    UnknownOutcome(String),
}
