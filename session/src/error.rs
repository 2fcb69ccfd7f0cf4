use thiserror::Error;

use crate::phase::{SessionPhase, Trigger};

/// A rejected operator action. The session is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{trigger} is not allowed while the session is {phase}")]
    InvalidTransition { trigger: Trigger, phase: SessionPhase },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("identity {0:?} is not in the directory")]
    UnknownIdentity(String),

    #[error("session runtime has stopped")]
    RuntimeStopped,
}

impl SessionError {
    /// Stable machine-readable kind, used by the console's error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Validation(_) => "validation_error",
            Self::UnknownIdentity(_) => "unknown_identity",
            Self::RuntimeStopped => "runtime_stopped",
        }
    }
}
