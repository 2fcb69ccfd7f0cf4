//! Operator-assisted verification session.
//!
//! A [`VerificationSession`] coordinates three things:
//! 1. the operator's selection and action intents,
//! 2. the single outstanding call to the push or token collaborator,
//! 3. the caller-facing narrative, including the delayed "completed" message.
//!
//! The session itself is synchronous: triggers that need a collaborator move
//! the session into a pending phase and hand back a [`Dispatch`]; whoever
//! performs the call feeds the result back through
//! [`VerificationSession::complete`]. [`SessionRuntime`] is that driver for
//! tokio: it owns the session, runs collaborator calls on spawned tasks,
//! fires the narrative timer and publishes snapshots.

pub mod error;
pub mod narrator;
pub mod phase;
pub mod runtime;
pub mod session;

pub use error::SessionError;
pub use narrator::{narrate, Line, Narration, Tone};
pub use phase::{SessionPhase, Trigger};
pub use runtime::{Collaborators, SessionHandle, SessionRuntime};
pub use session::{
    Completion, CompletionTimer, Dispatch, Generation, Request, SessionSnapshot, Ticket,
    VerificationSession, DEFAULT_COMPLETION_DELAY,
};
