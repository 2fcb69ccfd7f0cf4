//! Operator- and caller-facing narrative derived from a session snapshot.
//!
//! `narrate` is a pure function of the snapshot: phase, subject, method,
//! outcome and the time elapsed between resolution and `observed_at`. The
//! caller narrative switches to "completed" once the completion delay has
//! passed; the runtime republishes a snapshot exactly when that happens.

use callverify_types::{Method, Outcome};
use serde::Serialize;

use crate::phase::SessionPhase;
use crate::session::SessionSnapshot;

pub const NO_PUSH_SENT: &str = "No push notification sent yet.";

/// Colouring hint for a narrative line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Pending,
    Success,
    Failure,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Line {
    pub text: String,
    pub tone: Tone,
    /// Show a busy indicator next to the text.
    pub busy: bool,
}

impl Line {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            busy: false,
        }
    }

    fn busy(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Pending,
            busy: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Narration {
    pub operator: Line,
    pub caller: Line,
}

pub fn narrate(snapshot: &SessionSnapshot) -> Narration {
    let name = snapshot.subject_name();
    match snapshot.phase {
        SessionPhase::Idle => Narration {
            operator: Line::new("Select a user to verify.", Tone::Neutral),
            caller: Line::new(NO_PUSH_SENT, Tone::Neutral),
        },
        SessionPhase::Selected => Narration {
            operator: Line::new(
                format!("Ready to verify {name}. Send a push or use a hardware token."),
                Tone::Neutral,
            ),
            caller: Line::new(NO_PUSH_SENT, Tone::Neutral),
        },
        SessionPhase::PushPending => Narration {
            operator: Line::busy(format!("Push sent to {name}. Waiting for approval...")),
            caller: Line::busy(format!(
                "Push notification sent to {name}. Awaiting response..."
            )),
        },
        SessionPhase::TokenEntry => Narration {
            operator: Line::new(
                format!("Enter the hardware token number {name} reads out."),
                Tone::Neutral,
            ),
            caller: Line::new(
                format!("Waiting for {name} to provide hardware token number..."),
                Tone::Neutral,
            ),
        },
        SessionPhase::TokenPending => Narration {
            operator: Line::busy(format!("Checking hardware token for {name}...")),
            caller: Line::busy(format!(
                "Hardware token sent to {name}. Awaiting response..."
            )),
        },
        SessionPhase::Resolved => resolved(snapshot, name),
    }
}

fn resolved(snapshot: &SessionSnapshot, name: &str) -> Narration {
    let outcome = snapshot.outcome.unwrap_or(Outcome::Error);

    let operator = match outcome {
        Outcome::Allow => Line::new("Response: allow", Tone::Success),
        Outcome::Deny => Line::new("Response: deny", Tone::Failure),
        Outcome::Error => Line::new(
            format!(
                "Verification error: {}",
                snapshot.failure.as_deref().unwrap_or("unknown error")
            ),
            Tone::Warning,
        ),
    };

    // Errors read as a denial on the caller's side.
    let (caller_tone, approved) = if outcome.is_allow() {
        (Tone::Success, true)
    } else {
        (Tone::Failure, false)
    };

    let caller_text = if snapshot.completion_elapsed() {
        format!("Verification of {name} completed!")
    } else {
        match (snapshot.method.unwrap_or(Method::Push), approved) {
            (Method::Push, true) => format!("Push notification approved by {name}."),
            (Method::Push, false) => format!("Push notification denied by {name}."),
            (Method::Token, true) => format!("Correct token by {name}"),
            (Method::Token, false) => format!("Incorrect token by {name}"),
        }
    };

    Narration {
        operator,
        caller: Line::new(caller_text, caller_tone),
    }
}
