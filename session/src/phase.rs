//! Session phases and the triggers that move between them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No subject selected.
    #[default]
    Idle,
    /// Subject chosen, nothing dispatched yet.
    Selected,
    /// Push challenge dispatched, awaiting the caller.
    PushPending,
    /// Token fallback chosen, awaiting the caller's code.
    TokenEntry,
    /// Code submitted, awaiting the token verifier.
    TokenPending,
    /// Terminal outcome recorded.
    Resolved,
}

impl SessionPhase {
    pub const ALL: [SessionPhase; 6] = [
        Self::Idle,
        Self::Selected,
        Self::PushPending,
        Self::TokenEntry,
        Self::TokenPending,
        Self::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected => "selected",
            Self::PushPending => "push_pending",
            Self::TokenEntry => "token_entry",
            Self::TokenPending => "token_pending",
            Self::Resolved => "resolved",
        }
    }

    /// Whether a collaborator call is outstanding in this phase.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PushPending | Self::TokenPending)
    }

    /// Whether an operator trigger is allowed in this phase.
    pub fn accepts(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::SelectIdentity => matches!(self, Self::Idle | Self::Selected),
            Trigger::SendPush | Trigger::ChooseToken => matches!(self, Self::Selected),
            Trigger::EnterToken | Trigger::SubmitToken => matches!(self, Self::TokenEntry),
            Trigger::Reset => true,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-initiated triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    SelectIdentity,
    SendPush,
    ChooseToken,
    EnterToken,
    SubmitToken,
    Reset,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectIdentity => "select_identity",
            Self::SendPush => "send_push",
            Self::ChooseToken => "choose_token",
            Self::EnterToken => "enter_token",
            Self::SubmitToken => "submit_token",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
