//! Operator and caller view projections.
//!
//! Both views are pure functions of the session snapshot and the cached
//! directory. Control availability is decided by phase alone.

use callverify_directory::{IdentityDirectory, IdentityOption};
use callverify_session::{narrate, Line, SessionPhase, SessionSnapshot};
use callverify_types::{Handle, Outcome};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperatorView {
    pub identities: Vec<IdentityOption>,
    pub selected: Option<Handle>,
    /// Shown instead of the list when the directory failed to load.
    pub directory_banner: Option<String>,
    pub selector_enabled: bool,
    pub send_push_enabled: bool,
    pub choose_token_enabled: bool,
    pub token_input_visible: bool,
    pub token_input_editable: bool,
    pub token_input: String,
    pub submit_enabled: bool,
    pub clear_enabled: bool,
    pub response: Option<Outcome>,
    pub status: Line,
    /// Rejection message of the last operator intent, if it failed.
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallerView {
    pub status: Line,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsoleViews {
    pub phase: SessionPhase,
    pub operator: OperatorView,
    pub caller: CallerView,
}

pub fn render(snapshot: &SessionSnapshot, directory: &IdentityDirectory) -> ConsoleViews {
    let phase = snapshot.phase;
    let token_input = snapshot.pending_token_value.as_deref().unwrap_or_default();
    let narration = narrate(snapshot);
    let token_visible = matches!(phase, SessionPhase::TokenEntry | SessionPhase::TokenPending);

    let operator = OperatorView {
        identities: directory.options(),
        selected: snapshot.subject.as_ref().map(|s| s.handle.clone()),
        directory_banner: directory
            .load_error()
            .map(|e| format!("Identity directory unavailable: {e}")),
        selector_enabled: directory.is_available()
            && matches!(phase, SessionPhase::Idle | SessionPhase::Selected),
        send_push_enabled: phase == SessionPhase::Selected,
        choose_token_enabled: phase == SessionPhase::Selected,
        token_input_visible: token_visible,
        token_input_editable: phase == SessionPhase::TokenEntry,
        token_input: if token_visible {
            token_input.to_string()
        } else {
            String::new()
        },
        submit_enabled: phase == SessionPhase::TokenEntry && !token_input.trim().is_empty(),
        clear_enabled: phase != SessionPhase::Idle,
        response: snapshot.outcome,
        status: narration.operator,
        last_error: None,
    };

    ConsoleViews {
        phase,
        operator,
        caller: CallerView {
            status: narration.caller,
        },
    }
}
