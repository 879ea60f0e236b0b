//! Action enum: user intents and internal events.

use autotext_proto::classify::QueueTab;
use autotext_proto::lead::LeadId;
use autotext_proto::queue::ActionKind;

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    SelectUp(usize),
    SelectDown(usize),
    SelectFirst,
    SelectLast,
    SwitchTab(QueueTab),
    ToggleTab,

    // ── Queue ────────────────────────────────────────────────────────────────
    /// Run `kind` against a lead. The App resolves the target from the
    /// current selection when the component leaves it empty.
    Perform(ActionKind, Option<LeadId>),
    Reload,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}

/// Queue action bound to each key.
pub const ACTION_KEYS: [(char, ActionKind); 5] = [
    ('a', ActionKind::Approve),
    ('A', ActionKind::ApproveAndSend),
    ('s', ActionKind::SkipOneDay),
    ('g', ActionKind::Regenerate),
    ('n', ActionKind::SendNow),
];

pub fn action_for_key(c: char) -> Option<ActionKind> {
    ACTION_KEYS.iter().find(|(k, _)| *k == c).map(|(_, kind)| *kind)
}
