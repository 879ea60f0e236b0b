use reqwest::StatusCode;
use thiserror::Error;

use crate::lead::LeadId;
use crate::queue::ActionKind;

/// The leads poll failed. The previous snapshot stays in place.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("lead service returned {0}")]
    Status(StatusCode),

    #[error("unreadable leads payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a state-changing call did not go through.
#[derive(Error, Debug)]
pub enum ActionFailure {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("lead service returned {0}")]
    Status(StatusCode),
}

#[derive(Error, Debug)]
#[error("{kind} for lead {lead_id} failed: {source}")]
pub struct ActionError {
    pub kind: ActionKind,
    pub lead_id: LeadId,
    #[source]
    pub source: ActionFailure,
}

/// An action was refused locally, before any request went out.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    #[error("{0} already in progress for lead {1}")]
    AlreadyInFlight(ActionKind, LeadId),

    #[error("lead {0} is not in the current snapshot")]
    UnknownLead(LeadId),

    #[error("{0} does not apply to lead {1} with its current draft status")]
    NotApplicable(ActionKind, LeadId),
}

#[derive(Error, Debug)]
pub enum MessageLogError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("message log returned {status}: {detail}")]
    Rejected { status: StatusCode, detail: String },
}
