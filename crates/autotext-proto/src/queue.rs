//! LeadQueue: the in-memory snapshot plus optimistic action bookkeeping.
//!
//! The snapshot is only ever changed in two ways: wholesale replacement from
//! a fetch (`replace`), or a single-record optimistic patch when an action
//! starts (`begin`). Failed actions are not undone here; `finish` tells the
//! caller to reload from the lead service instead.
//!
//! # Membership
//! ```text
//!  PENDING  --approve-->          APPROVED
//!  PENDING  --approve_and_send--> removed
//!  PENDING  --skip_one_day-->     PENDING   (next_ai_send_at += 24h)
//!  APPROVED --send_now-->         removed
//! ```

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::classify::{self, ClassifiedLead, QueueTab};
use crate::error::QueueError;
use crate::lead::{Lead, LeadId, MessageStatus};

/// How far `skip_one_day` pushes the next send.
pub fn skip_delay() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Approve,
    ApproveAndSend,
    SendNow,
    SkipOneDay,
    Regenerate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Approve,
        ActionKind::ApproveAndSend,
        ActionKind::SendNow,
        ActionKind::SkipOneDay,
        ActionKind::Regenerate,
    ];

    /// Path of the lead service endpoint, relative to the base URL.
    pub fn endpoint(self, id: &LeadId) -> String {
        let route = match self {
            Self::Approve => "approve-message",
            Self::ApproveAndSend => "approve-send",
            Self::SendNow => "send-now",
            Self::SkipOneDay => "skip-message",
            Self::Regenerate => "regenerate-message",
        };
        format!("/api/{route}/{id}/")
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::ApproveAndSend => "approve & send",
            Self::SendNow => "send now",
            Self::SkipOneDay => "skip 1 day",
            Self::Regenerate => "regenerate",
        }
    }

    /// Toast text once the service confirms.
    pub fn done_message(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::ApproveAndSend | Self::SendNow => "sent",
            Self::SkipOneDay => "skipped to tomorrow",
            Self::Regenerate => "new draft ready",
        }
    }

    /// Whether the lead service accepts the action for a lead whose draft is
    /// in `status`. Only an approved draft can be sent on its own; the other
    /// actions need a draft that is neither approved nor sent.
    pub fn applies_to(self, status: MessageStatus) -> bool {
        match self {
            Self::SendNow => status == MessageStatus::Approved,
            Self::Approve | Self::ApproveAndSend | Self::SkipOneDay | Self::Regenerate => {
                classify::is_pending(status)
            }
        }
    }

    /// Whether the action belongs in the key legend of `tab`.
    pub fn available_in(self, tab: QueueTab) -> bool {
        match self {
            Self::SendNow => tab == QueueTab::Approved,
            _ => tab == QueueTab::Pending,
        }
    }

    /// True for actions that hand the draft to the SMS side.
    pub fn sends_message(self) -> bool {
        matches!(self, Self::ApproveAndSend | Self::SendNow)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the caller must do once an action's request has resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// The snapshot already reflects the outcome.
    Keep,
    /// Throw the snapshot away and fetch a fresh one.
    Reload,
}

#[derive(Debug, Default)]
pub struct LeadQueue {
    leads: Vec<ClassifiedLead>,
    in_flight: HashSet<(LeadId, ActionKind)>,
    skip_marks_handled: bool,
    loaded: bool,
}

impl LeadQueue {
    pub fn new(skip_marks_handled: bool) -> Self {
        Self {
            skip_marks_handled,
            ..Self::default()
        }
    }

    /// Swap in a fresh snapshot. Membership is recomputed for every record.
    pub fn replace(&mut self, leads: Vec<Lead>) {
        self.leads = classify::classify(leads);
        self.loaded = true;
    }

    /// True once at least one snapshot has arrived.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn leads(&self) -> &[ClassifiedLead] {
        &self.leads
    }

    pub fn get(&self, id: &LeadId) -> Option<&ClassifiedLead> {
        self.leads.iter().find(|l| &l.lead.id == id)
    }

    pub fn visible(&self, tab: QueueTab) -> impl Iterator<Item = &ClassifiedLead> + '_ {
        self.leads.iter().filter(move |l| tab.contains(l))
    }

    pub fn counts(&self) -> (usize, usize) {
        classify::tab_counts(&self.leads)
    }

    pub fn next_send(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        classify::next_send(&self.leads, now)
    }

    pub fn is_in_flight(&self, id: &LeadId, kind: ActionKind) -> bool {
        self.in_flight.contains(&(id.clone(), kind))
    }

    pub fn has_in_flight(&self, id: &LeadId) -> bool {
        self.in_flight.iter().any(|(lead, _)| lead == id)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Register an action and apply its optimistic patch.
    ///
    /// Refuses duplicates of an outstanding `(lead, kind)`, unknown leads, and
    /// actions the lead's draft status does not allow. Nothing changes on
    /// refusal.
    pub fn begin(
        &mut self,
        kind: ActionKind,
        id: &LeadId,
        now: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        if self.is_in_flight(id, kind) {
            return Err(QueueError::AlreadyInFlight(kind, id.clone()));
        }
        let pos = self
            .leads
            .iter()
            .position(|l| &l.lead.id == id)
            .ok_or_else(|| QueueError::UnknownLead(id.clone()))?;
        if !kind.applies_to(self.leads[pos].lead.message_status) {
            return Err(QueueError::NotApplicable(kind, id.clone()));
        }

        self.in_flight.insert((id.clone(), kind));

        match kind {
            ActionKind::Approve => {
                let entry = &mut self.leads[pos];
                entry.is_pending = false;
                entry.lead.message_status = MessageStatus::Approved;
            }
            ActionKind::ApproveAndSend | ActionKind::SendNow => {
                self.leads.remove(pos);
            }
            ActionKind::SkipOneDay => {
                let entry = &mut self.leads[pos];
                let base = entry.lead.next_ai_send_at.unwrap_or(now);
                entry.lead.next_ai_send_at = Some(base + skip_delay());
                if self.skip_marks_handled {
                    entry.is_pending = false;
                }
            }
            ActionKind::Regenerate => {}
        }
        Ok(())
    }

    /// Clear the in-flight entry and decide whether the snapshot can stand.
    pub fn finish(&mut self, kind: ActionKind, id: &LeadId, succeeded: bool) -> Reconcile {
        self.in_flight.remove(&(id.clone(), kind));
        if !succeeded || kind == ActionKind::Regenerate {
            Reconcile::Reload
        } else {
            Reconcile::Keep
        }
    }
}
