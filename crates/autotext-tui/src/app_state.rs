//! AppState: shared read-only data passed to all components during render/event.
//!
//! The App event loop is the only thing that writes to AppState.

use chrono::{DateTime, Utc};

use autotext_proto::classify::{ClassifiedLead, QueueTab};
use autotext_proto::lead::LeadId;
use autotext_proto::queue::LeadQueue;

pub struct AppState {
    /// The snapshot plus in-flight bookkeeping.
    pub queue: LeadQueue,
    /// Advanced by the UI ticker. Every countdown and overdue check reads this.
    pub now: DateTime<Utc>,
    pub tab: QueueTab,
    /// Lead under the cursor, tracked by id so it survives snapshot replacement.
    pub selected: Option<LeadId>,

    // ── Lead service ──────────────────────────────────────────────────────────
    pub base_url: String,
    /// True while a leads fetch is outstanding.
    pub loading: bool,
    /// False once a fetch fails; true again after the next good one.
    pub connected: bool,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(queue: LeadQueue, base_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            queue,
            now,
            tab: QueueTab::default(),
            selected: None,
            base_url: base_url.into(),
            loading: false,
            connected: false,
            last_fetch: None,
            last_error: None,
        }
    }

    /// Leads on the active tab, in snapshot order.
    pub fn visible(&self) -> Vec<&ClassifiedLead> {
        self.queue.visible(self.tab).collect()
    }

    pub fn selected_lead(&self) -> Option<&ClassifiedLead> {
        let id = self.selected.as_ref()?;
        self.queue.get(id).filter(|l| self.tab.contains(l))
    }
}
