//! Queue membership and banner ordering. Everything here is pure.

use chrono::{DateTime, Utc};

use crate::lead::{Lead, MessageStatus};

/// Which of the two queue tabs is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueTab {
    #[default]
    Pending,
    Approved,
}

impl QueueTab {
    pub fn toggle(self) -> Self {
        match self {
            Self::Pending => Self::Approved,
            Self::Approved => Self::Pending,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Pending => "Pending Approval",
            Self::Approved => "Approved",
        }
    }

    pub fn contains(self, lead: &ClassifiedLead) -> bool {
        match self {
            Self::Pending => lead.is_pending,
            Self::Approved => !lead.is_pending,
        }
    }
}

/// A lead plus its derived queue membership.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLead {
    pub lead: Lead,
    pub is_pending: bool,
}

impl ClassifiedLead {
    pub fn new(lead: Lead) -> Self {
        let is_pending = is_pending(lead.message_status);
        Self { lead, is_pending }
    }
}

pub fn is_pending(status: MessageStatus) -> bool {
    !matches!(status, MessageStatus::Approved | MessageStatus::Sent)
}

pub fn classify(leads: Vec<Lead>) -> Vec<ClassifiedLead> {
    leads.into_iter().map(ClassifiedLead::new).collect()
}

/// `target < now`. Re-evaluate on every tick; never cache the answer.
pub fn is_overdue(now: DateTime<Utc>, target: DateTime<Utc>) -> bool {
    target < now
}

/// Earliest scheduled send that has not yet passed.
pub fn next_send<'a, I>(leads: I, now: DateTime<Utc>) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a ClassifiedLead>,
{
    let mut future: Vec<DateTime<Utc>> = leads
        .into_iter()
        .filter_map(|l| l.lead.next_ai_send_at)
        .filter(|&at| !is_overdue(now, at))
        .collect();
    future.sort();
    future.first().copied()
}

/// `(pending, approved)` sizes for the tab labels.
pub fn tab_counts<'a, I>(leads: I) -> (usize, usize)
where
    I: IntoIterator<Item = &'a ClassifiedLead>,
{
    leads.into_iter().fold((0, 0), |(p, a), l| {
        if l.is_pending {
            (p + 1, a)
        } else {
            (p, a + 1)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn lead_with(id: u64, status: MessageStatus) -> Lead {
        let mut lead = Lead::new(id, format!("lead {id}"));
        lead.message_status = status;
        lead
    }

    fn scheduled(id: u64, at: Option<DateTime<Utc>>) -> ClassifiedLead {
        let mut lead = Lead::new(id, "x");
        lead.next_ai_send_at = at;
        ClassifiedLead::new(lead)
    }

    #[test]
    fn pending_is_a_function_of_status() {
        let cases = [
            (MessageStatus::NotStarted, true),
            (MessageStatus::Pending, true),
            (MessageStatus::Approved, false),
            (MessageStatus::Sent, false),
        ];
        for (status, expected) in cases {
            let out = classify(vec![lead_with(1, status)]);
            assert_eq!(out[0].is_pending, expected, "{status:?}");
        }
    }

    #[test]
    fn opt_in_flag_does_not_affect_membership() {
        let mut lead = lead_with(1, MessageStatus::Approved);
        lead.opted_in_for_ai = false;
        assert!(!ClassifiedLead::new(lead.clone()).is_pending);
        lead.opted_in_for_ai = true;
        lead.message_status = MessageStatus::Pending;
        assert!(ClassifiedLead::new(lead).is_pending);
    }

    #[test]
    fn tabs_partition_in_source_order() {
        let leads = classify(vec![
            lead_with(3, MessageStatus::Pending),
            lead_with(1, MessageStatus::Approved),
            lead_with(2, MessageStatus::NotStarted),
            lead_with(4, MessageStatus::Sent),
        ]);
        let pending: Vec<_> = leads
            .iter()
            .filter(|l| QueueTab::Pending.contains(l))
            .map(|l| l.lead.id.to_string())
            .collect();
        let approved: Vec<_> = leads
            .iter()
            .filter(|l| QueueTab::Approved.contains(l))
            .map(|l| l.lead.id.to_string())
            .collect();
        assert_eq!(pending, ["3", "2"]);
        assert_eq!(approved, ["1", "4"]);
        assert_eq!(tab_counts(&leads), (2, 2));
    }

    #[test]
    fn banner_picks_earliest_future_send() {
        let now = Utc.with_ymd_and_hms(2025, 4, 26, 12, 0, 0).unwrap();
        let leads = vec![
            scheduled(1, Some(now + Duration::seconds(10))),
            scheduled(2, Some(now - Duration::seconds(5))),
            scheduled(3, Some(now + Duration::seconds(5))),
            scheduled(4, None),
        ];
        assert_eq!(next_send(&leads, now), Some(now + Duration::seconds(5)));
    }

    #[test]
    fn banner_includes_exactly_now_and_moves_with_time() {
        let now = Utc.with_ymd_and_hms(2025, 4, 26, 12, 0, 0).unwrap();
        let leads = vec![scheduled(1, Some(now)), scheduled(2, Some(now + Duration::seconds(30)))];
        assert_eq!(next_send(&leads, now), Some(now));
        let later = now + Duration::seconds(1);
        assert_eq!(next_send(&leads, later), Some(now + Duration::seconds(30)));
        assert_eq!(next_send(&leads, now + Duration::minutes(1)), None);
    }

    #[test]
    fn overdue_is_strict() {
        let now = Utc.with_ymd_and_hms(2025, 4, 26, 12, 0, 0).unwrap();
        assert!(!is_overdue(now, now));
        assert!(is_overdue(now, now - Duration::milliseconds(1)));
    }

    #[test]
    fn classification_is_idempotent() {
        let raw = vec![
            lead_with(1, MessageStatus::Pending),
            lead_with(2, MessageStatus::Approved),
        ];
        assert_eq!(classify(raw.clone()), classify(raw));
    }

    #[test]
    fn tab_toggle() {
        assert_eq!(QueueTab::Pending.toggle(), QueueTab::Approved);
        assert_eq!(QueueTab::Approved.toggle(), QueueTab::Pending);
    }
}
