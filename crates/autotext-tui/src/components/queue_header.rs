//! QueueHeader: title, next-send banner and the two tabs with counts.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use autotext_proto::classify::QueueTab;
use autotext_proto::countdown::{format_absolute, humanize_until};

use crate::{
    app_state::AppState,
    component::Component,
    theme::{C_BANNER, C_MUTED, C_PRIMARY, C_SECONDARY, C_TAB_ACTIVE},
};

pub const TITLE: &str = "AI Message Queue";

pub struct QueueHeader;

/// `Next AI message in 5 minutes (Apr 26 3:05 PM)`, or nothing when no send
/// is ahead of `now`.
pub fn banner(state: &AppState) -> Option<String> {
    let at = state.queue.next_send(state.now)?;
    Some(format!(
        "Next AI message in {} ({})",
        humanize_until(state.now, at),
        format_absolute(at)
    ))
}

pub fn tab_label(tab: QueueTab, count: usize) -> String {
    format!("{} ({})", tab.title(), count)
}

impl Component for QueueHeader {
    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let (pending, approved) = state.queue.counts();

        let title = Line::from(Span::styled(
            format!(" {}", TITLE),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ));

        let banner = match banner(state) {
            Some(text) => Line::from(Span::styled(format!(" {}", text), Style::default().fg(C_BANNER))),
            None if !state.queue.is_loaded() => {
                Line::from(Span::styled(" Loading…", Style::default().fg(C_MUTED)))
            }
            None => Line::default(),
        };

        let mut tabs = vec![Span::raw(" ")];
        for (i, (tab, count)) in [(QueueTab::Pending, pending), (QueueTab::Approved, approved)]
            .into_iter()
            .enumerate()
        {
            let style = if tab == state.tab {
                Style::default()
                    .fg(C_TAB_ACTIVE)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(C_SECONDARY)
            };
            tabs.push(Span::styled(format!("[{}] ", i + 1), Style::default().fg(C_MUTED)));
            tabs.push(Span::styled(tab_label(tab, count), style));
            tabs.push(Span::raw("   "));
        }

        frame.render_widget(
            Paragraph::new(vec![title, banner, Line::from(tabs)]),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::{lead, render, state_with};
    use autotext_proto::lead::MessageStatus;
    use chrono::Duration;

    #[test]
    fn tabs_show_counts() {
        let state = state_with(vec![
            lead(1, MessageStatus::Pending, None),
            lead(2, MessageStatus::NotStarted, None),
            lead(3, MessageStatus::Sent, None),
        ]);
        let screen = render(&mut QueueHeader, &state, 70, 3);
        assert!(screen.contains("AI Message Queue"));
        assert!(screen.contains("Pending Approval (2)"));
        assert!(screen.contains("Approved (1)"));
    }

    #[test]
    fn banner_picks_earliest_future_send() {
        let mut state = state_with(vec![]);
        let now = state.now;
        state.queue.replace(vec![
            lead(1, MessageStatus::Pending, Some(now + Duration::seconds(10))),
            lead(2, MessageStatus::Pending, Some(now - Duration::seconds(5))),
            lead(3, MessageStatus::Pending, Some(now + Duration::minutes(5))),
        ]);
        let text = banner(&state).unwrap();
        assert!(text.starts_with("Next AI message in a few seconds ("), "{text}");
        assert!(text.ends_with(&format!("({})", format_absolute(now + Duration::seconds(10)))));
    }

    #[test]
    fn no_banner_when_everything_is_overdue() {
        let mut state = state_with(vec![]);
        let now = state.now;
        state
            .queue
            .replace(vec![lead(1, MessageStatus::Pending, Some(now - Duration::hours(1)))]);
        assert_eq!(banner(&state), None);
        assert!(!render(&mut QueueHeader, &state, 60, 3).contains("Next AI message"));
    }
}
