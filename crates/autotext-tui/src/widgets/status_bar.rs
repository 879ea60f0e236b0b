//! Status bar: connection dot, last fetch, and the key legend.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use autotext_proto::classify::QueueTab;

use crate::action::ACTION_KEYS;
use crate::theme::{C_ACCENT, C_MODE_NORMAL, C_MUTED, C_OK, C_SECONDARY};

/// Key legend for `tab`; only the queue actions that apply there are listed.
pub fn keys_for(tab: QueueTab) -> String {
    let mut keys = String::from(" ↑↓/jk select");
    for (key, kind) in ACTION_KEYS {
        if kind.available_in(tab) {
            keys.push_str(&format!("  {} {}", key, kind.label()));
        }
    }
    keys.push_str("  Tab/1/2 tabs  r reload  q quit");
    keys
}

/// `● <base_url>  fetched 3:05:12 PM` or the last error when disconnected.
pub fn connection_line<'a>(
    base_url: &'a str,
    connected: bool,
    last_fetch: Option<DateTime<Utc>>,
    last_error: Option<&'a str>,
) -> Line<'a> {
    let dot = if connected {
        Span::styled("●", Style::default().fg(C_OK))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    };
    let detail = match (connected, last_error, last_fetch) {
        (false, Some(err), _) => err.to_string(),
        (_, _, Some(at)) => format!("fetched {}", at.with_timezone(&Local).format("%-I:%M:%S %p")),
        _ => "connecting…".to_string(),
    };
    Line::from(vec![
        dot,
        Span::raw(" "),
        Span::styled(base_url, Style::default().fg(C_SECONDARY)),
        Span::raw("  "),
        Span::styled(detail, Style::default().fg(C_MUTED)),
    ])
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, tab: QueueTab) {
    let line = Line::from(vec![
        Span::styled(
            " QUEUE ",
            Style::default()
                .fg(C_MODE_NORMAL)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_for(tab), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn legend_only_lists_actions_for_the_tab() {
        assert!(keys_for(QueueTab::Pending).contains("a approve"));
        assert!(!keys_for(QueueTab::Pending).contains("send now"));
        assert!(keys_for(QueueTab::Approved).contains("n send now"));
        assert!(!keys_for(QueueTab::Approved).contains("approve"));
    }

    #[test]
    fn disconnected_shows_error() {
        let line = connection_line("http://crm", false, None, Some("lead service returned 502"));
        assert!(text(&line).starts_with("○ http://crm"));
        assert!(text(&line).ends_with("lead service returned 502"));

        let line = connection_line("http://crm", true, None, None);
        assert!(text(&line).ends_with("connecting…"));
    }
}
