//! DraftPanel: the selected lead's AI draft and schedule.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use autotext_proto::countdown::format_absolute;

use crate::{
    app_state::AppState,
    component::Component,
    theme::{style_default, style_secondary, C_IN_FLIGHT, C_MUTED, C_PRIMARY},
    widgets::pane_chrome::pane_chrome,
};

pub const NO_DRAFT: &str = "No draft yet.";

pub struct DraftPanel;

impl Component for DraftPanel {
    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("draft", None, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(entry) = state.selected_lead() else {
            return;
        };
        let lead = &entry.lead;

        let mut lines = vec![Line::from(vec![
            Span::styled(
                lead.name.clone(),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", lead.message_status.as_str()), style_secondary()),
        ])];

        let schedule = match (lead.opted_in_for_ai, lead.next_ai_send_at) {
            (_, Some(at)) => format!("next send {}", format_absolute(at)),
            (true, None) => "auto follow-up on, nothing scheduled".to_string(),
            (false, None) => "auto follow-up off".to_string(),
        };
        lines.push(Line::from(Span::styled(schedule, style_secondary())));
        if state.queue.has_in_flight(&lead.id) {
            lines.push(Line::from(Span::styled("working…", Style::default().fg(C_IN_FLIGHT))));
        }
        lines.push(Line::default());

        match lead.draft() {
            Some(text) => lines.extend(text.lines().map(|l| Line::styled(l.to_string(), style_default()))),
            None => lines.push(Line::styled(NO_DRAFT, Style::default().fg(C_MUTED))),
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
