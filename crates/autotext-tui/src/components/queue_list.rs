//! QueueList: the leads on the active tab, one row each, with a live
//! countdown to their next scheduled send.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use autotext_proto::classify::{is_overdue, ClassifiedLead, QueueTab};
use autotext_proto::countdown::format_countdown;
use autotext_proto::lead::LeadId;

use crate::{
    action::{action_for_key, Action},
    app_state::AppState,
    component::Component,
    theme::{
        style_selected, style_selected_focused, C_COUNTDOWN, C_IN_FLIGHT, C_MUTED,
        C_OVERDUE, C_PRIMARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
    },
};

pub const EMPTY: &str = "Nothing here.";
const IN_FLIGHT_MARK: &str = "⟳";

pub struct QueueList {
    list: ScrollableList<LeadId>,
    list_state: ListState,
}

impl QueueList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            list_state: ListState::default(),
        }
    }

    /// Rebuild rows from the active tab. Call after every snapshot change or
    /// tab switch.
    pub fn sync(&mut self, state: &AppState) {
        let keys = state.visible().into_iter().map(|l| l.lead.id.clone()).collect();
        self.list.set_keys(keys);
    }

    pub fn selected_id(&self) -> Option<&LeadId> {
        self.list.selected_key()
    }

    fn render_row(&self, entry: &ClassifiedLead, width: usize, state: &AppState) -> Line<'static> {
        let lead = &entry.lead;
        let marker = if state.queue.has_in_flight(&lead.id) {
            Span::styled(format!("{} ", IN_FLIGHT_MARK), Style::default().fg(C_IN_FLIGHT))
        } else {
            Span::raw("  ")
        };

        let countdown = format_countdown(state.now, lead.next_ai_send_at);
        let countdown_style = match lead.next_ai_send_at {
            Some(at) if is_overdue(state.now, at) => Style::default().fg(C_OVERDUE),
            _ => Style::default().fg(C_COUNTDOWN),
        };
        let tail = if countdown.is_empty() {
            String::new()
        } else {
            format!("  • {}", countdown)
        };

        let name_room = width.saturating_sub(2 + tail.width());
        let name = if lead.name.is_empty() {
            format!("lead {}", lead.id)
        } else {
            lead.name.clone()
        };

        Line::from(vec![
            marker,
            Span::styled(truncate(&name, name_room), Style::default().fg(C_PRIMARY)),
            Span::styled(tail, countdown_style),
        ])
    }
}

impl Default for QueueList {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

impl Component for QueueList {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        let page = 10;
        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => vec![Action::SelectUp(1)],
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                vec![Action::SelectDown(1)]
            }
            (KeyCode::PageUp, _) => vec![Action::SelectUp(page)],
            (KeyCode::PageDown, _) => vec![Action::SelectDown(page)],
            (KeyCode::Home, _) => vec![Action::SelectFirst],
            (KeyCode::End, _) => vec![Action::SelectLast],
            (KeyCode::Char(c), m) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                action_for_key(c)
                    .map(|kind| vec![Action::Perform(kind, None)])
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::SelectUp(n) => self.list.select_up(*n),
            Action::SelectDown(n) => self.list.select_down(*n),
            Action::SelectFirst => self.list.select_first(),
            Action::SelectLast => self.list.select_last(),
            Action::SwitchTab(_) | Action::ToggleTab => {
                self.sync(state);
                self.list.select_first();
            }
            _ => {}
        }
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let key = match state.tab {
            QueueTab::Pending => '1',
            QueueTab::Approved => '2',
        };
        let badge = (!state.connected && state.last_error.is_some()).then_some(Badge {
            text: "OFFLINE",
            color: C_OVERDUE,
        });
        let block = pane_chrome(state.tab.title(), Some(key), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let visible = state.visible();
        if visible.is_empty() {
            let msg = if state.queue.is_loaded() { EMPTY } else { "Loading…" };
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" {}", msg), Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        self.list.ensure_visible(height);
        let range = self.list.visible_range(height);
        let width = inner.width as usize;

        let items: Vec<ListItem> = visible
            .get(range.clone())
            .unwrap_or_default()
            .iter()
            .map(|entry| ListItem::new(self.render_row(entry, width, state)))
            .collect();

        let highlight = if focused {
            style_selected_focused()
        } else {
            style_selected()
        };
        let list = List::new(items).highlight_style(highlight);
        // Rows are already windowed, so the widget's own offset stays at zero.
        self.list_state = ListState::default()
            .with_selected(Some(self.list.selected.saturating_sub(range.start)));
        frame.render_stateful_widget(list, inner, &mut self.list_state);
    }
}
