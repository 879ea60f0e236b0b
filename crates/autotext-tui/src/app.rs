//! App: the dashboard event loop.
//!
//! - `App` owns the components and `AppState`, including the lead snapshot.
//! - Terminal input arrives from a blocking reader task over an `mpsc` channel.
//! - Finished requests arrive from the `Dispatcher` over a second channel.
//! - A `PollScheduler` drives the data poll and the countdown ticker. It lives
//!   on the `run` stack, so leaving the loop drops both timers.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::io;
use std::time::Duration;

use chrono::Utc;
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use autotext_proto::classify::QueueTab;
use autotext_proto::config::Config;
use autotext_proto::queue::LeadQueue;
use autotext_proto::schedule::{PollScheduler, ScheduleEvent};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::{draft_panel::DraftPanel, queue_header::QueueHeader, queue_list::QueueList},
    dispatch::{Dispatcher, Notice, QueueEvent},
    theme::C_BG,
    widgets::{status_bar, toast::ToastManager},
};

const TOAST_TICK: Duration = Duration::from_millis(100);
const INPUT_POLL: Duration = Duration::from_millis(200);

pub struct App {
    state: AppState,
    dispatcher: Dispatcher,
    header: QueueHeader,
    list: QueueList,
    draft: DraftPanel,
    toast: ToastManager,
    poll_every: Duration,
    tick_every: Duration,
    should_quit: bool,
    /// Set by a manual reload so the next scheduled poll is a full period away.
    poll_reset: bool,
}

impl App {
    pub fn new(config: &Config, dispatcher: Dispatcher) -> Self {
        let queue = LeadQueue::new(config.queue.skip_marks_handled);
        Self {
            state: AppState::new(queue, config.api.base_url.clone(), Utc::now()),
            dispatcher,
            header: QueueHeader,
            list: QueueList::new(),
            draft: DraftPanel,
            toast: ToastManager::new(),
            poll_every: config.polling.poll_interval(),
            tick_every: config.polling.tick_interval(),
            should_quit: false,
            poll_reset: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, queue_rx: mpsc::Receiver<QueueEvent>) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        debug!("terminal ready, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal, queue_rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("autotext exiting");
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        mut queue_rx: mpsc::Receiver<QueueEvent>,
    ) -> anyhow::Result<()> {
        // ── Background task: keyboard events ──────────────────────────────────
        // Polls with a timeout so it notices the receiver going away on exit.
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);
        tokio::task::spawn_blocking(move || loop {
            if event_tx.is_closed() {
                break;
            }
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if event_tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        let mut scheduler = PollScheduler::new(self.poll_every, self.tick_every);

        // Toast expiry + spinner animation.
        let mut toast_tick = tokio::time::interval(TOAST_TICK);
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(ev) = event_rx.recv() => {
                    needs_redraw = self.handle_event(ev);
                }

                Some(event) = queue_rx.recv() => {
                    self.on_queue_event(event);
                    needs_redraw = true;
                }

                scheduled = scheduler.next() => {
                    match scheduled {
                        ScheduleEvent::Poll => self.dispatcher.fetch(),
                        ScheduleEvent::Tick(now) => {
                            self.state.now = now;
                            for action in self.list.tick(&self.state) {
                                self.dispatch(action);
                            }
                        }
                    }
                    self.sync_loading();
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }

            if std::mem::take(&mut self.poll_reset) {
                scheduler.reset_poll();
            }
        }
        Ok(())
    }

    // ── Message handlers ──────────────────────────────────────────────────────

    /// Returns `true` when the event needs a redraw.
    fn handle_event(&mut self, ev: Event) -> bool {
        match ev {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                true
            }
            Event::Resize(..) => true,
            _ => false,
        }
    }

    fn on_queue_event(&mut self, event: QueueEvent) {
        if let QueueEvent::Fetched(result) = &event {
            match result {
                Ok(_) => {
                    self.state.connected = true;
                    self.state.last_fetch = Some(Utc::now());
                    self.state.last_error = None;
                }
                Err(e) => {
                    self.state.connected = false;
                    self.state.last_error = Some(e.to_string());
                }
            }
        }
        if let Some(notice) = self.dispatcher.settle(&mut self.state.queue, event) {
            self.notify(notice);
        }
        self.sync_loading();
        self.sync_selection();
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return vec![Action::Quit],
            (KeyCode::Char('q'), KeyModifiers::NONE) | (KeyCode::Esc, _) => {
                return vec![Action::Quit]
            }
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => return vec![Action::ToggleTab],
            (KeyCode::Char('1'), _) => return vec![Action::SwitchTab(QueueTab::Pending)],
            (KeyCode::Char('2'), _) => return vec![Action::SwitchTab(QueueTab::Approved)],
            (KeyCode::Char('r'), KeyModifiers::NONE) => return vec![Action::Reload],
            _ => {}
        }
        self.list.handle_key(key, &self.state)
    }

    fn dispatch(&mut self, action: Action) {
        match &action {
            Action::Quit => {
                self.should_quit = true;
                return;
            }
            Action::SwitchTab(tab) => self.state.tab = *tab,
            Action::ToggleTab => self.state.tab = self.state.tab.toggle(),
            Action::Perform(kind, target) => {
                let Some(id) = target.clone().or_else(|| self.state.selected.clone()) else {
                    self.toast.info("no lead selected");
                    return;
                };
                match self
                    .dispatcher
                    .start(&mut self.state.queue, *kind, &id, Utc::now())
                {
                    Ok(()) => self.sync_selection(),
                    Err(e) => {
                        debug!("refused: {}", e);
                        self.notify(Notice::refused(&e));
                    }
                }
                return;
            }
            Action::Reload => {
                self.dispatcher.fetch();
                self.poll_reset = true;
                self.sync_loading();
                return;
            }
            _ => {}
        }

        let follow_up = self.list.on_action(&action, &self.state);
        self.state.selected = self.list.selected_id().cloned();
        for next in follow_up {
            self.dispatch(next);
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.toast.push(notice.message, notice.severity);
    }

    /// Rebuild the list from the snapshot and keep `state.selected` in step.
    fn sync_selection(&mut self) {
        self.list.sync(&self.state);
        self.state.selected = self.list.selected_id().cloned();
    }

    fn sync_loading(&mut self) {
        self.state.loading = self.dispatcher.fetching();
        if self.state.loading {
            self.toast.spinner("loading leads");
        } else {
            self.toast.dismiss_spinner();
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.header.draw(frame, outer[0], false, &self.state);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer[1]);
        self.list.draw(frame, body[0], true, &self.state);
        self.draft.draw(frame, body[1], false, &self.state);

        frame.render_widget(
            Paragraph::new(status_bar::connection_line(
                &self.state.base_url,
                self.state.connected,
                self.state.last_fetch,
                self.state.last_error.as_deref(),
            )),
            outer[2],
        );
        status_bar::draw_keys_bar(frame, outer[3], self.state.tab);

        self.toast.draw(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autotext_proto::client::ApiClient;
    use autotext_proto::config::ApiConfig;
    use autotext_proto::lead::{LeadId, MessageStatus};
    use ratatui::backend::TestBackend;

    use crate::components::test_support::lead;

    fn app() -> (App, mpsc::Receiver<QueueEvent>) {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();
        let (tx, rx) = mpsc::channel(16);
        let mut app = App::new(&Config::default(), Dispatcher::new(client, None, tx));
        app.state.queue.replace(vec![
            lead(1, MessageStatus::Pending, None),
            lead(2, MessageStatus::Pending, None),
            lead(3, MessageStatus::Approved, None),
        ]);
        app.sync_selection();
        (app, rx)
    }

    fn press(app: &mut App, c: char) {
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
    }

    #[tokio::test]
    async fn tabs_and_selection() {
        let (mut app, _rx) = app();
        assert_eq!(app.state.selected, Some(LeadId::from(1)));
        press(&mut app, 'j');
        assert_eq!(app.state.selected, Some(LeadId::from(2)));

        press(&mut app, '2');
        assert_eq!(app.state.tab, QueueTab::Approved);
        assert_eq!(app.state.selected, Some(LeadId::from(3)));
    }

    #[tokio::test]
    async fn approve_moves_lead_and_selection_follows_row() {
        let (mut app, _rx) = app();
        press(&mut app, 'a');
        assert!(app.state.queue.is_in_flight(&LeadId::from(1), autotext_proto::queue::ActionKind::Approve));
        assert_eq!(app.state.queue.counts(), (1, 2));
        assert_eq!(app.state.selected, Some(LeadId::from(2)));
    }

    #[tokio::test]
    async fn wrong_tab_action_is_refused_locally() {
        let (mut app, _rx) = app();
        press(&mut app, 'n');
        assert_eq!(app.state.queue.in_flight_len(), 0);
        assert!(app.toast.messages().any(|(m, _)| m.contains("does not apply")));
    }

    #[tokio::test]
    async fn quit_keys() {
        let (mut app, _rx) = app();
        press(&mut app, 'q');
        assert!(app.should_quit);

        let (mut app, _rx) = self::app();
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn resize_only_redraws() {
        let (mut app, _rx) = app();
        let before = app.state.selected.clone();
        assert!(app.handle_event(Event::Resize(120, 40)));
        assert_eq!(app.state.selected, before);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn full_frame_renders() {
        let (mut app, _rx) = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = (0..20)
            .flat_map(|y| (0..100).map(move |x| (x, y)))
            .map(|(x, y)| buffer[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Pending Approval (2)"));
        assert!(text.contains("Lead 1"));
        assert!(text.contains("No draft yet."));
        assert!(text.contains("a approve"));
    }
}
