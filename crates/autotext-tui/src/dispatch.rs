//! Dispatcher: turns queue actions into spawned requests and folds their
//! results back into the snapshot.
//!
//! Every request runs on its own task and reports over one `mpsc` channel;
//! the event loop feeds each `QueueEvent` to `settle` in arrival order. Only
//! the event loop ever touches the `LeadQueue`.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use autotext_proto::client::ApiClient;
use autotext_proto::error::{ActionError, FetchError, MessageLogError, QueueError};
use autotext_proto::lead::{Lead, LeadId};
use autotext_proto::message_log::{LogMessageRequest, MessageLogClient};
use autotext_proto::queue::{ActionKind, LeadQueue, Reconcile};

use crate::widgets::toast::Severity;

#[derive(Debug)]
pub enum QueueEvent {
    Fetched(Result<Vec<Lead>, FetchError>),
    ActionDone {
        kind: ActionKind,
        lead_id: LeadId,
        name: String,
        draft: Option<String>,
        result: Result<(), ActionError>,
    },
    Logged {
        lead_id: LeadId,
        result: Result<u64, MessageLogError>,
    },
}

/// Something worth a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// How a locally refused action is reported.
    pub fn refused(err: &QueueError) -> Self {
        match err {
            QueueError::AlreadyInFlight(..) => Self::new(Severity::Info, err.to_string()),
            QueueError::UnknownLead(_) | QueueError::NotApplicable(..) => {
                Self::new(Severity::Warning, err.to_string())
            }
        }
    }
}

pub struct Dispatcher {
    client: ApiClient,
    message_log: Option<MessageLogClient>,
    tx: mpsc::Sender<QueueEvent>,
    fetches_in_flight: usize,
}

impl Dispatcher {
    pub fn new(
        client: ApiClient,
        message_log: Option<MessageLogClient>,
        tx: mpsc::Sender<QueueEvent>,
    ) -> Self {
        Self {
            client,
            message_log,
            tx,
            fetches_in_flight: 0,
        }
    }

    /// True while any leads fetch is outstanding.
    pub fn fetching(&self) -> bool {
        self.fetches_in_flight > 0
    }

    /// Fetch a fresh snapshot in the background.
    pub fn fetch(&mut self) {
        self.fetches_in_flight += 1;
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_leads().await;
            let _ = tx.send(QueueEvent::Fetched(result)).await;
        });
    }

    /// Apply the optimistic patch for `kind` and send the request.
    ///
    /// Nothing goes out when the queue refuses the action.
    pub fn start(
        &mut self,
        queue: &mut LeadQueue,
        kind: ActionKind,
        id: &LeadId,
        now: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        // Capture before `begin`, which may drop the lead from the snapshot.
        let (name, draft) = match queue.get(id) {
            Some(entry) => (
                entry.lead.name.clone(),
                entry.lead.draft().map(str::to_string),
            ),
            None => (String::new(), None),
        };
        queue.begin(kind, id, now)?;
        info!("{} for lead {} started", kind, id);

        let client = self.client.clone();
        let tx = self.tx.clone();
        let lead_id = id.clone();
        tokio::spawn(async move {
            let result = client.perform(kind, &lead_id).await;
            let _ = tx
                .send(QueueEvent::ActionDone {
                    kind,
                    lead_id,
                    name,
                    draft,
                    result,
                })
                .await;
        });
        Ok(())
    }

    /// Fold a finished request into the snapshot. Follow-up requests (reload,
    /// send logging) are spawned from here.
    pub fn settle(&mut self, queue: &mut LeadQueue, event: QueueEvent) -> Option<Notice> {
        match event {
            QueueEvent::Fetched(result) => {
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                match result {
                    Ok(leads) => {
                        debug!("snapshot replaced ({} leads)", leads.len());
                        queue.replace(leads);
                        None
                    }
                    Err(e) => {
                        warn!("leads fetch failed: {}", e);
                        Some(Notice::new(
                            Severity::Warning,
                            format!("couldn't load leads: {e}"),
                        ))
                    }
                }
            }

            QueueEvent::ActionDone {
                kind,
                lead_id,
                name,
                draft,
                result,
            } => {
                let succeeded = result.is_ok();
                if queue.finish(kind, &lead_id, succeeded) == Reconcile::Reload {
                    self.fetch();
                }
                match result {
                    Ok(()) => {
                        if kind.sends_message() {
                            self.record_send(&lead_id, draft);
                        }
                        let who = if name.is_empty() { lead_id.to_string() } else { name };
                        Some(Notice::new(
                            Severity::Success,
                            format!("{}: {}", who, kind.done_message()),
                        ))
                    }
                    Err(e) => {
                        warn!("{}", e);
                        Some(Notice::new(Severity::Error, e.to_string()))
                    }
                }
            }

            QueueEvent::Logged { lead_id, result } => {
                match result {
                    Ok(id) => debug!("send for lead {} logged as message {}", lead_id, id),
                    Err(e) => warn!("could not log send for lead {}: {}", lead_id, e),
                }
                None
            }
        }
    }

    fn record_send(&self, lead_id: &LeadId, draft: Option<String>) {
        let Some(log) = self.message_log.clone() else {
            return;
        };
        let entry = LogMessageRequest::sent(lead_id, draft.as_deref(), Utc::now());
        let tx = self.tx.clone();
        let lead_id = lead_id.clone();
        tokio::spawn(async move {
            let result = log.record(&entry).await;
            let _ = tx.send(QueueEvent::Logged { lead_id, result }).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use autotext_proto::classify::{self, QueueTab};
    use autotext_proto::config::ApiConfig;
    use autotext_proto::lead::MessageStatus;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    fn fixture() -> serde_json::Value {
        serde_json::json!({"leads": [
            {"id": 1, "name": "Ana", "message_status": "pending",
             "ai_message": "Hi Ana, still looking at the Civic?",
             "next_ai_send_at": "2030-01-01T10:00:00Z"},
            {"id": 2, "name": "Ben", "message_status": "approved",
             "ai_message": "Ben, your trade-in quote is ready."},
            {"id": 3, "name": "Cy", "message_status": "not_started"}
        ]})
    }

    /// Lead service where approve-send always fails and, with `failing`, so
    /// does every other action. Log posts are collected.
    async fn mock_service(
        logged: Arc<Mutex<Vec<serde_json::Value>>>,
        failing: bool,
    ) -> SocketAddr {
        let action = move || async move {
            if failing {
                (StatusCode::INTERNAL_SERVER_ERROR, "twilio down")
            } else {
                (StatusCode::OK, "ok")
            }
        };
        let router = Router::new()
            .route("/api/leads/", get(|| async { Json(fixture()) }))
            .route(
                "/api/approve-send/:id/",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "twilio down") }),
            )
            .route("/api/approve-message/:id/", post(action))
            .route("/api/send-now/:id/", post(action))
            .route("/api/skip-message/:id/", post(action))
            .route("/api/regenerate-message/:id/", post(action))
            .route(
                "/log-message",
                post(move |Json(body): Json<serde_json::Value>| {
                    let logged = logged.clone();
                    async move {
                        logged.lock().unwrap().push(body);
                        Json(serde_json::json!({"success": true, "messageId": 1}))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    struct Harness {
        client: ApiClient,
        dispatcher: Dispatcher,
        rx: mpsc::Receiver<QueueEvent>,
        queue: LeadQueue,
        logged: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    impl Harness {
        async fn new(record_sends: bool) -> Self {
            Self::with(record_sends, false).await
        }

        async fn with(record_sends: bool, failing: bool) -> Self {
            let logged = Arc::new(Mutex::new(Vec::new()));
            let addr = mock_service(logged.clone(), failing).await;
            let base = format!("http://{addr}");
            let client = ApiClient::new(&ApiConfig {
                base_url: base.clone(),
                ..ApiConfig::default()
            })
            .unwrap();
            let log = record_sends.then(|| MessageLogClient::new(&base).unwrap());
            let (tx, rx) = mpsc::channel(16);
            let mut h = Self {
                dispatcher: Dispatcher::new(client.clone(), log, tx),
                client,
                rx,
                queue: LeadQueue::new(false),
                logged,
            };
            h.dispatcher.fetch();
            assert_eq!(h.pump().await, None);
            h
        }

        async fn next(&mut self) -> QueueEvent {
            tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("event in time")
                .expect("channel open")
        }

        async fn pump(&mut self) -> Option<Notice> {
            let event = self.next().await;
            self.dispatcher.settle(&mut self.queue, event)
        }
    }

    #[tokio::test]
    async fn first_fetch_fills_queue() {
        let h = Harness::new(false).await;
        assert!(h.queue.is_loaded());
        assert_eq!(h.queue.counts(), (2, 1));
        assert!(!h.dispatcher.fetching());
    }

    #[tokio::test]
    async fn failed_action_reloads_to_fresh_snapshot() {
        let mut h = Harness::new(false).await;
        let id = LeadId::from(1);

        h.dispatcher
            .start(&mut h.queue, ActionKind::ApproveAndSend, &id, Utc::now())
            .unwrap();
        // optimistic: gone before the service answers
        assert!(h.queue.get(&id).is_none());

        let notice = h.pump().await.unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("500"), "{}", notice.message);
        assert!(h.dispatcher.fetching());
        assert!(!h.queue.has_in_flight(&id));

        assert_eq!(h.pump().await, None);
        let fresh = classify::classify(h.client.fetch_leads().await.unwrap());
        assert_eq!(h.queue.leads(), &fresh[..]);
    }

    #[tokio::test]
    async fn failed_patch_is_replaced_by_fresh_snapshot() {
        for kind in [ActionKind::Approve, ActionKind::SkipOneDay] {
            let mut h = Harness::with(false, true).await;
            let id = LeadId::from(1);
            let before = h.queue.leads().to_vec();

            h.dispatcher.start(&mut h.queue, kind, &id, Utc::now()).unwrap();
            assert_ne!(h.queue.leads(), &before[..], "{kind}: patched locally");

            let notice = h.pump().await.unwrap();
            assert_eq!(notice.severity, Severity::Error, "{kind}");
            assert!(notice.message.starts_with(&format!("{kind} for lead 1 failed")));
            assert_eq!(h.pump().await, None);

            let fresh = classify::classify(h.client.fetch_leads().await.unwrap());
            assert_eq!(h.queue.leads(), &fresh[..], "{kind}");
            assert_eq!(h.queue.leads(), &before[..], "{kind}");
            assert!(!h.queue.has_in_flight(&id));
        }
    }

    #[tokio::test]
    async fn successful_approve_keeps_optimistic_state() {
        let mut h = Harness::new(false).await;
        let id = LeadId::from(1);
        h.dispatcher
            .start(&mut h.queue, ActionKind::Approve, &id, Utc::now())
            .unwrap();
        let entry = h.queue.get(&id).unwrap();
        assert!(!entry.is_pending);
        assert_eq!(entry.lead.message_status, MessageStatus::Approved);

        let notice = h.pump().await.unwrap();
        assert_eq!(notice.severity, Severity::Success);
        assert_eq!(notice.message, "Ana: approved");
        assert!(!h.dispatcher.fetching());
        assert_eq!(h.queue.visible(QueueTab::Approved).count(), 2);
    }

    #[tokio::test]
    async fn duplicate_start_sends_nothing() {
        let mut h = Harness::new(false).await;
        let id = LeadId::from(1);
        h.dispatcher
            .start(&mut h.queue, ActionKind::Regenerate, &id, Utc::now())
            .unwrap();
        let err = h
            .dispatcher
            .start(&mut h.queue, ActionKind::Regenerate, &id, Utc::now())
            .unwrap_err();
        assert_eq!(Notice::refused(&err).severity, Severity::Info);

        // one completion, then the regenerate reload
        assert!(h.pump().await.is_some());
        assert_eq!(h.pump().await, None);
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_now_records_the_draft() {
        let mut h = Harness::new(true).await;
        let id = LeadId::from(2);
        h.dispatcher
            .start(&mut h.queue, ActionKind::SendNow, &id, Utc::now())
            .unwrap();
        assert_eq!(h.pump().await.unwrap().message, "Ben: sent");
        match h.next().await {
            QueueEvent::Logged { lead_id, result } => {
                assert_eq!(lead_id, id);
                assert_eq!(result.unwrap(), 1);
            }
            other => panic!("expected a log event, got {other:?}"),
        }
        let logged = h.logged.lock().unwrap().clone();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0]["leadId"], 2);
        assert_eq!(logged[0]["message"], "Ben, your trade-in quote is ready.");
    }

    #[tokio::test]
    async fn sends_are_not_logged_unless_enabled() {
        let mut h = Harness::new(false).await;
        h.dispatcher
            .start(&mut h.queue, ActionKind::SendNow, &LeadId::from(2), Utc::now())
            .unwrap();
        assert!(h.pump().await.is_some());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.rx.try_recv().is_err());
        assert!(h.logged.lock().unwrap().is_empty());
    }
}
