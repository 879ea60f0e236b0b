//! HTTP client for the lead service.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ActionError, ActionFailure, FetchError};
use crate::lead::{self, Lead, LeadId};
use crate::queue::ActionKind;

const LEADS_PATH: &str = "/api/leads/?filter=all";
const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    csrf_token: Option<HeaderValue>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .user_agent(concat!("autotext/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .default_headers(headers)
            .build()?;

        let csrf_token = match config.csrf_token.as_deref() {
            Some(token) => Some(HeaderValue::from_str(token)?),
            None => None,
        };

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch every lead. Accepts a bare array or `{"leads": [...]}`.
    pub async fn fetch_leads(&self) -> Result<Vec<Lead>, FetchError> {
        let response = self.http.get(self.url(LEADS_PATH)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        let leads = lead::parse_leads(&body)?;
        debug!("fetched {} leads", leads.len());
        Ok(leads)
    }

    /// POST the endpoint for `kind`. The response body is not inspected.
    pub async fn perform(&self, kind: ActionKind, id: &LeadId) -> Result<(), ActionError> {
        let fail = |source: ActionFailure| ActionError {
            kind,
            lead_id: id.clone(),
            source,
        };

        let mut request = self.http.post(self.url(&kind.endpoint(id)));
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token.clone());
        }
        let response = request
            .send()
            .await
            .map_err(|e| fail(ActionFailure::Transport(e)))?;
        let status = response.status();
        if !status.is_success() {
            warn!("{} for lead {} answered {}", kind, id, status);
            return Err(fail(ActionFailure::Status(status)));
        }
        Ok(())
    }
}
