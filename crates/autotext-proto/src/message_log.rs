//! Wire types for the message-log stub and the client the dashboard uses to
//! record sends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::MessageLogError;
use crate::lead::LeadId;

pub const LOG_MESSAGE_PATH: &str = "/log-message";

/// Body of `POST /log-message`. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMessageRequest {
    #[serde(rename = "leadId", default)]
    pub lead_id: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl LogMessageRequest {
    pub fn sent(lead_id: &LeadId, message: Option<&str>, at: DateTime<Utc>) -> Self {
        let lead_id = match lead_id.as_str().parse::<i64>() {
            Ok(n) => serde_json::Value::from(n),
            Err(_) => serde_json::Value::from(lead_id.as_str()),
        };
        Self {
            lead_id: Some(lead_id),
            message: message.map(str::to_string),
            time: Some(at.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessageResponse {
    pub success: bool,
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogMessageResponse {
    pub fn ok(id: u64) -> Self {
        Self {
            success: true,
            message_id: Some(id),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// One row of the message table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: u64,
    pub lead_id: Option<serde_json::Value>,
    pub message: Option<String>,
    pub time: Option<String>,
}

#[derive(Clone)]
pub struct MessageLogClient {
    http: reqwest::Client,
    url: String,
}

impl MessageLogClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), LOG_MESSAGE_PATH),
        })
    }

    /// Record one message; returns the id the table assigned.
    pub async fn record(&self, entry: &LogMessageRequest) -> Result<u64, MessageLogError> {
        let response = self.http.post(&self.url).json(entry).send().await?;
        let status = response.status();
        let body: Option<LogMessageResponse> = response.json().await.ok();
        match body {
            Some(LogMessageResponse {
                success: true,
                message_id: Some(id),
                ..
            }) if status.is_success() => Ok(id),
            other => Err(MessageLogError::Rejected {
                status,
                detail: other
                    .and_then(|b| b.error)
                    .unwrap_or_else(|| "no detail".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn request_uses_camel_case_lead_id() {
        let at = Utc.with_ymd_and_hms(2025, 4, 26, 15, 5, 0).unwrap();
        let req = LogMessageRequest::sent(&LeadId::from(12), Some("Hi there"), at);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["leadId"], 12);
        assert_eq!(json["message"], "Hi there");
        assert_eq!(json["time"], "2025-04-26T15:05:00+00:00");

        let req = LogMessageRequest::sent(&LeadId::from("ab-1"), None, at);
        assert_eq!(serde_json::to_value(&req).unwrap()["leadId"], "ab-1");
    }

    #[test]
    fn request_fields_are_optional() {
        let req: LogMessageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, LogMessageRequest::default());
    }

    #[test]
    fn response_shapes() {
        assert_eq!(
            serde_json::to_value(LogMessageResponse::ok(3)).unwrap(),
            serde_json::json!({"success": true, "messageId": 3})
        );
        assert_eq!(
            serde_json::to_value(LogMessageResponse::failed("disk full")).unwrap(),
            serde_json::json!({"success": false, "error": "disk full"})
        );
    }
}
