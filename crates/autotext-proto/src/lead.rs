//! Lead records as the lead service reports them.
//!
//! Only the subset of fields the queue needs is modelled; everything else in
//! the payload is ignored.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque lead identifier. The service sends integers, but nothing here
/// depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for LeadId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for LeadId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for LeadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => LeadId(n.to_string()),
            Raw::Text(s) => LeadId(s),
        })
    }
}

/// Draft lifecycle as tracked by the lead service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    NotStarted,
    Pending,
    Approved,
    Sent,
}

impl MessageStatus {
    /// Case-insensitive parse. Values outside the four known states read as
    /// `NotStarted`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "sent" => Self::Sent,
            _ => Self::NotStarted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Sent => "sent",
        }
    }
}

impl<'de> Deserialize<'de> for MessageStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(MessageStatus::parse).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub ai_message: Option<String>,
    #[serde(default)]
    pub message_status: MessageStatus,
    #[serde(default, deserialize_with = "null_as_false")]
    pub opted_in_for_ai: bool,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub next_ai_send_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn new(id: impl Into<LeadId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ai_message: None,
            message_status: MessageStatus::NotStarted,
            opted_in_for_ai: false,
            next_ai_send_at: None,
        }
    }

    /// The draft text, treating an empty string as absent.
    pub fn draft(&self) -> Option<&str> {
        self.ai_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
    }
}

/// Decode the leads endpoint body, which is either `{"leads": [...]}` or a
/// bare array.
///
/// Records are decoded one at a time so a bad one is named in the error.
pub fn parse_leads(body: &str) -> Result<Vec<Lead>, serde_json::Error> {
    let records: Vec<Value> = match serde_json::from_str(body)? {
        Value::Object(mut obj) => match obj.remove("leads") {
            Some(leads) => serde_json::from_value(leads)?,
            None => return Err(de::Error::missing_field("leads")),
        },
        other => serde_json::from_value(other)?,
    };
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let which = match record.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(id) => id.to_string(),
                None => format!("#{i}"),
            };
            serde_json::from_value::<Lead>(record).map_err(|e| {
                <serde_json::Error as de::Error>::custom(format_args!("lead {which}: {e}"))
            })
        })
        .collect()
}

/// Parse a lead service timestamp into UTC.
///
/// RFC 3339 values keep their offset; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s:?}"))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
