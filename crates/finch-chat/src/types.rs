//! Wire and session types for the conversational dispatch layer.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Session and turns
// =============================================================================

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One entry in the session's display history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Absolute chart locator, ready for direct rendering.
    pub chart_reference: Option<String>,
    /// Backend-relative export locator, replayed through the proxy.
    pub export_reference: Option<String>,
    /// Epoch seconds.
    pub created_at: i64,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text.into())
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::plain(Role::Agent, text.into())
    }

    fn plain(role: Role, text: String) -> Self {
        Self {
            role,
            text,
            chart_reference: None,
            export_reference: None,
            created_at: Local::now().timestamp(),
        }
    }
}

/// Tenant parameters sent with every dispatch.
///
/// Flattened into the request object next to `text`, so extra keys end up at
/// the top level of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    pub company_id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionParams {
    pub fn new(company_id: i64) -> Self {
        Self {
            company_id,
            extra: Map::new(),
        }
    }

    /// Add an extra opaque parameter.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// =============================================================================
// Agent endpoint payloads
// =============================================================================

/// Request body for the agent endpoint.
///
/// `context` is omitted entirely when absent, never sent as `null`.
#[derive(Debug, Serialize)]
pub struct AgentRequest<'a> {
    pub text: &'a str,
    #[serde(flatten)]
    pub params: &'a SessionParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a Value>,
}

/// Raw agent response, partially typed.
///
/// Only `message`, `data.chart_url`, `data.csv_url`, `context` and
/// `followups` are ever read. Everything else rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAgentResponse {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub followups: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawAgentResponse {
    /// The message text, if it is a non-null string.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().and_then(Value::as_str)
    }

    /// `data.chart_url`, if `data` is an object holding a non-empty string.
    pub fn chart_url(&self) -> Option<&str> {
        self.data_str("chart_url")
    }

    /// `data.csv_url`, if `data` is an object holding a non-empty string.
    pub fn csv_url(&self) -> Option<&str> {
        self.data_str("csv_url")
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// What the UI renders from one agent response, plus the next round's state.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedTurn {
    pub message: String,
    pub chart_reference: Option<String>,
    pub export_reference: Option<String>,
    pub next_context: Option<Value>,
    pub next_followups: Vec<String>,
}

impl InterpretedTurn {
    /// Build the agent-role history turn for this response.
    pub fn to_turn(&self) -> Turn {
        Turn {
            role: Role::Agent,
            text: self.message.clone(),
            chart_reference: self.chart_reference.clone(),
            export_reference: self.export_reference.clone(),
            created_at: Local::now().timestamp(),
        }
    }
}

/// Read-only view of the Context Store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    pub context: Option<Value>,
    pub followups: Vec<String>,
    /// Export locator captured with `context`.
    pub export_reference: Option<String>,
}

/// A materialized export, ready for a client-side save.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
