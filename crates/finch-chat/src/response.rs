//! Response interpretation.
//!
//! Turns a raw agent payload into what the UI renders: message text, an
//! absolute chart locator, a relative export locator, and the next round's
//! context and follow-ups. Missing optional fields never fail.

use serde_json::Value;

use crate::types::{InterpretedTurn, RawAgentResponse};

/// Conventional API segment relative locators are rebased under.
const API_SEGMENT: &str = "/api";

/// Placeholder used when the response carries no message.
pub const DEFAULT_PLACEHOLDER: &str = "(no message)";

// =============================================================================
// ResponseInterpreter
// =============================================================================

/// Interprets raw agent responses against a fixed chart base locator.
#[derive(Debug, Clone)]
pub struct ResponseInterpreter {
    chart_base: String,
    placeholder: String,
}

impl ResponseInterpreter {
    pub fn new(chart_base: impl Into<String>) -> Self {
        Self {
            chart_base: chart_base.into(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Override the message placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn chart_base(&self) -> &str {
        &self.chart_base
    }

    pub fn interpret(&self, raw: RawAgentResponse) -> InterpretedTurn {
        let message = raw
            .message_text()
            .map(str::to_string)
            .unwrap_or_else(|| self.placeholder.clone());
        let chart_reference = raw
            .chart_url()
            .map(|url| absolutize(url, &self.chart_base));
        let export_reference = raw.csv_url().map(str::to_string);

        InterpretedTurn {
            message,
            chart_reference,
            export_reference,
            next_context: raw.context,
            next_followups: followups_from(raw.followups),
        }
    }
}

// =============================================================================
// Locator helpers
// =============================================================================

/// True for `http://` and `https://` locators, case-insensitively.
pub fn is_absolute(locator: &str) -> bool {
    let lower = locator
        .get(..8)
        .unwrap_or(locator)
        .to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Rebase a relative path under the API segment.
///
/// `/api/x` is kept, `/x` becomes `/api/x`, `x` becomes `/api/x`.
pub fn normalize_api_path(path: &str) -> String {
    if path.starts_with("/api/") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", API_SEGMENT, path)
    } else {
        format!("{}/{}", API_SEGMENT, path)
    }
}

/// Resolve a locator against `base`; absolute locators pass through unchanged.
pub fn absolutize(locator: &str, base: &str) -> String {
    if is_absolute(locator) {
        return locator.to_string();
    }
    format!("{}{}", base.trim_end_matches('/'), normalize_api_path(locator))
}

/// Follow-ups as strings; anything that is not an array yields none.
fn followups_from(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================
