use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::error::UpstreamError;

/// The error-shaped value a tool returns instead of failing the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// `"<action>: <upstream detail>"`, e.g. `Failed to fetch teams: ...`.
    pub fn upstream(action: &str, err: &UpstreamError) -> Self {
        Self::new(format!("{}: {}", action, err.detail()))
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Json(Value),
    Text(String),
    Failure(ErrorEnvelope),
}

impl ToolOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        ToolOutcome::Failure(ErrorEnvelope::new(error))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    /// Render as the `result` of an MCP `tools/call` response.
    pub fn to_call_result(&self) -> Value {
        let (text, is_error) = match self {
            ToolOutcome::Json(value) => (
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
                false,
            ),
            ToolOutcome::Text(text) => (text.clone(), false),
            ToolOutcome::Failure(envelope) => (json!(envelope).to_string(), true),
        };

        json!({
            "content": [{
                "type": "text",
                "text": text
            }],
            "isError": is_error
        })
    }
}

impl From<ErrorEnvelope> for ToolOutcome {
    fn from(envelope: ErrorEnvelope) -> Self {
        ToolOutcome::Failure(envelope)
    }
}
