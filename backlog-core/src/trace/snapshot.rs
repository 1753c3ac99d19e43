//! Message snapshots
//!
//! A snapshot is a detached, textual copy of an exchange's observable state
//! taken at capture time. Later changes to the live exchange do not reach it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BacklogError, Result};
use crate::pipeline::{Body, Exchange};

/// Rendered header value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSnapshot {
    /// JSON type of the original value
    #[serde(rename = "type")]
    pub kind: String,
    /// Textual rendering of the value
    pub value: String,
}

/// Detached copy of an exchange's message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSnapshot {
    exchange_id: String,
    headers: BTreeMap<String, HeaderSnapshot>,
    body_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl MessageSnapshot {
    /// Snapshot the exchange as seen by node `node_id`
    ///
    /// `body_max_chars` clips long bodies; zero keeps them whole. Bodies with
    /// no textual rendering fail with [`BacklogError::CaptureFailed`].
    pub fn capture(exchange: &Exchange, node_id: &str, body_max_chars: usize) -> Result<Self> {
        let headers = exchange
            .headers()
            .iter()
            .map(|(key, value)| (key.clone(), render_header(value)))
            .collect();

        let body = match exchange.body() {
            Body::Empty => None,
            Body::Text(text) => Some(text.clone()),
            Body::Json(value) => Some(serde_json::to_string(value)?),
            Body::Bytes(bytes) => Some(hex::encode(bytes)),
            Body::Opaque(_) => {
                return Err(BacklogError::CaptureFailed {
                    node_id: node_id.to_string(),
                    reason: "message body has no textual representation".to_string(),
                })
            }
        };

        Ok(Self {
            exchange_id: exchange.exchange_id().to_string(),
            headers,
            body_type: exchange.body().type_name().to_string(),
            body: body.map(|b| clip(b, body_max_chars)),
        })
    }

    pub fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    pub fn headers(&self) -> &BTreeMap<String, HeaderSnapshot> {
        &self.headers
    }

    pub fn body_type(&self) -> &str {
        &self.body_type
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

fn render_header(value: &Value) -> HeaderSnapshot {
    let (kind, value) = match value {
        Value::Null => ("null", String::new()),
        Value::Bool(b) => ("boolean", b.to_string()),
        Value::Number(n) => ("number", n.to_string()),
        Value::String(s) => ("string", s.clone()),
        Value::Array(_) => ("array", value.to_string()),
        Value::Object(_) => ("object", value.to_string()),
    };
    HeaderSnapshot {
        kind: kind.to_string(),
        value,
    }
}

fn clip(body: String, max_chars: usize) -> String {
    if max_chars == 0 {
        return body;
    }
    let total = body.chars().count();
    if total <= max_chars {
        return body;
    }
    let mut clipped: String = body.chars().take(max_chars).collect();
    clipped.push_str(&format!(
        "... [Body clipped after {} chars, total length is {}]",
        max_chars, total
    ));
    clipped
}
