//! In-flight message exchange

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

/// Message body carried by an exchange
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body
    #[default]
    Empty,
    /// Plain text
    Text(String),
    /// Structured JSON document
    Json(Value),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Arbitrary in-process value with no textual rendering
    ///
    /// Stream handles, connection objects and the like end up here. The
    /// backlog tracer cannot snapshot them.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Body {
    /// Short type name used in dumps
    pub fn type_name(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Text(_) => "text",
            Body::Json(_) => "json",
            Body::Bytes(_) => "bytes",
            Body::Opaque(_) => "opaque",
        }
    }

    /// Returns true if there is no body
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

/// A message travelling through a route
///
/// Processors receive the exchange mutably and may rewrite headers or body.
#[derive(Debug, Clone)]
pub struct Exchange {
    exchange_id: String,
    headers: BTreeMap<String, Value>,
    body: Body,
}

impl Exchange {
    /// Create an empty exchange with a fresh id
    pub fn new() -> Self {
        Self {
            exchange_id: Uuid::new_v4().to_string(),
            headers: BTreeMap::new(),
            body: Body::Empty,
        }
    }

    /// Create an exchange carrying the given body
    pub fn with_body(body: impl Into<Body>) -> Self {
        let mut exchange = Self::new();
        exchange.body = body.into();
        exchange
    }

    /// Add a header (builder style)
    pub fn header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    pub fn headers(&self) -> &BTreeMap<String, Value> {
        &self.headers
    }

    pub fn get_header(&self, key: &str) -> Option<&Value> {
        self.headers.get(key)
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn remove_header(&mut self, key: &str) -> Option<Value> {
        self.headers.remove(key)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exchange_ids_are_unique() {
        let a = Exchange::new();
        let b = Exchange::new();
        assert_ne!(a.exchange_id(), b.exchange_id());
    }

    #[test]
    fn test_headers_and_body() {
        let mut exchange = Exchange::with_body("hello")
            .header("count", 3)
            .header("source", "timer");

        assert_eq!(exchange.get_header("count"), Some(&json!(3)));
        assert_eq!(exchange.body().type_name(), "text");

        exchange.set_body(json!({"id": 7}));
        exchange.remove_header("source");
        assert_eq!(exchange.body().type_name(), "json");
        assert_eq!(exchange.headers().len(), 1);
    }
}
