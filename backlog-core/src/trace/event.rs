//! Backlog event records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::MessageSnapshot;

/// One captured trace event
///
/// Records are immutable once built; the backlog hands them out behind an
/// `Arc` so queries never copy message data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogEvent {
    /// Value of the trace counter when this event was captured
    trace_id: u64,

    /// Capture time
    timestamp: DateTime<Utc>,

    /// Route owning the node, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    route_id: Option<String>,

    /// Id of the node the exchange was about to enter
    to_node: String,

    /// Whether that node is the first output of its route
    first_in_route: bool,

    /// Detached copy of the message
    message: MessageSnapshot,
}

impl BacklogEvent {
    /// Create a new event stamped with the current time
    pub fn new(
        trace_id: u64,
        route_id: Option<String>,
        to_node: String,
        first_in_route: bool,
        message: MessageSnapshot,
    ) -> Self {
        Self {
            trace_id,
            timestamp: Utc::now(),
            route_id,
            to_node,
            first_in_route,
            message,
        }
    }

    pub fn trace_id(&self) -> u64 {
        self.trace_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    pub fn to_node(&self) -> &str {
        &self.to_node
    }

    pub fn is_first_in_route(&self) -> bool {
        self.first_in_route
    }

    pub fn exchange_id(&self) -> &str {
        self.message.exchange_id()
    }

    pub fn message(&self) -> &MessageSnapshot {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Exchange;

    #[test]
    fn test_event_serialization() {
        let exchange = Exchange::with_body("ping").header("attempt", 1);
        let message = MessageSnapshot::capture(&exchange, "to1", 0).unwrap();
        let event = BacklogEvent::new(7, Some("orders".to_string()), "to1".to_string(), true, message);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"traceId\":7"));
        assert!(json.contains("\"toNode\":\"to1\""));
        assert!(json.contains("\"firstInRoute\":true"));

        let parsed: BacklogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.exchange_id(), exchange.exchange_id());
    }

    #[test]
    fn test_route_id_omitted_when_absent() {
        let message = MessageSnapshot::capture(&Exchange::new(), "log1", 0).unwrap();
        let event = BacklogEvent::new(1, None, "log1".to_string(), false, message);

        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("routeId"));
        assert_eq!(event.route_id(), None);
    }
}
