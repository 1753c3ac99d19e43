//! Textual dumps of backlog events
//!
//! Two formats are supported: an XML document matching the operator tooling
//! that consumes backlog dumps, and JSON Lines for everything else.

use std::sync::Arc;

use crate::error::Result;

use super::event::BacklogEvent;

/// Root element of a single event
pub const ROOT_TAG: &str = "backlogTracerEventMessage";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Render events as a `<backlogTracerEventMessages>` document
pub fn events_to_xml(events: &[Arc<BacklogEvent>]) -> String {
    let mut sb = String::new();
    sb.push('<');
    sb.push_str(ROOT_TAG);
    sb.push_str("s>");
    for event in events {
        sb.push('\n');
        sb.push_str(&event_to_xml(event, 2));
    }
    sb.push_str("\n</");
    sb.push_str(ROOT_TAG);
    sb.push_str("s>");
    sb
}

/// Render one event as XML, indented by `indent` spaces
pub fn event_to_xml(event: &BacklogEvent, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let inner = " ".repeat(indent + 2);
    let message = event.message();

    let mut lines = vec![format!("{pad}<{ROOT_TAG}>")];
    lines.push(format!("{inner}<uid>{}</uid>", event.trace_id()));
    lines.push(format!(
        "{inner}<timestamp>{}</timestamp>",
        event.timestamp().format(TIMESTAMP_FORMAT)
    ));
    if let Some(route_id) = event.route_id() {
        lines.push(format!("{inner}<routeId>{}</routeId>", escape(route_id)));
    }
    lines.push(format!("{inner}<toNode>{}</toNode>", escape(event.to_node())));
    lines.push(format!(
        "{inner}<firstInRoute>{}</firstInRoute>",
        event.is_first_in_route()
    ));
    lines.push(format!(
        "{inner}<exchangeId>{}</exchangeId>",
        escape(event.exchange_id())
    ));

    let deep = " ".repeat(indent + 4);
    lines.push(format!(
        "{inner}<message exchangeId=\"{}\">",
        escape(event.exchange_id())
    ));
    if !message.headers().is_empty() {
        lines.push(format!("{deep}<headers>"));
        for (key, header) in message.headers() {
            lines.push(format!(
                "{deep}  <header key=\"{}\" type=\"{}\">{}</header>",
                escape(key),
                escape(&header.kind),
                escape(&header.value)
            ));
        }
        lines.push(format!("{deep}</headers>"));
    }
    match message.body() {
        Some(body) => lines.push(format!(
            "{deep}<body type=\"{}\">{}</body>",
            escape(message.body_type()),
            escape(body)
        )),
        None => lines.push(format!("{deep}<body>[Body is null]</body>")),
    }
    lines.push(format!("{inner}</message>"));
    lines.push(format!("{pad}</{ROOT_TAG}>"));

    lines.join("\n")
}

/// Render events as JSON Lines, one event per line
pub fn to_json_lines(events: &[Arc<BacklogEvent>]) -> Result<String> {
    let lines = events
        .iter()
        .map(|event| serde_json::to_string(event.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
