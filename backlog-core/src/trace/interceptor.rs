//! Per-node trace interceptor
//!
//! The interceptor sits in front of one node's processor. While the tracer
//! is enabled it records a [`BacklogEvent`] for every exchange that enters
//! the node, then hands the untouched exchange on.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::pipeline::{Exchange, NodeDefinition, Processor};

use super::event::BacklogEvent;
use super::snapshot::MessageSnapshot;
use super::store::BacklogStore;
use super::tracer::BacklogTracer;

/// Processor decorator capturing exchanges into the backlog
pub struct BacklogTracerInterceptor {
    store: Arc<BacklogStore>,
    target: Arc<dyn Processor>,
    node: Arc<NodeDefinition>,
    route_id: Option<String>,
    first: bool,
    tracer: BacklogTracer,
}

impl BacklogTracerInterceptor {
    pub fn new(
        store: Arc<BacklogStore>,
        target: Arc<dyn Processor>,
        node: Arc<NodeDefinition>,
        route_id: Option<String>,
        first: bool,
        tracer: BacklogTracer,
    ) -> Self {
        Self {
            store,
            target,
            node,
            route_id,
            first,
            tracer,
        }
    }

    pub fn node(&self) -> &Arc<NodeDefinition> {
        &self.node
    }

    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    pub fn is_first_in_route(&self) -> bool {
        self.first
    }

    /// Record the exchange as it enters the node
    ///
    /// Never fails; a snapshot error is handed to the tracer's capture
    /// failure policy instead.
    fn capture(&self, exchange: &Exchange) {
        let trace_id = self.tracer.increment_trace_counter();
        let to_node = self.tracer.node_id(&self.node).to_string();

        match MessageSnapshot::capture(exchange, &to_node, self.tracer.body_max_chars()) {
            Ok(message) => {
                let event = BacklogEvent::new(
                    trace_id,
                    self.route_id.clone(),
                    to_node,
                    self.first,
                    message,
                );
                self.store.push(event);
            }
            Err(err) => self.tracer.capture_failed(&err),
        }
    }
}

impl Processor for BacklogTracerInterceptor {
    fn process(&self, exchange: &mut Exchange) -> Result<()> {
        if self.tracer.should_trace(&self.node) {
            self.capture(exchange);
        }
        self.target.process(exchange)
    }

    fn stop(&self) {
        self.tracer.stop_processor(&self.node);
        self.target.stop();
    }
}

impl fmt::Debug for BacklogTracerInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacklogTracerInterceptor")
            .field("node", &self.node.to_string())
            .field("route_id", &self.route_id)
            .field("first", &self.first)
            .finish()
    }
}

impl fmt::Display for BacklogTracerInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BacklogTracer[{}]", self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BacklogError;
    use crate::pipeline::{processor_fn, Body};
    use crate::trace::{CaptureFailurePolicy, TracerConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn interceptor(
        tracer: &BacklogTracer,
        node: NodeDefinition,
        target: Arc<dyn Processor>,
    ) -> BacklogTracerInterceptor {
        let node = Arc::new(node);
        tracer.should_wrap(&node);
        BacklogTracerInterceptor::new(
            tracer.store().clone(),
            target,
            node,
            Some("route1".to_string()),
            true,
            tracer.clone(),
        )
    }

    #[test]
    fn test_disabled_is_pass_through() {
        let tracer = BacklogTracer::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let wrapped = interceptor(
            &tracer,
            NodeDefinition::new("to").with_id("a"),
            processor_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        for _ in 0..5 {
            wrapped.process(&mut Exchange::with_body("x")).unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(tracer.trace_counter(), 0);
        assert!(tracer.store().is_empty());
    }

    #[test]
    fn test_enabled_captures_input_state() {
        let tracer = BacklogTracer::default();
        tracer.set_enabled(true);
        let wrapped = interceptor(
            &tracer,
            NodeDefinition::new("to").with_id("a"),
            processor_fn(|ex| {
                ex.set_body("rewritten");
                Ok(())
            }),
        );

        let mut exchange = Exchange::with_body("original");
        wrapped.process(&mut exchange).unwrap();

        let events = tracer.dump_traced_messages("a");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trace_id(), 1);
        assert_eq!(events[0].route_id(), Some("route1"));
        assert!(events[0].is_first_in_route());
        assert_eq!(events[0].message().body(), Some("original"));
        assert_eq!(events[0].exchange_id(), exchange.exchange_id());
    }

    #[test]
    fn test_downstream_failure_propagates() {
        let tracer = BacklogTracer::default();
        tracer.set_enabled(true);
        let wrapped = interceptor(
            &tracer,
            NodeDefinition::new("to").with_id("a"),
            processor_fn(|_| {
                Err(BacklogError::ProcessingFailed {
                    node_id: "a".to_string(),
                    reason: "downstream refused".to_string(),
                })
            }),
        );

        let err = wrapped.process(&mut Exchange::new()).unwrap_err();
        assert!(matches!(err, BacklogError::ProcessingFailed { ref reason, .. } if reason == "downstream refused"));
        // The event was still captured before the failure
        assert_eq!(tracer.store().len(), 1);
    }

    #[test]
    fn test_capture_failure_does_not_stop_exchange() {
        let tracer = BacklogTracer::with_config(
            TracerConfig::default()
                .enabled(true)
                .capture_failure_policy(CaptureFailurePolicy::Count),
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let wrapped = interceptor(
            &tracer,
            NodeDefinition::new("to").with_id("a"),
            processor_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        let mut exchange = Exchange::with_body(Body::Opaque(Arc::new(vec![1u8, 2, 3])));
        wrapped.process(&mut exchange).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(tracer.store().is_empty());
        assert_eq!(tracer.capture_failures(), 1);
    }

    #[test]
    fn test_capture_failure_policies() {
        for (policy, expected_failures) in [
            (CaptureFailurePolicy::Ignore, 0),
            (CaptureFailurePolicy::Count, 1),
            (CaptureFailurePolicy::Log, 1),
        ] {
            let tracer = BacklogTracer::with_config(
                TracerConfig::default()
                    .enabled(true)
                    .capture_failure_policy(policy),
            )
            .unwrap();
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = calls.clone();
            let wrapped = interceptor(
                &tracer,
                NodeDefinition::new("to").with_id("a"),
                processor_fn(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            );

            let mut exchange = Exchange::with_body(Body::Opaque(Arc::new("opaque")));
            wrapped.process(&mut exchange).unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 1, "{:?}", policy);
            assert!(tracer.store().is_empty(), "{:?}", policy);
            assert_eq!(tracer.capture_failures(), expected_failures, "{:?}", policy);
            // The failed capture still consumed a trace id
            assert_eq!(tracer.trace_counter(), 1, "{:?}", policy);
        }
    }

    #[test]
    fn test_unnamed_node_gets_id_on_capture() {
        let tracer = BacklogTracer::default();
        tracer.set_enabled(true);
        let wrapped = interceptor(&tracer, NodeDefinition::new("log"), processor_fn(|_| Ok(())));

        wrapped.process(&mut Exchange::new()).unwrap();

        assert_eq!(wrapped.node().id(), Some("log1"));
        assert_eq!(tracer.dump_traced_messages("log1").len(), 1);
    }

    #[test]
    fn test_stop_untracks_node() {
        let tracer = BacklogTracer::default();
        let wrapped = interceptor(&tracer, NodeDefinition::new("to"), processor_fn(|_| Ok(())));
        assert_eq!(tracer.tracked_node_count(), 1);

        wrapped.stop();
        assert_eq!(tracer.tracked_node_count(), 0);
    }
}
