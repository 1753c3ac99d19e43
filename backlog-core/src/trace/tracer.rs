//! Backlog tracer
//!
//! The tracer is the façade over the backlog: it decides which nodes get an
//! interceptor when routes are built, owns the enabled switch and the trace
//! counter, and answers queries against the store.
//!
//! A `BacklogTracer` is a cheap handle; clones share the same state. Every
//! interceptor holds one.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{BacklogError, Result};
use crate::pipeline::{
    force_assign_ids, DefaultNodeIdFactory, InterceptStrategy, NodeDefinition, NodeIdFactory,
    NodeKey, Processor, RouteDefinition,
};

use super::config::{CaptureFailurePolicy, TracerConfig};
use super::event::BacklogEvent;
use super::format;
use super::interceptor::BacklogTracerInterceptor;
use super::store::{BacklogStore, StoreStats};

/// Lifecycle state of a tracer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ServiceState {
    /// Ready; the initial state
    Started = 0,
    /// Backlog cleared, tracked nodes kept; can be started again
    Stopped = 1,
    /// Terminal; the tracer must not be used any more
    Shutdown = 2,
}

impl ServiceState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ServiceState::Started,
            1 => ServiceState::Stopped,
            _ => ServiceState::Shutdown,
        }
    }
}

struct TracerInner {
    enabled: AtomicBool,
    backlog_size: AtomicUsize,
    trace_counter: AtomicU64,
    capture_failures: AtomicU64,
    capture_failure_policy: AtomicU8,
    body_max_chars: usize,
    state: AtomicU8,
    store: Arc<BacklogStore>,
    processors: Mutex<BTreeMap<NodeKey, Arc<NodeDefinition>>>,
    node_id_factory: Arc<dyn NodeIdFactory>,
}

/// Tracer storing a copy of message details in a bounded backlog
///
/// Traced messages are kept per node in a FIFO backlog and can be pulled on
/// demand, either per node (non-destructive) or all at once (drains the
/// backlog).
#[derive(Clone)]
pub struct BacklogTracer {
    inner: Arc<TracerInner>,
}

impl BacklogTracer {
    /// Create a tracer with default configuration and the given id factory
    pub fn new(node_id_factory: Arc<dyn NodeIdFactory>) -> Self {
        Self::build(TracerConfig::default(), node_id_factory)
    }

    /// Create a tracer from a configuration, using the default id factory
    pub fn with_config(config: TracerConfig) -> Result<Self> {
        Self::with_config_and_factory(config, Arc::new(DefaultNodeIdFactory::new()))
    }

    /// Create a tracer from a configuration and id factory
    pub fn with_config_and_factory(
        config: TracerConfig,
        node_id_factory: Arc<dyn NodeIdFactory>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, node_id_factory))
    }

    fn build(config: TracerConfig, node_id_factory: Arc<dyn NodeIdFactory>) -> Self {
        Self {
            inner: Arc::new(TracerInner {
                enabled: AtomicBool::new(config.enabled),
                backlog_size: AtomicUsize::new(config.backlog_size),
                trace_counter: AtomicU64::new(0),
                capture_failures: AtomicU64::new(0),
                capture_failure_policy: AtomicU8::new(config.capture_failure_policy as u8),
                body_max_chars: config.body_max_chars,
                state: AtomicU8::new(ServiceState::Started as u8),
                store: Arc::new(BacklogStore::new(config.capacity)),
                processors: Mutex::new(BTreeMap::new()),
                node_id_factory,
            }),
        }
    }

    /// Find the backlog tracer among registered intercept strategies
    pub fn find(strategies: &[Arc<dyn InterceptStrategy>]) -> Option<BacklogTracer> {
        strategies
            .iter()
            .find_map(|strategy| strategy.as_any().downcast_ref::<BacklogTracer>())
            .cloned()
    }

    fn ensure_usable(&self) {
        assert!(
            self.state() != ServiceState::Shutdown,
            "backlog tracer used after shutdown"
        );
    }

    // ───────────────────────────────────────────────────────────────────────
    // Wrapping
    // ───────────────────────────────────────────────────────────────────────

    /// Whether `node` should get an interceptor; remembers the node
    ///
    /// Every node is wrapped. Whether anything is captured is decided per
    /// exchange by [`should_trace`](Self::should_trace), so toggling the
    /// tracer never requires rebuilding routes.
    pub fn should_wrap(&self, node: &Arc<NodeDefinition>) -> bool {
        {
            let mut processors = self.inner.processors.lock();
            self.ensure_usable();
            processors.insert(node.key(), node.clone());
        }

        if self.inner.enabled.load(Ordering::Acquire) {
            force_assign_ids(node, self.inner.node_id_factory.as_ref());
        }
        true
    }

    /// Whether exchanges entering `node` should be captured right now
    ///
    /// Called from running routes, so it stays callable after shutdown and
    /// then always answers false.
    pub fn should_trace(&self, _node: &NodeDefinition) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Forget a node whose route is being torn down
    ///
    /// Routes may be torn down after the tracer; nothing is tracked then.
    pub fn stop_processor(&self, node: &NodeDefinition) {
        let mut processors = self.inner.processors.lock();
        if self.state() == ServiceState::Shutdown {
            return;
        }
        processors.remove(&node.key());
    }

    /// Number of nodes currently wrapped
    pub fn tracked_node_count(&self) -> usize {
        self.inner.processors.lock().len()
    }

    /// The id of `node`, assigning one if it has none yet
    pub(crate) fn node_id<'a>(&self, node: &'a NodeDefinition) -> &'a str {
        node.id_or_init(|| self.inner.node_id_factory.create_id(node))
    }

    // ───────────────────────────────────────────────────────────────────────
    // Settings
    // ───────────────────────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.ensure_usable();
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Turn capture on or off
    ///
    /// Enabling assigns ids to every tracked node (and its descendants) that
    /// lacks one, since events are looked up by node id.
    pub fn set_enabled(&self, enabled: bool) {
        self.ensure_usable();
        if enabled {
            self.force_auto_assigning_ids();
        }
        let was = self.inner.enabled.swap(enabled, Ordering::AcqRel);
        if was != enabled {
            info!(enabled, "backlog tracer toggled");
        }
    }

    fn force_auto_assigning_ids(&self) {
        let processors = self.inner.processors.lock();
        for node in processors.values() {
            force_assign_ids(node, self.inner.node_id_factory.as_ref());
        }
        debug!(nodes = processors.len(), "assigned ids to tracked nodes");
    }

    pub fn backlog_size(&self) -> usize {
        self.ensure_usable();
        self.inner.backlog_size.load(Ordering::Relaxed)
    }

    /// Set how many of the latest events per node are reported as current
    pub fn set_backlog_size(&self, backlog_size: i64) -> Result<()> {
        self.ensure_usable();
        let size = usize::try_from(backlog_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or(BacklogError::InvalidBacklogSize { size: backlog_size })?;

        self.inner.backlog_size.store(size, Ordering::Relaxed);
        info!(backlog_size = size, "backlog size changed");
        Ok(())
    }

    pub fn capture_failure_policy(&self) -> CaptureFailurePolicy {
        CaptureFailurePolicy::from_u8(self.inner.capture_failure_policy.load(Ordering::Relaxed))
    }

    pub fn set_capture_failure_policy(&self, policy: CaptureFailurePolicy) {
        self.ensure_usable();
        self.inner
            .capture_failure_policy
            .store(policy as u8, Ordering::Relaxed);
    }

    pub(crate) fn body_max_chars(&self) -> usize {
        self.inner.body_max_chars
    }

    // ───────────────────────────────────────────────────────────────────────
    // Counters
    // ───────────────────────────────────────────────────────────────────────

    pub fn trace_counter(&self) -> u64 {
        self.ensure_usable();
        self.inner.trace_counter.load(Ordering::SeqCst)
    }

    /// Reset the trace counter; events already captured keep their ids
    pub fn reset_trace_counter(&self) {
        self.ensure_usable();
        self.inner.trace_counter.store(0, Ordering::SeqCst);
    }

    pub(crate) fn increment_trace_counter(&self) -> u64 {
        self.inner.trace_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Snapshots that failed under the `Count` or `Log` policies
    pub fn capture_failures(&self) -> u64 {
        self.inner.capture_failures.load(Ordering::Relaxed)
    }

    pub(crate) fn capture_failed(&self, err: &BacklogError) {
        match self.capture_failure_policy() {
            CaptureFailurePolicy::Ignore => {}
            CaptureFailurePolicy::Count => {
                self.inner.capture_failures.fetch_add(1, Ordering::Relaxed);
            }
            CaptureFailurePolicy::Log => {
                self.inner.capture_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "dropped backlog trace event");
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────────────

    /// The shared backlog store
    pub fn store(&self) -> &Arc<BacklogStore> {
        &self.inner.store
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.store.stats()
    }

    /// All backlog events for `node_id`, oldest first; the backlog is kept
    pub fn dump_traced_messages(&self, node_id: &str) -> Vec<Arc<BacklogEvent>> {
        self.ensure_usable();
        self.inner.store.filter(|event| event.to_node() == node_id)
    }

    /// The latest `backlog_size` events for `node_id`, oldest first
    pub fn latest_traced_messages(&self, node_id: &str) -> Vec<Arc<BacklogEvent>> {
        let mut events = self.dump_traced_messages(node_id);
        let keep = self.backlog_size();
        if events.len() > keep {
            events = events.split_off(events.len() - keep);
        }
        events
    }

    pub fn dump_traced_messages_as_xml(&self, node_id: &str) -> String {
        format::events_to_xml(&self.dump_traced_messages(node_id))
    }

    /// Remove and return every event in the backlog, oldest first
    pub fn dump_all_traced_messages(&self) -> Vec<Arc<BacklogEvent>> {
        self.ensure_usable();
        self.inner.store.drain_all()
    }

    pub fn dump_all_traced_messages_as_xml(&self) -> String {
        format::events_to_xml(&self.dump_all_traced_messages())
    }

    // ───────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ───────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Mark the tracer started; it is usable immediately after construction
    pub fn start(&self) {
        self.ensure_usable();
        self.inner
            .state
            .store(ServiceState::Started as u8, Ordering::Release);
        debug!("backlog tracer started");
    }

    /// Clear the backlog; tracked nodes are kept
    pub fn stop(&self) {
        self.ensure_usable();
        self.inner.store.clear();
        self.inner
            .state
            .store(ServiceState::Stopped as u8, Ordering::Release);
        debug!("backlog tracer stopped");
    }

    /// Clear the backlog and tracked nodes; the tracer is unusable afterwards
    pub fn shutdown(&self) {
        let mut processors = self.inner.processors.lock();
        self.ensure_usable();
        self.inner.enabled.store(false, Ordering::Release);
        self.inner.store.clear();
        processors.clear();
        self.inner
            .state
            .store(ServiceState::Shutdown as u8, Ordering::Release);
        drop(processors);
        debug!("backlog tracer shut down");
    }
}

impl Default for BacklogTracer {
    fn default() -> Self {
        Self::new(Arc::new(DefaultNodeIdFactory::new()))
    }
}

impl InterceptStrategy for BacklogTracer {
    fn wrap_processor(
        &self,
        route: Option<&RouteDefinition>,
        node: &Arc<NodeDefinition>,
        target: Arc<dyn Processor>,
    ) -> Arc<dyn Processor> {
        if !self.should_wrap(node) {
            return target;
        }

        let first = route.map(|r| r.is_first_output(node)).unwrap_or(false);
        let route_id = route.and_then(|r| r.id()).map(str::to_string);
        debug!(node = %node, first, "wrapping node with backlog tracer");

        Arc::new(BacklogTracerInterceptor::new(
            self.inner.store.clone(),
            target,
            node.clone(),
            route_id,
            first,
            self.clone(),
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for BacklogTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacklogTracer")
            .field("state", &self.state())
            .field("enabled", &self.inner.enabled.load(Ordering::Relaxed))
            .field("backlog_size", &self.inner.backlog_size.load(Ordering::Relaxed))
            .field("trace_counter", &self.inner.trace_counter.load(Ordering::Relaxed))
            .field("store", &self.inner.store.stats())
            .finish()
    }
}
