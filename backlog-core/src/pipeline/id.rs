//! Node id assignment

use std::collections::HashMap;

use parking_lot::Mutex;

use super::NodeDefinition;

/// Generates ids for nodes that were defined without one
pub trait NodeIdFactory: Send + Sync {
    /// Create a new id for the given node
    fn create_id(&self, node: &NodeDefinition) -> String;
}

/// Default factory: the node label followed by a per-label counter
/// (`to1`, `to2`, `log1`, ...)
#[derive(Debug, Default)]
pub struct DefaultNodeIdFactory {
    counters: Mutex<HashMap<String, u64>>,
}

impl DefaultNodeIdFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeIdFactory for DefaultNodeIdFactory {
    fn create_id(&self, node: &NodeDefinition) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(node.label().to_string()).or_insert(0);
        *counter += 1;
        format!("{}{}", node.label(), counter)
    }
}

/// Ensure the node and all of its descendants have ids
///
/// Nodes that already carry an id keep it.
pub fn force_assign_ids(node: &NodeDefinition, factory: &dyn NodeIdFactory) {
    node.id_or_init(|| factory.create_id(node));
    for child in node.children() {
        force_assign_ids(child, factory);
    }
}
