//! Node definitions
//!
//! A node is the static definition of one stage in a route. Its id may be
//! given explicitly or assigned later by a [`NodeIdFactory`]; once set it
//! never changes.
//!
//! [`NodeIdFactory`]: super::NodeIdFactory

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable key identifying a node definition for its whole life
///
/// Keys are independent of the (possibly still unassigned) node id, so an
/// unnamed node can be tracked before it gets one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey(Uuid);

impl NodeKey {
    fn generate() -> Self {
        NodeKey(Uuid::new_v4())
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static definition of a pipeline stage
#[derive(Debug)]
pub struct NodeDefinition {
    key: NodeKey,
    label: String,
    id: OnceLock<String>,
    custom_id: bool,
    children: Vec<Arc<NodeDefinition>>,
}

impl NodeDefinition {
    /// Create an unnamed node of the given kind (e.g. "to", "log", "filter")
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            key: NodeKey::generate(),
            label: label.into(),
            id: OnceLock::new(),
            custom_id: false,
            children: Vec::new(),
        }
    }

    /// Give this node an explicit id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = OnceLock::from(id.into());
        self.custom_id = true;
        self
    }

    /// Add a nested node (e.g. the outputs of a filter or choice)
    pub fn with_child(mut self, child: NodeDefinition) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The node id, if one has been given or assigned
    pub fn id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    pub fn has_id(&self) -> bool {
        self.id.get().is_some()
    }

    /// Whether the id was given explicitly rather than generated
    pub fn has_custom_id(&self) -> bool {
        self.custom_id
    }

    pub fn children(&self) -> &[Arc<NodeDefinition>] {
        &self.children
    }

    /// Return the id, initializing it with `make_id` if the node has none
    pub fn id_or_init<F>(&self, make_id: F) -> &str
    where
        F: FnOnce() -> String,
    {
        self.id.get_or_init(make_id)
    }
}

impl fmt::Display for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}[{}]", self.label, id),
            None => write!(f, "{}[{}]", self.label, self.key),
        }
    }
}
