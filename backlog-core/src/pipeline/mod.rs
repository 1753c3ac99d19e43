//! Minimal pipeline model
//!
//! The backlog tracer plugs into a routing engine through a few narrow
//! seams. This module provides just enough of that engine to drive them:
//!
//! ```text
//! RouteDefinition ──► RouteBuilder ──► Pipeline
//!   (nodes +            │  for every node, every
//!    processors)        │  InterceptStrategy may
//!                       │  wrap the processor
//!                       ▼
//!              Processor::process(&mut Exchange)
//! ```
//!
//! Nodes defined without an id get one from a [`NodeIdFactory`] on demand.

mod exchange;
mod id;
mod node;
mod processor;
mod route;

pub use exchange::{Body, Exchange};
pub use id::{force_assign_ids, DefaultNodeIdFactory, NodeIdFactory};
pub use node::{NodeDefinition, NodeKey};
pub use processor::{processor_fn, FnProcessor, Pipeline, Processor};
pub use route::{InterceptStrategy, RouteBuilder, RouteDefinition, RouteOutput};
