//! # Backlog Core - message trace backlog
//!
//! Backlog Core keeps a bounded, in-memory history of the exchanges flowing
//! through a message pipeline:
//!
//! - **Tracer**: an intercept strategy that wraps every node of a route when
//!   it is built and can be switched on and off at runtime
//! - **Backlog**: a fixed-capacity FIFO of immutable trace events shared by
//!   all wrapped nodes, evicting the oldest event when full
//! - **Queries**: per-node dumps that leave the backlog intact, and a full
//!   dump that drains it, as data, XML or JSON Lines
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use backlog_core::{BacklogTracer, Exchange, NodeDefinition, Processor, RouteBuilder, RouteDefinition};
//! use backlog_core::pipeline::processor_fn;
//!
//! let tracer = BacklogTracer::default();
//!
//! let route = RouteDefinition::new()
//!     .with_id("greetings")
//!     .to(NodeDefinition::new("to").with_id("upper"), processor_fn(|ex| {
//!         ex.set_body("HELLO");
//!         Ok(())
//!     }));
//! let pipeline = RouteBuilder::new()
//!     .intercept(Arc::new(tracer.clone()))
//!     .build(&route);
//!
//! tracer.set_enabled(true);
//! pipeline.process(&mut Exchange::with_body("hello")).unwrap();
//!
//! let events = tracer.dump_traced_messages("upper");
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].message().body(), Some("hello"));
//!
//! // Draining empties the backlog
//! assert_eq!(tracer.dump_all_traced_messages().len(), 1);
//! assert!(tracer.dump_traced_messages("upper").is_empty());
//! ```

pub mod error;
pub mod pipeline;
pub mod trace;

// Re-export main types
pub use error::{BacklogError, ErrorCategory, ErrorDetail, ErrorResponse, Result};
pub use pipeline::{
    Body, DefaultNodeIdFactory, Exchange, InterceptStrategy, NodeDefinition, NodeIdFactory,
    Pipeline, Processor, RouteBuilder, RouteDefinition,
};
pub use trace::{
    BacklogEvent, BacklogStore, BacklogTracer, BacklogTracerInterceptor, CaptureFailurePolicy,
    MessageSnapshot, ServiceState, StoreStats, TracerConfig,
};

/// Upper bound on events held in the backlog, across all nodes
pub const DEFAULT_BACKLOG_CAPACITY: usize = 1000;

/// Default number of latest events per node reported as current
pub const DEFAULT_BACKLOG_SIZE: usize = 10;
