//! Backlog tracing
//!
//! The backlog tracer keeps a bounded, in-memory history of the exchanges
//! flowing through a route, so an operator can switch tracing on at runtime
//! and look at what recently passed through each node without anything
//! having been logged or persisted up front.
//!
//! ## Key Properties
//!
//! - **Bounded**: one FIFO store with a fixed capacity; the oldest event is
//!   evicted to admit a new one
//! - **Detached**: each event holds a copy of the message taken at capture
//!   time
//! - **Toggleable**: nodes are wrapped once at build time; the enabled switch
//!   is checked per exchange
//! - **Non-intrusive**: a failed capture never fails the exchange
//!
//! ## Architecture
//!
//! ```text
//! Build time                      Run time
//! ──────────                      ────────
//! RouteBuilder                    exchange ──► BacklogTracerInterceptor ──► processor
//!   │ wrap_processor()                           │ enabled?
//!   ▼                                            ▼
//! BacklogTracer ──── shares ────────────► BacklogStore (bounded FIFO)
//!   │ tracked nodes, counter                     ▲
//!   └─ dump_traced_messages() ───────────────────┤ snapshot (keeps)
//!   └─ dump_all_traced_messages() ───────────────┘ drain (takes)
//! ```

mod config;
mod event;
mod interceptor;
mod snapshot;
mod store;
mod tracer;

pub mod format;

pub use config::{CaptureFailurePolicy, TracerConfig};
pub use event::BacklogEvent;
pub use interceptor::BacklogTracerInterceptor;
pub use snapshot::{HeaderSnapshot, MessageSnapshot};
pub use store::{BacklogStore, StoreStats};
pub use tracer::{BacklogTracer, ServiceState};
