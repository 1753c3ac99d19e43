//! Backlog Trace CLI - run a demo route and dump its backlog
//!
//! Builds a small order-handling route, pushes exchanges through it from
//! several threads with the backlog tracer enabled, then prints what the
//! backlog captured.
//!
//! Usage:
//!     backlog-trace
//!     backlog-trace --exchanges 50 --threads 4 --node validate
//!     backlog-trace --config tracer.json --json

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backlog_core::pipeline::processor_fn;
use backlog_core::trace::format;
use backlog_core::{
    BacklogError, BacklogTracer, Exchange, NodeDefinition, Pipeline, Processor, RouteBuilder,
    RouteDefinition, TracerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "backlog-trace")]
#[command(about = "Run a demo route with the backlog tracer and dump the captured events")]
#[command(version)]
struct Args {
    /// Path to a tracer configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of exchanges to send through the route
    #[arg(short, long, default_value_t = 20)]
    exchanges: usize,

    /// Number of producer threads
    #[arg(short, long, default_value_t = 2)]
    threads: usize,

    /// Only dump events for this node (keeps the backlog)
    #[arg(short, long)]
    node: Option<String>,

    /// Override the backlog capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Override the per-node backlog size
    #[arg(long)]
    backlog_size: Option<i64>,

    /// Output JSON Lines instead of XML
    #[arg(long)]
    json: bool,

    /// Verbose output (show debug info)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "backlog_core=debug"
    } else {
        "backlog_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{}", serde_json::to_string_pretty(&e.to_error_response()).unwrap_or_default());
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), BacklogError> {
    let mut config = match &args.config {
        Some(path) => TracerConfig::from_file(path)?,
        None => TracerConfig::default(),
    };
    if let Some(capacity) = args.capacity {
        config = config.capacity(capacity);
    }

    let tracer = BacklogTracer::with_config(config)?;
    if let Some(size) = args.backlog_size {
        tracer.set_backlog_size(size)?;
    }

    let route = demo_route();
    let pipeline = RouteBuilder::new()
        .intercept(Arc::new(tracer.clone()))
        .build(&route);

    tracer.set_enabled(true);
    run_exchanges(&pipeline, args.exchanges, args.threads.max(1));

    tracing::info!(
        trace_counter = tracer.trace_counter(),
        stats = ?tracer.stats(),
        "exchanges completed"
    );

    let events = match &args.node {
        Some(node) => tracer.latest_traced_messages(node),
        None => tracer.dump_all_traced_messages(),
    };

    if args.json {
        println!("{}", format::to_json_lines(&events)?);
    } else {
        println!("{}", format::events_to_xml(&events));
    }

    pipeline.stop();
    tracer.shutdown();
    Ok(())
}

fn demo_route() -> RouteDefinition {
    RouteDefinition::new()
        .with_id("orders")
        .to(
            NodeDefinition::new("validate").with_id("validate"),
            processor_fn(|ex| {
                if ex.get_header("orderId").is_none() {
                    return Err(BacklogError::ProcessingFailed {
                        node_id: "validate".to_string(),
                        reason: "missing orderId header".to_string(),
                    });
                }
                Ok(())
            }),
        )
        .to(
            NodeDefinition::new("enrich"),
            processor_fn(|ex| {
                ex.set_header("priority", "normal");
                Ok(())
            }),
        )
        .to(
            NodeDefinition::new("to"),
            processor_fn(|ex| {
                ex.set_body(json!({"status": "accepted"}));
                Ok(())
            }),
        )
}

fn run_exchanges(pipeline: &Pipeline, exchanges: usize, threads: usize) {
    thread::scope(|scope| {
        for worker in 0..threads {
            scope.spawn(move || {
                for n in (worker..exchanges).step_by(threads) {
                    let mut exchange = Exchange::with_body(json!({"order": n, "qty": n % 5 + 1}))
                        .header("orderId", format!("ORD-{:04}", n))
                        .header("worker", worker as u64);
                    if let Err(e) = pipeline.process(&mut exchange) {
                        tracing::warn!(error = %e, "exchange failed");
                    }
                }
            });
        }
    });
}
